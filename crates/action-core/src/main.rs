//! Action Simulation
//!
//! Runs a scripted host/observer session: observers forward Sprint and
//! PrimaryAttack requests for the player, the host validates and replicates
//! them, and every lifecycle event on the host is written to a JSONL log.

use action_core::actions::ActionCatalog;
use action_core::config::{default_config_toml, SimConfig};
use action_core::events::EventLogger;
use action_core::net::Session;
use action_core::setup::{self, DUMMY, PLAYER};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Command line arguments for the action simulation
#[derive(Parser, Debug)]
#[command(name = "action_sim")]
#[command(about = "Networked action system simulation")]
struct Args {
    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of ticks to simulate (overrides the config)
    #[arg(long)]
    ticks: Option<u64>,

    /// Random seed for the loopback link (overrides the config)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of observer peers
    #[arg(long, default_value_t = 1)]
    observers: usize,

    /// Write host action events to this JSONL file
    #[arg(long)]
    event_log: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", default_config_toml()?);
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &args.config {
        Some(path) => SimConfig::from_file(path)?,
        None => SimConfig::default(),
    };
    if let Some(ticks) = args.ticks {
        config.simulation.ticks = ticks;
    }
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    let ticks = config.simulation.ticks;

    println!("Action Simulation");
    println!("=================");
    println!("Seed: {}", config.simulation.seed);
    println!("Ticks: {}", ticks);
    println!("Observers: {}", args.observers);
    println!("Snapshot interval: {}", config.replication.snapshot_interval_ticks);
    println!();

    let mut logger = match &args.event_log {
        Some(path) => EventLogger::create(path)?,
        None => EventLogger::discard(),
    };

    let catalog = ActionCatalog::with_defaults(&config);
    let mut session = Session::new(config, catalog);
    for _ in 0..args.observers {
        session.add_observer();
    }
    setup::spawn_demo_agents(&mut session);
    println!(
        "Spawned {} and {} on {} peer(s)",
        PLAYER,
        DUMMY,
        args.observers + 1
    );
    println!();

    let mut projectiles = 0usize;
    for tick in 1..=ticks {
        run_script(&mut session, tick);
        session.tick();
        logger.drain_session(&mut session)?;

        for spawn in session.host_mut().drain_projectiles() {
            projectiles += 1;
            println!(
                "[Tick {:>4}] {} spawned {} toward ({:.0}, {:.0}, {:.0})",
                tick, spawn.owner, spawn.projectile, spawn.target[0], spawn.target[1], spawn.target[2]
            );
        }
        session.host_mut().drain_cues();

        for observer in session.observers_mut() {
            observer.drain_projectiles();
            observer.drain_cues();
        }

        if tick % 50 == 0 {
            println!("Tick {} / {}", tick, ticks);
        }
    }

    let stopped = session.destroy_agent(DUMMY);
    logger.drain_session(&mut session)?;
    logger.finish()?;
    let tally = logger.tally();

    println!();
    println!("Simulation complete. Ran {} ticks.", ticks);
    println!("Host events: {} ({} rejected starts)", tally.host, tally.rejected_starts);
    println!("Observer events: {}", tally.observer);
    println!("Projectiles spawned: {}", projectiles);
    println!("Relay requests lost: {}", session.relay_lost());
    println!("Dummy teardown stopped {} action(s)", stopped);
    println!("Invariant violations: {}", session.host().violations().len());

    let host_records = session.host().registry(PLAYER).map(|r| r.records());
    for (index, observer) in session.observers().iter().enumerate() {
        let in_sync = observer.registry(PLAYER).map(|r| r.records()) == host_records;
        println!(
            "Observer {} ({}): {}",
            index,
            observer.id(),
            if in_sync { "in sync" } else { "diverged" }
        );
    }
    if let Some(path) = &args.event_log {
        println!("Wrote {} events to {}", tally.host, path.display());
    }

    Ok(())
}

/// Scripted requests. The first observer plays the player's client; with no
/// observers the host issues the same requests itself.
fn run_script(session: &mut Session, tick: u64) {
    let (name, start) = match tick {
        2 => ("Sprint", true),
        5 | 6 => ("PrimaryAttack", true),
        20 => ("Sprint", false),
        30 => {
            session.host_mut().start_action(DUMMY, DUMMY, "Sprint");
            return;
        }
        45 => {
            session.host_mut().stop_action(DUMMY, DUMMY, "Sprint");
            return;
        }
        _ => return,
    };

    let peer = if session.observers().is_empty() {
        session.host_mut()
    } else {
        &mut session.observers_mut()[0]
    };
    let accepted = if start {
        peer.start_action(PLAYER, PLAYER, name)
    } else {
        peer.stop_action(PLAYER, PLAYER, name)
    };
    tracing::info!(tick, action = name, start, accepted, "scripted request");
}
