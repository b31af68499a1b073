//! Registry behavior on a single peer
//!
//! Start/stop semantics, the authority gate, first-match lookups, removal
//! rules and teardown.

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use action_core::actions::{ActionBehavior, ActionCatalog, ActionContext, ProjectileAttack, Sprint};
use action_core::components::{AimRig, MoveSpeed};
use action_core::config::SimConfig;
use action_core::error::{ActionError, InvariantViolation};
use action_core::net::{Peer, PeerRole};
use action_events::{ActionEventKind, ActionId, ActionKind, NetId};

const AGENT: NetId = NetId(1);

/// Counts how many times it has been stopped.
struct StopCounter {
    stops: Arc<AtomicUsize>,
}

impl ActionBehavior for StopCounter {
    fn name(&self) -> &str {
        "Counter"
    }

    fn on_stop(&mut self, _ctx: &mut ActionContext<'_>, _instigator: NetId) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Starts itself as soon as it is added.
struct AutoStart {
    allowed: bool,
}

impl ActionBehavior for AutoStart {
    fn name(&self) -> &str {
        "AutoStart"
    }

    fn auto_start(&self) -> bool {
        true
    }

    fn can_start(&self, _ctx: &ActionContext<'_>, _instigator: NetId) -> bool {
        self.allowed
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn host_with(catalog: ActionCatalog, defaults: &[&str]) -> Peer {
    let config = SimConfig::default();
    let mut host = Peer::new(PeerRole::Host, &config, catalog);
    let defaults: Vec<ActionKind> = defaults.iter().copied().map(ActionKind::new).collect();
    host.spawn_agent(AGENT, Some(AimRig::default()), MoveSpeed::default(), &defaults);
    host
}

fn host(defaults: &[&str]) -> Peer {
    host_with(ActionCatalog::with_defaults(&SimConfig::default()), defaults)
}

fn running(peer: &Peer) -> Vec<bool> {
    peer.registry(AGENT)
        .unwrap()
        .iter()
        .map(|action| action.is_running())
        .collect()
}

#[test]
fn test_stop_is_idempotent() {
    let mut host = host(&["sprint"]);

    assert!(host.start_action(AGENT, AGENT, "Sprint"));
    assert!(host.stop_action(AGENT, AGENT, "Sprint"));
    let events_after_first_stop = host.drain_events().len();
    assert!(events_after_first_stop > 0);

    // Second stop finds nothing running and touches nothing
    assert!(!host.stop_action(AGENT, AGENT, "Sprint"));
    assert!(host.drain_events().is_empty());
    assert_eq!(host.speed(AGENT).unwrap().bonus, 0.0);
    assert!(host.violations().is_empty());
}

#[test]
fn test_start_unknown_name() {
    let mut host = host(&["sprint"]);
    assert!(!host.start_action(AGENT, AGENT, "Fireball"));
    assert!(!host.stop_action(AGENT, AGENT, "Fireball"));
    assert!(host.notices().is_empty());
}

#[test]
fn test_first_match_with_duplicate_names() {
    let mut host = host(&["dash", "dash"]);

    assert!(host.start_action(AGENT, AGENT, "Dash"));
    assert_eq!(running(&host), vec![true, false]);

    // First Dash is busy, so the scan falls through to the second
    assert!(host.start_action(AGENT, AGENT, "Dash"));
    assert_eq!(running(&host), vec![true, true]);
    let notices = host.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, "Failed to run: Dash");

    // Nothing left to start
    assert!(!host.start_action(AGENT, AGENT, "Dash"));
    assert_eq!(host.notices().len(), 3);

    // Stop takes the first running match
    assert!(host.stop_action(AGENT, AGENT, "Dash"));
    assert_eq!(running(&host), vec![false, true]);
}

#[test]
fn test_start_rejections_are_recorded() {
    let mut host = host(&["sprint"]);
    assert!(host.start_action(AGENT, AGENT, "Sprint"));
    host.drain_events();

    assert!(!host.start_action(AGENT, AGENT, "Sprint"));
    let events = host.drain_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, ActionEventKind::StartRejected);
    assert_eq!(events[0].action_name.as_deref(), Some("Sprint"));
}

#[test]
fn test_lookups() {
    let host = host(&["primary_attack", "sprint", "dash"]);
    let registry = host.registry(AGENT).unwrap();

    assert_eq!(registry.len(), 3);
    let attack = registry.get_action(&ActionKind::new("primary_attack")).unwrap();
    assert_eq!(attack.name(), "PrimaryAttack");
    assert_eq!(
        attack.behavior_as::<ProjectileAttack>().unwrap().projectile(),
        "magic_bolt"
    );

    assert_eq!(registry.get_behavior::<Sprint>().unwrap().speed_bonus(), 200.0);
    assert_eq!(registry.get_behavior::<ProjectileAttack>().unwrap().projectile(), "magic_bolt");
    assert_eq!(registry.find_by_name("Dash").unwrap().id(), ActionId(2));
    assert!(registry.find_by_name("BlackHole").is_none());
}

#[test]
fn test_running_action_cannot_be_removed() {
    let mut host = host(&["sprint"]);
    let id = host.registry(AGENT).unwrap().find_by_name("Sprint").unwrap().id();

    assert!(host.start_action(AGENT, AGENT, "Sprint"));
    assert!(!host.remove_action(AGENT, id));
    assert_eq!(host.registry(AGENT).unwrap().len(), 1);
    assert_eq!(
        host.violations(),
        &[InvariantViolation::RemoveRejected {
            agent: AGENT,
            source: ActionError::StillRunning(id),
        }]
    );

    assert!(host.stop_action(AGENT, AGENT, "Sprint"));
    assert!(host.remove_action(AGENT, id));
    assert!(host.registry(AGENT).unwrap().is_empty());
}

#[test]
fn test_remove_unknown_action() {
    let mut host = host(&[]);
    assert!(!host.remove_action(AGENT, ActionId(9)));
    assert_eq!(host.violations().len(), 1);
}

#[test]
fn test_add_unknown_kind_reports() {
    let mut host = host(&[]);
    assert!(host.add_action(AGENT, AGENT, "fireball").is_none());
    assert!(host.registry(AGENT).unwrap().is_empty());
    assert!(matches!(
        host.violations(),
        [InvariantViolation::SpawnFailed {
            source: ActionError::UnknownKind(_),
            ..
        }]
    ));
}

#[test]
fn test_observer_cannot_add_actions() {
    let config = SimConfig::default();
    let catalog = ActionCatalog::with_defaults(&config);
    let mut observer = Peer::new(PeerRole::Observer, &config, catalog);
    observer.spawn_agent(AGENT, None, MoveSpeed::default(), &[]);

    assert!(observer.add_action(AGENT, AGENT, "sprint").is_none());
    assert!(observer.registry(AGENT).unwrap().is_empty());

    let events = observer.drain_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, ActionEventKind::AuthorityDenied);
    // Refusal is a warning, not an invariant violation
    assert!(observer.violations().is_empty());
}

#[test]
fn test_empty_kind_reported_before_authority_check() {
    let config = SimConfig::default();
    let catalog = ActionCatalog::with_defaults(&config);
    let mut observer = Peer::new(PeerRole::Observer, &config, catalog);
    observer.spawn_agent(AGENT, None, MoveSpeed::default(), &[]);

    assert!(observer.add_action(AGENT, AGENT, "").is_none());
    assert_eq!(
        observer.violations(),
        &[InvariantViolation::SpawnFailed {
            agent: AGENT,
            source: ActionError::EmptyKind,
        }]
    );
    assert!(observer.drain_events().is_empty());
}

#[test]
fn test_auto_start() {
    let mut catalog = ActionCatalog::new();
    catalog.register("auto", || Box::new(AutoStart { allowed: true }));
    catalog.register("auto_blocked", || Box::new(AutoStart { allowed: false }));
    let host = host_with(catalog, &["auto", "auto_blocked"]);

    assert_eq!(running(&host), vec![true, false]);
    assert!(matches!(
        host.violations(),
        [InvariantViolation::AutoStartRejected { .. }]
    ));
}

#[test]
fn test_teardown_stops_every_running_action() {
    let stops = Arc::new(AtomicUsize::new(0));
    let mut catalog = ActionCatalog::new();
    let counter = Arc::clone(&stops);
    catalog.register("counter", move || {
        Box::new(StopCounter {
            stops: Arc::clone(&counter),
        })
    });
    let mut host = host_with(catalog, &["counter", "counter", "counter", "counter"]);

    for _ in 0..3 {
        assert!(host.start_action(AGENT, AGENT, "Counter"));
    }
    assert_eq!(host.registry(AGENT).unwrap().running_count(), 3);

    assert_eq!(host.destroy_agent(AGENT), 3);
    assert_eq!(stops.load(Ordering::SeqCst), 3);
    assert!(host.agent(AGENT).is_none());
    assert!(!host.start_action(AGENT, AGENT, "Counter"));
}

#[test]
fn test_sprint_bonus_follows_running_flag() {
    let mut host = host(&["sprint"]);
    let base = host.speed(AGENT).unwrap().current();

    assert!(host.start_action(AGENT, AGENT, "Sprint"));
    assert_eq!(host.speed(AGENT).unwrap().current(), base + 200.0);
    assert!(!host.start_action(AGENT, AGENT, "Sprint"));
    assert_eq!(host.speed(AGENT).unwrap().current(), base + 200.0);
    assert!(host.stop_action(AGENT, AGENT, "Sprint"));
    assert_eq!(host.speed(AGENT).unwrap().current(), base);
}
