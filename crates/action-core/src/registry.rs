//! Action Registry
//!
//! Per-agent ordered collection of actions. On the authority it is the only
//! place actions are created, retired and started by name; it also records
//! the changes that replication ships to observers. On observers it mirrors
//! those changes and forwards local start/stop requests to the authority.

use action_events::{
    ActionEventKind, ActionId, ActionKind, ActionRecord, NetId, RelayCommand, RelayRequest,
    ReplicationOp,
};
use bevy_ecs::prelude::*;
use std::collections::HashMap;

use crate::actions::{ActionBehavior, ActionContext, ActionInstance};
use crate::error::{ActionError, InvariantViolation};
use crate::services::Continuation;

/// Component: the actions owned by one agent, in insertion order
#[derive(Component, Debug, Default)]
pub struct ActionRegistry {
    actions: Vec<ActionInstance>,
    next_action_id: u32,
    /// Changes not yet shipped to observers (authority only)
    pending_ops: Vec<ReplicationOp>,
    /// Last version sent (authority) or applied (observer)
    version: u64,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an action of `kind` and appends it. Authority only.
    ///
    /// Auto-start actions are started immediately when their precondition
    /// holds. Returns the new action's id.
    pub fn add_action(
        &mut self,
        ctx: &mut ActionContext<'_>,
        instigator: NetId,
        kind: &ActionKind,
    ) -> Option<ActionId> {
        if kind.is_empty() {
            let agent = ctx.owner().id();
            ctx.report(InvariantViolation::SpawnFailed {
                agent,
                source: ActionError::EmptyKind,
            });
            return None;
        }
        if !ctx.is_authority() {
            tracing::warn!(
                agent = %ctx.owner().id(),
                %kind,
                "add_action refused: not the authority for this agent"
            );
            ctx.record(ActionEventKind::AuthorityDenied, None, Some(instigator));
            return None;
        }

        let id = ActionId(self.next_action_id);
        let spawned = ctx.catalog().spawn_instance(kind, id, ctx.owner().entity);
        let instance = match spawned {
            Ok(instance) => instance,
            Err(source) => {
                let agent = ctx.owner().id();
                ctx.report(InvariantViolation::SpawnFailed { agent, source });
                return None;
            }
        };
        self.next_action_id += 1;

        tracing::debug!(agent = %ctx.owner().id(), action = instance.name(), %kind, "action added");
        ctx.record(ActionEventKind::Added, Some((id, instance.name())), Some(instigator));
        self.pending_ops.push(ReplicationOp::Added {
            action_id: id,
            kind: kind.clone(),
        });
        self.actions.push(instance);

        let index = self.actions.len() - 1;
        if self.actions[index].auto_start() {
            if self.actions[index].can_start(ctx, instigator) {
                self.start_at(ctx, index, instigator);
            } else {
                ctx.report(InvariantViolation::AutoStartRejected {
                    agent: ctx.owner().id(),
                    name: self.actions[index].name().to_string(),
                });
            }
        }

        Some(id)
    }

    /// Starts the first action named `name` whose precondition holds.
    ///
    /// Matches failing their precondition notify the user and the scan moves
    /// on. Observers start optimistically and forward the request to the
    /// authority. Returns true if an action was started.
    pub fn start_action_by_name(
        &mut self,
        ctx: &mut ActionContext<'_>,
        instigator: NetId,
        name: &str,
    ) -> bool {
        for index in 0..self.actions.len() {
            if self.actions[index].name() != name {
                continue;
            }

            let action = &self.actions[index];
            if !action.can_start(ctx, instigator) {
                let action_id = action.id();
                ctx.notify(format!("Failed to run: {}", name));
                ctx.record(ActionEventKind::StartRejected, Some((action_id, name)), Some(instigator));
                continue;
            }

            if !ctx.is_authority() {
                let action_id = action.id();
                ctx.forward(RelayRequest::start(ctx.owner().id(), instigator, name));
                ctx.record(
                    ActionEventKind::Forwarded {
                        command: RelayCommand::Start,
                    },
                    Some((action_id, name)),
                    Some(instigator),
                );
            }

            self.start_at(ctx, index, instigator);
            return true;
        }

        tracing::debug!(agent = %ctx.owner().id(), name, "no startable action with this name");
        false
    }

    /// Stops the first running action named `name`.
    ///
    /// Observers stop locally and forward the request. Returns true if an
    /// action was stopped.
    pub fn stop_action_by_name(
        &mut self,
        ctx: &mut ActionContext<'_>,
        instigator: NetId,
        name: &str,
    ) -> bool {
        let Some(index) = self
            .actions
            .iter()
            .position(|action| action.name() == name && action.is_running())
        else {
            return false;
        };

        if !ctx.is_authority() {
            let action_id = self.actions[index].id();
            ctx.forward(RelayRequest::stop(ctx.owner().id(), instigator, name));
            ctx.record(
                ActionEventKind::Forwarded {
                    command: RelayCommand::Stop,
                },
                Some((action_id, name)),
                Some(instigator),
            );
        }

        self.stop_at(ctx, index, instigator)
    }

    /// Retires an idle action. Authority only.
    pub fn remove_action(&mut self, ctx: &mut ActionContext<'_>, action_id: ActionId) -> bool {
        let agent = ctx.owner().id();
        if !ctx.is_authority() {
            tracing::warn!(%agent, %action_id, "remove_action refused: not the authority for this agent");
            ctx.record(ActionEventKind::AuthorityDenied, None, None);
            return false;
        }

        let Some(index) = self.position(action_id) else {
            ctx.report(InvariantViolation::RemoveRejected {
                agent,
                source: ActionError::UnknownAction(action_id),
            });
            return false;
        };
        if self.actions[index].is_running() {
            ctx.report(InvariantViolation::RemoveRejected {
                agent,
                source: ActionError::StillRunning(action_id),
            });
            return false;
        }

        let action = self.actions.remove(index);
        tracing::debug!(%agent, action = action.name(), "action removed");
        ctx.record(ActionEventKind::Removed, Some((action_id, action.name())), None);
        self.pending_ops.push(ReplicationOp::Removed { action_id });
        true
    }

    /// First action of the given kind.
    pub fn get_action(&self, kind: &ActionKind) -> Option<&ActionInstance> {
        self.actions.iter().find(|action| action.kind() == kind)
    }

    /// First action whose behavior is a `T`.
    pub fn get_behavior<T: ActionBehavior>(&self) -> Option<&T> {
        self.actions.iter().find_map(|action| action.behavior_as::<T>())
    }

    /// First action named `name`.
    pub fn find_by_name(&self, name: &str) -> Option<&ActionInstance> {
        self.actions.iter().find(|action| action.name() == name)
    }

    pub fn action(&self, action_id: ActionId) -> Option<&ActionInstance> {
        self.actions.iter().find(|action| action.id() == action_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionInstance> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn running_count(&self) -> usize {
        self.actions.iter().filter(|action| action.is_running()).count()
    }

    /// Force-stops every running action before the agent goes away.
    ///
    /// Returns the number of actions stopped.
    pub fn teardown(&mut self, ctx: &mut ActionContext<'_>) -> usize {
        let owner = ctx.owner().id();
        let mut stopped = 0;
        for action in &mut self.actions {
            if action.stop_action(ctx, owner) {
                stopped += 1;
            }
        }
        stopped
    }

    /// Delivers a fired continuation to its action.
    pub(crate) fn fire_timer(&mut self, ctx: &mut ActionContext<'_>, continuation: Continuation) {
        let Some(index) = self.position(continuation.action_id) else {
            tracing::debug!(
                agent = %ctx.owner().id(),
                action_id = %continuation.action_id,
                "timer fired for retired action, dropped"
            );
            return;
        };

        let action = &mut self.actions[index];
        if action.fire_timer(ctx, continuation.handle, continuation.instigator) && ctx.is_authority() {
            self.pending_ops.push(ReplicationOp::Running {
                action_id: continuation.action_id,
                running: false,
                instigator: Some(continuation.instigator),
            });
        }
    }

    /// Replicated state of every action, in order.
    pub fn records(&self) -> Vec<ActionRecord> {
        self.actions.iter().map(ActionInstance::record).collect()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn has_pending_ops(&self) -> bool {
        !self.pending_ops.is_empty()
    }

    pub(crate) fn take_pending_ops(&mut self) -> Vec<ReplicationOp> {
        std::mem::take(&mut self.pending_ops)
    }

    /// Allocates the next outgoing version.
    pub(crate) fn bump_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Mirrors an ordered list of authority changes.
    ///
    /// Mirrored transitions skip preconditions and auto-start. Ops that are
    /// already reflected locally are ignored.
    pub(crate) fn apply_delta(&mut self, ctx: &mut ActionContext<'_>, ops: &[ReplicationOp]) {
        ctx.set_replicated(true);
        for op in ops {
            match op {
                ReplicationOp::Added { action_id, kind } => {
                    if self.position(*action_id).is_none() {
                        self.mirror_add(ctx, *action_id, kind);
                    }
                }
                ReplicationOp::Removed { action_id } => {
                    if let Some(index) = self.position(*action_id) {
                        self.mirror_remove(ctx, index);
                    }
                }
                ReplicationOp::Running {
                    action_id,
                    running,
                    instigator,
                } => match self.position(*action_id) {
                    Some(index) => self.mirror_running(ctx, index, *running, *instigator),
                    None => tracing::debug!(
                        agent = %ctx.owner().id(),
                        %action_id,
                        "running flag for unknown action, waiting for snapshot"
                    ),
                },
            }
        }
        ctx.set_replicated(false);
    }

    /// Reconciles the whole collection with an authority snapshot: missing
    /// actions are retired, new ones materialized, order and running flags
    /// brought in line.
    pub(crate) fn apply_snapshot(&mut self, ctx: &mut ActionContext<'_>, records: &[ActionRecord]) {
        ctx.set_replicated(true);

        let order: HashMap<ActionId, usize> = records
            .iter()
            .enumerate()
            .map(|(position, record)| (record.action_id, position))
            .collect();

        while let Some(index) = self
            .actions
            .iter()
            .position(|action| !order.contains_key(&action.id()))
        {
            self.mirror_remove(ctx, index);
        }

        for record in records {
            if self.position(record.action_id).is_none() {
                self.mirror_add(ctx, record.action_id, &record.kind);
            }
        }

        self.actions
            .sort_by_key(|action| order.get(&action.id()).copied().unwrap_or(usize::MAX));

        for record in records {
            if let Some(index) = self.position(record.action_id) {
                self.mirror_running(ctx, index, record.running, record.instigator);
            }
        }

        ctx.set_replicated(false);
    }

    fn position(&self, action_id: ActionId) -> Option<usize> {
        self.actions.iter().position(|action| action.id() == action_id)
    }

    fn start_at(&mut self, ctx: &mut ActionContext<'_>, index: usize, instigator: NetId) -> bool {
        let action = &mut self.actions[index];
        if !action.start_action(ctx, instigator) {
            return false;
        }
        if ctx.is_authority() {
            self.pending_ops.push(ReplicationOp::Running {
                action_id: action.id(),
                running: true,
                instigator: Some(instigator),
            });
        }
        true
    }

    fn stop_at(&mut self, ctx: &mut ActionContext<'_>, index: usize, instigator: NetId) -> bool {
        let action = &mut self.actions[index];
        if !action.stop_action(ctx, instigator) {
            return false;
        }
        if ctx.is_authority() {
            self.pending_ops.push(ReplicationOp::Running {
                action_id: action.id(),
                running: false,
                instigator: Some(instigator),
            });
        }
        true
    }

    fn mirror_add(&mut self, ctx: &mut ActionContext<'_>, action_id: ActionId, kind: &ActionKind) {
        let spawned = ctx.catalog().spawn_instance(kind, action_id, ctx.owner().entity);
        match spawned {
            Ok(instance) => {
                ctx.record(ActionEventKind::Mirrored, Some((action_id, instance.name())), None);
                self.next_action_id = self.next_action_id.max(action_id.0 + 1);
                self.actions.push(instance);
            }
            Err(source) => {
                let agent = ctx.owner().id();
                ctx.report(InvariantViolation::SpawnFailed { agent, source });
            }
        }
    }

    fn mirror_remove(&mut self, ctx: &mut ActionContext<'_>, index: usize) {
        let owner = ctx.owner().id();
        let mut action = self.actions.remove(index);
        action.stop_action(ctx, owner);
        ctx.record(ActionEventKind::Removed, Some((action.id(), action.name())), None);
    }

    fn mirror_running(
        &mut self,
        ctx: &mut ActionContext<'_>,
        index: usize,
        running: bool,
        instigator: Option<NetId>,
    ) {
        let by = instigator.unwrap_or_else(|| ctx.owner().id());
        let action = &mut self.actions[index];
        if action.is_running() != running {
            if running {
                action.start_action(ctx, by);
            } else {
                action.stop_action(ctx, by);
            }
        }
        action.sync_instigator(instigator);
    }
}
