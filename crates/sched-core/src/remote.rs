//! Orderings between actions on a remote node and its connection resource.
//!
//! Every edge built here carries `preserve`, which exempts it from the rule
//! forbidding user orderings that involve a connection resource. Edges from
//! the connection start also carry `runnable_left`, so an action cannot run
//! when the connection cannot start.

use crate::classifier::RemoteConnectionState;
use crate::error::{Result, SchedError};
use crate::fencing::{REASON_CONNECTION_UNRECOVERABLE, REASON_UNKNOWN_STATE};
use crate::ordering::{Endpoint, OrderingFlags};
use crate::plan::Transition;
use crate::snapshot::{ActionId, NodeId, ResourceId, Snapshot};
use crate::types::{readable_action, Role, TaskKind};

// ---------------------------------------------------------------------------
// Ordering primitives
// ---------------------------------------------------------------------------

/// `rsc` start before `action`.
pub fn order_start_then_action(
    snapshot: &Snapshot,
    out: &mut Transition,
    rsc: ResourceId,
    action: ActionId,
    extra: OrderingFlags,
) {
    out.new_ordering(
        Endpoint::start_of(rsc),
        Endpoint::action(snapshot, action),
        OrderingFlags::PRESERVE
            .with(OrderingFlags::RUNNABLE_LEFT)
            .with(extra),
    );
}

/// `action` before `rsc` stop.
pub fn order_action_then_stop(
    snapshot: &Snapshot,
    out: &mut Transition,
    action: ActionId,
    rsc: ResourceId,
    extra: OrderingFlags,
) {
    out.new_ordering(
        Endpoint::action(snapshot, action),
        Endpoint::stop_of(rsc),
        OrderingFlags::PRESERVE.with(extra),
    );
}

/// Resolve the remote or guest node `action` runs on and that node's
/// connection resource.
pub(crate) fn connection_of(
    snapshot: &Snapshot,
    action: ActionId,
    context: &'static str,
) -> Result<(NodeId, ResourceId)> {
    let a = snapshot.action(action);
    let node = a.node.ok_or_else(|| {
        SchedError::contract(context, format!("action '{}' has no node", a.uuid))
    })?;
    let n = snapshot.node(node);
    if !n.is_remote_or_guest() {
        return Err(SchedError::contract(
            context,
            format!("action '{}' runs on {} node '{}'", a.uuid, n.kind, n.name),
        ));
    }
    let connection = n.connection.ok_or_else(|| {
        SchedError::contract(
            context,
            format!("node '{}' has no connection resource", n.name),
        )
    })?;
    Ok((node, connection))
}

// ---------------------------------------------------------------------------
// Plain remote ordering
// ---------------------------------------------------------------------------

/// Order `action`, which runs on a remote node, relative to that node's
/// connection start and stop given the connection `state`.
pub fn apply_remote_ordering(
    snapshot: &Snapshot,
    out: &mut Transition,
    action: ActionId,
    state: RemoteConnectionState,
) -> Result<()> {
    let a = snapshot.action(action);
    if a.rsc.is_none() {
        return Ok(());
    }
    let (node, remote_rsc) = connection_of(snapshot, action, "remote ordering")?;
    let conn = snapshot.resource(remote_rsc);

    tracing::trace!(
        "Order {} action {} relative to {}{} (state: {})",
        readable_action(&a.task, a.interval_ms),
        a.uuid,
        if conn.failed { "failed " } else { "" },
        conn.name,
        state
    );

    match a.task.for_ordering() {
        TaskKind::Start | TaskKind::Promote => {
            // Force recovery by making this action required
            let extra = if state == RemoteConnectionState::Failed {
                OrderingFlags::IMPLIES_THEN
            } else {
                OrderingFlags::OPTIONAL
            };
            order_start_then_action(snapshot, out, remote_rsc, action, extra);
        }

        TaskKind::Stop => match state {
            RemoteConnectionState::Alive => {
                order_action_then_stop(
                    snapshot,
                    out,
                    action,
                    remote_rsc,
                    OrderingFlags::IMPLIES_FIRST,
                );
            }
            RemoteConnectionState::Failed => {
                // Fencing implies the stop, no ordering needed.
                out.request_fencing(snapshot, node, REASON_CONNECTION_UNRECOVERABLE, false);
            }
            _ if conn.next_role == Role::Stopped => {
                // Unknown or stopped: the connection is not coming back this
                // transition, so stop the resource first.
                order_action_then_stop(
                    snapshot,
                    out,
                    action,
                    remote_rsc,
                    OrderingFlags::IMPLIES_FIRST,
                );
            }
            _ => {
                // Connection restarts elsewhere; stop after it is back.
                order_start_then_action(
                    snapshot,
                    out,
                    remote_rsc,
                    action,
                    OrderingFlags::OPTIONAL,
                );
            }
        },

        TaskKind::Demote => {
            // Ordering against a start that is never going to happen would
            // block the demote. The stop ordering covers the other states.
            if matches!(
                state,
                RemoteConnectionState::Resting | RemoteConnectionState::Unknown
            ) {
                order_start_then_action(
                    snapshot,
                    out,
                    remote_rsc,
                    action,
                    OrderingFlags::OPTIONAL,
                );
            }
        }

        task => {
            if a.is_recurring() {
                // Restart recurring monitors even on a mere reconnect.
                order_start_then_action(
                    snapshot,
                    out,
                    remote_rsc,
                    action,
                    OrderingFlags::IMPLIES_THEN,
                );
                return Ok(());
            }

            if task == TaskKind::Monitor && state == RemoteConnectionState::Failed {
                // A probe we have no way to run.
                out.request_fencing(snapshot, node, REASON_UNKNOWN_STATE, false);
            }

            if conn.current_node().is_some() && state == RemoteConnectionState::Stopped {
                // Going down for good: check the services really stopped
                // before the connection closes.
                order_action_then_stop(
                    snapshot,
                    out,
                    action,
                    remote_rsc,
                    OrderingFlags::RUNNABLE_LEFT,
                );
            } else {
                order_start_then_action(
                    snapshot,
                    out,
                    remote_rsc,
                    action,
                    OrderingFlags::OPTIONAL,
                );
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
