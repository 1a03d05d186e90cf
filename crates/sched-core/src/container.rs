//! Orderings for actions on guest nodes, whose connection runs inside a
//! container resource. Virtual machines count as containers here too.

use crate::error::{Result, SchedError};
use crate::fencing::REASON_CONTAINER_FAILED;
use crate::ordering::OrderingFlags;
use crate::plan::Transition;
use crate::remote::{connection_of, order_action_then_stop, order_start_then_action};
use crate::snapshot::{ActionId, Snapshot};
use crate::types::{readable_action, TaskKind};

/// Order `action`, which runs on a guest node, relative to the guest's
/// connection and the container hosting it.
pub fn apply_container_ordering(
    snapshot: &Snapshot,
    out: &mut Transition,
    action: ActionId,
) -> Result<()> {
    let a = snapshot.action(action);
    if a.rsc.is_none() {
        return Err(SchedError::contract(
            "container ordering",
            format!("action '{}' has no resource", a.uuid),
        ));
    }
    let (node, remote_rsc) = connection_of(snapshot, action, "container ordering")?;
    let conn = snapshot.resource(remote_rsc);
    let container_id = conn.container.ok_or_else(|| {
        SchedError::contract(
            "container ordering",
            format!("connection '{}' has no container", conn.name),
        )
    })?;
    let container = snapshot.resource(container_id);

    if container.failed {
        out.request_fencing(snapshot, node, REASON_CONTAINER_FAILED, false);
    }

    tracing::trace!(
        "Order {} action {} relative to {}{} for {}{}",
        readable_action(&a.task, a.interval_ms),
        a.uuid,
        if conn.failed { "failed " } else { "" },
        conn.name,
        if container.failed { "failed " } else { "" },
        container.name
    );

    match a.task.for_ordering() {
        TaskKind::Start | TaskKind::Promote => {
            // Recovering the container forces recovery of what runs inside it
            order_start_then_action(
                snapshot,
                out,
                container_id,
                action,
                OrderingFlags::IMPLIES_THEN,
            );
            order_start_then_action(snapshot, out, remote_rsc, action, OrderingFlags::OPTIONAL);
        }

        TaskKind::Stop | TaskKind::Demote => {
            // With a failed container these are implied by the container
            // stopping, the same way fencing implies them elsewhere.
            if !container.failed {
                order_action_then_stop(snapshot, out, action, remote_rsc, OrderingFlags::OPTIONAL);
            }
        }

        task => {
            if a.is_recurring() {
                if !task.is_placeholder() {
                    order_start_then_action(
                        snapshot,
                        out,
                        remote_rsc,
                        action,
                        OrderingFlags::IMPLIES_THEN,
                    );
                }
            } else {
                order_start_then_action(snapshot, out, remote_rsc, action, OrderingFlags::OPTIONAL);
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
