use crate::error::{Result, SchedError};
use crate::snapshot::{Node, NodeId, Resource, ResourceId, Snapshot};
use crate::types::Role;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// RemoteConnectionState (output)
// ---------------------------------------------------------------------------

/// Liveness of a remote or guest node's connection for this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteConnectionState {
    /// Recoverable, but the outcome is not known yet.
    Unknown,
    Alive,
    /// Waiting for the connection to recover elsewhere.
    Resting,
    /// Unrecoverable this cycle; anything depending on it is unsafe.
    Failed,
    /// Cleanly stopped on purpose.
    Stopped,
}

impl RemoteConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            RemoteConnectionState::Unknown => "unknown",
            RemoteConnectionState::Alive => "alive",
            RemoteConnectionState::Resting => "resting",
            RemoteConnectionState::Failed => "failed",
            RemoteConnectionState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for RemoteConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ConnectionContext
// ---------------------------------------------------------------------------

pub struct ConnectionContext<'a> {
    pub connection: &'a Resource,
    pub node: &'a Node,
    /// Cluster node currently running the connection, if any.
    pub host: Option<&'a Node>,
}

// ---------------------------------------------------------------------------
// StateRule
// ---------------------------------------------------------------------------

pub struct StateRule {
    pub id: &'static str,
    pub condition: fn(&ConnectionContext) -> bool,
    pub state: RemoteConnectionState,
}

// ---------------------------------------------------------------------------
// Condition helpers
// ---------------------------------------------------------------------------

fn will_not_run(ctx: &ConnectionContext) -> bool {
    ctx.connection.next_role == Role::Stopped || ctx.connection.allocated_to.is_none()
}

fn host_unclean(ctx: &ConnectionContext) -> bool {
    ctx.host.map(|h| h.unclean).unwrap_or(false)
}

fn host_down(ctx: &ConnectionContext) -> bool {
    ctx.host.map(|h| h.unclean || !h.online).unwrap_or(false)
}

fn awaiting_reconnect(ctx: &ConnectionContext) -> bool {
    ctx.connection.next_role == Role::Stopped
        && ctx.connection.reconnect_interval_ms > 0
        && ctx.node.remote_was_fenced
        && !ctx.node.shutdown_requested
}

fn mid_migration(ctx: &ConnectionContext) -> bool {
    ctx.connection.running_on.len() > 1
        && ctx.connection.partial_migration_source.is_some()
        && ctx.connection.partial_migration_target.is_some()
}

// ---------------------------------------------------------------------------
// State rules (priority-ordered, first match wins)
// ---------------------------------------------------------------------------

pub const STATE_RULES: &[StateRule] = &[
    // The connection is stranded on a node that cannot be trusted and will
    // not be recovered elsewhere this cycle.
    StateRule {
        id: "stranded_on_unclean_host",
        condition: |ctx| will_not_run(ctx) && host_unclean(ctx),
        state: RemoteConnectionState::Failed,
    },
    StateRule {
        id: "cleanly_stopped",
        condition: |ctx| will_not_run(ctx) && !ctx.connection.failed,
        state: RemoteConnectionState::Stopped,
    },
    // Failed, but a reconnect attempt is still due before we can tell.
    StateRule {
        id: "awaiting_reconnect",
        condition: |ctx| will_not_run(ctx) && awaiting_reconnect(ctx),
        state: RemoteConnectionState::Unknown,
    },
    StateRule {
        id: "unrecoverable",
        condition: will_not_run,
        state: RemoteConnectionState::Failed,
    },
    StateRule {
        id: "not_yet_placed",
        condition: |ctx| ctx.host.is_none(),
        state: RemoteConnectionState::Unknown,
    },
    StateRule {
        id: "host_down",
        condition: host_down,
        state: RemoteConnectionState::Resting,
    },
    StateRule {
        id: "connection_migrating",
        condition: mid_migration,
        state: RemoteConnectionState::Resting,
    },
];

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classify `connection` as seen from `node`.
///
/// `node` must be a remote or guest node and `connection` must be its
/// connection resource; anything else is a contract violation.
pub fn classify(
    snapshot: &Snapshot,
    connection: ResourceId,
    node: NodeId,
) -> Result<RemoteConnectionState> {
    let n = snapshot.node(node);
    if !n.is_remote_or_guest() {
        return Err(SchedError::contract(
            "classify",
            format!("node '{}' is a {} node", n.name, n.kind),
        ));
    }
    if n.connection != Some(connection) {
        return Err(SchedError::contract(
            "classify",
            format!(
                "'{}' is not the connection resource of node '{}'",
                snapshot.resource(connection).name,
                n.name
            ),
        ));
    }

    let conn = snapshot.resource(connection);
    let ctx = ConnectionContext {
        connection: conn,
        node: n,
        host: conn.current_node().map(|h| snapshot.node(h)),
    };
    Ok(classify_context(&ctx))
}

/// Classify the connection backing `node`.
pub fn node_state(snapshot: &Snapshot, node: NodeId) -> Result<RemoteConnectionState> {
    let n = snapshot.node(node);
    let connection = n.connection.ok_or_else(|| {
        SchedError::contract(
            "node_state",
            format!("node '{}' has no connection resource", n.name),
        )
    })?;
    classify(snapshot, connection, node)
}

pub fn classify_context(ctx: &ConnectionContext) -> RemoteConnectionState {
    for rule in STATE_RULES {
        if (rule.condition)(ctx) {
            tracing::trace!(
                connection = %ctx.connection.name,
                node = %ctx.node.name,
                rule = rule.id,
                "connection is {}",
                rule.state
            );
            return rule.state;
        }
    }
    RemoteConnectionState::Alive
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
