use crate::snapshot::{op_key, ActionId, ResourceId, Snapshot};
use crate::types::TaskKind;
use serde::Serialize;
use std::fmt;

// ---------------------------------------------------------------------------
// OrderingFlags
// ---------------------------------------------------------------------------

/// Modifiers carried by an ordering edge. An edge with none set is an
/// optional (advisory) ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct OrderingFlags {
    /// System generated: exempt from the prohibition on user orderings that
    /// involve a connection resource.
    pub preserve: bool,
    /// `then` is runnable only if `first` is runnable.
    pub runnable_left: bool,
    /// If `first` is required, `then` becomes required too.
    pub implies_then: bool,
    /// If `then` is required, `first` becomes required too.
    pub implies_first: bool,
}

impl OrderingFlags {
    pub const OPTIONAL: OrderingFlags = OrderingFlags {
        preserve: false,
        runnable_left: false,
        implies_then: false,
        implies_first: false,
    };

    pub const PRESERVE: OrderingFlags = OrderingFlags {
        preserve: true,
        ..Self::OPTIONAL
    };

    pub const RUNNABLE_LEFT: OrderingFlags = OrderingFlags {
        runnable_left: true,
        ..Self::OPTIONAL
    };

    pub const IMPLIES_THEN: OrderingFlags = OrderingFlags {
        implies_then: true,
        ..Self::OPTIONAL
    };

    pub const IMPLIES_FIRST: OrderingFlags = OrderingFlags {
        implies_first: true,
        ..Self::OPTIONAL
    };

    /// Every modifier set in either operand.
    pub const fn with(self, other: OrderingFlags) -> OrderingFlags {
        OrderingFlags {
            preserve: self.preserve || other.preserve,
            runnable_left: self.runnable_left || other.runnable_left,
            implies_then: self.implies_then || other.implies_then,
            implies_first: self.implies_first || other.implies_first,
        }
    }

    pub fn is_optional(&self) -> bool {
        *self == Self::OPTIONAL
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.preserve {
            names.push("preserve");
        }
        if self.runnable_left {
            names.push("runnable_left");
        }
        if self.implies_then {
            names.push("implies_then");
        }
        if self.implies_first {
            names.push("implies_first");
        }
        if names.is_empty() {
            names.push("optional");
        }
        names
    }
}

impl fmt::Display for OrderingFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join("|"))
    }
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// One side of an ordering edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Whatever action of `rsc` matches the operation key, resolved later by
    /// the transition graph builder.
    Op {
        rsc: ResourceId,
        task: TaskKind,
        interval_ms: u64,
    },
    /// A concrete action from the snapshot.
    Action {
        rsc: Option<ResourceId>,
        action: ActionId,
    },
}

impl Endpoint {
    pub fn start_of(rsc: ResourceId) -> Self {
        Endpoint::Op {
            rsc,
            task: TaskKind::Start,
            interval_ms: 0,
        }
    }

    pub fn stop_of(rsc: ResourceId) -> Self {
        Endpoint::Op {
            rsc,
            task: TaskKind::Stop,
            interval_ms: 0,
        }
    }

    pub fn action(snapshot: &Snapshot, action: ActionId) -> Self {
        Endpoint::Action {
            rsc: snapshot.action(action).rsc,
            action,
        }
    }

    pub fn resource(&self) -> Option<ResourceId> {
        match self {
            Endpoint::Op { rsc, .. } => Some(*rsc),
            Endpoint::Action { rsc, .. } => *rsc,
        }
    }

    /// Operation key or action uuid, as the graph builder would name it.
    pub fn label(&self, snapshot: &Snapshot) -> String {
        match self {
            Endpoint::Op {
                rsc,
                task,
                interval_ms,
            } => op_key(&snapshot.resource(*rsc).name, task, *interval_ms),
            Endpoint::Action { action, .. } => snapshot.action(*action).uuid.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// OrderingConstraint
// ---------------------------------------------------------------------------

/// `first` must happen before `then`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderingConstraint {
    pub first: Endpoint,
    pub then: Endpoint,
    pub flags: OrderingFlags,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
