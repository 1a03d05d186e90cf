//! Output of one ordering pass.
//!
//! `Transition` collects ordering constraints and fencing requests in
//! insertion order. Nothing is ever removed or rewritten once appended, so
//! replaying a pass over the same snapshot yields an identical transition.

use crate::fencing::FencingRequest;
use crate::ordering::{Endpoint, OrderingConstraint, OrderingFlags};
use crate::snapshot::Snapshot;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transition {
    pub orderings: Vec<OrderingConstraint>,
    pub fencing: Vec<FencingRequest>,
}

impl Transition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_ordering(&mut self, first: Endpoint, then: Endpoint, flags: OrderingFlags) {
        self.orderings.push(OrderingConstraint { first, then, flags });
    }

    pub fn is_empty(&self) -> bool {
        self.orderings.is_empty() && self.fencing.is_empty()
    }

    /// Resolve ids to names for display and serialization.
    pub fn report(&self, snapshot: &Snapshot) -> TransitionReport {
        TransitionReport {
            orderings: self
                .orderings
                .iter()
                .map(|o| OrderingView {
                    first: o.first.label(snapshot),
                    then: o.then.label(snapshot),
                    flags: o.flags.names(),
                })
                .collect(),
            fencing: self
                .fencing
                .iter()
                .map(|f| FencingView {
                    node: snapshot.node(f.node).name.clone(),
                    reason: f.reason.clone(),
                    immediate: f.immediate,
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Report (serializable view)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionReport {
    pub orderings: Vec<OrderingView>,
    pub fencing: Vec<FencingView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderingView {
    pub first: String,
    pub then: String,
    pub flags: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FencingView {
    pub node: String,
    pub reason: String,
    pub immediate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Node, Resource, SnapshotBuilder};

    #[test]
    fn report_resolves_names_in_order() {
        let mut b = SnapshotBuilder::new();
        let n1 = b.node(Node::cluster("node1"));
        let conn = b.resource(Resource::new("remote1").placed_on(n1));
        let r1 = b.node(Node::remote("remote1", conn));
        let snap = b.build();

        let mut t = Transition::new();
        t.new_ordering(
            Endpoint::start_of(conn),
            Endpoint::stop_of(conn),
            OrderingFlags::PRESERVE,
        );
        t.request_fencing(&snap, r1, "testing", true);

        let report = t.report(&snap);
        assert_eq!(report.orderings[0].first, "remote1_start_0");
        assert_eq!(report.orderings[0].then, "remote1_stop_0");
        assert_eq!(report.orderings[0].flags, vec!["preserve"]);
        assert_eq!(report.fencing[0].node, "remote1");
        assert!(report.fencing[0].immediate);
    }
}
