use crate::plan::Transition;
use crate::snapshot::{NodeId, Snapshot};

pub const REASON_CONNECTION_UNRECOVERABLE: &str =
    "resources are active but connection is unrecoverable";
pub const REASON_UNKNOWN_STATE: &str =
    "resources are in unknown state and connection is unrecoverable";
pub const REASON_CONTAINER_FAILED: &str = "container failed";

/// A queued request to fence `node`. The consumer decides how and when the
/// fencing is carried out and deduplicates repeated requests for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencingRequest {
    pub node: NodeId,
    pub reason: String,
    /// Fence right away instead of waiting for the transition to reach it.
    pub immediate: bool,
}

impl Transition {
    pub fn request_fencing(
        &mut self,
        snapshot: &Snapshot,
        node: NodeId,
        reason: &str,
        immediate: bool,
    ) {
        tracing::warn!(
            node = %snapshot.node(node).name,
            immediate,
            "scheduling fencing: {reason}"
        );
        self.fencing.push(FencingRequest {
            node,
            reason: reason.to_string(),
            immediate,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Node, Resource, SnapshotBuilder};

    #[test]
    fn repeated_requests_are_all_queued() {
        let mut b = SnapshotBuilder::new();
        let conn = b.resource(Resource::new("remote1"));
        let node = b.node(Node::remote("remote1", conn));
        let snap = b.build();

        let mut t = Transition::new();
        t.request_fencing(&snap, node, REASON_CONTAINER_FAILED, false);
        t.request_fencing(&snap, node, REASON_CONTAINER_FAILED, false);

        assert_eq!(t.fencing.len(), 2);
        assert!(t
            .fencing
            .iter()
            .all(|r| r.node == node && r.reason == REASON_CONTAINER_FAILED && !r.immediate));
        assert!(t.orderings.is_empty());
    }
}
