use crate::classifier::{classify, RemoteConnectionState};
use crate::snapshot::{NodeId, ResourceId, Snapshot};

/// True if `node` is a remote node whose connection is classified as
/// failed. Nodes whose connection runs inside a container are guests
/// whatever their declared kind, and never count.
pub fn is_failed_remote_node(snapshot: &Snapshot, node: NodeId) -> bool {
    let n = snapshot.node(node);
    let Some(conn) = n.connection else {
        return false;
    };
    if !n.is_remote_or_guest() || snapshot.resource(conn).container.is_some() {
        return false;
    }
    matches!(
        classify(snapshot, conn, node),
        Ok(RemoteConnectionState::Failed)
    )
}

/// True if `rsc` hosts other resources and is the container of the
/// connection backing guest node `node`.
pub fn rsc_corresponds_to_guest(snapshot: &Snapshot, rsc: ResourceId, node: NodeId) -> bool {
    snapshot.resource(rsc).has_fillers()
        && snapshot
            .node(node)
            .connection
            .and_then(|conn| snapshot.resource(conn).container)
            == Some(rsc)
}
