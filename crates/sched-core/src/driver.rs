use crate::classifier::classify;
use crate::container::apply_container_ordering;
use crate::error::Result;
use crate::ordering::{Endpoint, OrderingFlags};
use crate::plan::Transition;
use crate::remote::apply_remote_ordering;
use crate::snapshot::Snapshot;
use crate::types::TaskKind;

/// Order every action that runs across a remote or guest connection so it
/// happens while the connection is up (after its start, before its stop).
///
/// Orderings are appended to `out` in action order. The first contract
/// violation aborts the pass.
pub fn order_remote_connection_actions(snapshot: &Snapshot, out: &mut Transition) -> Result<()> {
    if !snapshot.have_remote_nodes() {
        return Ok(());
    }

    tracing::debug!("Creating remote connection orderings");
    let (orderings_before, fencing_before) = (out.orderings.len(), out.fencing.len());

    for (id, action) in snapshot.actions() {
        let Some(rsc_id) = action.rsc else {
            continue;
        };
        let rsc = snapshot.resource(rsc_id);

        // Clearing the failcount of a connection resource goes before any
        // start of that connection.
        if rsc.is_remote_connection && action.task == TaskKind::ClearFailcount {
            out.new_ordering(
                Endpoint::action(snapshot, id),
                Endpoint::start_of(rsc_id),
                OrderingFlags::OPTIONAL,
            );
            continue;
        }

        let Some(node_id) = action.node else {
            continue;
        };
        let node = snapshot.node(node_id);
        if !node.is_remote_or_guest() {
            continue;
        }

        // Pseudo actions may still turn real (or real ones pseudo) once
        // orderings are applied, but this pass only looks at real ones.
        if action.pseudo {
            tracing::trace!("Skipping pseudo action {}", action.uuid);
            continue;
        }

        let Some(remote) = node.connection else {
            tracing::trace!("Skipping {} on orphaned node {}", action.uuid, node.name);
            continue;
        };

        // Moving onto a remote node: keep the resource on its original node
        // until the connection has started.
        if action.task == TaskKind::Start {
            for &other in &rsc.actions {
                let o = snapshot.action(other);
                if o.task == TaskKind::Stop && o.node.is_some() && o.node != Some(node_id) {
                    out.new_ordering(
                        Endpoint::start_of(remote),
                        Endpoint::action(snapshot, other),
                        OrderingFlags::OPTIONAL,
                    );
                }
            }
        }

        if snapshot.resource(remote).container.is_some() {
            tracing::trace!("Container ordering for {}", action.uuid);
            apply_container_ordering(snapshot, out, id)?;
        } else {
            tracing::trace!("Remote ordering for {}", action.uuid);
            let state = classify(snapshot, remote, node_id)?;
            apply_remote_ordering(snapshot, out, id, state)?;
        }
    }

    tracing::debug!(
        orderings = out.orderings.len() - orderings_before,
        fencing = out.fencing.len() - fencing_before,
        "remote connection orderings created"
    );
    Ok(())
}

/// Run the remote connection pass into a fresh transition.
pub fn plan(snapshot: &Snapshot) -> Result<Transition> {
    let mut out = Transition::new();
    order_remote_connection_actions(snapshot, &mut out)?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchedError;
    use crate::fencing::{REASON_CONNECTION_UNRECOVERABLE, REASON_CONTAINER_FAILED};
    use crate::ordering::OrderingConstraint;
    use crate::snapshot::{Action, Node, NodeId, Resource, ResourceId, SnapshotBuilder};
    use crate::types::Role;

    struct Cluster {
        b: SnapshotBuilder,
        node1: NodeId,
        node2: NodeId,
        conn: ResourceId,
        remote: NodeId,
    }

    fn cluster() -> Cluster {
        let mut b = SnapshotBuilder::new();
        let node1 = b.node(Node::cluster("node1"));
        let node2 = b.node(Node::cluster("node2"));
        let conn = b.resource(Resource::new("remote1").placed_on(node1));
        let remote = b.node(Node::remote("remote1", conn));
        Cluster {
            b,
            node1,
            node2,
            conn,
            remote,
        }
    }

    #[test]
    fn no_remote_nodes_is_noop() {
        let mut b = SnapshotBuilder::new();
        let n1 = b.node(Node::cluster("node1"));
        let web = b.resource(Resource::new("web").placed_on(n1));
        b.action(Action::new(TaskKind::Start).of(web).on(n1));
        let snap = b.build();
        assert!(plan(&snap).unwrap().is_empty());
    }

    #[test]
    fn cluster_node_actions_are_skipped() {
        let mut c = cluster();
        let web = c.b.resource(Resource::new("web").placed_on(c.node1));
        c.b.action(Action::new(TaskKind::Start).of(web).on(c.node1));
        c.b.action(Action::new(TaskKind::Monitor).of(web));
        c.b.action(Action::new(TaskKind::Other("do_shutdown".into())).on(c.remote));
        let snap = c.b.build();
        assert!(plan(&snap).unwrap().is_empty());
    }

    #[test]
    fn clear_failcount_precedes_connection_start() {
        let mut c = cluster();
        let clear = c
            .b
            .action(Action::new(TaskKind::ClearFailcount).of(c.conn).on(c.node1));
        let snap = c.b.build();
        let t = plan(&snap).unwrap();
        assert_eq!(
            t.orderings,
            vec![OrderingConstraint {
                first: Endpoint::action(&snap, clear),
                then: Endpoint::start_of(c.conn),
                flags: OrderingFlags::OPTIONAL,
            }]
        );
    }

    #[test]
    fn clear_failcount_of_ordinary_resource_is_ordered_normally() {
        let mut c = cluster();
        let web = c.b.resource(Resource::new("web").placed_on(c.remote));
        c.b.action(Action::new(TaskKind::ClearFailcount).of(web).on(c.remote));
        let snap = c.b.build();
        let t = plan(&snap).unwrap();
        assert_eq!(t.orderings.len(), 1);
        assert_eq!(t.orderings[0].first, Endpoint::start_of(c.conn));
    }

    #[test]
    fn pseudo_actions_are_excluded() {
        let mut c = cluster();
        let web = c.b.resource(Resource::new("web").placed_on(c.remote));
        c.b.action(Action::new(TaskKind::Stop).of(web).on(c.remote).pseudo());
        let snap = c.b.build();
        assert!(plan(&snap).unwrap().is_empty());
    }

    #[test]
    fn orphaned_remote_node_is_skipped() {
        let mut c = cluster();
        let mut orphan = Node::cluster("orphan");
        orphan.kind = crate::types::NodeKind::Remote;
        let orphan = c.b.node(orphan);
        let web = c.b.resource(Resource::new("web").placed_on(orphan));
        c.b.action(Action::new(TaskKind::Stop).of(web).on(orphan));
        let snap = c.b.build();
        assert!(plan(&snap).unwrap().is_empty());
    }

    #[test]
    fn start_on_failed_connection_implies_then() {
        let mut c = cluster();
        c.b.node_mut(c.node1).unclean = true;
        c.b.resource_mut(c.conn).next_role = Role::Stopped;
        let web = c.b.resource(Resource::new("web"));
        c.b.action(Action::new(TaskKind::Start).of(web).on(c.remote));
        let snap = c.b.build();
        let t = plan(&snap).unwrap();
        assert_eq!(t.orderings.len(), 1);
        assert!(t.orderings[0].flags.implies_then);
    }

    #[test]
    fn stop_on_failed_connection_fences_once() {
        let mut c = cluster();
        let conn = c.b.resource_mut(c.conn);
        conn.next_role = Role::Stopped;
        conn.failed = true;
        let web = c.b.resource(Resource::new("web").placed_on(c.remote));
        c.b.action(Action::new(TaskKind::Stop).of(web).on(c.remote));
        let snap = c.b.build();
        let t = plan(&snap).unwrap();
        assert!(t.orderings.is_empty());
        assert_eq!(t.fencing.len(), 1);
        assert_eq!(t.fencing[0].node, c.remote);
        assert_eq!(t.fencing[0].reason, REASON_CONNECTION_UNRECOVERABLE);
    }

    #[test]
    fn stop_with_reconnect_pending_or_clean_stop_precedes_connection_stop() {
        // Unknown (failed, reconnect pending) and Stopped (clean) connections
        // that are not coming back both order the stop first.
        for failed in [true, false] {
            let mut c = cluster();
            let conn = c.b.resource_mut(c.conn);
            conn.next_role = Role::Stopped;
            conn.failed = failed;
            conn.reconnect_interval_ms = 30_000;
            c.b.node_mut(c.remote).remote_was_fenced = true;
            let web = c.b.resource(Resource::new("web").placed_on(c.remote));
            let stop = c.b.action(Action::new(TaskKind::Stop).of(web).on(c.remote));
            let snap = c.b.build();

            let expected_state = if failed {
                crate::classifier::RemoteConnectionState::Unknown
            } else {
                crate::classifier::RemoteConnectionState::Stopped
            };
            assert_eq!(classify(&snap, c.conn, c.remote).unwrap(), expected_state);

            let t = plan(&snap).unwrap();
            assert_eq!(
                t.orderings,
                vec![OrderingConstraint {
                    first: Endpoint::action(&snap, stop),
                    then: Endpoint::stop_of(c.conn),
                    flags: OrderingFlags::PRESERVE.with(OrderingFlags::IMPLIES_FIRST),
                }]
            );
            assert!(t.fencing.is_empty());
        }
    }

    #[test]
    fn move_to_remote_node_keeps_original_until_connection_starts() {
        let mut c = cluster();
        let a = c.b.resource(Resource::new("A").placed_on(c.node1));
        let stop = c.b.action(Action::new(TaskKind::Stop).of(a).on(c.node1));
        let start = c.b.action(Action::new(TaskKind::Start).of(a).on(c.remote));
        let snap = c.b.build();
        let t = plan(&snap).unwrap();

        let safeguard = OrderingConstraint {
            first: Endpoint::start_of(c.conn),
            then: Endpoint::action(&snap, stop),
            flags: OrderingFlags::OPTIONAL,
        };
        assert_eq!(t.orderings[0], safeguard);
        // Followed by the regular start ordering.
        assert_eq!(t.orderings[1].then, Endpoint::action(&snap, start));
        assert_eq!(t.orderings.len(), 2);
    }

    #[test]
    fn safeguard_covers_every_cross_node_stop() {
        let mut c = cluster();
        let a = c.b.resource(Resource::new("A"));
        c.b.resource_mut(a).running_on = vec![c.node1, c.node2];
        c.b.action(Action::new(TaskKind::Stop).of(a).on(c.node1));
        c.b.action(Action::new(TaskKind::Stop).of(a).on(c.node2));
        c.b.action(Action::new(TaskKind::Stop).of(a));
        c.b.action(Action::new(TaskKind::Start).of(a).on(c.remote));
        let snap = c.b.build();
        let t = plan(&snap).unwrap();
        let optional = t
            .orderings
            .iter()
            .filter(|o| o.flags.is_optional() && o.first == Endpoint::start_of(c.conn))
            .count();
        assert_eq!(optional, 2);
    }

    #[test]
    fn migrate_to_remote_node_gets_no_safeguard() {
        let mut c = cluster();
        let a = c.b.resource(Resource::new("A").placed_on(c.node1));
        c.b.action(Action::new(TaskKind::Stop).of(a).on(c.node1));
        c.b.action(Action::new(TaskKind::MigrateFrom).of(a).on(c.remote));
        let snap = c.b.build();
        let t = plan(&snap).unwrap();
        assert!(t.orderings.iter().all(|o| !o.flags.is_optional()));
    }

    #[test]
    fn guest_node_uses_container_ordering() {
        let mut c = cluster();
        let vm = c.b.resource(Resource::new("vm1").placed_on(c.node2));
        c.b.resource_mut(vm).failed = true;
        let mut gconn = Resource::new("guest1").placed_on(c.node2);
        gconn.container = Some(vm);
        let gconn = c.b.resource(gconn);
        let guest = c.b.node(Node::guest("guest1", gconn));
        let app = c.b.resource(Resource::new("app").placed_on(guest));
        c.b.action(Action::new(TaskKind::Stop).of(app).on(guest));
        let snap = c.b.build();

        let t = plan(&snap).unwrap();
        assert!(t.orderings.is_empty());
        assert_eq!(t.fencing.len(), 1);
        assert_eq!(t.fencing[0].node, guest);
        assert_eq!(t.fencing[0].reason, REASON_CONTAINER_FAILED);
    }

    #[test]
    fn guest_kind_without_container_uses_remote_ordering() {
        let mut c = cluster();
        c.b.node_mut(c.remote).kind = crate::types::NodeKind::Guest;
        let web = c.b.resource(Resource::new("web").placed_on(c.remote));
        c.b.action(Action::new(TaskKind::Stop).of(web).on(c.remote));
        let snap = c.b.build();
        let t = plan(&snap).unwrap();
        assert_eq!(
            t.orderings[0].flags,
            OrderingFlags::PRESERVE.with(OrderingFlags::IMPLIES_FIRST)
        );
    }

    #[test]
    fn replay_is_identical() {
        let mut c = cluster();
        let web = c.b.resource(Resource::new("web").placed_on(c.remote));
        let db = c.b.resource(Resource::new("db").placed_on(c.node1));
        c.b.action(Action::new(TaskKind::Stop).of(web).on(c.remote));
        c.b.action(Action::new(TaskKind::Monitor).of(web).on(c.remote).every(10_000));
        c.b.action(Action::new(TaskKind::Stop).of(db).on(c.node1));
        c.b.action(Action::new(TaskKind::Start).of(db).on(c.remote));
        c.b.action(Action::new(TaskKind::ClearFailcount).of(c.conn).on(c.node1));
        let snap = c.b.build();

        let first = plan(&snap).unwrap();
        let second = plan(&snap).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.orderings.len(), 5);
    }

    #[test]
    fn pass_appends_to_existing_transition() {
        let mut c = cluster();
        let web = c.b.resource(Resource::new("web").placed_on(c.remote));
        c.b.action(Action::new(TaskKind::Stop).of(web).on(c.remote));
        let snap = c.b.build();

        let mut t = Transition::new();
        order_remote_connection_actions(&snap, &mut t).unwrap();
        order_remote_connection_actions(&snap, &mut t).unwrap();
        assert_eq!(t.orderings.len(), 2);
        assert_eq!(t.orderings[0], t.orderings[1]);
    }

    #[test]
    fn task_names_parse_case_insensitively() {
        let mut c = cluster();
        let web = c.b.resource(Resource::new("web").placed_on(c.remote));
        let task: TaskKind = "Start".parse().unwrap();
        c.b.action(Action::new(task).of(web).on(c.remote));
        let snap = c.b.build();
        let t = plan(&snap).unwrap();
        assert_eq!(t.orderings.len(), 1);
        assert!(t.orderings[0].flags.runnable_left);
    }

    #[test]
    fn container_ordering_on_cluster_node_is_contract_violation() {
        // Container ordering reached directly for an action on a cluster node.
        let mut c = cluster();
        let web = c.b.resource(Resource::new("web").placed_on(c.remote));
        let id = c.b.action(Action::new(TaskKind::Start).of(web).on(c.node1));
        let snap = c.b.build();
        let mut out = Transition::new();
        let err = apply_container_ordering(&snap, &mut out, id).unwrap_err();
        assert!(matches!(err, SchedError::Contract { .. }));
    }
}
