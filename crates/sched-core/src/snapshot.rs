//! Read-only cluster snapshot for one planning cycle.
//!
//! Nodes, resources and actions live in flat arenas and refer to each other
//! through typed indices (`NodeId`, `ResourceId`, `ActionId`). The derived
//! relationships (a resource's owned actions, a container's fillers, the
//! connection back-reference) are computed once by `SnapshotBuilder::build`
//! and never change afterwards.
//!
//! Snapshots come either from a `SnapshotDocument` (YAML or JSON with string
//! cross-references) or directly from a `SnapshotBuilder`.

use crate::error::{Result, SchedError};
use crate::types::{NodeKind, Role, TaskKind};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResourceId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ActionId(pub usize);

/// Operation key in the `<resource>_<task>_<interval_ms>` form.
pub fn op_key(rsc: &str, task: &TaskKind, interval_ms: u64) -> String {
    format!("{rsc}_{task}_{interval_ms}")
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub online: bool,
    pub unclean: bool,
    pub shutdown_requested: bool,
    /// The node was fenced earlier and has not rejoined since.
    pub remote_was_fenced: bool,
    /// Connection resource backing a remote or guest node.
    pub connection: Option<ResourceId>,
}

impl Node {
    fn with_kind(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            online: true,
            unclean: false,
            shutdown_requested: false,
            remote_was_fenced: false,
            connection: None,
        }
    }

    pub fn cluster(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::Cluster)
    }

    pub fn remote(name: impl Into<String>, connection: ResourceId) -> Self {
        Self {
            connection: Some(connection),
            ..Self::with_kind(name, NodeKind::Remote)
        }
    }

    pub fn guest(name: impl Into<String>, connection: ResourceId) -> Self {
        Self {
            connection: Some(connection),
            ..Self::with_kind(name, NodeKind::Guest)
        }
    }

    pub fn is_remote_or_guest(&self) -> bool {
        self.kind.is_remote_or_guest()
    }
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub name: String,
    pub role: Role,
    pub next_role: Role,
    pub allocated_to: Option<NodeId>,
    /// Nodes the resource is active on right now. The first entry is the
    /// node treated as its current location.
    pub running_on: Vec<NodeId>,
    pub failed: bool,
    /// Reconnect interval for connection resources, 0 when unset.
    pub reconnect_interval_ms: u64,
    pub container: Option<ResourceId>,
    pub partial_migration_source: Option<NodeId>,
    pub partial_migration_target: Option<NodeId>,

    // Derived by SnapshotBuilder::build.
    pub fillers: Vec<ResourceId>,
    pub actions: Vec<ActionId>,
    pub is_remote_connection: bool,
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: Role::Started,
            next_role: Role::Started,
            allocated_to: None,
            running_on: Vec::new(),
            failed: false,
            reconnect_interval_ms: 0,
            container: None,
            partial_migration_source: None,
            partial_migration_target: None,
            fillers: Vec::new(),
            actions: Vec::new(),
            is_remote_connection: false,
        }
    }

    /// Active on `node` and staying there this cycle.
    pub fn placed_on(mut self, node: NodeId) -> Self {
        self.running_on = vec![node];
        self.allocated_to = Some(node);
        self
    }

    pub fn current_node(&self) -> Option<NodeId> {
        self.running_on.first().copied()
    }

    pub fn has_fillers(&self) -> bool {
        !self.fillers.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    /// Unique action key. Defaults to the operation key when left empty.
    pub uuid: String,
    pub rsc: Option<ResourceId>,
    pub task: TaskKind,
    pub node: Option<NodeId>,
    pub interval_ms: u64,
    pub pseudo: bool,
}

impl Action {
    pub fn new(task: TaskKind) -> Self {
        Self {
            uuid: String::new(),
            rsc: None,
            task,
            node: None,
            interval_ms: 0,
            pseudo: false,
        }
    }

    pub fn of(mut self, rsc: ResourceId) -> Self {
        self.rsc = Some(rsc);
        self
    }

    pub fn on(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }

    pub fn every(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    pub fn pseudo(mut self) -> Self {
        self.pseudo = true;
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.interval_ms > 0
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    nodes: Vec<Node>,
    resources: Vec<Resource>,
    actions: Vec<Action>,
    have_remote_nodes: bool,
}

impl Snapshot {
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn resource(&self, id: ResourceId) -> &Resource {
        &self.resources[id.0]
    }

    pub fn action(&self, id: ActionId) -> &Action {
        &self.actions[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn resources(&self) -> impl Iterator<Item = (ResourceId, &Resource)> {
        self.resources
            .iter()
            .enumerate()
            .map(|(i, r)| (ResourceId(i), r))
    }

    pub fn actions(&self) -> impl Iterator<Item = (ActionId, &Action)> {
        self.actions.iter().enumerate().map(|(i, a)| (ActionId(i), a))
    }

    pub fn have_remote_nodes(&self) -> bool {
        self.have_remote_nodes
    }

    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.nodes().find(|(_, n)| n.name == name).map(|(id, _)| id)
    }

    pub fn find_resource(&self, name: &str) -> Option<ResourceId> {
        self.resources()
            .find(|(_, r)| r.name == name)
            .map(|(id, _)| id)
    }

    /// Load a snapshot document. `.json` files are parsed as JSON, anything
    /// else as YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let doc: SnapshotDocument = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&data)?,
            _ => serde_yaml::from_str(&data)?,
        };
        Self::from_document(&doc)
    }

    pub fn from_document(doc: &SnapshotDocument) -> Result<Self> {
        let mut builder = SnapshotBuilder::new();
        let mut node_ids: HashMap<&str, NodeId> = HashMap::new();
        let mut rsc_ids: HashMap<&str, ResourceId> = HashMap::new();

        // Resources first so nodes can point at their connection.
        for entry in &doc.resources {
            let role: Role = entry.role.parse()?;
            let next_role = match &entry.next_role {
                Some(r) => r.parse()?,
                None => role,
            };
            let mut rsc = Resource::new(entry.id.clone());
            rsc.role = role;
            rsc.next_role = next_role;
            rsc.failed = entry.failed;
            rsc.reconnect_interval_ms = entry.reconnect_interval_ms;
            let id = builder.resource(rsc);
            if rsc_ids.insert(entry.id.as_str(), id).is_some() {
                return Err(SchedError::DuplicateId {
                    kind: "resource",
                    id: entry.id.clone(),
                });
            }
        }

        let lookup_rsc = |name: &str| -> Result<ResourceId> {
            rsc_ids
                .get(name)
                .copied()
                .ok_or_else(|| SchedError::UnknownResource(name.to_string()))
        };

        for entry in &doc.nodes {
            let node = Node {
                name: entry.id.clone(),
                kind: entry.kind,
                online: entry.online,
                unclean: entry.unclean,
                shutdown_requested: entry.shutdown_requested,
                remote_was_fenced: entry.remote_was_fenced,
                connection: entry.connection.as_deref().map(lookup_rsc).transpose()?,
            };
            let id = builder.node(node);
            if node_ids.insert(entry.id.as_str(), id).is_some() {
                return Err(SchedError::DuplicateId {
                    kind: "node",
                    id: entry.id.clone(),
                });
            }
        }

        let lookup_node = |name: &str| -> Result<NodeId> {
            node_ids
                .get(name)
                .copied()
                .ok_or_else(|| SchedError::UnknownNode(name.to_string()))
        };

        for entry in &doc.resources {
            let id = lookup_rsc(&entry.id)?;
            let allocated_to = entry.allocated_to.as_deref().map(lookup_node).transpose()?;
            let running_on = entry
                .running_on
                .iter()
                .map(|n| lookup_node(n))
                .collect::<Result<Vec<_>>>()?;
            let container = entry.container.as_deref().map(lookup_rsc).transpose()?;
            let source = entry
                .migration_source
                .as_deref()
                .map(lookup_node)
                .transpose()?;
            let target = entry
                .migration_target
                .as_deref()
                .map(lookup_node)
                .transpose()?;

            let rsc = builder.resource_mut(id);
            rsc.allocated_to = allocated_to;
            rsc.running_on = running_on;
            rsc.container = container;
            rsc.partial_migration_source = source;
            rsc.partial_migration_target = target;
        }

        // Ids default to the op key, which repeats across nodes for one
        // operation, so uniqueness is per node.
        let mut seen_actions: HashSet<(String, Option<NodeId>)> = HashSet::new();
        for entry in &doc.actions {
            let mut action = Action::new(entry.task.clone());
            action.uuid = entry.id.clone().unwrap_or_default();
            action.rsc = entry.resource.as_deref().map(lookup_rsc).transpose()?;
            action.node = entry.node.as_deref().map(lookup_node).transpose()?;
            action.interval_ms = entry.interval_ms;
            action.pseudo = entry.pseudo;
            let id = builder.action(action);
            let uuid = builder.actions[id.0].uuid.clone();
            if !seen_actions.insert((uuid.clone(), builder.actions[id.0].node)) {
                let id = match &entry.node {
                    Some(node) => format!("{uuid} on {node}"),
                    None => uuid,
                };
                return Err(SchedError::DuplicateId { kind: "action", id });
            }
        }

        Ok(builder.build())
    }
}

// ---------------------------------------------------------------------------
// SnapshotBuilder
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    nodes: Vec<Node>,
    resources: Vec<Resource>,
    actions: Vec<Action>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn resource(&mut self, rsc: Resource) -> ResourceId {
        self.resources.push(rsc);
        ResourceId(self.resources.len() - 1)
    }

    /// Add an action. An empty uuid is replaced by the operation key.
    pub fn action(&mut self, mut action: Action) -> ActionId {
        if action.uuid.is_empty() {
            action.uuid = match action.rsc {
                Some(rsc) => op_key(&self.resources[rsc.0].name, &action.task, action.interval_ms),
                None => action.task.to_string(),
            };
        }
        self.actions.push(action);
        ActionId(self.actions.len() - 1)
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn resource_mut(&mut self, id: ResourceId) -> &mut Resource {
        &mut self.resources[id.0]
    }

    pub fn build(mut self) -> Snapshot {
        for rsc in &mut self.resources {
            rsc.fillers.clear();
            rsc.actions.clear();
            rsc.is_remote_connection = false;
        }

        for i in 0..self.resources.len() {
            if let Some(container) = self.resources[i].container {
                self.resources[container.0].fillers.push(ResourceId(i));
            }
        }

        for (i, action) in self.actions.iter().enumerate() {
            if let Some(rsc) = action.rsc {
                self.resources[rsc.0].actions.push(ActionId(i));
            }
        }

        for node in &self.nodes {
            if let Some(conn) = node.connection {
                self.resources[conn.0].is_remote_connection = true;
            }
        }

        let have_remote_nodes = self.nodes.iter().any(Node::is_remote_or_guest);

        Snapshot {
            nodes: self.nodes,
            resources: self.resources,
            actions: self.actions,
            have_remote_nodes,
        }
    }
}

// ---------------------------------------------------------------------------
// SnapshotDocument (ingestion format)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotDocument {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub resources: Vec<ResourceSpec>,
    #[serde(default)]
    pub actions: Vec<ActionSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSpec {
    pub id: String,
    #[serde(default)]
    pub kind: NodeKind,
    #[serde(default = "default_true")]
    pub online: bool,
    #[serde(default)]
    pub unclean: bool,
    #[serde(default)]
    pub shutdown_requested: bool,
    #[serde(default)]
    pub remote_was_fenced: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceSpec {
    pub id: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocated_to: Option<String>,
    #[serde(default)]
    pub running_on: Vec<String>,
    #[serde(default)]
    pub failed: bool,
    #[serde(default)]
    pub reconnect_interval_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migration_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migration_target: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    pub task: TaskKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(default)]
    pub interval_ms: u64,
    #[serde(default)]
    pub pseudo: bool,
}

fn default_true() -> bool {
    true
}

fn default_role() -> String {
    Role::Started.as_str().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
