use crate::error::SchedError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Stopped,
    Started,
    Unpromoted,
    Promoted,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Stopped => "stopped",
            Role::Started => "started",
            Role::Unpromoted => "unpromoted",
            Role::Promoted => "promoted",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Stopped
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = SchedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stopped" => Ok(Role::Stopped),
            "started" => Ok(Role::Started),
            "unpromoted" | "slave" => Ok(Role::Unpromoted),
            "promoted" | "master" => Ok(Role::Promoted),
            _ => Err(SchedError::InvalidRole(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// NodeKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Full cluster member running the whole stack.
    Cluster,
    /// Joined through a connection resource running on a cluster node.
    Remote,
    /// Joined through a connection resource whose endpoint lives inside a
    /// container resource.
    Guest,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Cluster => "cluster",
            NodeKind::Remote => "remote",
            NodeKind::Guest => "guest",
        }
    }

    pub fn is_remote_or_guest(self) -> bool {
        matches!(self, NodeKind::Remote | NodeKind::Guest)
    }
}

impl Default for NodeKind {
    fn default() -> Self {
        NodeKind::Cluster
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TaskKind
// ---------------------------------------------------------------------------

/// What an action does. Parsed once from the action name at snapshot
/// ingestion; nothing downstream compares task strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TaskKind {
    Start,
    Stop,
    Promote,
    Demote,
    Monitor,
    MigrateTo,
    MigrateFrom,
    ClearFailcount,
    Notify,
    Cancel,
    Delete,
    Other(String),
}

impl TaskKind {
    pub fn as_str(&self) -> &str {
        match self {
            TaskKind::Start => "start",
            TaskKind::Stop => "stop",
            TaskKind::Promote => "promote",
            TaskKind::Demote => "demote",
            TaskKind::Monitor => "monitor",
            TaskKind::MigrateTo => "migrate_to",
            TaskKind::MigrateFrom => "migrate_from",
            TaskKind::ClearFailcount => "clear_failcount",
            TaskKind::Notify => "notify",
            TaskKind::Cancel => "cancel",
            TaskKind::Delete => "delete",
            TaskKind::Other(name) => name,
        }
    }

    pub fn is_migration(&self) -> bool {
        matches!(self, TaskKind::MigrateTo | TaskKind::MigrateFrom)
    }

    /// Tasks with no dedicated execution semantics of their own. These map
    /// to the no-op task class when the scheduler reasons about ordering.
    pub fn is_placeholder(&self) -> bool {
        matches!(
            self,
            TaskKind::ClearFailcount | TaskKind::Cancel | TaskKind::Delete | TaskKind::Other(_)
        )
    }

    /// Migration steps imply the same before/after relationship to a remote
    /// connection as a stop does.
    pub fn for_ordering(&self) -> TaskKind {
        if self.is_migration() {
            TaskKind::Stop
        } else {
            self.clone()
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskKind {
    type Err = SchedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(SchedError::InvalidTask("empty task name".to_string()));
        }
        let task = match trimmed.to_ascii_lowercase().as_str() {
            "start" => TaskKind::Start,
            "stop" => TaskKind::Stop,
            "promote" => TaskKind::Promote,
            "demote" => TaskKind::Demote,
            "monitor" => TaskKind::Monitor,
            "migrate_to" => TaskKind::MigrateTo,
            "migrate_from" => TaskKind::MigrateFrom,
            "clear_failcount" => TaskKind::ClearFailcount,
            "notify" => TaskKind::Notify,
            "cancel" => TaskKind::Cancel,
            "delete" => TaskKind::Delete,
            _ => TaskKind::Other(trimmed.to_string()),
        };
        Ok(task)
    }
}

impl TryFrom<String> for TaskKind {
    type Error = SchedError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskKind> for String {
    fn from(task: TaskKind) -> Self {
        task.as_str().to_string()
    }
}

/// Display label for an action: a one-shot monitor is a probe.
pub fn readable_action(task: &TaskKind, interval_ms: u64) -> &str {
    if interval_ms == 0 && *task == TaskKind::Monitor {
        return "probe";
    }
    task.as_str()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_parses_known_names() {
        assert_eq!("start".parse::<TaskKind>().unwrap(), TaskKind::Start);
        assert_eq!("migrate_to".parse::<TaskKind>().unwrap(), TaskKind::MigrateTo);
        assert_eq!(
            "clear_failcount".parse::<TaskKind>().unwrap(),
            TaskKind::ClearFailcount
        );
        assert_eq!("STOP".parse::<TaskKind>().unwrap(), TaskKind::Stop);
    }

    #[test]
    fn task_unknown_name_is_other() {
        let task: TaskKind = "reload-agent".parse().unwrap();
        assert_eq!(task, TaskKind::Other("reload-agent".to_string()));
        assert!(task.is_placeholder());
        assert_eq!(task.as_str(), "reload-agent");
    }

    #[test]
    fn cancel_and_delete_are_placeholders() {
        assert!(TaskKind::Cancel.is_placeholder());
        assert!(TaskKind::Delete.is_placeholder());
        assert!(!TaskKind::Monitor.is_placeholder());
        assert!(!TaskKind::Notify.is_placeholder());
    }

    #[test]
    fn task_empty_name_rejected() {
        assert!(matches!(
            "  ".parse::<TaskKind>(),
            Err(SchedError::InvalidTask(_))
        ));
    }

    #[test]
    fn migration_orders_like_stop() {
        assert_eq!(TaskKind::MigrateTo.for_ordering(), TaskKind::Stop);
        assert_eq!(TaskKind::MigrateFrom.for_ordering(), TaskKind::Stop);
        assert_eq!(TaskKind::Demote.for_ordering(), TaskKind::Demote);
    }

    #[test]
    fn task_serializes_as_plain_string() {
        let json = serde_json::to_string(&TaskKind::MigrateFrom).unwrap();
        assert_eq!(json, "\"migrate_from\"");
        let parsed: TaskKind = serde_json::from_str("\"promote\"").unwrap();
        assert_eq!(parsed, TaskKind::Promote);
    }

    #[test]
    fn role_aliases() {
        assert_eq!("master".parse::<Role>().unwrap(), Role::Promoted);
        assert_eq!("Slave".parse::<Role>().unwrap(), Role::Unpromoted);
        assert!("running".parse::<Role>().is_err());
    }

    #[test]
    fn readable_probe() {
        assert_eq!(readable_action(&TaskKind::Monitor, 0), "probe");
        assert_eq!(readable_action(&TaskKind::Monitor, 10_000), "monitor");
        assert_eq!(readable_action(&TaskKind::Start, 0), "start");
    }
}
