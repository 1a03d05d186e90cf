//! Cluster-wide scheduler options: the schema used to check configured
//! values, and a lister that renders it through an `OptionOutput`.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum OptionKind {
    Boolean,
    Integer,
    /// Plain seconds, or an integer suffixed with ms, s, min or h.
    Duration,
    Enum(&'static [&'static str]),
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClusterOption {
    pub name: &'static str,
    pub kind: OptionKind,
    pub default: &'static str,
    pub short_description: &'static str,
    pub long_description: &'static str,
}

pub const CLUSTER_OPTIONS: &[ClusterOption] = &[
    ClusterOption {
        name: "stonith-enabled",
        kind: OptionKind::Boolean,
        default: "true",
        short_description: "Whether nodes may be fenced as part of recovery",
        long_description: "If false, unresponsive nodes are immediately assumed to be \
                           harmless, and resources that were active on them may be \
                           recovered elsewhere.",
    },
    ClusterOption {
        name: "have-watchdog",
        kind: OptionKind::Boolean,
        default: "false",
        short_description: "Whether watchdog integration is enabled",
        long_description: "Set by the cluster when a hardware watchdog can self-fence \
                           nodes that lose quorum or their connection.",
    },
    ClusterOption {
        name: "stonith-timeout",
        kind: OptionKind::Duration,
        default: "60s",
        short_description: "How long to wait for on, off and reboot fence actions",
        long_description: "",
    },
    ClusterOption {
        name: "cluster-recheck-interval",
        kind: OptionKind::Duration,
        default: "15min",
        short_description: "Polling interval for time-based changes to options and constraints",
        long_description: "The scheduler is also run on every cluster event; this is the \
                           upper bound between runs. A value of 0 disables polling.",
    },
    ClusterOption {
        name: "start-failure-is-fatal",
        kind: OptionKind::Boolean,
        default: "true",
        short_description: "Whether a start failure prevents a resource from starting on that node",
        long_description: "",
    },
    ClusterOption {
        name: "no-quorum-policy",
        kind: OptionKind::Enum(&["stop", "freeze", "ignore", "demote", "suicide"]),
        default: "stop",
        short_description: "What to do when the cluster does not have quorum",
        long_description: "",
    },
    ClusterOption {
        name: "shutdown-lock",
        kind: OptionKind::Boolean,
        default: "false",
        short_description: "Whether to lock resources to a cleanly shut down node",
        long_description: "Locked resources are not recovered elsewhere until the node \
                           rejoins. Does not apply to remote or guest node connections.",
    },
    ClusterOption {
        name: "node-health-strategy",
        kind: OptionKind::Enum(&[
            "none",
            "migrate-on-red",
            "only-green",
            "progressive",
            "custom",
        ]),
        default: "none",
        short_description: "How the cluster reacts to node health attributes",
        long_description: "",
    },
    ClusterOption {
        name: "batch-limit",
        kind: OptionKind::Integer,
        default: "0",
        short_description: "Maximum number of jobs that can be scheduled per node",
        long_description: "0 means the limit is derived from the number of cores.",
    },
    ClusterOption {
        name: "cluster-name",
        kind: OptionKind::String,
        default: "",
        short_description: "An arbitrary name for the cluster",
        long_description: "",
    },
];

pub fn find_option(name: &str) -> Option<&'static ClusterOption> {
    CLUSTER_OPTIONS.iter().find(|o| o.name == name)
}

// ---------------------------------------------------------------------------
// Value checks
// ---------------------------------------------------------------------------

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "y" | "1" => Some(true),
        "false" | "no" | "off" | "n" | "0" => Some(false),
        _ => None,
    }
}

/// Parse a duration into milliseconds.
pub fn parse_duration_ms(value: &str) -> Option<u64> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);
    let n: u64 = digits.parse().ok()?;
    let factor = match unit.trim() {
        "" | "s" | "sec" => 1_000,
        "ms" | "msec" => 1,
        "m" | "min" => 60_000,
        "h" | "hr" => 3_600_000,
        _ => return None,
    };
    n.checked_mul(factor)
}

impl ClusterOption {
    /// Check `value` against this option's kind. The error is a short
    /// reason suitable for a warning message.
    pub fn check(&self, value: &str) -> Result<(), String> {
        match self.kind {
            OptionKind::Boolean => parse_bool(value)
                .map(|_| ())
                .ok_or_else(|| format!("'{value}' is not a boolean")),
            OptionKind::Integer => value
                .trim()
                .parse::<i64>()
                .map(|_| ())
                .map_err(|_| format!("'{value}' is not an integer")),
            OptionKind::Duration => parse_duration_ms(value)
                .map(|_| ())
                .ok_or_else(|| format!("'{value}' is not a duration")),
            OptionKind::Enum(allowed) => {
                if allowed.iter().any(|a| *a == value.trim()) {
                    Ok(())
                } else {
                    Err(format!(
                        "'{value}' is not one of {}",
                        allowed.join(", ")
                    ))
                }
            }
            OptionKind::String => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Sink for an option listing.
pub trait OptionOutput {
    fn begin_list(&mut self, name: &str, short_description: &str, long_description: &str);
    fn option(&mut self, option: &ClusterOption);
    fn end_list(&mut self);
}

pub const LIST_NAME: &str = "cluster-options";
pub const LIST_SHORT_DESCRIPTION: &str = "Cluster-wide scheduler options";
pub const LIST_LONG_DESCRIPTION: &str = "Also known as properties, these are options that \
    affect behavior across the entire cluster, including how the scheduler orders actions \
    on remote and guest nodes and when it asks for nodes to be fenced.";

pub fn list_cluster_options(out: &mut dyn OptionOutput) {
    out.begin_list(LIST_NAME, LIST_SHORT_DESCRIPTION, LIST_LONG_DESCRIPTION);
    for option in CLUSTER_OPTIONS {
        out.option(option);
    }
    out.end_list();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
