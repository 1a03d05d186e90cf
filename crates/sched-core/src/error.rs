use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedError {
    /// The caller handed the core a state that upstream snapshot
    /// construction guarantees cannot happen. Aborts the pass.
    #[error("contract violation in {context}: {detail}")]
    Contract {
        context: &'static str,
        detail: String,
    },

    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("unknown resource: {0}")]
    UnknownResource(String),

    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("invalid role '{0}': expected stopped, started, unpromoted or promoted")]
    InvalidRole(String),

    #[error("invalid task: {0}")]
    InvalidTask(String),

    #[error("invalid option value for '{name}': {reason}")]
    InvalidOption { name: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SchedError {
    pub(crate) fn contract(context: &'static str, detail: impl Into<String>) -> Self {
        SchedError::Contract {
            context,
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedError>;
