use crate::error::{Result, SchedError};
use crate::options::find_option;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cluster_options: BTreeMap<String, String>,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            version: default_version(),
            cluster_options: BTreeMap::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    /// Configured value of a known option, falling back to its default.
    /// `None` for options outside the schema.
    pub fn option(&self, name: &str) -> Option<&str> {
        let schema = find_option(name)?;
        Some(
            self.cluster_options
                .get(name)
                .map(String::as_str)
                .unwrap_or(schema.default),
        )
    }

    /// Set a known option after checking the value against its schema.
    pub fn set_option(&mut self, name: &str, value: &str) -> Result<()> {
        let schema = find_option(name).ok_or_else(|| SchedError::InvalidOption {
            name: name.to_string(),
            reason: "unknown option".to_string(),
        })?;
        schema
            .check(value)
            .map_err(|reason| SchedError::InvalidOption {
                name: name.to_string(),
                reason,
            })?;
        self.cluster_options
            .insert(name.to_string(), value.trim().to_string());
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.version != 1 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!("unsupported config version {}", self.version),
            });
        }

        for (name, value) in &self.cluster_options {
            match find_option(name) {
                None => warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("unknown cluster option '{name}'"),
                }),
                Some(schema) => {
                    if let Err(reason) = schema.check(value) {
                        warnings.push(ConfigWarning {
                            level: WarnLevel::Error,
                            message: format!("cluster option '{name}': {reason}"),
                        });
                    }
                }
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
