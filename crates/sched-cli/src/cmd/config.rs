use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use sched_core::config::{Config, WarnLevel};
use sched_core::options::CLUSTER_OPTIONS;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Check a config file for unknown options and bad values
    Validate {
        /// Path to the YAML config
        #[arg(env = "SCHED_CONFIG")]
        path: PathBuf,
    },

    /// Show the effective value of every cluster option
    Show {
        /// Path to the YAML config
        #[arg(env = "SCHED_CONFIG")]
        path: PathBuf,
    },

    /// Set a cluster option, creating the config file if needed
    Set {
        /// Option name, e.g. stonith-timeout
        name: String,
        /// New value, checked against the option's type
        value: String,
        /// Path to the YAML config
        #[arg(long, env = "SCHED_CONFIG")]
        path: PathBuf,
    },
}

pub fn run(subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Validate { path } => validate(&path, json),
        ConfigSubcommand::Show { path } => show(&path, json),
        ConfigSubcommand::Set { name, value, path } => set(&path, &name, &value, json),
    }
}

fn load(path: &Path) -> anyhow::Result<Config> {
    Config::load(path).with_context(|| format!("failed to load config {}", path.display()))
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(path: &Path, json: bool) -> anyhow::Result<()> {
    let config = load(path)?;
    let warnings = config.validate();

    if json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "[warning]",
                WarnLevel::Error => "[error]",
            };
            println!("{prefix} {}", w.message);
        }
    }

    let has_errors = warnings.iter().any(|w| w.level == WarnLevel::Error);
    if has_errors {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct EffectiveOption<'a> {
    name: &'static str,
    value: &'a str,
    configured: bool,
}

fn show(path: &Path, json: bool) -> anyhow::Result<()> {
    let config = load(path)?;

    let mut rows = Vec::new();
    for option in CLUSTER_OPTIONS {
        let value = config.option(option.name).unwrap_or(option.default);
        rows.push(EffectiveOption {
            name: option.name,
            value,
            configured: config.cluster_options.contains_key(option.name),
        });
    }

    if json {
        return print_json(&rows);
    }

    let table = rows
        .iter()
        .map(|r| {
            vec![
                r.name.to_string(),
                r.value.to_string(),
                if r.configured { "configured" } else { "default" }.to_string(),
            ]
        })
        .collect();
    print_table(&["NAME", "VALUE", "SOURCE"], table);
    Ok(())
}

// ---------------------------------------------------------------------------
// set
// ---------------------------------------------------------------------------

fn set(path: &Path, name: &str, value: &str, json: bool) -> anyhow::Result<()> {
    let mut config = if path.exists() {
        load(path)?
    } else {
        Config::new()
    };
    config.set_option(name, value)?;
    config
        .save(path)
        .with_context(|| format!("failed to write config {}", path.display()))?;

    if json {
        print_json(&serde_json::json!({ "name": name, "value": value.trim() }))?;
    } else {
        println!("Set {name} = {}", value.trim());
    }
    Ok(())
}
