mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sched",
    about = "Plan ordering constraints and fencing for remote and guest node connections",
    version,
    propagate_version = true
)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log at debug level (RUST_LOG directives still apply)
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the remote connection ordering pass over a snapshot
    Plan {
        /// Snapshot file (.yaml, .yml or .json)
        #[arg(env = "SCHED_SNAPSHOT")]
        snapshot: PathBuf,

        /// Also write the plan as JSON to this path
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show the connection state of every remote and guest node
    Classify {
        /// Snapshot file (.yaml, .yml or .json)
        #[arg(env = "SCHED_SNAPSHOT")]
        snapshot: PathBuf,
    },

    /// List the recognized cluster options
    Options,

    /// Validate scheduler configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Plan { snapshot, out } => cmd::plan::run(&snapshot, out.as_deref(), cli.json),
        Commands::Classify { snapshot } => cmd::classify::run(&snapshot, cli.json),
        Commands::Options => cmd::options::run(cli.json),
        Commands::Config { subcommand } => cmd::config::run(subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
