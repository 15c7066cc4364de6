//! harrington CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "harrington", version, about = "Fuzzy potential scoring engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score the potentials of every project in an ecosystem
    Score {
        /// Ecosystem name
        #[arg(long)]
        ecosystem: String,

        /// Score a single project instead of the whole ecosystem
        #[arg(long)]
        project: Option<String>,

        /// Snapshot TOML (defaults to the configured snapshot)
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Output directory (defaults to the configured output_dir)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,

        /// Max projects scored concurrently
        #[arg(long)]
        parallelism: Option<usize>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show the membership of one rank in every term of its characteristic
    Value {
        /// Ecosystem name
        #[arg(long)]
        ecosystem: String,

        /// Project name
        #[arg(long)]
        project: String,

        /// Characteristic name; a potential shows its weighted profile
        #[arg(long)]
        characteristic: String,

        /// Snapshot TOML (defaults to the configured snapshot)
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a snapshot file
    Validate {
        /// Snapshot TOML
        #[arg(long)]
        snapshot: PathBuf,
    },

    /// Compare two score reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Drift threshold (defaults to the configured drift_threshold)
        #[arg(long)]
        threshold: Option<f64>,

        /// Exit code 1 if any score declined
        #[arg(long)]
        fail_on_decline: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example snapshot
    Init,
}

#[tokio::main]
async fn main() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "harrington=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Score {
            ecosystem,
            project,
            snapshot,
            output,
            format,
            parallelism,
            config,
        } => {
            commands::score::execute(
                ecosystem,
                project,
                snapshot,
                output,
                format,
                parallelism,
                config,
            )
            .await
        }
        Commands::Value {
            ecosystem,
            project,
            characteristic,
            snapshot,
            config,
        } => commands::value::execute(ecosystem, project, characteristic, snapshot, config),
        Commands::Validate { snapshot } => commands::validate::execute(snapshot),
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_decline,
            format,
            config,
        } => commands::compare::execute(
            baseline,
            current,
            threshold,
            fail_on_decline,
            format,
            config,
        ),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
