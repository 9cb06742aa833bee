//! OMR marking pipeline entry points.
//!
//! One binary, one subcommand per process role: the data-plane worker, the
//! control-plane result consumers, the standalone index recognizer, manual
//! job submission, and schema initialization.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use omr_infrastructure::config::AppConfig;
use omr_infrastructure::logging::init_logging;

#[derive(Parser)]
#[command(name = "omr", version, about = "OMR answer-sheet marking pipeline")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

/// Which job kind to submit.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum SubmitKind {
    TemplateConfig,
    MarkingConfig,
    Marking,
}

#[derive(Subcommand)]
enum Command {
    /// Run the worker: CV handlers on the three input queues plus the
    /// index-result fan-in.
    Worker,
    /// Run the control plane: the result consumers for all job kinds.
    Control,
    /// Run the standalone handwritten-index recognizer.
    IndexService,
    /// Submit one job to its input queue.
    Submit {
        /// The job kind to submit.
        #[arg(long, value_enum)]
        kind: SubmitKind,
        /// The job record's id.
        #[arg(long)]
        id: i64,
    },
    /// Create the database schema.
    InitDb,
    /// Delete artifacts past their retention window.
    Cleanup,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    init_logging(&config.logging)?;

    match cli.command {
        Command::Worker => commands::run_worker(config).await,
        Command::Control => commands::run_control(config).await,
        Command::IndexService => commands::run_index_service(config).await,
        Command::Submit { kind, id } => commands::submit(config, kind, id).await,
        Command::InitDb => commands::init_db(config).await,
        Command::Cleanup => commands::cleanup(config).await,
    }
}
