//! examplan CLI
//!
//! Command-line interface for running the allocation pipeline over a
//! record bundle.

mod commands;

use clap::{Parser, Subcommand};
use examplan_core::{PlannerConfig, RunMetadata};
use examplan_scheduler::{Planner, Stage};
use std::path::PathBuf;
use tracing::info_span;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use commands::OutputFormat;

/// examplan - exam timetabling, seating and invigilation
#[derive(Parser, Debug)]
#[command(name = "examplan")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Planner configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level or filter directive (overrides RUST_LOG and the config file)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Schedule courses into exam slots
    Timetable {
        /// Record bundle (TOML or JSON)
        #[arg(long)]
        input: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Schedule and seat students into rooms
    Seating {
        /// Record bundle (TOML or JSON)
        #[arg(long)]
        input: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Schedule, seat and assign invigilators
    Invigilators {
        /// Record bundle (TOML or JSON)
        #[arg(long)]
        input: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Run every stage and show diagnostics and summary
    Plan {
        /// Record bundle (TOML or JSON)
        #[arg(long)]
        input: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Validate settings, and verify the plan of a bundle if given
    Check {
        /// Record bundle (TOML or JSON)
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PlannerConfig::from_file(path)?,
        None => PlannerConfig::default(),
    };

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else if let Some(level) = &cli.log_level {
        EnvFilter::new(level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let metadata = RunMetadata::new();
    let span = info_span!("plan_run", run_id = %metadata.run_id);
    let _guard = span.enter();

    let planner = Planner::new(config.settings)?;

    match cli.command {
        Commands::Timetable { input, format } => {
            commands::generate(&planner, &input, Stage::Timetable, format, &metadata)?;
        }
        Commands::Seating { input, format } => {
            commands::generate(&planner, &input, Stage::Seating, format, &metadata)?;
        }
        Commands::Invigilators { input, format } => {
            commands::generate(&planner, &input, Stage::Invigilation, format, &metadata)?;
        }
        Commands::Plan { input, format } => {
            commands::plan(&planner, &input, format, &metadata)?;
        }
        Commands::Check { input } => {
            commands::check(&planner, input.as_deref())?;
        }
    }

    Ok(())
}
