//! Orange command-line tool
//!
//! Loads member specifications written as JSON, builds them into class
//! blueprints and reports what was declared.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "orange")]
#[command(about = "Inspect and validate Orange member specifications", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to orange.toml (defaults to ./orange.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every member declared by a specification file
    Inspect {
        /// Specification file (JSON object of member keys to values)
        file: PathBuf,
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Validate specification files
    Check {
        /// Files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show version and effective runtime options
    Info,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("ORANGE_LOG", default_level)).init();

    let config = commands::load_options(cli.config.as_deref())?;

    match cli.command {
        Commands::Inspect { file, format } => {
            commands::inspect::execute(&file, &format, &config)?;
        }

        Commands::Check { files } => {
            commands::check::execute(&files, &config)?;
        }

        Commands::Info => {
            commands::info::execute(&config)?;
        }
    }

    Ok(())
}
