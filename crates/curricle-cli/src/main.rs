//! curricle CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "curricle", version, about = "Course-progress engine for linear curricula")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scripted cohort session on an in-memory store
    Simulate {
        /// Path to the session script TOML
        #[arg(long)]
        script: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory (defaults to the configured one)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: table, json, csv, all
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Snapshot the roster from the configured store
    Roster {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory (defaults to the configured one)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, csv, all
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Compare two roster report snapshots
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Exit code 1 if no learner moved since the baseline
        #[arg(long)]
        fail_on_stall: bool,

        /// Output format: markdown, json, text
        #[arg(long, default_value = "markdown")]
        format: String,
    },

    /// Validate a curriculum against its exam bank
    Validate {
        /// Path to the curriculum TOML
        #[arg(long)]
        curriculum: PathBuf,

        /// Path to the exam-bank TOML
        #[arg(long)]
        exams: PathBuf,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Print the curriculum outline
    Show {
        /// Path to the curriculum TOML
        #[arg(long)]
        curriculum: PathBuf,
    },

    /// Create starter config, curriculum, and exam bank
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("curricle=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            script,
            config,
            output,
            format,
        } => commands::simulate::execute(script, config, output, format).await,
        Commands::Roster {
            config,
            output,
            format,
        } => commands::roster::execute(config, output, format).await,
        Commands::Compare {
            baseline,
            current,
            fail_on_stall,
            format,
        } => commands::compare::execute(baseline, current, fail_on_stall, format),
        Commands::Validate {
            curriculum,
            exams,
            strict,
        } => commands::validate::execute(curriculum, exams, strict),
        Commands::Show { curriculum } => commands::show::execute(curriculum),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
