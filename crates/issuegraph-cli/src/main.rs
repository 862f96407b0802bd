mod commands;
mod gh;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "issuegraph",
    version,
    about = "Upload a CSV issue hierarchy to GitHub, children first"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Create every row as a GitHub issue and add it to its project
    Run {
        /// Path to the input CSV file
        input: PathBuf,
        /// Optional run configuration YAML
        #[arg(long)]
        config: Option<PathBuf>,
        /// Skip rows a previous run already created and append to its output
        #[arg(long)]
        resume: bool,
        /// Previous output to resume from (implies --resume)
        #[arg(long)]
        resume_from: Option<PathBuf>,
        /// Output CSV (default: `<input stem>_output.csv` next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also print the summary as one JSON line
        #[arg(long)]
        json: bool,
    },
    /// Validate the input and print the creation order without touching GitHub
    Check {
        /// Path to the input CSV file
        input: PathBuf,
        /// Optional run configuration YAML
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    logging::init(&cli.log_level);

    match cli.command {
        Commands::Run {
            input,
            config,
            resume,
            resume_from,
            output,
            json,
        } => {
            let args = commands::run::RunArgs {
                input,
                config,
                resume,
                resume_from,
                output,
                json,
            };
            commands::run::execute(&args).await
        }
        Commands::Check { input, config } => commands::check::execute(&input, config.as_deref()),
    }
}
