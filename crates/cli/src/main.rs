// survmerge CLI - consolidate field session exports into one clean dataset

mod analyze;
mod exit_codes;
mod merge;
mod summary;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "survmerge")]
#[command(about = "Consolidate survey-point session files into one deduplicated dataset")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge session files per a TOML config and write the combined CSV
    #[command(after_help = "\
Examples:
  survmerge merge sep25.toml
  survmerge merge sep25.toml --json
  survmerge merge sep25.toml --audit audit.json")]
    Merge {
        /// Path to the merge .toml config
        config: PathBuf,

        /// Print the JSON audit to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON audit to a file
        #[arg(long)]
        audit: Option<PathBuf>,
    },

    /// Report duplicate counts under every strategy, plus near-duplicates
    #[command(after_help = "\
Examples:
  survmerge analyze \"Sep 25\" \"Sep 26\"
  survmerge analyze \"Sep 25\" --epsilon 0.000001 --exclude unique_missions.csv
  survmerge analyze \"Sep 25\" --json")]
    Analyze {
        /// Session folders to scan (every CSV in each)
        #[arg(required = true)]
        dirs: Vec<PathBuf>,

        /// Component-wise proximity bound for the near-duplicate scan
        #[arg(long, default_value_t = 1e-6)]
        epsilon: f64,

        /// File names to skip (repeatable)
        #[arg(long)]
        exclude: Vec<String>,

        /// Print the JSON report to stdout instead of the human report
        #[arg(long)]
        json: bool,
    },

    /// Per-day capture summary from a combined output file
    #[command(after_help = "\
Examples:
  survmerge summary results/combined.csv
  survmerge summary results/combined.csv --utc-offset -5")]
    Summary {
        /// Combined CSV produced by `merge`
        input: PathBuf,

        /// Site UTC offset in hours for local-time display
        #[arg(long, default_value_t = -5, allow_hyphen_values = true)]
        utc_offset: i32,
    },

    /// Validate a merge config without running it
    Validate {
        /// Path to the merge .toml config
        config: PathBuf,
    },
}

pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Merge {
            config,
            json,
            audit,
        } => merge::cmd_merge(config, json, audit),
        Commands::Analyze {
            dirs,
            epsilon,
            exclude,
            json,
        } => analyze::cmd_analyze(dirs, epsilon, exclude, json),
        Commands::Summary { input, utc_offset } => summary::cmd_summary(input, utc_offset),
        Commands::Validate { config } => merge::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {hint}");
            }
            ExitCode::from(err.code)
        }
    }
}
