mod cli; // Command handlers

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use log::{LevelFilter, debug};

/// Rewriter: assembles and runs streaming content pipelines
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a pipeline over a file, or over stdin when no input is given
    Run {
        /// Pipeline description (.json, .yaml, .yml or .toml)
        #[arg(short, long)]
        pipeline: PathBuf,
        /// Input file
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the registered stages
    Stages,
    /// Check that every stage of a pipeline can be resolved
    Check {
        /// Pipeline description to check
        #[arg(short, long)]
        pipeline: PathBuf,
    },
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // RUST_LOG still wins over the -v flags
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).parse_default_env();
    if let Err(e) = builder.try_init() {
        eprintln!("Failed to initialize env_logger: {}", e);
    }
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_logging(args.verbose);
    debug!("Parsed args: {:?}", args);

    let outcome = match args.command {
        Commands::Run { pipeline, input, output } => cli::run_pipeline(&pipeline, input.as_deref(), output.as_deref()),
        Commands::Stages => cli::list_stages(),
        Commands::Check { pipeline } => cli::check_pipeline(&pipeline),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
