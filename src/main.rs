//! vigil: build and inspect file integrity databases.

mod commands;
mod error;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use vigil_config::Config;

#[derive(Parser, Debug)]
#[command(name = "vigil", version, about = "File integrity database toolkit")]
struct Args {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, env = "VIGIL_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Create an empty database with a version header
    Init {
        /// Hash algorithm to record (overrides configuration)
        #[arg(long)]
        hash: Option<String>,
        /// Previous hash algorithm to record alongside (overrides configuration)
        #[arg(long)]
        old_hash: Option<String>,
        /// Overwrite an existing database
        #[arg(long)]
        force: bool,
        /// Database path (overrides configuration)
        database: Option<PathBuf>,
    },
    /// Show the version and hash algorithms of a database
    Info {
        /// Database path (overrides configuration)
        database: Option<PathBuf>,
    },
    /// Print a record's value as hex
    Get {
        database: PathBuf,
        key: String,
    },
    /// List the supported hash algorithms
    Algorithms,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("vigil: {err:?}");
            return ExitCode::FAILURE;
        },
    };
    let result = match args.command {
        Command::Init { hash, old_hash, force, database } => {
            commands::init(&config, hash.as_deref(), old_hash.as_deref(), force, database)
        },
        Command::Info { database } => commands::info(&config, database),
        Command::Get { database, key } => commands::get(&database, &key),
        Command::Algorithms => {
            commands::algorithms(&config);
            Ok(())
        },
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("vigil: {err:?}");
            ExitCode::FAILURE
        },
    }
}
