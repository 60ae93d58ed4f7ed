//! relogd - captive portal session keeper
//!
//! Logs into the campus gateway, then watches outbound connectivity and
//! logs in again whenever it is lost.

use clap::{Parser, Subcommand};
use relogd_core::config::toml_config::DEFAULT_CONFIG_PATH;
use relogd_core::{error::RelogError, init_logging};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

mod cli;
mod daemon;

#[derive(Parser)]
#[command(name = "relogd", version)]
#[command(about = "Keeps a captive portal session logged in")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and keep the session alive (default)
    Run {
        /// Detach from the terminal
        #[arg(long)]
        daemon: bool,

        /// PID file used when detached
        #[arg(long, requires = "daemon")]
        pid_file: Option<PathBuf>,
    },
    /// Attempt a single login and exit
    Login,
    /// Check connectivity once and exit
    Probe,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    if let Err(e) = init_logging(level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(2);
    }

    let command = cli.command.unwrap_or(Commands::Run {
        daemon: false,
        pid_file: None,
    });

    let result = match command {
        Commands::Run { daemon, pid_file } => cli::run::run_daemon(&cli.config, daemon, pid_file),
        Commands::Login => cli::login::run_login(&cli.config),
        Commands::Probe => cli::probe::run_probe(&cli.config),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            let exit_code = match e {
                // Configuration errors (exit code 2)
                RelogError::Config(_) => 2,
                // Runtime failures (exit code 1)
                RelogError::Login(_)
                | RelogError::Startup { .. }
                | RelogError::Unreachable { .. }
                | RelogError::Coordinator(_)
                | RelogError::Daemon { .. }
                | RelogError::Io(_) => 1,
            };

            eprintln!("{}", e);
            std::process::exit(exit_code);
        }
    }
}
