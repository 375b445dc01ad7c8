//! Gamescout CLI - scan the host for games and packages.
//!
//! Thin presentation layer over the `gamescout` library: argument parsing,
//! logging bootstrap, and outcome printing. No discovery logic lives here.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::scan::Platform;

#[derive(Parser)]
#[command(
    name = "gamescout",
    version,
    about = "Find games and packages installed by store launchers"
)]
struct Cli {
    /// Config file to use instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan platforms and print every outcome.
    Scan {
        /// Platforms to scan; all of them when omitted.
        #[arg(value_enum)]
        platforms: Vec<Platform>,

        /// Only report items installed locally (skips remote sources).
        #[arg(long)]
        installed_only: bool,

        /// Emit records as JSON lines instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Print the config file location.
    ConfigPath,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Scan {
            platforms,
            installed_only,
            json,
        } => {
            let platforms = if platforms.is_empty() {
                Platform::all()
            } else {
                platforms
            };
            commands::scan::run(cli.config.as_deref(), &platforms, installed_only, json)
        }
        Command::ConfigPath => {
            match gamescout::config::ConfigFile::default_path() {
                Some(path) => println!("{}", path.display()),
                None => eprintln!("no config directory on this host"),
            }
            ExitCode::SUCCESS
        }
    }
}
