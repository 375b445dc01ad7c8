//! The `scan` subcommand.

use std::path::Path;
use std::process::ExitCode;

use clap::ValueEnum;
use tracing::error;

use gamescout::config::ConfigFile;
use gamescout::outcome::Outcome;
use gamescout::platform::{self, ea, steam, winget, ScanFilter};
use gamescout::record::GameRecord;
use gamescout::scan::{self, ScanDeps};
use gamescout::sys::{KnownFolders, MachineIdentity, Registry, StdProcessRunner};

/// A scannable platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Platform {
    Steam,
    Ea,
    Winget,
}

impl Platform {
    /// Every platform, in scan order.
    pub fn all() -> Vec<Platform> {
        vec![Platform::Steam, Platform::Ea, Platform::Winget]
    }

    fn name(&self) -> &'static str {
        match self {
            Platform::Steam => "steam",
            Platform::Ea => "ea",
            Platform::Winget => "winget",
        }
    }
}

/// Run the scan and print every outcome.
///
/// Exit code is a failure only when every outcome of every scanned
/// platform is an error; partial failure is normal scan output.
pub fn run(
    config_path: Option<&Path>,
    platforms: &[Platform],
    installed_only: bool,
    json: bool,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let folders = KnownFolders::detect();
    let runner = StdProcessRunner::new();
    let identity = MachineIdentity::new();

    #[cfg(windows)]
    let windows_registry = gamescout::sys::WindowsRegistry::new();
    #[cfg(windows)]
    let registry: Option<&dyn Registry> = Some(&windows_registry);
    #[cfg(not(windows))]
    let registry: Option<&dyn Registry> = None;

    let deps = ScanDeps {
        registry,
        runner: &runner,
        identity: &identity,
    };
    let filter = ScanFilter {
        installed_only: installed_only || config.installed_only,
        ..Default::default()
    };

    let mut total = 0usize;
    let mut failed = 0usize;

    for platform in platforms {
        let outcomes: Vec<Outcome> = match platform {
            Platform::Steam => {
                let spec = steam::spec(&folders, config.steam_path.clone());
                platform::apply_filter(scan::discover(&spec, &deps), filter).collect()
            }
            Platform::Ea => {
                let spec = ea::spec(&folders, config.ea_path.clone(), config.ea_schema_policy);
                platform::apply_filter(scan::discover(&spec, &deps), filter).collect()
            }
            Platform::Winget => winget::find_all(
                &folders,
                config.winget_client_dir.clone(),
                config.winget_query.as_deref(),
                filter,
                &deps,
            ),
        };

        for outcome in outcomes {
            total += 1;
            match outcome {
                Outcome::Game(record) => print_record(platform.name(), &record, json),
                Outcome::Error(e) => {
                    failed += 1;
                    eprintln!("[{}] error: {e}", platform.name());
                }
            }
        }
    }

    if total > 0 && failed == total {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn load_config(explicit: Option<&Path>) -> Result<ConfigFile, gamescout::config::ConfigError> {
    match explicit.map(Path::to_path_buf).or_else(ConfigFile::default_path) {
        Some(path) => ConfigFile::load(&path),
        None => Ok(ConfigFile::default()),
    }
}

fn print_record(platform: &str, record: &GameRecord, json: bool) {
    if json {
        println!("{}", record_json(platform, record));
        return;
    }

    let path = record
        .install_path
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".into());
    let installed = if record.installed { "installed" } else { "not installed" };
    println!("[{platform}] {} ({}) {installed} {path}", record.name, record.id);
    for problem in &record.problems {
        println!("    problem: {problem}");
    }
}

fn record_json(platform: &str, record: &GameRecord) -> serde_json::Value {
    serde_json::json!({
        "platform": platform,
        "id": record.id.as_str(),
        "name": record.name,
        "installPath": record.install_path.as_deref().map(|p| p.display().to_string()),
        "launch": record.launch,
        "uninstall": record.uninstall,
        "installed": record.installed,
        "owned": record.owned,
        "installDate": record.install_date.map(|d| d.to_rfc3339()),
        "lastRunDate": record.last_run_date.map(|d| d.to_rfc3339()),
        "numRuns": record.num_runs,
        "installedVersion": record.installed_version,
        "defaultVersion": record.default_version,
        "publisher": record.publisher,
        "problems": record.problems.iter().map(|p| format!("{p:?}")).collect::<Vec<_>>(),
        "metadata": record.metadata,
    })
}
