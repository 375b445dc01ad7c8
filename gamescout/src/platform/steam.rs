//! Steam: key-value manifests under user-configurable library folders.
//!
//! Steam's data root holds `steamapps/libraryfolders.vdf`, an index of
//! every library folder the user has added. Each library folder contains
//! one `appmanifest_<appid>.acf` per installed app. Both files are the
//! hierarchical key-value format handled by [`crate::keyvalue`].
//!
//! The root is found via an explicit override, the `SteamPath` registry
//! value on Windows, or a list of historical default locations; Steam on
//! Linux has accumulated several over the years.

use std::path::PathBuf;

use chrono::{TimeZone, Utc};

use crate::keyvalue::Node;
use crate::locate::{LocateSpec, RegistryLocation};
use crate::outcome::Outcome;
use crate::record::{GameRecord, Problem};
use crate::scan::{FormatAdapter, ManifestAdapter, ManifestContext, ManifestIndex, PlatformSpec};
use crate::sys::{KnownFolders, RegistryHive, RegistryView};

/// Registry key holding the Steam install path on Windows.
pub const REGISTRY_KEY: &str = r"Software\Valve\Steam";

/// `StateFlags` bit meaning "fully installed".
const STATE_FULLY_INSTALLED: i64 = 4;
/// `StateFlags` bits meaning an update or install failed.
const STATE_UPDATE_FAILED: i64 = 8 | 16;

/// Build the Steam platform spec.
///
/// `override_path` pins the Steam root explicitly; when `None`, resolution
/// falls back to registry and default locations.
pub fn spec(folders: &KnownFolders, override_path: Option<PathBuf>) -> PlatformSpec {
    let mut locate = LocateSpec::new(default_dirs(folders), "steamapps/libraryfolders.vdf")
        .with_registry(RegistryLocation {
            hive: RegistryHive::CurrentUser,
            view: RegistryView::Default,
            key: REGISTRY_KEY.into(),
            value: "SteamPath".into(),
        });
    if let Some(path) = override_path {
        locate = locate.with_override(path);
    }

    PlatformSpec {
        name: "steam",
        locate,
        adapter: FormatAdapter::KeyValue(ManifestAdapter {
            index: Some(ManifestIndex {
                file: PathBuf::from("steamapps/libraryfolders.vdf"),
                root_name: "libraryfolders",
                entry_field: "path",
                suffix: PathBuf::from("steamapps"),
            }),
            manifest_glob: "appmanifest_*.acf".into(),
            root_name: "AppState",
            map: map_manifest,
        }),
    }
}

fn default_dirs(folders: &KnownFolders) -> Vec<PathBuf> {
    if cfg!(windows) {
        vec![folders.program_files_x86.join("Steam")]
    } else {
        vec![
            // $XDG_DATA_HOME/Steam
            folders.data_local.join("Steam"),
            folders.home.join(".steam/debian-installation"),
            // flatpak installation
            folders
                .home
                .join(".var/app/com.valvesoftware.Steam/data/Steam"),
            // legacy directory, often a symlink to the real installation
            folders.home.join(".steam/steam"),
            folders.home.join(".steam"),
            folders.home.join(".local/.steam"),
        ]
    }
}

/// Map one `appmanifest_*.acf` document onto a record.
fn map_manifest(node: &Node, context: &ManifestContext<'_>) -> Outcome {
    let app_id = match node.require_i64("appid") {
        Ok(app_id) => app_id,
        Err(e) => return context.error(e),
    };
    let name = match node.require_str("name") {
        Ok(name) => name.to_owned(),
        Err(e) => return context.error(e),
    };
    let install_dir = match node.require_str("installdir") {
        Ok(install_dir) => install_dir.to_owned(),
        Err(e) => return context.error(e),
    };

    let id = app_id.to_string();
    let install_path = context.library.join("common").join(install_dir);

    let mut record = GameRecord::new(id.clone(), name)
        .with_install_path(install_path)
        .with_launch(format!("steam://rungameid/{id}"))
        .with_uninstall(format!("steam://uninstall/{id}"));

    if let Some(flags) = node.get_i64("StateFlags") {
        if flags & STATE_UPDATE_FAILED != 0 {
            record = record.with_problem(Problem::InstallFailed);
        } else if flags & STATE_FULLY_INSTALLED == 0 {
            record = record.with_problem(Problem::InstallPending);
        }
    }

    // A manifest mid-download reports fewer bytes downloaded than expected.
    if let (Some(to_download), Some(downloaded)) = (
        node.get_i64("BytesToDownload"),
        node.get_i64("BytesDownloaded"),
    ) {
        if downloaded < to_download {
            record = record.with_problem(Problem::InstallPending);
        }
    }

    if let Some(last_updated) = node.get_i64("LastUpdated") {
        if let Some(date) = Utc.timestamp_opt(last_updated, 0).single() {
            record.install_date = Some(date);
        }
    }
    if let Some(size) = node.get_str("SizeOnDisk") {
        record = record.with_metadata("SizeOnDisk", size);
    }

    Outcome::Game(record)
}
