//! Winget: fixed-width tables from the Windows Package Manager CLI.
//!
//! Winget is observed from two sources: `winget list` for what is installed
//! locally, and `winget search` for what the catalog offers. The two are
//! reconciled per identity by [`crate::merge`], so one record can carry
//! both an installed version and the catalog's current version.
//!
//! Rows whose `Source` column is empty are non-package installs; their id
//! encodes a Windows uninstall registry key
//! (`ARP\{Machine|User}\{X64|X86}\<subkey>`), which is expanded into
//! install location, launch and uninstall commands, and publisher metadata
//! when a registry capability is available.
//!
//! Long fields are elided with `…`; an elided row triggers exactly one
//! narrower `list --id` re-query (see [`crate::table`]).

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::locate::LocateSpec;
use crate::merge;
use crate::outcome::{collect_by_id, Outcome, ScanError};
use crate::record::{GameId, GameRecord};
use crate::scan::{
    self, CliTableAdapter, FormatAdapter, PlatformSpec, RecoverSpec, ScanDeps, TableContext,
};
use crate::sys::{KnownFolders, Registry, RegistryHive, RegistryView};
use crate::table::RowSlices;

use super::ScanFilter;

/// Default search query for the remote source.
pub const DEFAULT_QUERY: &str = "game";

/// Windows uninstall registry key that ARP ids point into.
const UNINSTALL_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Uninstall";

/// Table columns shared by `list` and `search` output.
const COL_NAME: usize = 0;
const COL_ID: usize = 1;
const COL_VERSION: usize = 2;
const COL_AVAILABLE: usize = 3;
const COL_SOURCE: usize = 4;

/// Spec for the installed source (`winget list`).
pub fn installed_spec(folders: &KnownFolders, client_dir: Option<PathBuf>) -> PlatformSpec {
    PlatformSpec {
        name: "winget",
        locate: locate_client(folders, client_dir),
        adapter: FormatAdapter::Table(CliTableAdapter {
            client: PathBuf::from("winget.exe"),
            args: list_args(),
            header_marker: "Name",
            min_columns: 5,
            recover: Some(RecoverSpec {
                args: recover_args,
                min_columns: 3,
                splice: splice_recovered,
            }),
            map: map_list_row,
        }),
    }
}

/// Spec for the remote source (`winget search`).
pub fn search_spec(
    folders: &KnownFolders,
    client_dir: Option<PathBuf>,
    query: &str,
) -> PlatformSpec {
    PlatformSpec {
        name: "winget-search",
        locate: locate_client(folders, client_dir),
        adapter: FormatAdapter::Table(CliTableAdapter {
            client: PathBuf::from("winget.exe"),
            args: vec![
                "search".into(),
                "--tag".into(),
                query.into(),
                "--nowarn".into(),
                "--disable-interactivity".into(),
            ],
            header_marker: "Name",
            min_columns: 5,
            recover: None,
            map: map_search_row,
        }),
    }
}

/// Scan both sources and reconcile them into one outcome set.
///
/// With `installed_only` set the remote search is skipped entirely. The
/// result is ordered by identity so repeated scans of an unchanged host
/// compare equal.
pub fn find_all(
    folders: &KnownFolders,
    client_dir: Option<PathBuf>,
    query: Option<&str>,
    filter: ScanFilter,
    deps: &ScanDeps<'_>,
) -> Vec<Outcome> {
    let mut loose = Vec::new();

    let spec = installed_spec(folders, client_dir.clone());
    let installed = keyed_outcomes(scan::discover(&spec, deps), &mut loose);

    let remote = if filter.installed_only {
        HashMap::new()
    } else {
        let spec = search_spec(folders, client_dir, query.unwrap_or(DEFAULT_QUERY));
        keyed_outcomes(scan::discover(&spec, deps), &mut loose)
    };

    let merged = merge::merge_sources(installed, remote);

    let mut entries: Vec<(GameId, Outcome)> = merged.into_iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));

    loose.extend(entries.into_iter().map(|(_, outcome)| outcome));
    super::apply_filter(loose.into_iter(), filter).collect()
}

/// [`find_all`] collected into an identity-keyed map plus errors.
pub fn find_all_by_id(
    folders: &KnownFolders,
    client_dir: Option<PathBuf>,
    query: Option<&str>,
    filter: ScanFilter,
    deps: &ScanDeps<'_>,
) -> (HashMap<GameId, GameRecord>, Vec<ScanError>) {
    collect_by_id(find_all(folders, client_dir, query, filter, deps))
}

/// Bucket record outcomes by identity; identity-less errors go to `loose`.
fn keyed_outcomes(
    outcomes: impl Iterator<Item = Outcome>,
    loose: &mut Vec<Outcome>,
) -> HashMap<GameId, Outcome> {
    let mut keyed = HashMap::new();
    for outcome in outcomes {
        match outcome {
            Outcome::Game(game) => {
                keyed.entry(game.id.clone()).or_insert(Outcome::Game(game));
            }
            error => loose.push(error),
        }
    }
    keyed
}

fn locate_client(folders: &KnownFolders, client_dir: Option<PathBuf>) -> LocateSpec {
    let mut locate = LocateSpec::new(
        vec![folders.data_local.join("Microsoft").join("WindowsApps")],
        "winget.exe",
    );
    if let Some(dir) = client_dir {
        locate = locate.with_override(dir);
    }
    locate
}

fn list_args() -> Vec<String> {
    vec![
        "list".into(),
        "--nowarn".into(),
        "--disable-interactivity".into(),
    ]
}

/// Narrower query for one elided row: filter the list by the id, marker
/// stripped.
fn recover_args(row: &RowSlices) -> Vec<String> {
    let source = row.field_trimmed(COL_SOURCE);
    let source = if source.is_empty() { "winget" } else { source };
    vec![
        "list".into(),
        "--id".into(),
        row.field_trimmed(COL_ID).into(),
        "--source".into(),
        source.into(),
        "--nowarn".into(),
        "--disable-interactivity".into(),
    ]
}

/// The narrower table carries Name, Id, Version; Available and Source keep
/// their values from the original row.
fn splice_recovered(original: &RowSlices, recovered: &RowSlices) -> RowSlices {
    let mut fields = original.fields.clone();
    for index in 0..3 {
        if let Some(value) = recovered.fields.get(index) {
            if index < fields.len() {
                fields[index] = value.clone();
            }
        }
    }
    RowSlices { fields }
}

/// Map one `winget list` row onto a record.
fn map_list_row(row: &RowSlices, context: &TableContext<'_>) -> Outcome {
    let id = row.field_trimmed(COL_ID);
    if id.is_empty() {
        return Outcome::error(format!("table row has no id: {}", row.fields.join(" | ")));
    }

    let mut record = GameRecord::new(id, row.field(COL_NAME));

    let version = row.field(COL_VERSION);
    if !version.is_empty() {
        record = record.with_installed_version(version);
    }
    let available = row.field(COL_AVAILABLE);
    if !available.is_empty() {
        record = record.with_default_version(available);
    }

    let source = row.field(COL_SOURCE);
    if source.is_empty() {
        // Non-package install: the id points into the uninstall registry.
        if let Some(registry) = context.registry {
            if let Err(error) = expand_registry_entry(&mut record, registry) {
                return Outcome::Error(error);
            }
        }
    } else {
        record = record.with_metadata("Source", source);
    }

    Outcome::Game(record)
}

/// Map one `winget search` row onto a not-installed catalog record.
fn map_search_row(row: &RowSlices, _context: &TableContext<'_>) -> Outcome {
    let id = row.field_trimmed(COL_ID);
    if id.is_empty() {
        return Outcome::error(format!("table row has no id: {}", row.fields.join(" | ")));
    }

    let mut record = GameRecord::new(id, row.field(COL_NAME))
        .with_installed(false)
        .with_owned(false);

    let available = row.field(COL_VERSION);
    if !available.is_empty() {
        record = record.with_default_version(available);
    }
    let source = row.field(COL_SOURCE);
    if !source.is_empty() {
        record = record.with_metadata("Source", source);
    }

    Outcome::Game(record)
}

/// Fill a record from the uninstall registry key its ARP id names.
fn expand_registry_entry(
    record: &mut GameRecord,
    registry: &dyn Registry,
) -> Result<(), ScanError> {
    let id = record.id.as_str().to_owned();
    let Some((hive, view, subkey)) = parse_arp_id(&id) else {
        return Err(ScanError::new(format!(
            "did not find expected ARP\\[Machine|User]\\[X64|X86]\\ registry key prefix in id {id}"
        )));
    };

    let base = registry
        .open_base_key(hive, view)
        .ok_or_else(|| ScanError::new(format!("registry hive for {id} is unavailable")))?;
    let key = base
        .open_sub_key(&subkey)
        .ok_or_else(|| ScanError::new(format!("unable to open {subkey}")))?;

    if record.name.is_empty() {
        if let Some(name) = key.try_get_string("DisplayName") {
            record.name = name;
        }
    }
    if let Some(path) = key.try_get_string("InstallLocation") {
        if !path.is_empty() {
            record.install_path = Some(PathBuf::from(path));
        }
    }
    if let Some(launch) = key.try_get_string("DisplayIcon") {
        if !launch.is_empty() {
            record.launch = Some(launch);
        }
    }
    if let Some(uninstall) = key.try_get_string("UninstallString") {
        if !uninstall.is_empty() {
            record.uninstall = Some(uninstall);
        }
    }
    if let Some(date) = key.try_get_string("InstallDate") {
        record.install_date = NaiveDate::parse_from_str(&date, "%Y%m%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());
    }
    if let Some(publisher) = key.try_get_string("Publisher") {
        if !publisher.is_empty() {
            record.publisher = Some(publisher);
        }
    }
    if let Some(homepage) = key.try_get_string("URLInfoAbout") {
        if !homepage.is_empty() {
            record.homepage = Some(homepage);
        }
    }
    if let Some(support) = key.try_get_string("HelpLink") {
        if !support.is_empty() {
            record.support_url = Some(support);
        }
    }

    Ok(())
}

/// Decode an `ARP\{Machine|User}\{X64|X86}\<subkey>` id.
fn parse_arp_id(id: &str) -> Option<(RegistryHive, RegistryView, String)> {
    let rest = id.strip_prefix("ARP\\")?;
    let (scope, rest) = rest.split_once('\\')?;
    let (arch, subkey) = rest.split_once('\\')?;
    if subkey.is_empty() {
        return None;
    }

    let hive = match scope {
        "Machine" => RegistryHive::LocalMachine,
        "User" => RegistryHive::CurrentUser,
        _ => return None,
    };
    let view = match arch {
        "X64" => RegistryView::View64,
        "X86" => RegistryView::View32,
        _ => return None,
    };
    Some((hive, view, format!("{UNINSTALL_KEY}\\{subkey}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::InMemoryRegistry;

    fn row(fields: &[&str]) -> RowSlices {
        RowSlices {
            fields: fields.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_parse_arp_id_variants() {
        let (hive, view, subkey) = parse_arp_id(r"ARP\Machine\X64\Steam App 262060").unwrap();
        assert_eq!(hive, RegistryHive::LocalMachine);
        assert_eq!(view, RegistryView::View64);
        assert!(subkey.ends_with("Steam App 262060"));

        let (hive, view, _) = parse_arp_id(r"ARP\User\X86\SomeApp").unwrap();
        assert_eq!(hive, RegistryHive::CurrentUser);
        assert_eq!(view, RegistryView::View32);

        assert!(parse_arp_id("RedHook.DarkestDungeon").is_none());
        assert!(parse_arp_id(r"ARP\Other\X64\App").is_none());
    }

    #[test]
    fn test_map_list_row_package_source() {
        let context = TableContext { registry: None };
        let outcome = map_list_row(
            &row(&["Darkest Dungeon", "RedHook.DarkestDungeon", "1.0", "1.1", "winget"]),
            &context,
        );
        let record = outcome.game().unwrap();
        assert_eq!(record.id, GameId::new("RedHook.DarkestDungeon"));
        assert!(record.installed);
        assert_eq!(record.installed_version.as_deref(), Some("1.0"));
        assert_eq!(record.default_version.as_deref(), Some("1.1"));
        assert_eq!(record.metadata["Source"], vec!["winget"]);
    }

    #[test]
    fn test_map_list_row_without_id_is_error() {
        let context = TableContext { registry: None };
        let outcome = map_list_row(&row(&["Name", "", "", "", ""]), &context);
        assert!(outcome.is_error());
    }

    #[test]
    fn test_map_list_row_expands_registry_entry() {
        let mut registry = InMemoryRegistry::new();
        let subkey = format!("{UNINSTALL_KEY}\\MyTool");
        registry.add_string(
            RegistryHive::LocalMachine,
            RegistryView::View64,
            &subkey,
            "InstallLocation",
            r"C:\Tools\MyTool",
        );
        registry.add_string(
            RegistryHive::LocalMachine,
            RegistryView::View64,
            &subkey,
            "UninstallString",
            r"C:\Tools\MyTool\uninstall.exe",
        );
        registry.add_string(
            RegistryHive::LocalMachine,
            RegistryView::View64,
            &subkey,
            "InstallDate",
            "20240115",
        );
        registry.add_string(
            RegistryHive::LocalMachine,
            RegistryView::View64,
            &subkey,
            "Publisher",
            "My Corp",
        );

        let context = TableContext {
            registry: Some(&registry),
        };
        let outcome = map_list_row(
            &row(&["My Tool", r"ARP\Machine\X64\MyTool", "2.0", "", ""]),
            &context,
        );
        let record = outcome.game().unwrap();
        assert_eq!(
            record.install_path.as_deref().unwrap().to_str(),
            Some(r"C:\Tools\MyTool")
        );
        assert_eq!(record.publisher.as_deref(), Some("My Corp"));
        assert!(record.install_date.is_some());
    }

    #[test]
    fn test_unopenable_registry_key_is_error_outcome() {
        let registry = InMemoryRegistry::new();
        let context = TableContext {
            registry: Some(&registry),
        };
        let outcome = map_list_row(
            &row(&["My Tool", r"ARP\Machine\X64\Gone", "2.0", "", ""]),
            &context,
        );
        let error = outcome.err().unwrap();
        assert!(error.message().contains("unable to open"));
    }

    #[test]
    fn test_missing_registry_capability_keeps_table_record() {
        let context = TableContext { registry: None };
        let outcome = map_list_row(
            &row(&["My Tool", r"ARP\Machine\X64\MyTool", "2.0", "", ""]),
            &context,
        );
        let record = outcome.game().unwrap();
        assert!(record.install_path.is_none());
        assert_eq!(record.installed_version.as_deref(), Some("2.0"));
    }

    #[test]
    fn test_map_search_row_is_not_installed() {
        let context = TableContext { registry: None };
        let outcome = map_search_row(
            &row(&["Darkest Dungeon", "RedHook.DarkestDungeon", "1.1", "Tag: game", "winget"]),
            &context,
        );
        let record = outcome.game().unwrap();
        assert!(!record.installed);
        assert!(!record.owned);
        assert_eq!(record.default_version.as_deref(), Some("1.1"));
    }

    #[test]
    fn test_recover_args_trim_marker_and_default_source() {
        let args = recover_args(&row(&["Name…", "RedHook.Darkest…", "1.0", "", ""]));
        assert_eq!(
            args,
            vec![
                "list",
                "--id",
                "RedHook.Darkest",
                "--source",
                "winget",
                "--nowarn",
                "--disable-interactivity",
            ]
        );
    }

    #[test]
    fn test_splice_keeps_trailing_columns() {
        let original = row(&["Name…", "Id…", "1…", "1.1", "msstore"]);
        let recovered = row(&["Full Name", "Full.Id", "1.0.3"]);
        let spliced = splice_recovered(&original, &recovered);
        assert_eq!(
            spliced.fields,
            vec!["Full Name", "Full.Id", "1.0.3", "1.1", "msstore"]
        );
    }
}
