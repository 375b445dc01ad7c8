//! Integration tests for Steam discovery.
//!
//! These drive the whole pipeline (locate, library index, per-manifest
//! parsing) against real directory trees built in a tempdir.
//!
//! Run with: `cargo test --test steam_discovery`

use std::fs;
use std::path::{Path, PathBuf};

use gamescout::outcome::{split_outcomes, Outcome};
use gamescout::platform::steam;
use gamescout::record::GameId;
use gamescout::scan::{self, ScanDeps};
use gamescout::sys::{
    FixedIdentity, InMemoryRegistry, KnownFolders, RegistryHive, RegistryView, ScriptedRunner,
};

// ============================================================================
// Helper Functions
// ============================================================================

/// Write a well-formed app manifest into a library's steamapps directory.
fn write_manifest(steamapps: &Path, app_id: u32, name: &str, install_dir: &str) {
    fs::write(
        steamapps.join(format!("appmanifest_{app_id}.acf")),
        format!(
            "\"AppState\"\n{{\n    \"appid\"       \"{app_id}\"\n    \"name\"        \"{name}\"\n    \"installdir\"  \"{install_dir}\"\n    \"StateFlags\"  \"4\"\n}}\n"
        ),
    )
    .unwrap();
}

/// Write a Steam root whose library index lists the given library folders.
fn write_steam_root(base: &Path, libraries: &[&Path]) -> PathBuf {
    let root = base.join("Steam");
    fs::create_dir_all(root.join("steamapps")).unwrap();

    let mut index = String::from("\"libraryfolders\"\n{\n");
    for (i, library) in libraries.iter().enumerate() {
        index.push_str(&format!(
            "    \"{i}\"\n    {{\n        \"path\"    \"{}\"\n    }}\n",
            library.display()
        ));
    }
    index.push_str("}\n");
    fs::write(root.join("steamapps/libraryfolders.vdf"), index).unwrap();
    root
}

fn scan_outcomes(spec: &scan::PlatformSpec) -> Vec<Outcome> {
    let runner = ScriptedRunner::new();
    let identity = FixedIdentity::new("host");
    let deps = ScanDeps {
        registry: None,
        runner: &runner,
        identity: &identity,
    };
    scan::discover(spec, &deps).collect()
}

// ============================================================================
// Integration Tests
// ============================================================================

#[test]
fn finds_games_across_multiple_libraries() {
    let dir = tempfile::tempdir().unwrap();
    let lib_a = dir.path().join("lib_a");
    let lib_b = dir.path().join("lib_b");
    fs::create_dir_all(lib_a.join("steamapps")).unwrap();
    fs::create_dir_all(lib_b.join("steamapps")).unwrap();
    write_manifest(&lib_a.join("steamapps"), 220, "Half-Life 2", "Half-Life 2");
    write_manifest(&lib_a.join("steamapps"), 262060, "Darkest Dungeon", "DarkestDungeon");
    write_manifest(&lib_b.join("steamapps"), 400, "Portal", "Portal");

    let root = write_steam_root(dir.path(), &[&lib_a, &lib_b]);
    let folders = KnownFolders::rooted(dir.path());
    let spec = steam::spec(&folders, Some(root));

    let (games, errors) = split_outcomes(scan_outcomes(&spec));
    assert_eq!(games.len(), 3);
    assert!(errors.is_empty());

    let darkest = games
        .iter()
        .find(|g| g.id == GameId::new("262060"))
        .unwrap();
    assert_eq!(darkest.name, "Darkest Dungeon");
    assert_eq!(
        darkest.install_path.as_deref().unwrap(),
        lib_a.join("steamapps/common/DarkestDungeon")
    );
    assert_eq!(darkest.launch.as_deref(), Some("steam://rungameid/262060"));
    assert_eq!(darkest.uninstall.as_deref(), Some("steam://uninstall/262060"));
}

#[test]
fn one_malformed_manifest_never_hides_the_good_ones() {
    let dir = tempfile::tempdir().unwrap();
    let library = dir.path().join("lib");
    let steamapps = library.join("steamapps");
    fs::create_dir_all(&steamapps).unwrap();

    for app_id in [10u32, 20, 30] {
        write_manifest(&steamapps, app_id, &format!("Game {app_id}"), "dir");
    }
    fs::write(steamapps.join("appmanifest_99.acf"), "\"AppState\" { \"appid\"").unwrap();

    let root = write_steam_root(dir.path(), &[&library]);
    let folders = KnownFolders::rooted(dir.path());
    let spec = steam::spec(&folders, Some(root));

    let outcomes = scan_outcomes(&spec);
    assert_eq!(outcomes.len(), 4);
    let (games, errors) = split_outcomes(outcomes);
    assert_eq!(games.len(), 3);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message().contains("appmanifest_99.acf"));
}

#[test]
fn manifest_without_installdir_is_a_field_error_not_an_empty_path() {
    let dir = tempfile::tempdir().unwrap();
    let library = dir.path().join("lib");
    let steamapps = library.join("steamapps");
    fs::create_dir_all(&steamapps).unwrap();
    fs::write(
        steamapps.join("appmanifest_50.acf"),
        "\"AppState\"\n{\n    \"appid\" \"50\"\n    \"name\" \"No Dir\"\n}\n",
    )
    .unwrap();

    let root = write_steam_root(dir.path(), &[&library]);
    let folders = KnownFolders::rooted(dir.path());
    let spec = steam::spec(&folders, Some(root));

    let outcomes = scan_outcomes(&spec);
    assert_eq!(outcomes.len(), 1);
    let error = outcomes[0].err().unwrap();
    assert!(error.message().contains("installdir"));
    assert!(error.message().contains("appmanifest_50.acf"));
}

#[test]
fn missing_library_folder_is_reported_and_scan_continues() {
    let dir = tempfile::tempdir().unwrap();
    let present = dir.path().join("present");
    let gone = dir.path().join("gone");
    fs::create_dir_all(present.join("steamapps")).unwrap();
    write_manifest(&present.join("steamapps"), 70, "Seventy", "seventy");

    let root = write_steam_root(dir.path(), &[&gone, &present]);
    let folders = KnownFolders::rooted(dir.path());
    let spec = steam::spec(&folders, Some(root));

    let outcomes = scan_outcomes(&spec);
    assert_eq!(outcomes.len(), 2);
    let (games, errors) = split_outcomes(outcomes);
    assert_eq!(games.len(), 1);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message().contains("does not exist"));
}

#[test]
fn registry_path_resolves_when_defaults_are_absent() {
    let dir = tempfile::tempdir().unwrap();
    let library = dir.path().join("lib");
    fs::create_dir_all(library.join("steamapps")).unwrap();
    write_manifest(&library.join("steamapps"), 80, "Eighty", "eighty");
    let root = write_steam_root(dir.path().join("hidden").as_path(), &[&library]);

    let mut registry = InMemoryRegistry::new();
    registry.add_string(
        RegistryHive::CurrentUser,
        RegistryView::Default,
        steam::REGISTRY_KEY,
        "SteamPath",
        root.to_string_lossy(),
    );

    // KnownFolders point at an empty tree, so every default dir misses.
    let folders = KnownFolders::rooted(dir.path().join("empty"));
    let spec = steam::spec(&folders, None);

    let runner = ScriptedRunner::new();
    let identity = FixedIdentity::new("host");
    let deps = ScanDeps {
        registry: Some(&registry),
        runner: &runner,
        identity: &identity,
    };

    let (games, errors) = split_outcomes(scan::discover(&spec, &deps));
    assert_eq!(games.len(), 1);
    assert!(errors.is_empty());
    assert_eq!(games[0].name, "Eighty");
}

#[test]
fn relative_override_fails_fast_even_when_registry_would_work() {
    let dir = tempfile::tempdir().unwrap();
    let library = dir.path().join("lib");
    fs::create_dir_all(library.join("steamapps")).unwrap();
    write_manifest(&library.join("steamapps"), 90, "Ninety", "ninety");
    let root = write_steam_root(dir.path(), &[&library]);

    let mut registry = InMemoryRegistry::new();
    registry.add_string(
        RegistryHive::CurrentUser,
        RegistryView::Default,
        steam::REGISTRY_KEY,
        "SteamPath",
        root.to_string_lossy(),
    );

    let folders = KnownFolders::rooted(dir.path());
    let spec = steam::spec(&folders, Some(PathBuf::from("relative/steam")));

    let runner = ScriptedRunner::new();
    let identity = FixedIdentity::new("host");
    let deps = ScanDeps {
        registry: Some(&registry),
        runner: &runner,
        identity: &identity,
    };

    let outcomes: Vec<_> = scan::discover(&spec, &deps).collect();
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0]
        .err()
        .unwrap()
        .message()
        .contains("not fully qualified"));
}

#[test]
fn repeated_scans_of_an_unchanged_tree_are_identical() {
    let dir = tempfile::tempdir().unwrap();
    let library = dir.path().join("lib");
    let steamapps = library.join("steamapps");
    fs::create_dir_all(&steamapps).unwrap();
    write_manifest(&steamapps, 100, "Hundred", "hundred");
    write_manifest(&steamapps, 200, "Two Hundred", "two-hundred");
    fs::write(steamapps.join("appmanifest_x.acf"), "\"Nope\" { }").unwrap();

    let root = write_steam_root(dir.path(), &[&library]);
    let folders = KnownFolders::rooted(dir.path());
    let spec = steam::spec(&folders, Some(root));

    let (first_games, first_errors) = split_outcomes(scan_outcomes(&spec));
    let (second_games, second_errors) = split_outcomes(scan_outcomes(&spec));

    assert_eq!(first_games, second_games);
    assert_eq!(
        first_errors.iter().map(|e| e.message()).collect::<Vec<_>>(),
        second_errors.iter().map(|e| e.message()).collect::<Vec<_>>(),
    );
}

#[test]
fn early_termination_stops_after_first_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let library = dir.path().join("lib");
    let steamapps = library.join("steamapps");
    fs::create_dir_all(&steamapps).unwrap();
    for app_id in 1..=20u32 {
        write_manifest(&steamapps, app_id, &format!("G{app_id}"), "g");
    }

    let root = write_steam_root(dir.path(), &[&library]);
    let folders = KnownFolders::rooted(dir.path());
    let spec = steam::spec(&folders, Some(root));

    let runner = ScriptedRunner::new();
    let identity = FixedIdentity::new("host");
    let deps = ScanDeps {
        registry: None,
        runner: &runner,
        identity: &identity,
    };

    // Pull-based: taking one outcome must not require parsing all twenty.
    let first = scan::discover(&spec, &deps).next();
    assert!(first.unwrap().is_game());
}
