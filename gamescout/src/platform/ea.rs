//! EA app: an encrypted, versioned install database.
//!
//! The EA desktop app keeps its install database as a single AES-encrypted
//! JSON blob under the machine-wide data directory, inside a directory
//! whose name is a fixed hash. The blob is keyed to the machine (see
//! [`crate::blob::crypto`]), carries a schema version, and lists one entry
//! per installed title.

use std::path::{Path, PathBuf};

use crate::blob::{InstallInfo, SchemaPolicy};
use crate::locate::LocateSpec;
use crate::outcome::Outcome;
use crate::record::{GameRecord, Problem};
use crate::scan::{BlobAdapter, FormatAdapter, PlatformSpec};
use crate::sys::KnownFolders;

/// Schema version this adapter understands.
pub const SUPPORTED_SCHEMA_VERSION: u32 = 21;

/// Fixed directory name holding the all-users install database.
const ALL_USERS_FOLDER: &str = "530c11479fe252fc5aabc24935b9776d4900eb3ba58fdc271e0d6229413ad40e";

/// File name of the install database inside [`ALL_USERS_FOLDER`].
const INSTALL_INFO_FILE: &str = "IS";

/// Build the EA platform spec.
///
/// `override_path` pins the data folder (the directory that contains the
/// hashed all-users directory); `policy` controls schema-version handling
/// per call, never through ambient state.
pub fn spec(
    folders: &KnownFolders,
    override_path: Option<PathBuf>,
    policy: SchemaPolicy,
) -> PlatformSpec {
    let blob_path = PathBuf::from(ALL_USERS_FOLDER).join(INSTALL_INFO_FILE);

    let mut locate = LocateSpec::new(
        vec![folders.data_common.join("EA Desktop")],
        blob_path.clone(),
    );
    if let Some(path) = override_path {
        locate = locate.with_override(path);
    }

    PlatformSpec {
        name: "ea",
        locate,
        adapter: FormatAdapter::Blob(BlobAdapter {
            blob_path,
            supported_schema: SUPPORTED_SCHEMA_VERSION,
            policy,
            map: map_install_info,
        }),
    }
}

/// Map one install-database entry onto a record.
///
/// `softwareId`, `baseSlug`, and `baseInstallPath` are required; a missing
/// one is a field error naming the field and the entry, never a record
/// with a defaulted identity or path.
fn map_install_info(entry: InstallInfo, index: usize, blob: &Path) -> Outcome {
    let Some(software_id) = entry.software_id.filter(|id| !id.is_empty()) else {
        return Outcome::error(format!(
            "install entry #{index} in {} does not have the value \"softwareId\"",
            blob.display()
        ));
    };

    let Some(base_slug) = entry.base_slug.filter(|slug| !slug.is_empty()) else {
        return Outcome::error(format!(
            "install entry #{index} for {software_id} does not have the value \"baseSlug\""
        ));
    };

    let Some(base_install_path) = entry.base_install_path.filter(|path| !path.is_empty()) else {
        return Outcome::error(format!(
            "install entry #{index} for {software_id} ({base_slug}) does not have the value \
             \"baseInstallPath\""
        ));
    };

    let install_path = PathBuf::from(base_install_path);
    let mut record = GameRecord::new(software_id, base_slug).with_install_path(install_path.clone());

    if let Some(version) = entry.installed_version {
        record = record.with_installed_version(version);
    }

    // The database believes it's installed; the disk gets the final word.
    if !install_path.exists() {
        record = record.with_problem(Problem::NotFoundOnDisk);
    }

    Outcome::Game(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::GameId;

    fn entry(id: Option<&str>, slug: Option<&str>, path: Option<&str>) -> InstallInfo {
        InstallInfo {
            software_id: id.map(str::to_owned),
            base_slug: slug.map(str::to_owned),
            base_install_path: path.map(str::to_owned),
            installed_version: None,
        }
    }

    #[test]
    fn test_complete_entry_maps_to_record() {
        let dir = tempfile::tempdir().unwrap();
        let games = dir.path().join("DragonAge");
        std::fs::create_dir(&games).unwrap();

        let outcome = map_install_info(
            entry(
                Some("Origin.OFR.50.0001"),
                Some("dragon-age"),
                Some(games.to_str().unwrap()),
            ),
            0,
            Path::new("/data/IS"),
        );
        let record = outcome.game().unwrap();
        assert_eq!(record.id, GameId::new("Origin.OFR.50.0001"));
        assert_eq!(record.name, "dragon-age");
        assert!(!record.has_problems());
    }

    #[test]
    fn test_missing_software_id_is_field_error() {
        let outcome =
            map_install_info(entry(None, Some("slug"), Some("/x")), 3, Path::new("/d/IS"));
        let error = outcome.err().unwrap();
        assert!(error.message().contains("#3"));
        assert!(error.message().contains("softwareId"));
        assert!(error.message().contains("/d/IS"));
    }

    #[test]
    fn test_missing_slug_names_the_id() {
        let outcome =
            map_install_info(entry(Some("sw-1"), None, Some("/x")), 0, Path::new("/d/IS"));
        let error = outcome.err().unwrap();
        assert!(error.message().contains("sw-1"));
        assert!(error.message().contains("baseSlug"));
    }

    #[test]
    fn test_missing_install_path_is_field_error_not_empty_path() {
        let outcome =
            map_install_info(entry(Some("sw-1"), Some("slug"), None), 0, Path::new("/d/IS"));
        assert!(outcome
            .err()
            .unwrap()
            .message()
            .contains("baseInstallPath"));
    }

    #[test]
    fn test_vanished_install_dir_gets_problem_not_drop() {
        let outcome = map_install_info(
            entry(Some("sw-1"), Some("slug"), Some("/no/such/dir")),
            0,
            Path::new("/d/IS"),
        );
        let record = outcome.game().unwrap();
        assert!(record.problems.contains(&Problem::NotFoundOnDisk));
    }

    #[test]
    fn test_spec_points_at_hashed_folder() {
        let folders = KnownFolders::rooted("/base");
        let spec = spec(&folders, None, SchemaPolicy::default());
        assert_eq!(spec.name, "ea");
        assert!(spec
            .locate
            .marker
            .to_string_lossy()
            .contains(ALL_USERS_FOLDER));
    }
}
