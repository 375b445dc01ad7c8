//! Resolved well-known directories.

use std::path::{Path, PathBuf};

/// Well-known directories of the current host, resolved once and passed by
/// value into platform specs.
///
/// Handlers never call `dirs` themselves; they combine these roots with
/// platform-relative paths. Tests replace the whole set with paths under a
/// tempdir via [`KnownFolders::rooted`] or the `with_*` setters.
#[derive(Debug, Clone)]
pub struct KnownFolders {
    /// User home directory.
    pub home: PathBuf,
    /// Per-user local application data (`%LocalAppData%`, `~/.local/share`).
    pub data_local: PathBuf,
    /// Per-user roaming application data (`%AppData%`, `~/.config`).
    pub data_roaming: PathBuf,
    /// Machine-wide application data (`%ProgramData%`, `/var/lib`).
    pub data_common: PathBuf,
    /// 32-bit program files directory on Windows.
    pub program_files_x86: PathBuf,
    /// Temporary directory.
    pub temp: PathBuf,
}

impl KnownFolders {
    /// Resolve the host's real directories.
    pub fn detect() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"));
        Self {
            data_local: dirs::data_local_dir().unwrap_or_else(|| home.join(".local/share")),
            data_roaming: dirs::config_dir().unwrap_or_else(|| home.join(".config")),
            data_common: detect_data_common(),
            program_files_x86: detect_program_files_x86(),
            temp: std::env::temp_dir(),
            home,
        }
    }

    /// All folders placed under one base directory.
    ///
    /// Intended for tests: a scan pointed at a tempdir sees a complete,
    /// empty host.
    pub fn rooted(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self {
            home: base.join("home"),
            data_local: base.join("data_local"),
            data_roaming: base.join("data_roaming"),
            data_common: base.join("data_common"),
            program_files_x86: base.join("program_files_x86"),
            temp: base.join("temp"),
        }
    }

    /// Override the home directory.
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = home.into();
        self
    }

    /// Override the per-user local data directory.
    pub fn with_data_local(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_local = dir.into();
        self
    }

    /// Override the machine-wide data directory.
    pub fn with_data_common(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_common = dir.into();
        self
    }

    /// Override the 32-bit program files directory.
    pub fn with_program_files_x86(mut self, dir: impl Into<PathBuf>) -> Self {
        self.program_files_x86 = dir.into();
        self
    }
}

#[cfg(windows)]
fn detect_data_common() -> PathBuf {
    std::env::var_os("ProgramData")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(r"C:\ProgramData"))
}

#[cfg(not(windows))]
fn detect_data_common() -> PathBuf {
    PathBuf::from("/var/lib")
}

#[cfg(windows)]
fn detect_program_files_x86() -> PathBuf {
    std::env::var_os("ProgramFiles(x86)")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(r"C:\Program Files (x86)"))
}

#[cfg(not(windows))]
fn detect_program_files_x86() -> PathBuf {
    PathBuf::from("/usr/lib")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rooted_places_everything_under_base() {
        let folders = KnownFolders::rooted("/base");
        assert_eq!(folders.home, PathBuf::from("/base/home"));
        assert_eq!(folders.data_common, PathBuf::from("/base/data_common"));
        assert_eq!(folders.temp, PathBuf::from("/base/temp"));
    }

    #[test]
    fn test_with_overrides() {
        let folders = KnownFolders::rooted("/base")
            .with_home("/custom/home")
            .with_program_files_x86("/custom/pf86");
        assert_eq!(folders.home, PathBuf::from("/custom/home"));
        assert_eq!(folders.program_files_x86, PathBuf::from("/custom/pf86"));
        assert_eq!(folders.data_local, PathBuf::from("/base/data_local"));
    }

    #[test]
    fn test_detect_produces_absolute_paths() {
        let folders = KnownFolders::detect();
        assert!(folders.temp.is_absolute());
    }
}
