//! Canonical game/package records.
//!
//! Every platform adapter normalizes its native evidence into [`GameRecord`],
//! the platform-agnostic projection consumed by callers. Records are keyed by
//! [`GameId`], an opaque case-insensitive identity that is unique within one
//! platform's namespace and never reused across platforms.
//!
//! Non-fatal anomalies (an install that never finished, a directory the
//! launcher believes in but the disk does not) travel with the record as
//! [`Problem`] tags instead of failing the whole lookup.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// Opaque identity of a game or package within one platform's namespace.
///
/// The original casing is preserved for display, but equality, hashing, and
/// ordering all operate on the case-folded form, so `"EpicGame"` and
/// `"epicgame"` are the same identity. Identities are immutable once
/// assigned.
///
/// # Example
///
/// ```
/// use gamescout::record::GameId;
///
/// let a = GameId::new("Valve.Steam");
/// let b = GameId::new("valve.steam");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "Valve.Steam");
/// ```
#[derive(Debug, Clone)]
pub struct GameId(String);

impl GameId {
    /// Create an identity from its platform-native key.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The identity exactly as the platform produced it.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the underlying key is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn folded(&self) -> impl Iterator<Item = char> + '_ {
        self.0.chars().flat_map(char::to_lowercase)
    }
}

impl PartialEq for GameId {
    fn eq(&self, other: &Self) -> bool {
        self.folded().eq(other.folded())
    }
}

impl Eq for GameId {}

impl Hash for GameId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in self.folded() {
            state.write_u32(c as u32);
        }
    }
}

impl PartialOrd for GameId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GameId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.folded().cmp(other.folded())
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GameId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for GameId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

/// Non-fatal anomaly attached to a record.
///
/// Problems carry information a caller may want to act on without turning
/// the record itself into an error. A record may carry zero or more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Problem {
    /// Queued, downloading, or mid-install.
    InstallPending,
    /// Install failed or was cancelled.
    InstallFailed,
    /// Pinned to its current version; will not be updated.
    VersionLocked,
    /// Installed on disk, but the launcher's own data does not list it.
    NotFoundInData,
    /// Listed in the launcher's data, but the install directory is missing.
    NotFoundOnDisk,
    /// Expired trial or lapsed membership.
    ExpiredTrial,
    /// Runs, but not fully working (missing prerequisite, partial support).
    Incomplete,
    /// Does not run on this host.
    Unplayable,
    /// Bootleg, hack, or otherwise unofficial build.
    Unofficial,
    /// Present on disk but failed verification.
    FailedToVerify,
}

impl Problem {
    /// Human-readable description of the anomaly.
    pub fn description(&self) -> &'static str {
        match self {
            Problem::InstallPending => "This item is waiting to install",
            Problem::InstallFailed => "This item was not installed successfully",
            Problem::VersionLocked => "This item will not be updated",
            Problem::NotFoundInData => {
                "This item was not found in the launcher's manifests or database"
            }
            Problem::NotFoundOnDisk => "This item's installation was not found",
            Problem::ExpiredTrial => {
                "This item is an expired trial or part of a lapsed membership"
            }
            Problem::Incomplete => "This item is not fully working",
            Problem::Unplayable => "This item is unplayable",
            Problem::Unofficial => "This item is a bootleg or hack",
            Problem::FailedToVerify => "This item failed verification",
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Platform-agnostic record of one game or package.
///
/// Only `id` and `name` are always present. Everything else is evidence a
/// platform may or may not provide: local installs carry paths and launch
/// commands, remote catalog entries carry versions and descriptions, and the
/// reconciler ([`crate::merge`]) combines the two.
///
/// Platform extras that don't warrant first-class fields go into `metadata`,
/// an open string-keyed multi-value map (for example `"Genres"` mapping to a
/// list of genre names).
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    /// Identity within the platform's namespace.
    pub id: GameId,

    /// Display name.
    pub name: String,

    /// Absolute install directory, when installed and known.
    pub install_path: Option<PathBuf>,

    /// Launch command or URL (for example `steam://rungameid/220`).
    pub launch: Option<String>,

    /// Arguments to pass to `launch` when it is a command.
    pub launch_args: Option<String>,

    /// Uninstall command or URL.
    pub uninstall: Option<String>,

    /// Whether the platform reports the item as installed locally.
    pub installed: bool,

    /// Whether the item is owned by (licensed to) the current user.
    pub owned: bool,

    /// When the item was installed, if the platform records it.
    pub install_date: Option<DateTime<Utc>>,

    /// When the item was last run, if the platform records it.
    pub last_run_date: Option<DateTime<Utc>>,

    /// How many times the item has been run.
    pub num_runs: u32,

    /// Version installed locally.
    pub installed_version: Option<String>,

    /// Version the platform's catalog would install today.
    pub default_version: Option<String>,

    /// Catalog description.
    pub description: Option<String>,

    /// Publisher name.
    pub publisher: Option<String>,

    /// Product homepage.
    pub homepage: Option<String>,

    /// Support URL.
    pub support_url: Option<String>,

    /// Non-fatal anomalies observed while building this record.
    pub problems: Vec<Problem>,

    /// Open multi-value metadata map for platform-specific extras.
    pub metadata: BTreeMap<String, Vec<String>>,
}

impl GameRecord {
    /// Create a minimal record: installed, owned, everything else empty.
    pub fn new(id: impl Into<GameId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            install_path: None,
            launch: None,
            launch_args: None,
            uninstall: None,
            installed: true,
            owned: true,
            install_date: None,
            last_run_date: None,
            num_runs: 0,
            installed_version: None,
            default_version: None,
            description: None,
            publisher: None,
            homepage: None,
            support_url: None,
            problems: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Set the install directory.
    pub fn with_install_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.install_path = Some(path.into());
        self
    }

    /// Set the launch command or URL.
    pub fn with_launch(mut self, launch: impl Into<String>) -> Self {
        self.launch = Some(launch.into());
        self
    }

    /// Set the uninstall command or URL.
    pub fn with_uninstall(mut self, uninstall: impl Into<String>) -> Self {
        self.uninstall = Some(uninstall.into());
        self
    }

    /// Set the installed flag.
    pub fn with_installed(mut self, installed: bool) -> Self {
        self.installed = installed;
        self
    }

    /// Set the owned flag.
    pub fn with_owned(mut self, owned: bool) -> Self {
        self.owned = owned;
        self
    }

    /// Set the locally installed version.
    pub fn with_installed_version(mut self, version: impl Into<String>) -> Self {
        self.installed_version = Some(version.into());
        self
    }

    /// Set the catalog default version.
    pub fn with_default_version(mut self, version: impl Into<String>) -> Self {
        self.default_version = Some(version.into());
        self
    }

    /// Attach a problem tag.
    pub fn with_problem(mut self, problem: Problem) -> Self {
        if !self.problems.contains(&problem) {
            self.problems.push(problem);
        }
        self
    }

    /// Append a metadata value under `key`, preserving earlier values.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .entry(key.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Whether any problem tags are attached.
    pub fn has_problems(&self) -> bool {
        !self.problems.is_empty()
    }
}
