//! Platform adapters.
//!
//! Each platform module defines its [`PlatformSpec`](crate::scan::PlatformSpec)
//! value (locate strategies plus format adapter) and the mapping from its
//! native evidence onto [`GameRecord`](crate::record::GameRecord)s. All
//! enumeration mechanics live in [`crate::scan`]; a platform module is
//! configuration and field mapping, nothing more.
//!
//! ```no_run
//! use gamescout::platform::steam;
//! use gamescout::scan::{self, ScanDeps};
//! use gamescout::sys::{KnownFolders, MachineIdentity, StdProcessRunner};
//!
//! let folders = KnownFolders::detect();
//! let runner = StdProcessRunner::new();
//! let identity = MachineIdentity::new();
//! let deps = ScanDeps { registry: None, runner: &runner, identity: &identity };
//!
//! let spec = steam::spec(&folders, None);
//! for outcome in scan::discover(&spec, &deps) {
//!     println!("{outcome:?}");
//! }
//! ```

pub mod ea;
pub mod steam;
pub mod winget;

use crate::outcome::Outcome;
use crate::record::GameRecord;

/// Caller options narrowing a scan.
///
/// Handlers honor the flags they understand and ignore the rest; a flag a
/// platform cannot express (everything Steam finds is installed, say) is
/// simply a no-op there.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanFilter {
    /// Only items installed locally.
    pub installed_only: bool,
    /// Only items owned by the current user.
    pub owned_only: bool,
    /// Only base items, no DLC or addons.
    pub base_only: bool,
    /// Only items that look like games rather than general software.
    pub games_only: bool,
}

impl ScanFilter {
    /// Whether a record passes the filter.
    pub fn admits(&self, record: &GameRecord) -> bool {
        if self.installed_only && !record.installed {
            return false;
        }
        if self.owned_only && !record.owned {
            return false;
        }
        true
    }
}

/// Drop game outcomes the filter rejects; errors always pass through.
pub fn apply_filter<'a>(
    outcomes: impl Iterator<Item = Outcome> + 'a,
    filter: ScanFilter,
) -> impl Iterator<Item = Outcome> + 'a {
    outcomes.filter(move |outcome| match outcome {
        Outcome::Game(record) => filter.admits(record),
        Outcome::Error(_) => true,
    })
}
