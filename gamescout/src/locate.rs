//! Location resolution: finding a platform's data root.
//!
//! Every platform keeps its manifests, databases, or blobs under one root
//! directory, and every platform hides that root somewhere different: an
//! explicit user setting, a registry value, or one of several historical
//! default locations. [`resolve`] tries the strategies in a fixed priority
//! order and reports either the single authoritative root or an error that
//! names everything it tried.
//!
//! Resolution is read-only and point-in-time: existence checks are not
//! retried and results are never cached across discovery calls, so a scan
//! always reflects the current state of disk and registry.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::outcome::ScanError;
use crate::sys::{Registry, RegistryHive, RegistryView};

/// Where a resolved root came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateStrategy {
    /// Caller-supplied explicit override path.
    Override,
    /// Registry value.
    Registry,
    /// One of the platform's default directories.
    DefaultDir,
}

/// A resolved platform data root and the strategy that produced it.
#[derive(Debug, Clone)]
pub struct SourceRoot {
    /// Absolute root directory.
    pub path: PathBuf,
    /// Strategy that won.
    pub strategy: LocateStrategy,
}

/// A registry value holding a platform's root path.
#[derive(Debug, Clone)]
pub struct RegistryLocation {
    /// Hive to open.
    pub hive: RegistryHive,
    /// View to open it with.
    pub view: RegistryView,
    /// Subkey path below the hive, backslash-separated.
    pub key: String,
    /// Value name holding the path.
    pub value: String,
}

/// Strategy table for resolving one platform's root.
///
/// This is a plain value: platform modules construct one, callers may
/// override pieces of it (typically `override_path` from configuration),
/// and [`resolve`] consumes it without side effects.
#[derive(Debug, Clone)]
pub struct LocateSpec {
    /// Explicit root supplied by the caller. When set, no other strategy
    /// runs; an unusable override is an error, never silently skipped.
    pub override_path: Option<PathBuf>,
    /// Registry lookup, attempted when a registry capability is present.
    pub registry: Option<RegistryLocation>,
    /// Ordered default directories to probe.
    pub default_dirs: Vec<PathBuf>,
    /// Platform-defining marker, relative to a candidate root. A candidate
    /// counts only when the marker exists beneath it.
    pub marker: PathBuf,
}

impl LocateSpec {
    /// Spec with only default directories and a marker.
    pub fn new(default_dirs: Vec<PathBuf>, marker: impl Into<PathBuf>) -> Self {
        Self {
            override_path: None,
            registry: None,
            default_dirs,
            marker: marker.into(),
        }
    }

    /// Set the explicit override path.
    pub fn with_override(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    /// Set the registry lookup.
    pub fn with_registry(mut self, location: RegistryLocation) -> Self {
        self.registry = Some(location);
        self
    }

    fn marker_exists(&self, root: &Path) -> bool {
        root.join(&self.marker).exists()
    }
}

/// Resolve a platform's data root.
///
/// Strategy order, first success winning with no further strategies
/// attempted:
///
/// 1. The explicit override, which must be absolute and exist.
/// 2. The registry value, when a capability is supplied and the stored path
///    is absolute with the marker present.
/// 3. Each default directory, in order, checked for the marker.
/// 4. Failure: an aggregate error naming every default path tried, folding
///    in a registry path that was found but unusable so stale registry data
///    can be diagnosed.
pub fn resolve(spec: &LocateSpec, registry: Option<&dyn Registry>) -> Result<SourceRoot, ScanError> {
    if let Some(path) = &spec.override_path {
        if !path.is_absolute() {
            return Err(ScanError::new(format!(
                "override path {} is not fully qualified",
                path.display()
            )));
        }
        if !path.exists() {
            return Err(ScanError::new(format!(
                "override path {} does not exist",
                path.display()
            )));
        }
        debug!(path = %path.display(), "root resolved from override");
        return Ok(SourceRoot {
            path: path.clone(),
            strategy: LocateStrategy::Override,
        });
    }

    let mut stale_registry_path = None;
    if let (Some(location), Some(registry)) = (&spec.registry, registry) {
        if let Some(path) = read_registry_path(location, registry) {
            if path.is_absolute() && spec.marker_exists(&path) {
                debug!(path = %path.display(), "root resolved from registry");
                return Ok(SourceRoot {
                    path,
                    strategy: LocateStrategy::Registry,
                });
            }
            stale_registry_path = Some(path);
        }
    }

    for dir in &spec.default_dirs {
        if spec.marker_exists(dir) {
            debug!(path = %dir.display(), "root resolved from default directory");
            return Ok(SourceRoot {
                path: dir.clone(),
                strategy: LocateStrategy::DefaultDir,
            });
        }
    }

    let tried = spec
        .default_dirs
        .iter()
        .map(|dir| dir.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let message = match stale_registry_path {
        Some(path) => format!(
            "no data root found; tried default paths [{tried}] and the registry path {} \
             which does not contain {}",
            path.display(),
            spec.marker.display()
        ),
        None => format!("no data root found; tried default paths [{tried}]"),
    };
    Err(ScanError::new(message))
}

fn read_registry_path(location: &RegistryLocation, registry: &dyn Registry) -> Option<PathBuf> {
    let base = registry.open_base_key(location.hive, location.view)?;
    let key = base.open_sub_key(&location.key)?;
    let value = key.try_get_string(&location.value)?;
    Some(PathBuf::from(value))
}
