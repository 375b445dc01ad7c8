//! The discovery engine.
//!
//! Every platform is the same algorithm with different parameters: resolve
//! the data root, drive a format adapter over it, yield one [`Outcome`] per
//! discovered unit. Instead of one handler type per store, a platform is a
//! [`PlatformSpec`] *value* (a name, a [`LocateSpec`] strategy table, and a
//! [`FormatAdapter`]), and [`discover`] is the only engine.
//!
//! # Resilience
//!
//! A failure at the resolver level is terminal for the platform: the
//! sequence is exactly one resolution-error outcome. A failure at the unit
//! level (one manifest file, one table row, one blob entry) is local: it
//! becomes one error outcome among many and enumeration continues.
//!
//! # Laziness
//!
//! The sequence is pull-based and single-pass. Root resolution, file
//! globbing, and per-unit parsing run as the caller advances the iterator;
//! stopping early does no further work. The sequence is not restartable:
//! each [`discover`] call re-resolves and re-reads so results always
//! reflect the current state of disk and registry. Cancellation is
//! cooperative: stop pulling between units.

use std::collections::HashMap;
use std::iter;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::blob::{self, BlobError, InstallInfo, SchemaCheck, SchemaPolicy};
use crate::keyvalue::{self, Node};
use crate::locate::{self, LocateSpec, SourceRoot};
use crate::outcome::{collect_by_id, Outcome, ScanError};
use crate::record::{GameId, GameRecord};
use crate::sys::{fsops, HostIdentity, ProcessRunner, Registry};
use crate::table::{RowSlices, TableLayout};

/// Capability bundle handed to the engine for one discovery call.
pub struct ScanDeps<'a> {
    /// Registry capability; `None` on hosts without one.
    pub registry: Option<&'a dyn Registry>,
    /// Child-process capability for CLI-backed platforms.
    pub runner: &'a dyn ProcessRunner,
    /// Host identity for encrypted blobs.
    pub identity: &'a dyn HostIdentity,
}

/// A platform, described as data.
pub struct PlatformSpec {
    /// Platform name, used in log and error messages.
    pub name: &'static str,
    /// How to find the data root.
    pub locate: LocateSpec,
    /// How to read what's under it.
    pub adapter: FormatAdapter,
}

/// The format family a platform stores its evidence in.
pub enum FormatAdapter {
    /// Hierarchical key-value manifest files.
    KeyValue(ManifestAdapter),
    /// Fixed-width tables printed by a CLI client.
    Table(CliTableAdapter),
    /// A versioned, encrypted JSON blob.
    Blob(BlobAdapter),
}

// ---------------------------------------------------------------------------
// Key-value family
// ---------------------------------------------------------------------------

/// Adapter for platforms storing one key-value manifest per item.
pub struct ManifestAdapter {
    /// Library index file that lists content folders. When absent, the
    /// resolved root itself is the single library folder.
    pub index: Option<ManifestIndex>,
    /// Glob matching one manifest per item within a library folder.
    pub manifest_glob: String,
    /// Expected root node name of each manifest.
    pub root_name: &'static str,
    /// Maps a parsed manifest onto a record (or a field error).
    pub map: fn(&Node, &ManifestContext<'_>) -> Outcome,
}

/// Library index configuration.
pub struct ManifestIndex {
    /// Index file, relative to the resolved root.
    pub file: PathBuf,
    /// Expected root node name of the index.
    pub root_name: &'static str,
    /// Field of each numbered child holding a library path.
    pub entry_field: &'static str,
    /// Suffix appended to each listed path to reach the manifests.
    pub suffix: PathBuf,
}

/// Where a manifest came from.
pub struct ManifestContext<'a> {
    /// Path of the manifest file.
    pub path: &'a Path,
    /// Library folder containing it.
    pub library: &'a Path,
}

impl ManifestContext<'_> {
    /// Error outcome naming the manifest file.
    pub fn error(&self, detail: impl std::fmt::Display) -> Outcome {
        Outcome::error(format!("manifest {}: {detail}", self.path.display()))
    }
}

// ---------------------------------------------------------------------------
// Table family
// ---------------------------------------------------------------------------

/// Adapter for platforms whose evidence is a CLI tool's table output.
pub struct CliTableAdapter {
    /// Client executable, relative to the resolved root.
    pub client: PathBuf,
    /// Arguments producing the table.
    pub args: Vec<String>,
    /// Token identifying the header line.
    pub header_marker: &'static str,
    /// Minimum column count for this table kind.
    pub min_columns: usize,
    /// Truncation recovery, when the tool supports a narrower query.
    pub recover: Option<RecoverSpec>,
    /// Maps one sliced row onto a record (or an error).
    pub map: fn(&RowSlices, &TableContext<'_>) -> Outcome,
}

/// One bounded re-query for an elided row.
pub struct RecoverSpec {
    /// Arguments of the narrower query, derived from the elided row.
    pub args: fn(&RowSlices) -> Vec<String>,
    /// Minimum column count of the narrower table.
    pub min_columns: usize,
    /// Splices recovered fields back into the original row.
    pub splice: fn(&RowSlices, &RowSlices) -> RowSlices,
}

/// Context for table row mapping.
pub struct TableContext<'a> {
    /// Registry capability, for rows that point into the registry.
    pub registry: Option<&'a dyn Registry>,
}

// ---------------------------------------------------------------------------
// Blob family
// ---------------------------------------------------------------------------

/// Adapter for platforms storing an encrypted install database.
pub struct BlobAdapter {
    /// Blob file, relative to the resolved root.
    pub blob_path: PathBuf,
    /// Schema version this adapter understands.
    pub supported_schema: u32,
    /// What to do about other versions.
    pub policy: SchemaPolicy,
    /// Maps one entry onto a record (or a field error).
    pub map: fn(InstallInfo, usize, &Path) -> Outcome,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Discover a platform's items as a lazy outcome sequence.
pub fn discover<'a>(
    spec: &'a PlatformSpec,
    deps: &'a ScanDeps<'a>,
) -> impl Iterator<Item = Outcome> + 'a {
    // Everything, including root resolution, is deferred to the first pull.
    iter::once(()).flat_map(move |()| run_discovery(spec, deps))
}

/// Discover into an identity-keyed map plus errors.
///
/// Derived from the same single enumeration as [`discover`]; the first
/// record for an identity wins.
pub fn discover_by_id(
    spec: &PlatformSpec,
    deps: &ScanDeps<'_>,
) -> (HashMap<GameId, GameRecord>, Vec<ScanError>) {
    collect_by_id(discover(spec, deps))
}

fn run_discovery<'a>(
    spec: &'a PlatformSpec,
    deps: &'a ScanDeps<'a>,
) -> Box<dyn Iterator<Item = Outcome> + 'a> {
    let root = match locate::resolve(&spec.locate, deps.registry) {
        Ok(root) => root,
        Err(error) => {
            warn!(platform = spec.name, error = %error, "data root not found");
            return Box::new(iter::once(Outcome::Error(error)));
        }
    };
    debug!(platform = spec.name, root = %root.path.display(), "data root resolved");

    match &spec.adapter {
        FormatAdapter::KeyValue(adapter) => enumerate_manifests(spec.name, adapter, root),
        FormatAdapter::Table(adapter) => enumerate_table(spec.name, adapter, root, deps),
        FormatAdapter::Blob(adapter) => enumerate_blob(spec.name, adapter, root, deps),
    }
}

// --- key-value driver ------------------------------------------------------

fn enumerate_manifests<'a>(
    platform: &'static str,
    adapter: &'a ManifestAdapter,
    root: SourceRoot,
) -> Box<dyn Iterator<Item = Outcome> + 'a> {
    let libraries = match &adapter.index {
        Some(index) => match read_library_index(index, &root.path) {
            Ok(libraries) => libraries,
            Err(outcome) => return Box::new(iter::once(outcome)),
        },
        None => vec![root.path.clone()],
    };

    Box::new(libraries.into_iter().flat_map(move |library| {
        enumerate_library(platform, adapter, library)
    }))
}

fn read_library_index(index: &ManifestIndex, root: &Path) -> Result<Vec<PathBuf>, Outcome> {
    let file = root.join(&index.file);
    let text = std::fs::read_to_string(&file).map_err(|e| {
        Outcome::Error(ScanError::with_source(
            format!("failed to read library index {}", file.display()),
            e,
        ))
    })?;

    let document = keyvalue::parse_document(&text, index.root_name).map_err(|e| {
        Outcome::Error(ScanError::with_source(
            format!("library index {} is not a valid format", file.display()),
            e,
        ))
    })?;

    let libraries: Vec<PathBuf> = document
        .numbered_children()
        .filter_map(|entry| entry.get_str(index.entry_field))
        .map(|path| PathBuf::from(path).join(&index.suffix))
        .collect();

    if libraries.is_empty() {
        return Err(Outcome::error(format!(
            "found no library folders in {}",
            file.display()
        )));
    }
    Ok(libraries)
}

fn enumerate_library<'a>(
    platform: &'static str,
    adapter: &'a ManifestAdapter,
    library: PathBuf,
) -> Box<dyn Iterator<Item = Outcome> + 'a> {
    if !library.is_dir() {
        return Box::new(iter::once(Outcome::error(format!(
            "library folder {} does not exist",
            library.display()
        ))));
    }

    let mut manifests =
        fsops::enumerate_files(&library, &adapter.manifest_glob, false).peekable();
    if manifests.peek().is_none() {
        return Box::new(iter::once(Outcome::error(format!(
            "library folder {} does not contain any manifests",
            library.display()
        ))));
    }

    Box::new(manifests.map(move |manifest| {
        debug!(platform, manifest = %manifest.display(), "parsing manifest");
        parse_manifest(adapter, &manifest, &library)
    }))
}

fn parse_manifest(adapter: &ManifestAdapter, manifest: &Path, library: &Path) -> Outcome {
    let context = ManifestContext {
        path: manifest,
        library,
    };

    let text = match std::fs::read_to_string(manifest) {
        Ok(text) => text,
        Err(e) => {
            return Outcome::Error(ScanError::with_source(
                format!("failed to read manifest {}", manifest.display()),
                e,
            ))
        }
    };

    match keyvalue::parse_document(&text, adapter.root_name) {
        Ok(document) => (adapter.map)(&document, &context),
        Err(e) => {
            warn!(manifest = %manifest.display(), error = %e, "malformed manifest");
            Outcome::Error(ScanError::with_source(
                format!("manifest {} is not a valid format", manifest.display()),
                e,
            ))
        }
    }
}

// --- table driver ----------------------------------------------------------

fn enumerate_table<'a>(
    platform: &'static str,
    adapter: &'a CliTableAdapter,
    root: SourceRoot,
    deps: &'a ScanDeps<'a>,
) -> Box<dyn Iterator<Item = Outcome> + 'a> {
    let client = root.path.join(&adapter.client);
    let args: Vec<&str> = adapter.args.iter().map(String::as_str).collect();

    let output = match deps.runner.run(&client, &args) {
        Ok(output) => output,
        Err(e) => {
            return Box::new(iter::once(Outcome::Error(ScanError::with_source(
                format!("failed to run {}", client.display()),
                e,
            ))))
        }
    };

    if output.stdout.is_empty() {
        return Box::new(iter::once(Outcome::error(format!(
            "no output from {} {}",
            client.display(),
            adapter.args.join(" ")
        ))));
    }

    let layout = match TableLayout::detect(&output.stdout, adapter.header_marker, adapter.min_columns)
    {
        Ok(layout) => layout,
        Err(e) => {
            return Box::new(iter::once(Outcome::Error(ScanError::with_source(
                format!("unparseable output from {}", client.display()),
                e,
            ))))
        }
    };

    // The table text is already in memory; rows are sliced, recovered, and
    // mapped one at a time as the caller pulls.
    let rows: Vec<RowSlices> = layout.rows(&output.stdout).collect();
    debug!(platform, rows = rows.len(), "table parsed");

    Box::new(rows.into_iter().map(move |row| {
        let row = match resolve_truncation(adapter, &client, &row, deps) {
            Ok(row) => row,
            Err(outcome) => return outcome,
        };
        (adapter.map)(
            &row,
            &TableContext {
                registry: deps.registry,
            },
        )
    }))
}

/// Apply at most one re-query to an elided row.
fn resolve_truncation(
    adapter: &CliTableAdapter,
    client: &Path,
    row: &RowSlices,
    deps: &ScanDeps<'_>,
) -> Result<RowSlices, Outcome> {
    if !row.is_truncated() {
        return Ok(row.clone());
    }
    let Some(recover) = &adapter.recover else {
        return Ok(row.clone());
    };

    let args = (recover.args)(row);
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    debug!(args = ?args, "re-querying elided row");

    let output = deps.runner.run(client, &arg_refs).map_err(|e| {
        Outcome::Error(ScanError::with_source(
            format!("re-query of elided row failed to run {}", client.display()),
            e,
        ))
    })?;

    let recovered = TableLayout::detect(&output.stdout, adapter.header_marker, recover.min_columns)
        .ok()
        .and_then(|layout| layout.first_row(&output.stdout));

    match recovered {
        // One attempt only: a re-query that is itself elided (or empty)
        // degrades to a per-row error, never a second retry.
        Some(recovered) if !recovered.is_truncated() => {
            Ok((recover.splice)(row, &recovered))
        }
        _ => Err(Outcome::error(format!(
            "row \"{}\" is still elided after re-query",
            row.fields.join(" | ")
        ))),
    }
}

// --- blob driver -----------------------------------------------------------

fn enumerate_blob<'a>(
    platform: &'static str,
    adapter: &'a BlobAdapter,
    root: SourceRoot,
    deps: &'a ScanDeps<'a>,
) -> Box<dyn Iterator<Item = Outcome> + 'a> {
    let path = root.path.join(&adapter.blob_path);

    let document = match read_blob(&path, deps.identity) {
        Ok(document) => document,
        Err(e) => {
            return Box::new(iter::once(Outcome::Error(ScanError::with_source(
                format!("failed to read install blob {}", path.display()),
                e,
            ))))
        }
    };

    let mut preface = Vec::new();
    match blob::check_schema(document.schema_version, adapter.supported_schema, adapter.policy) {
        SchemaCheck::Ok => {}
        SchemaCheck::Warn(message) => {
            warn!(platform, %message, "schema mismatch");
            preface.push(Outcome::error(format!("{}: {message}", path.display())));
        }
        SchemaCheck::Fail(message) => {
            return Box::new(iter::once(Outcome::error(format!(
                "{}: {message}",
                path.display()
            ))));
        }
    }

    if document.entries.is_empty() {
        preface.push(Outcome::error(format!(
            "install blob {} does not have any entries",
            path.display()
        )));
        return Box::new(preface.into_iter());
    }

    debug!(platform, entries = document.entries.len(), "blob parsed");
    Box::new(
        preface.into_iter().chain(
            document
                .entries
                .into_iter()
                .enumerate()
                .map(move |(index, entry)| (adapter.map)(entry, index, &path)),
        ),
    )
}

fn read_blob(path: &Path, identity: &dyn HostIdentity) -> Result<blob::BlobDocument, BlobError> {
    let raw = std::fs::read(path)?;
    let plaintext = blob::decrypt_blob(&raw, identity)?;
    blob::parse_envelope(&plaintext)
}
