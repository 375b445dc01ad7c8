//! Gamescout - discovery of games and packages registered by store launchers.
//!
//! This library finds software that third-party distribution platforms
//! (Steam, the EA app, winget, ...) have registered on the host, and
//! normalizes each platform's native evidence into one canonical
//! [`record::GameRecord`] per identity.
//!
//! # Architecture
//!
//! Data flows through four stages, strictly in order:
//!
//! 1. **Locate** ([`locate`]): resolve a platform's data root through an
//!    ordered fallback of strategies (override, registry, default dirs).
//! 2. **Parse** ([`keyvalue`], [`table`], [`blob`]): read the platform's
//!    native format: hierarchical key-value text, fixed-width CLI tables
//!    with truncation recovery, or encrypted versioned JSON.
//! 3. **Enumerate** ([`scan`]): one generic engine drives a format
//!    adapter over the resolved root, yielding one [`outcome::Outcome`]
//!    per discovered unit and never aborting the stream on a single bad
//!    entry.
//! 4. **Reconcile** ([`merge`]): fold multi-source observations of the
//!    same platform into one record per identity under explicit
//!    field-precedence rules.
//!
//! Platforms are described as data ([`scan::PlatformSpec`]), not as one
//! handler type per store; the concrete specs live in [`platform`]. Host
//! capabilities (registry, child processes, hardware identity, known
//! folders) are narrow traits in [`sys`] with std-backed production
//! implementations and plain-data test doubles.
//!
//! Everything is synchronous, single-threaded, and pull-based: a scan does
//! work only as its outcome iterator is advanced, holds no handles between
//! calls, and caches nothing across calls.

pub mod blob;
pub mod config;
pub mod keyvalue;
pub mod locate;
pub mod merge;
pub mod outcome;
pub mod platform;
pub mod record;
pub mod scan;
pub mod sys;
pub mod table;

pub use outcome::{collect_by_id, split_outcomes, Outcome, ScanError};
pub use record::{GameId, GameRecord, Problem};
