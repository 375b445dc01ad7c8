//! Capability interfaces to the host system.
//!
//! The discovery engine never touches the OS registry, child processes, or
//! hardware identifiers directly. Each of those concerns is a narrow trait
//! defined here, with a std-backed production implementation and a plain-data
//! test double, so handlers can be exercised on any host:
//!
//! - [`Registry`] / [`RegistryKey`]: scoped, read-only registry lookups.
//!   [`InMemoryRegistry`] serves tests and non-Windows hosts.
//! - [`ProcessRunner`]: blocking child-process execution with captured
//!   UTF-8 output. [`ScriptedRunner`] replays canned output in tests.
//! - [`HostIdentity`]: read-only host-identifying material for key
//!   derivation. [`FixedIdentity`] pins it in tests.
//! - [`KnownFolders`]: resolved well-known directories, overridable so a
//!   whole scan can be pointed at a tempdir.
//!
//! Plain filesystem access stays `std::fs` plus [`fsops`] glob enumeration;
//! tests run against real temporary directories instead of a mock.

pub mod fsops;
mod identity;
mod paths;
mod process;
mod registry;

pub use identity::{FixedIdentity, HostIdentity, IdentityError, MachineIdentity};
pub use paths::KnownFolders;
pub use process::{ProcessError, ProcessOutput, ProcessRunner, ScriptedRunner, StdProcessRunner};
pub use registry::{InMemoryRegistry, Registry, RegistryHive, RegistryKey, RegistryView};

#[cfg(windows)]
pub use registry::WindowsRegistry;
