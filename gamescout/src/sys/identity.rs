//! Host-identifying material for key derivation.
//!
//! Encrypted install blobs (§ the `blob` module) are keyed to the machine
//! they were written on. The [`HostIdentity`] capability supplies the
//! identifying string from read-only OS identifiers; it never writes
//! anything.

use thiserror::Error;

/// Failure to read host identifiers.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The OS identifier source is missing or unreadable.
    #[error("unable to read host identifier: {0}")]
    Unavailable(String),
}

/// Capability producing a stable host-identifying string.
pub trait HostIdentity {
    /// The identifying string. Stable across runs on the same host.
    fn identity_string(&self) -> Result<String, IdentityError>;
}

/// Production identity from OS machine identifiers.
///
/// Linux reads `/etc/machine-id`; Windows reads the `MachineGuid` value
/// under `HKLM\SOFTWARE\Microsoft\Cryptography`.
#[derive(Debug, Default)]
pub struct MachineIdentity;

impl MachineIdentity {
    /// Create the production identity source.
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "linux")]
impl HostIdentity for MachineIdentity {
    fn identity_string(&self) -> Result<String, IdentityError> {
        std::fs::read_to_string("/etc/machine-id")
            .map(|s| s.trim().to_owned())
            .map_err(|e| IdentityError::Unavailable(format!("/etc/machine-id: {e}")))
    }
}

#[cfg(windows)]
impl HostIdentity for MachineIdentity {
    fn identity_string(&self) -> Result<String, IdentityError> {
        use super::{Registry, RegistryHive, RegistryView, WindowsRegistry};

        let registry = WindowsRegistry::new();
        let base = registry
            .open_base_key(RegistryHive::LocalMachine, RegistryView::View64)
            .ok_or_else(|| IdentityError::Unavailable("HKLM unavailable".into()))?;
        let key = base
            .open_sub_key(r"SOFTWARE\Microsoft\Cryptography")
            .ok_or_else(|| {
                IdentityError::Unavailable(r"HKLM\SOFTWARE\Microsoft\Cryptography missing".into())
            })?;
        key.try_get_string("MachineGuid")
            .ok_or_else(|| IdentityError::Unavailable("MachineGuid value missing".into()))
    }
}

#[cfg(not(any(target_os = "linux", windows)))]
impl HostIdentity for MachineIdentity {
    fn identity_string(&self) -> Result<String, IdentityError> {
        Err(IdentityError::Unavailable(
            "no machine identifier source on this platform".into(),
        ))
    }
}

/// Fixed identity for tests: always returns the same string.
#[derive(Debug, Clone)]
pub struct FixedIdentity(String);

impl FixedIdentity {
    /// Create an identity pinned to `value`.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl HostIdentity for FixedIdentity {
    fn identity_string(&self) -> Result<String, IdentityError> {
        Ok(self.0.clone())
    }
}
