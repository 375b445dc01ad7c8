//! Versioned, encrypted JSON blob parser.
//!
//! Some launchers keep their install database as an encrypted JSON payload
//! carrying a schema version:
//!
//! ```json
//! {
//!   "schema": { "version": 21 },
//!   "installInfos": [
//!     { "softwareId": "...", "baseSlug": "...", "baseInstallPath": "..." }
//!   ]
//! }
//! ```
//!
//! This module handles the format: decrypt (see [`crypto`]), deserialize
//! the envelope, and judge the schema version against a [`SchemaPolicy`].
//! Mapping entries onto records, and deciding which fields are required,
//! belongs to the platform adapter.
//!
//! Decryption and deserialization failures are ordinary [`BlobError`]
//! values; nothing in this path panics or lets a raw error escape the
//! enumeration that drives it.

pub mod crypto;

use serde::Deserialize;
use thiserror::Error;

use crate::sys::{HostIdentity, IdentityError};

pub use crypto::CryptoError;

/// What to do when a blob's schema version is not the supported one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaPolicy {
    /// Emit a warning outcome and parse anyway.
    #[default]
    Warn,
    /// Emit an error outcome and stop.
    Error,
    /// Parse silently.
    Ignore,
}

/// Errors reading a blob.
#[derive(Debug, Error)]
pub enum BlobError {
    /// The blob file could not be read.
    #[error("failed to read blob: {0}")]
    Io(#[from] std::io::Error),

    /// Host identity material was unavailable.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Decryption failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The plaintext is not the expected JSON envelope.
    #[error("failed to deserialize blob envelope: {0}")]
    Deserialize(#[from] serde_json::Error),

    /// The envelope has no schema version.
    #[error("blob envelope does not have a schema version")]
    MissingSchemaVersion,
}

/// One entry of the install database.
///
/// Every field is optional at this layer; the platform adapter decides
/// which absences are field errors.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct InstallInfo {
    /// Identity of the installed software.
    pub software_id: Option<String>,
    /// Human-oriented slug (doubles as a display name).
    pub base_slug: Option<String>,
    /// Absolute install directory.
    pub base_install_path: Option<String>,
    /// Version installed locally.
    pub installed_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    schema: Option<Schema>,
    #[serde(default)]
    install_infos: Vec<InstallInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Schema {
    version: Option<u32>,
}

/// A parsed blob: schema version plus its entries.
#[derive(Debug, Clone)]
pub struct BlobDocument {
    /// The envelope's schema version.
    pub schema_version: u32,
    /// Entries in document order.
    pub entries: Vec<InstallInfo>,
}

/// Verdict of a schema-version check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaCheck {
    /// Version matches, or policy says ignore.
    Ok,
    /// Mismatch under [`SchemaPolicy::Warn`]: surface the message, then
    /// parse anyway.
    Warn(String),
    /// Mismatch under [`SchemaPolicy::Error`]: surface the message and
    /// stop.
    Fail(String),
}

/// Decrypt raw blob bytes using key material derived from the host.
pub fn decrypt_blob(raw: &[u8], identity: &dyn HostIdentity) -> Result<String, BlobError> {
    let identity_string = identity.identity_string()?;
    let key = crypto::derive_key(&identity_string);
    Ok(crypto::decrypt(raw, &key)?)
}

/// Deserialize plaintext into a [`BlobDocument`].
///
/// Unknown fields are ignored; a missing schema version is an error (there
/// is no sensible default to judge compatibility against).
pub fn parse_envelope(plaintext: &str) -> Result<BlobDocument, BlobError> {
    let envelope: Envelope = serde_json::from_str(plaintext)?;
    let schema_version = envelope
        .schema
        .and_then(|s| s.version)
        .ok_or(BlobError::MissingSchemaVersion)?;

    Ok(BlobDocument {
        schema_version,
        entries: envelope.install_infos,
    })
}

/// Judge a blob's schema version against the supported one.
pub fn check_schema(found: u32, supported: u32, policy: SchemaPolicy) -> SchemaCheck {
    if found == supported {
        return SchemaCheck::Ok;
    }
    match policy {
        SchemaPolicy::Ignore => SchemaCheck::Ok,
        SchemaPolicy::Warn => SchemaCheck::Warn(format!(
            "blob has schema version {found} but only version {supported} is supported; \
             parsing anyway because the schema policy is Warn"
        )),
        SchemaPolicy::Error => SchemaCheck::Fail(format!(
            "blob has schema version {found} but only version {supported} is supported"
        )),
    }
}
