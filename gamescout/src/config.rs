//! Optional INI configuration.
//!
//! Callers (the CLI, chiefly) can pin platform roots and scan options in a
//! small INI file instead of passing flags every run:
//!
//! ```ini
//! [scan]
//! installed_only = false
//!
//! [steam]
//! path = /mnt/games/Steam
//!
//! [ea]
//! path = /mnt/games/EA Desktop
//! schema_policy = warn
//!
//! [winget]
//! client = C:\Users\me\AppData\Local\Microsoft\WindowsApps
//! query = game
//! ```
//!
//! A missing file yields defaults; a malformed file is one error. The
//! library never reads configuration implicitly: values are applied only
//! where the caller maps them onto platform specs.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::blob::SchemaPolicy;

/// Errors loading a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read or parsed.
    #[error("malformed config {path}: {source}")]
    Parse {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying parser error.
        #[source]
        source: ini::Error,
    },

    /// A key has a value outside its accepted set.
    #[error("invalid value \"{value}\" for {section}.{key}")]
    InvalidValue {
        /// Section the key lives in.
        section: String,
        /// Key name.
        key: String,
        /// The rejected value.
        value: String,
    },
}

/// Loaded configuration with defaults for everything absent.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    /// Explicit Steam root.
    pub steam_path: Option<PathBuf>,
    /// Explicit EA data folder.
    pub ea_path: Option<PathBuf>,
    /// Schema policy for the EA install database.
    pub ea_schema_policy: SchemaPolicy,
    /// Directory containing the winget client.
    pub winget_client_dir: Option<PathBuf>,
    /// Search query for the winget remote source.
    pub winget_query: Option<String>,
    /// Skip remote sources entirely.
    pub installed_only: bool,
}

impl ConfigFile {
    /// Default config file location for this user.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gamescout").join("config.ini"))
    }

    /// Load from `path`; a nonexistent file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::default();

        if let Some(scan) = ini.section(Some("scan")) {
            if let Some(value) = scan.get("installed_only") {
                config.installed_only = parse_bool("scan", "installed_only", value)?;
            }
        }
        if let Some(steam) = ini.section(Some("steam")) {
            config.steam_path = steam.get("path").map(PathBuf::from);
        }
        if let Some(ea) = ini.section(Some("ea")) {
            config.ea_path = ea.get("path").map(PathBuf::from);
            if let Some(value) = ea.get("schema_policy") {
                config.ea_schema_policy = parse_schema_policy(value)?;
            }
        }
        if let Some(winget) = ini.section(Some("winget")) {
            config.winget_client_dir = winget.get("client").map(PathBuf::from);
            config.winget_query = winget.get("query").map(str::to_owned);
        }

        Ok(config)
    }
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            section: section.into(),
            key: key.into(),
            value: value.into(),
        }),
    }
}

fn parse_schema_policy(value: &str) -> Result<SchemaPolicy, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "warn" => Ok(SchemaPolicy::Warn),
        "error" => Ok(SchemaPolicy::Error),
        "ignore" => Ok(SchemaPolicy::Ignore),
        _ => Err(ConfigError::InvalidValue {
            section: "ea".into(),
            key: "schema_policy".into(),
            value: value.into(),
        }),
    }
}
