//! Read-only registry capability.
//!
//! Handlers that consult the Windows registry do so through the [`Registry`]
//! trait, never through `winreg` directly. On non-Windows hosts the
//! capability is simply absent (`None` is passed), and resolution falls
//! through to default directories. [`InMemoryRegistry`] provides a plain-data
//! implementation for tests on any host.
//!
//! Handles are scoped: opened, read, and dropped within one lookup. Nothing
//! here holds a registry handle between discovery calls.

use std::collections::HashMap;

/// Top-level registry hive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryHive {
    /// `HKEY_CURRENT_USER`
    CurrentUser,
    /// `HKEY_LOCAL_MACHINE`
    LocalMachine,
}

/// Registry view for WOW64 redirection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RegistryView {
    /// Whatever the process would see natively.
    #[default]
    Default,
    /// Force the 32-bit view.
    View32,
    /// Force the 64-bit view.
    View64,
}

/// A registry capability.
pub trait Registry {
    /// Open a base key for a hive. `None` when the hive is unavailable.
    fn open_base_key(
        &self,
        hive: RegistryHive,
        view: RegistryView,
    ) -> Option<Box<dyn RegistryKey + '_>>;
}

/// An open registry key.
pub trait RegistryKey {
    /// Open a subkey below this one. `None` when it does not exist.
    ///
    /// `path` uses backslash separators and is matched case-insensitively,
    /// as the real registry does.
    fn open_sub_key(&self, path: &str) -> Option<Box<dyn RegistryKey + '_>>;

    /// Read a string value. `None` when the value is absent or not a string.
    fn try_get_string(&self, name: &str) -> Option<String>;
}

fn fold_path(path: &str) -> String {
    path.trim_matches('\\').to_ascii_lowercase()
}

/// In-memory registry for tests and non-Windows hosts.
///
/// Populate with [`InMemoryRegistry::add_string`], then hand out as
/// `&dyn Registry`.
///
/// # Example
///
/// ```
/// use gamescout::sys::{InMemoryRegistry, Registry, RegistryHive, RegistryView};
///
/// let mut registry = InMemoryRegistry::new();
/// registry.add_string(
///     RegistryHive::CurrentUser,
///     RegistryView::Default,
///     r"Software\Valve\Steam",
///     "SteamPath",
///     "/home/user/.steam/steam",
/// );
///
/// let base = registry
///     .open_base_key(RegistryHive::CurrentUser, RegistryView::Default)
///     .unwrap();
/// let key = base.open_sub_key(r"Software\Valve\Steam").unwrap();
/// assert_eq!(key.try_get_string("SteamPath").as_deref(), Some("/home/user/.steam/steam"));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    keys: HashMap<(RegistryHive, RegistryView, String), HashMap<String, String>>,
}

impl InMemoryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a string value, creating the key if needed.
    pub fn add_string(
        &mut self,
        hive: RegistryHive,
        view: RegistryView,
        key_path: &str,
        name: &str,
        value: impl Into<String>,
    ) {
        self.keys
            .entry((hive, view, fold_path(key_path)))
            .or_default()
            .insert(name.to_ascii_lowercase(), value.into());
    }

    fn lookup(
        &self,
        hive: RegistryHive,
        view: RegistryView,
        path: &str,
    ) -> Option<&HashMap<String, String>> {
        self.keys.get(&(hive, view, fold_path(path)))
    }
}

impl Registry for InMemoryRegistry {
    fn open_base_key(
        &self,
        hive: RegistryHive,
        view: RegistryView,
    ) -> Option<Box<dyn RegistryKey + '_>> {
        Some(Box::new(InMemoryKey {
            registry: self,
            hive,
            view,
            path: String::new(),
        }))
    }
}

struct InMemoryKey<'a> {
    registry: &'a InMemoryRegistry,
    hive: RegistryHive,
    view: RegistryView,
    path: String,
}

impl InMemoryKey<'_> {
    fn join(&self, sub: &str) -> String {
        if self.path.is_empty() {
            fold_path(sub)
        } else {
            format!("{}\\{}", self.path, fold_path(sub))
        }
    }
}

impl RegistryKey for InMemoryKey<'_> {
    fn open_sub_key(&self, path: &str) -> Option<Box<dyn RegistryKey + '_>> {
        let full = self.join(path);
        self.registry.lookup(self.hive, self.view, &full)?;
        Some(Box::new(InMemoryKey {
            registry: self.registry,
            hive: self.hive,
            view: self.view,
            path: full,
        }))
    }

    fn try_get_string(&self, name: &str) -> Option<String> {
        self.registry
            .lookup(self.hive, self.view, &self.path)?
            .get(&name.to_ascii_lowercase())
            .cloned()
    }
}

/// Registry backed by the real Windows registry.
#[cfg(windows)]
#[derive(Debug, Default)]
pub struct WindowsRegistry;

#[cfg(windows)]
mod windows_impl {
    use winreg::enums::{
        HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, KEY_READ, KEY_WOW64_32KEY, KEY_WOW64_64KEY,
    };
    use winreg::RegKey;

    use super::{Registry, RegistryHive, RegistryKey, RegistryView, WindowsRegistry};

    impl WindowsRegistry {
        /// Create a registry handle. Cheap; holds nothing open.
        pub fn new() -> Self {
            Self
        }
    }

    fn access_flags(view: RegistryView) -> u32 {
        match view {
            RegistryView::Default => KEY_READ,
            RegistryView::View32 => KEY_READ | KEY_WOW64_32KEY,
            RegistryView::View64 => KEY_READ | KEY_WOW64_64KEY,
        }
    }

    impl Registry for WindowsRegistry {
        fn open_base_key(
            &self,
            hive: RegistryHive,
            view: RegistryView,
        ) -> Option<Box<dyn RegistryKey + '_>> {
            let hkey = match hive {
                RegistryHive::CurrentUser => HKEY_CURRENT_USER,
                RegistryHive::LocalMachine => HKEY_LOCAL_MACHINE,
            };
            Some(Box::new(WindowsKey {
                key: RegKey::predef(hkey),
                view,
            }))
        }
    }

    struct WindowsKey {
        key: RegKey,
        view: RegistryView,
    }

    impl RegistryKey for WindowsKey {
        fn open_sub_key(&self, path: &str) -> Option<Box<dyn RegistryKey + '_>> {
            let sub = self
                .key
                .open_subkey_with_flags(path, access_flags(self.view))
                .ok()?;
            Some(Box::new(WindowsKey {
                key: sub,
                view: self.view,
            }))
        }

        fn try_get_string(&self, name: &str) -> Option<String> {
            self.key.get_value::<String, _>(name).ok()
        }
    }
}
