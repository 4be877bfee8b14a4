//! Host configuration, resolved from the environment.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::binding::Convention;

/// Overrides the native library location.
pub const LIBRARY_ENV_VAR: &'static str = "RECORD_BRIDGE_LIBRARY";

/// Base name of the native library, without platform prefix or extension.
pub const LIBRARY_NAME: &'static str = "record_bridge_native";

/// Where the native library is loaded from.
#[derive(Debug, Clone, PartialEq)]
pub enum LibraryLocation {
    /// A concrete file, which can be inspected before it is loaded.
    File(PathBuf),
    /// A bare file name, resolved by the platform loader's search path.
    SearchPath(OsString),
}

impl LibraryLocation {
    pub fn as_os_str(&self) -> &OsStr {
        match self {
            LibraryLocation::File(path) => path.as_os_str(),
            LibraryLocation::SearchPath(name) => name.as_os_str(),
        }
    }
}

impl fmt::Display for LibraryLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LibraryLocation::File(path) => write!(f, "{}", path.display()),
            LibraryLocation::SearchPath(name) => write!(f, "{}", name.to_string_lossy()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub convention: Convention,
    pub library: LibraryLocation,
}

impl Config {
    pub fn from_env(convention: Convention) -> Self {
        let exe = std::env::current_exe().ok();
        Self::from_lookup(convention, |key| std::env::var_os(key), exe.as_deref())
    }

    /// Resolve the configuration from `lookup` instead of the process environment.
    pub fn from_lookup<F>(convention: Convention, lookup: F, exe: Option<&Path>) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let library = match lookup(LIBRARY_ENV_VAR) {
            Some(path) if !path.is_empty() => LibraryLocation::File(path.into()),
            _ => default_library(exe),
        };

        Self {
            convention,
            library,
        }
    }
}

/// The library next to the running executable if there is one, otherwise the bare file name.
fn default_library(exe: Option<&Path>) -> LibraryLocation {
    let file_name = libloading::library_filename(LIBRARY_NAME);

    if let Some(dir) = exe.and_then(Path::parent) {
        let candidate = dir.join(&file_name);
        if candidate.is_file() {
            return LibraryLocation::File(candidate);
        }
    }

    LibraryLocation::SearchPath(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_var_overrides_library() {
        let config = Config::from_lookup(
            Convention::Raw,
            |key| match key {
                LIBRARY_ENV_VAR => Some("/opt/native/libfoo.so".into()),
                _ => None,
            },
            None,
        );

        assert_eq!(config.convention, Convention::Raw);
        assert_eq!(
            config.library,
            LibraryLocation::File("/opt/native/libfoo.so".into())
        );
    }

    #[test]
    fn empty_env_var_is_ignored() {
        let config = Config::from_lookup(Convention::Encapsulated, |_| Some(OsString::new()), None);
        assert_eq!(
            config.library,
            LibraryLocation::SearchPath(libloading::library_filename(LIBRARY_NAME))
        );
    }

    #[test]
    fn falls_back_to_search_path() {
        let missing_dir = Path::new("/nonexistent-record-bridge-dir/record-bridge");
        let config = Config::from_lookup(Convention::Encapsulated, |_| None, Some(missing_dir));

        let location = config.library;
        assert_eq!(
            location,
            LibraryLocation::SearchPath(libloading::library_filename(LIBRARY_NAME))
        );
        assert!(location.to_string().contains(LIBRARY_NAME));
    }
}
