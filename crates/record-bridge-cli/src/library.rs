//! Loading the native library with `libloading`.

use std::sync::OnceLock;

use libloading::{Library, Symbol};

use record_bridge_core::abi::{EncapsulatedEntry, LayoutVersionFn, RawEntry};
use record_bridge_core::{
    ENCAPSULATED_ENTRY_SYMBOL, LAYOUT_VERSION, LAYOUT_VERSION_SYMBOL, RAW_ENTRY_SYMBOL,
};

use crate::binding::NativeBinding;
use crate::config::LibraryLocation;
use crate::error::ForeignCallError;
use crate::exports;

/// A loaded native library with its entry points resolved.
///
/// The entry points are only valid while `_library` is alive.
pub struct DynamicLibrary {
    _library: Library,
    encapsulated: EncapsulatedEntry,
    raw: RawEntry,
}

unsafe fn symbol<T: Copy>(library: &Library, name: &'static str) -> Result<T, ForeignCallError> {
    let symbol: Symbol<T> = library
        .get(name.as_bytes())
        .map_err(|e| ForeignCallError::MissingSymbol {
            symbol: name,
            reason: e.to_string(),
        })?;
    Ok(*symbol)
}

impl DynamicLibrary {
    pub fn load(location: &LibraryLocation) -> Result<Self, ForeignCallError> {
        if let LibraryLocation::File(path) = location {
            exports::check_exports(path)?;
        }

        let library = unsafe { Library::new(location.as_os_str()) }.map_err(|e| {
            ForeignCallError::LibraryLoad {
                library: location.to_string(),
                reason: e.to_string(),
            }
        })?;

        let layout_version = unsafe { symbol::<LayoutVersionFn>(&library, LAYOUT_VERSION_SYMBOL)? };
        let found = layout_version();
        if found != LAYOUT_VERSION {
            return Err(ForeignCallError::LayoutMismatch {
                expected: LAYOUT_VERSION,
                found,
            });
        }

        let encapsulated = unsafe { symbol::<EncapsulatedEntry>(&library, ENCAPSULATED_ENTRY_SYMBOL)? };
        let raw = unsafe { symbol::<RawEntry>(&library, RAW_ENTRY_SYMBOL)? };

        Ok(Self {
            _library: library,
            encapsulated,
            raw,
        })
    }

    /// Loads the library on first use and caches the outcome, failure included, for the rest of
    /// the process. The library is never unloaded.
    pub fn global(location: &LibraryLocation) -> Result<&'static DynamicLibrary, &'static ForeignCallError> {
        static LIBRARY: OnceLock<Result<DynamicLibrary, ForeignCallError>> = OnceLock::new();

        LIBRARY
            .get_or_init(|| {
                let loaded = Self::load(location);
                match &loaded {
                    Ok(_) => log::debug!("loaded native library {}", location),
                    Err(e) => log::error!("{}", e),
                }
                loaded
            })
            .as_ref()
    }
}

impl NativeBinding for DynamicLibrary {
    fn encapsulated_entry(&self) -> Result<EncapsulatedEntry, ForeignCallError> {
        Ok(self.encapsulated)
    }

    fn raw_entry(&self) -> Result<RawEntry, ForeignCallError> {
        Ok(self.raw)
    }
}
