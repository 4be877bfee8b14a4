//! Core types, methods, and constants shared between the host process and the native library.
//!
//! This component is intended to be fairly minimal, to reduce the impact of having it included
//! in native code.

pub mod abi;
pub mod entry;
pub mod env;
mod error;
pub mod types;

pub use crate::error::{AbiError, EnvError};

/// Version of both the `RecordAbi` layout and the `HostEnv` table.
///
/// Bump this whenever either of them changes shape.
pub const LAYOUT_VERSION: u32 = 1;

/// Number of elements in a record's integer array. Fixed for the lifetime of a record.
pub const INT_ARRAY_LEN: usize = 2;

/// Capacity in bytes of the inline text buffer used by the raw convention.
pub const TEXT_CAPACITY: usize = 64;

/// Every symbol exported by a native library starts with this prefix.
pub const ENTRY_SYMBOL_PREFIX: &'static str = "record_bridge_";

/// Entry point taking a `HostEnv` and an opaque object handle.
pub const ENCAPSULATED_ENTRY_SYMBOL: &'static str = "record_bridge_native_call";

/// Entry point taking a pointer to a `RecordAbi`.
pub const RAW_ENTRY_SYMBOL: &'static str = "record_bridge_raw_native_call";

/// Reports the `LAYOUT_VERSION` the native library was built against.
pub const LAYOUT_VERSION_SYMBOL: &'static str = "record_bridge_layout_version";

/// All symbols a native library must export.
pub const REQUIRED_SYMBOLS: [&'static str; 3] = [
    LAYOUT_VERSION_SYMBOL,
    ENCAPSULATED_ENTRY_SYMBOL,
    RAW_ENTRY_SYMBOL,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_share_prefix() {
        for symbol in REQUIRED_SYMBOLS.iter() {
            assert!(symbol.starts_with(ENTRY_SYMBOL_PREFIX), "{}", symbol);
        }
    }
}
