//! Pass a host-owned record to native code, under either of two calling conventions.
//!
//! Native libraries depend on this crate for the `#[record_entry]` attribute and the shared ABI.

pub use record_bridge_core::{abi, entry, env, types, AbiError, EnvError};
pub use record_bridge_macro::record_entry;
