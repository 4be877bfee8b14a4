//! Selecting and invoking a native entry point.

use std::fmt;

use record_bridge_core::abi::{EncapsulatedEntry, RawEntry};

use crate::error::ForeignCallError;
use crate::host_env::{self, HostContext};
use crate::marshal;
use crate::record::ExampleRecord;

/// Which entry point, and so which calling convention, a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    /// Field access through a `HostEnv` and an opaque handle.
    Encapsulated,
    /// A pointer to a marshalled `RecordAbi`.
    Raw,
}

impl Convention {
    /// No launch arguments selects the encapsulated entry point; any argument selects raw.
    pub fn from_arg_count(count: usize) -> Self {
        if count == 0 {
            Convention::Encapsulated
        } else {
            Convention::Raw
        }
    }
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Convention::Encapsulated => write!(f, "encapsulated"),
            Convention::Raw => write!(f, "raw"),
        }
    }
}

/// Source of native entry points.
pub trait NativeBinding {
    fn encapsulated_entry(&self) -> Result<EncapsulatedEntry, ForeignCallError>;
    fn raw_entry(&self) -> Result<RawEntry, ForeignCallError>;
}

/// Hand `record` to the native entry point for `convention`. Blocks until it returns.
pub fn invoke(
    binding: &dyn NativeBinding,
    convention: Convention,
    record: &mut ExampleRecord,
) -> Result<(), ForeignCallError> {
    match convention {
        Convention::Encapsulated => call_encapsulated(binding.encapsulated_entry()?, record),
        Convention::Raw => call_raw(binding.raw_entry()?, record),
    }
}

fn call_encapsulated(
    entry: EncapsulatedEntry,
    record: &mut ExampleRecord,
) -> Result<(), ForeignCallError> {
    let context = HostContext::new(record.class());
    let env = context.host_env();
    let obj = host_env::object_handle(record);

    unsafe { entry(&env, obj) };

    match context.take_exception() {
        Some(message) => Err(ForeignCallError::Exception(message)),
        None => Ok(()),
    }
}

fn call_raw(entry: RawEntry, record: &mut ExampleRecord) -> Result<(), ForeignCallError> {
    let mut abi = marshal::to_abi(record)?;

    unsafe { entry(&mut abi) };

    marshal::from_abi(&abi, record)?;
    Ok(())
}
