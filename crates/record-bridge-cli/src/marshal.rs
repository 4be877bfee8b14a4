//! Copying a record in and out of the raw `repr(C)` layout.

use record_bridge_core::abi::{RecordAbi, TextAbi};
use record_bridge_core::AbiError;

use crate::record::ExampleRecord;

pub fn to_abi(record: &ExampleRecord) -> Result<RecordAbi, AbiError> {
    let string_field = TextAbi::encode(&record.string_field())?;
    Ok(RecordAbi::new(
        record.int_field,
        record.int_array,
        string_field,
    ))
}

/// Write every field of `abi` back into `record`. Nothing is written unless all of it is valid.
pub fn from_abi(abi: &RecordAbi, record: &mut ExampleRecord) -> Result<(), AbiError> {
    abi.check_layout()?;
    let string_field = abi.string_field.as_str()?;

    record.int_field = abi.int_field;
    record.int_array = abi.int_array;
    record.class().set_string_field(string_field);

    Ok(())
}
