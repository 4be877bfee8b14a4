//! The native side: prints the record it was handed, then overwrites every field.
//!
//! Both entry points have the same observable effect and differ only in how the record reaches
//! them.

use record_bridge::abi::{ObjectHandle, RecordAbi, TextAbi};
use record_bridge::env::Env;
use record_bridge::{record_entry, AbiError, EnvError};
use record_bridge_core::{INT_ARRAY_LEN, LAYOUT_VERSION};

pub const NEW_INT_FIELD: i32 = 42;
pub const NEW_INT_ARRAY: [i32; INT_ARRAY_LEN] = [29, 31];
pub const NEW_STRING_FIELD: &'static str = "Good-bye, world!";

#[no_mangle]
pub extern "C" fn record_bridge_layout_version() -> u32 {
    LAYOUT_VERSION
}

fn print_state(int_field: i32, string_field: &str, int_array: &[i32]) {
    let elements = int_array
        .iter()
        .enumerate()
        .map(|(i, v)| format!("int_array[{}] = {}", i, v))
        .collect::<Vec<_>>()
        .join(", ");

    println!("In native call:");
    println!(
        "  int_field = {}, string_field = {}",
        int_field, string_field
    );
    println!("  {}", elements);
}

#[record_entry(encapsulated)]
fn native_call(env: &Env, record: ObjectHandle) -> Result<(), EnvError> {
    let mut int_field = env.field::<i32>(record, "int_field")?;
    let mut int_array = env.field::<Vec<i32>>(record, "int_array")?;
    let mut string_field = env.static_field::<String>("string_field")?;

    let mut elements = int_array.elements()?;
    print_state(int_field.get()?, &string_field.get()?, &elements);

    int_field.set(&NEW_INT_FIELD)?;
    for (element, value) in elements.iter_mut().zip(NEW_INT_ARRAY.iter()) {
        *element = *value;
    }
    elements.release()?;
    string_field.set(&NEW_STRING_FIELD.to_string())?;

    Ok(())
}

#[record_entry(raw)]
fn raw_native_call(record: &mut RecordAbi) -> Result<(), AbiError> {
    print_state(
        record.int_field,
        record.string_field.as_str()?,
        &record.int_array,
    );

    record.int_field = NEW_INT_FIELD;
    record.int_array = NEW_INT_ARRAY;
    record.string_field = TextAbi::encode(NEW_STRING_FIELD)?;

    Ok(())
}
