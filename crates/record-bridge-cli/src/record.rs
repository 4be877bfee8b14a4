//! The host-side record and the class that owns its shared text field.

use std::fmt;
use std::sync::{OnceLock, RwLock};

use record_bridge_core::INT_ARRAY_LEN;

pub const INITIAL_INT_FIELD: i32 = 17;
pub const INITIAL_INT_ARRAY: [i32; INT_ARRAY_LEN] = [19, 23];
pub const INITIAL_STRING_FIELD: &'static str = "Hello, world!";

/// Class-wide state shared by every `ExampleRecord` built from it.
///
/// `string_field` lives here rather than on the record, so a write through one record is visible
/// through all of them. All writes go through `set_string_field`.
#[derive(Debug)]
pub struct RecordClass {
    string_field: RwLock<String>,
}

impl RecordClass {
    pub fn new() -> Self {
        Self {
            string_field: RwLock::new(INITIAL_STRING_FIELD.to_string()),
        }
    }

    /// The process-wide class.
    pub fn global() -> &'static RecordClass {
        static CLASS: OnceLock<RecordClass> = OnceLock::new();
        CLASS.get_or_init(RecordClass::new)
    }

    pub fn string_field(&self) -> String {
        match self.string_field.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_string_field(&self, value: &str) {
        let mut guard = match self.string_field.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = value.to_string();
    }
}

impl Default for RecordClass {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ExampleRecord<'c> {
    class: &'c RecordClass,
    pub int_field: i32,
    pub int_array: [i32; INT_ARRAY_LEN],
}

impl<'c> ExampleRecord<'c> {
    /// A fresh record. The array starts zeroed and is populated by the caller.
    pub fn new(class: &'c RecordClass) -> Self {
        Self {
            class,
            int_field: INITIAL_INT_FIELD,
            int_array: [0; INT_ARRAY_LEN],
        }
    }

    pub fn class(&self) -> &'c RecordClass {
        self.class
    }

    pub fn string_field(&self) -> String {
        self.class.string_field()
    }

    pub fn snapshot(&self) -> RecordSnapshot {
        RecordSnapshot {
            int_field: self.int_field,
            string_field: self.string_field(),
            int_array: self.int_array,
        }
    }
}

/// Field values of a record at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSnapshot {
    pub int_field: i32,
    pub string_field: String,
    pub int_array: [i32; INT_ARRAY_LEN],
}

impl fmt::Display for RecordSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "  int_field = {}, string_field = {}",
            self.int_field, self.string_field
        )?;
        writeln!(
            f,
            "  int_array[0] = {}, int_array[1] = {}",
            self.int_array[0], self.int_array[1]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_record() {
        let class = RecordClass::new();
        let mut record = ExampleRecord::new(&class);
        record.int_array = INITIAL_INT_ARRAY;

        assert_eq!(
            record.snapshot(),
            RecordSnapshot {
                int_field: 17,
                string_field: "Hello, world!".to_string(),
                int_array: [19, 23],
            }
        );
    }

    #[test]
    fn string_field_is_shared_by_the_class() {
        let class = RecordClass::new();
        let first = ExampleRecord::new(&class);
        let second = ExampleRecord::new(&class);

        first.class().set_string_field("changed");

        assert_eq!(second.string_field(), "changed");
        assert_eq!(first.string_field(), "changed");
    }

    #[test]
    fn snapshot_display() {
        let snapshot = RecordSnapshot {
            int_field: 17,
            string_field: "Hello, world!".to_string(),
            int_array: [19, 23],
        };

        assert_eq!(
            snapshot.to_string(),
            "  int_field = 17, string_field = Hello, world!\n  int_array[0] = 19, int_array[1] = 23\n"
        );
    }
}
