//! One complete run: print the record, call into native code, print it again.

use std::io::{self, Write};

use crate::binding::{self, Convention, NativeBinding};
use crate::error::ForeignCallError;
use crate::record::{ExampleRecord, RecordClass, RecordSnapshot, INITIAL_INT_ARRAY};

/// What a run observed.
#[derive(Debug)]
pub struct Outcome {
    pub before: RecordSnapshot,
    pub after: RecordSnapshot,
    pub error: Option<ForeignCallError>,
}

/// Runs the demo against `binding`, or reports why there is no binding to run against.
///
/// A failed call is written to `out` as an `Exception:` line and does not stop the run. Only
/// failures to write `out` are returned as errors.
pub fn run<W: Write>(
    out: &mut W,
    convention: Convention,
    class: &RecordClass,
    binding: Result<&dyn NativeBinding, ForeignCallError>,
) -> io::Result<Outcome> {
    let mut record = ExampleRecord::new(class);
    record.int_array[0] = INITIAL_INT_ARRAY[0];
    record.int_array[1] = INITIAL_INT_ARRAY[1];

    let before = record.snapshot();
    writeln!(out, "Before native call:")?;
    write!(out, "{}", before)?;
    out.flush()?;

    let result = binding.and_then(|native| binding::invoke(native, convention, &mut record));
    let error = match result {
        Ok(()) => None,
        Err(e) => {
            log::warn!("{} native call failed: {}", convention, e);
            writeln!(out, "Exception: {}", e)?;
            Some(e)
        }
    };

    let after = record.snapshot();
    writeln!(out, "After native call:")?;
    write!(out, "{}", after)?;
    out.flush()?;

    Ok(Outcome {
        before,
        after,
        error,
    })
}
