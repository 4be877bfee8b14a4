//! Runtime support for functions annotated with `#[record_entry]`.
//!
//! The generated `extern "C"` wrappers only validate their raw arguments and delegate here.
//! Panics are caught so they never unwind into the host.

use std::any::Any;
use std::fmt::Display;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::abi::{HostEnv, ObjectHandle, RecordAbi};
use crate::env::Env;
use crate::AbiError;

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("native panic: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("native panic: {}", s)
    } else {
        "native panic".to_string()
    }
}

/// Runs an encapsulated entry point body.
///
/// Failures are reported to the host as a pending exception. An exception the host already
/// recorded is kept, since it is closer to the root cause.
///
/// # Safety
///
/// `env` must be null or point at a valid `HostEnv` for the duration of the call, and `obj` must
/// be a handle that host issued.
pub unsafe fn run_encapsulated<F, E>(env: *const HostEnv, obj: ObjectHandle, f: F)
where
    F: FnOnce(&Env, ObjectHandle) -> Result<(), E>,
    E: Display,
{
    let env = match Env::from_raw(env) {
        Ok(env) => env,
        Err(e) => {
            // No way to reach the host.
            eprintln!("Exception: {}", e);
            return;
        }
    };

    let message = match catch_unwind(AssertUnwindSafe(|| f(&env, obj))) {
        Ok(Ok(())) => return,
        Ok(Err(e)) => e.to_string(),
        Err(payload) => panic_message(&*payload),
    };

    if !env.exception_check() {
        env.throw(&message);
    }
}

/// Runs a raw entry point body.
///
/// The raw convention has no channel back to the host, so failures are written to stderr.
///
/// # Safety
///
/// `record` must be null or point at a `RecordAbi` that is valid and exclusively borrowed for
/// the duration of the call.
pub unsafe fn run_raw<F, E>(record: *mut RecordAbi, f: F)
where
    F: FnOnce(&mut RecordAbi) -> Result<(), E>,
    E: Display,
{
    let record = match record.as_mut() {
        Some(record) => record,
        None => {
            eprintln!("Exception: {}", AbiError::NullRecord);
            return;
        }
    };

    if let Err(e) = record.check_layout() {
        eprintln!("Exception: {}", e);
        return;
    }

    match catch_unwind(AssertUnwindSafe(|| f(record))) {
        Ok(Ok(())) => (),
        Ok(Err(e)) => eprintln!("Exception: {}", e),
        Err(payload) => eprintln!("Exception: {}", panic_message(&*payload)),
    }
}
