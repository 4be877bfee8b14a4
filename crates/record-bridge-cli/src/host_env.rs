//! The host half of the encapsulated convention.
//!
//! Native code never sees an `ExampleRecord` directly. It gets an opaque handle and a `HostEnv`
//! whose callbacks resolve fields by name and signature, then read and write them. Callbacks
//! report failures by raising a pending exception on the `HostContext`; they never panic.

use std::cell::RefCell;
use std::ffi::c_void;

use record_bridge_core::abi::{HostEnv, ObjectHandle, RawFieldId, StrAbi, INVALID_FIELD_ID};
use record_bridge_core::types::FieldType;
use record_bridge_core::{INT_ARRAY_LEN, LAYOUT_VERSION};

use crate::record::{ExampleRecord, RecordClass};

struct FieldDescriptor {
    name: &'static str,
    ty: FieldType,
    is_static: bool,
}

/// Fields exposed to native code. A field id is the index into this table.
const FIELDS: [FieldDescriptor; 3] = [
    FieldDescriptor {
        name: "int_field",
        ty: FieldType::Int,
        is_static: false,
    },
    FieldDescriptor {
        name: "int_array",
        ty: FieldType::IntArray,
        is_static: false,
    },
    FieldDescriptor {
        name: "string_field",
        ty: FieldType::Text,
        is_static: true,
    },
];

fn find_field(name: &str, signature: &str, is_static: bool) -> Option<RawFieldId> {
    let ty = signature.parse::<FieldType>().ok()?;
    FIELDS
        .iter()
        .position(|f| f.name == name && f.ty == ty && f.is_static == is_static)
        .map(|i| i as RawFieldId)
}

fn check_field(id: RawFieldId, ty: FieldType, is_static: bool) -> Result<(), String> {
    let kind = if is_static { "a static" } else { "an instance" };
    match FIELDS.get(id as usize) {
        Some(f) if id >= 0 && f.ty == ty && f.is_static == is_static => Ok(()),
        _ => Err(format!("field id {} is not {} field of type {}", id, kind, ty)),
    }
}

/// Per-call host state reachable from `HostEnv::context`.
pub struct HostContext<'c> {
    class: &'c RecordClass,
    pending: RefCell<Option<String>>,
}

impl<'c> HostContext<'c> {
    pub fn new(class: &'c RecordClass) -> Self {
        Self {
            class,
            pending: RefCell::new(None),
        }
    }

    /// Record an exception unless one is already pending.
    fn raise(&self, message: String) {
        let mut pending = self.pending.borrow_mut();
        if pending.is_none() {
            log::debug!("native call raised: {}", message);
            *pending = Some(message);
        }
    }

    pub fn take_exception(&self) -> Option<String> {
        self.pending.borrow_mut().take()
    }

    /// Builds the callback table. It borrows `self` through a raw pointer, so it must not be
    /// used after `self` is dropped.
    pub fn host_env(&self) -> HostEnv {
        HostEnv {
            version: LAYOUT_VERSION,
            context: self as *const HostContext as *mut c_void,
            get_field_id,
            get_static_field_id,
            get_int_field,
            set_int_field,
            get_array_length,
            get_int_array_region,
            set_int_array_region,
            get_static_text,
            set_static_text,
            throw,
            exception_check,
        }
    }
}

pub fn object_handle(record: &mut ExampleRecord) -> ObjectHandle {
    ObjectHandle(record as *mut ExampleRecord as *mut c_void)
}

unsafe fn context<'a>(env: *const HostEnv) -> &'a HostContext<'a> {
    &*((*env).context as *const HostContext)
}

unsafe fn record<'a>(obj: ObjectHandle) -> Option<&'a mut ExampleRecord<'a>> {
    (obj.0 as *mut ExampleRecord).as_mut()
}

/// Resolves the record behind `obj` after checking `id`, raising on failure.
unsafe fn instance<'a>(
    env: *const HostEnv,
    obj: ObjectHandle,
    id: RawFieldId,
    ty: FieldType,
) -> Option<&'a mut ExampleRecord<'a>> {
    let ctx = context(env);
    if let Err(message) = check_field(id, ty, false) {
        ctx.raise(message);
        return None;
    }
    match record(obj) {
        Some(record) => Some(record),
        None => {
            ctx.raise("null object handle".to_string());
            None
        }
    }
}

unsafe fn lookup(env: *const HostEnv, name: StrAbi, signature: StrAbi, is_static: bool) -> RawFieldId {
    let ctx = context(env);
    let (name, signature) = match (name.as_str(), signature.as_str()) {
        (Some(name), Some(signature)) => (name, signature),
        _ => {
            ctx.raise("field name or signature is not valid utf8".to_string());
            return INVALID_FIELD_ID;
        }
    };

    match find_field(name, signature, is_static) {
        Some(id) => id,
        None => {
            let kind = if is_static { "static field" } else { "field" };
            ctx.raise(format!("no {} `{}` with signature `{}`", kind, name, signature));
            INVALID_FIELD_ID
        }
    }
}

unsafe extern "C" fn get_field_id(env: *const HostEnv, name: StrAbi, signature: StrAbi) -> RawFieldId {
    lookup(env, name, signature, false)
}

unsafe extern "C" fn get_static_field_id(
    env: *const HostEnv,
    name: StrAbi,
    signature: StrAbi,
) -> RawFieldId {
    lookup(env, name, signature, true)
}

unsafe extern "C" fn get_int_field(env: *const HostEnv, obj: ObjectHandle, id: RawFieldId) -> i32 {
    match instance(env, obj, id, FieldType::Int) {
        Some(record) => record.int_field,
        None => 0,
    }
}

unsafe extern "C" fn set_int_field(env: *const HostEnv, obj: ObjectHandle, id: RawFieldId, value: i32) {
    if let Some(record) = instance(env, obj, id, FieldType::Int) {
        record.int_field = value;
    }
}

unsafe extern "C" fn get_array_length(env: *const HostEnv, obj: ObjectHandle, id: RawFieldId) -> i32 {
    match instance(env, obj, id, FieldType::IntArray) {
        Some(record) => record.int_array.len() as i32,
        None => 0,
    }
}

/// Checks a `[start, start + len)` region against the fixed array length.
fn region(start: i32, len: i32) -> Result<std::ops::Range<usize>, String> {
    let end = start.checked_add(len);
    match end {
        Some(end) if start >= 0 && len >= 0 && end as usize <= INT_ARRAY_LEN => {
            Ok(start as usize..end as usize)
        }
        _ => Err(format!(
            "array region at {} of length {} is out of bounds for length {}",
            start, len, INT_ARRAY_LEN
        )),
    }
}

unsafe extern "C" fn get_int_array_region(
    env: *const HostEnv,
    obj: ObjectHandle,
    id: RawFieldId,
    start: i32,
    len: i32,
    buf: *mut i32,
) {
    let record = match instance(env, obj, id, FieldType::IntArray) {
        Some(record) => record,
        None => return,
    };
    let range = match region(start, len) {
        Ok(range) => range,
        Err(message) => return context(env).raise(message),
    };
    if range.is_empty() {
        return;
    }
    if buf.is_null() {
        return context(env).raise("null array buffer".to_string());
    }

    std::slice::from_raw_parts_mut(buf, range.len()).copy_from_slice(&record.int_array[range]);
}

unsafe extern "C" fn set_int_array_region(
    env: *const HostEnv,
    obj: ObjectHandle,
    id: RawFieldId,
    start: i32,
    len: i32,
    buf: *const i32,
) {
    let record = match instance(env, obj, id, FieldType::IntArray) {
        Some(record) => record,
        None => return,
    };
    let range = match region(start, len) {
        Ok(range) => range,
        Err(message) => return context(env).raise(message),
    };
    if range.is_empty() {
        return;
    }
    if buf.is_null() {
        return context(env).raise("null array buffer".to_string());
    }

    let values = std::slice::from_raw_parts(buf, range.len());
    record.int_array[range].copy_from_slice(values);
}

unsafe extern "C" fn get_static_text(env: *const HostEnv, id: RawFieldId, buf: *mut u8, cap: u64) -> i64 {
    let ctx = context(env);
    if let Err(message) = check_field(id, FieldType::Text, true) {
        ctx.raise(message);
        return -1;
    }

    let text = ctx.class.string_field();
    let n = text.len().min(cap as usize);
    if n > 0 {
        if buf.is_null() {
            ctx.raise("null text buffer".to_string());
            return -1;
        }
        std::ptr::copy_nonoverlapping(text.as_ptr(), buf, n);
    }

    text.len() as i64
}

unsafe extern "C" fn set_static_text(env: *const HostEnv, id: RawFieldId, value: StrAbi) {
    let ctx = context(env);
    if let Err(message) = check_field(id, FieldType::Text, true) {
        return ctx.raise(message);
    }

    match value.as_str() {
        Some(text) => ctx.class.set_string_field(text),
        None => ctx.raise("static text is not valid utf8".to_string()),
    }
}

unsafe extern "C" fn throw(env: *const HostEnv, message: StrAbi) {
    let message = message.as_str().unwrap_or("<message is not valid utf8>");
    context(env).raise(message.to_string());
}

unsafe extern "C" fn exception_check(env: *const HostEnv) -> bool {
    context(env).pending.borrow().is_some()
}
