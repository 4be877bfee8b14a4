//! Stable `repr(C)` types that cross the boundary between host and native code.

use std::ffi::c_void;

use crate::{AbiError, INT_ARRAY_LEN, LAYOUT_VERSION, TEXT_CAPACITY};

/// Borrowed utf8 string view, valid only for the duration of the call it is passed to.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct StrAbi {
    pub ptr: *const u8,
    pub len: u64,
}

impl StrAbi {
    pub fn new(s: &str) -> Self {
        Self {
            ptr: s.as_ptr(),
            len: s.len() as u64,
        }
    }

    /// # Safety
    ///
    /// `ptr` must point at `len` readable bytes which outlive `'a`.
    pub unsafe fn as_bytes<'a>(&self) -> &'a [u8] {
        if self.ptr.is_null() || self.len == 0 {
            return &[];
        }
        std::slice::from_raw_parts(self.ptr, self.len as usize)
    }

    /// # Safety
    ///
    /// Same requirements as [`StrAbi::as_bytes`].
    pub unsafe fn as_str<'a>(&self) -> Option<&'a str> {
        std::str::from_utf8(self.as_bytes()).ok()
    }
}

/// Fixed capacity, inline, utf8 text buffer.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct TextAbi {
    pub len: u32,
    pub bytes: [u8; TEXT_CAPACITY],
}

impl TextAbi {
    pub fn encode(s: &str) -> Result<Self, AbiError> {
        let src = s.as_bytes();
        if src.len() > TEXT_CAPACITY {
            return Err(AbiError::TextTooLong {
                len: src.len(),
                capacity: TEXT_CAPACITY,
            });
        }

        let mut bytes = [0u8; TEXT_CAPACITY];
        bytes[..src.len()].copy_from_slice(src);

        Ok(Self {
            len: src.len() as u32,
            bytes,
        })
    }

    pub fn as_str(&self) -> Result<&str, AbiError> {
        let len = self.len as usize;
        let bytes = self.bytes.get(..len).ok_or(AbiError::InvalidText)?;
        std::str::from_utf8(bytes).map_err(|_| AbiError::InvalidText)
    }
}

impl PartialEq for TextAbi {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.bytes[..] == other.bytes[..]
    }
}

impl std::fmt::Debug for TextAbi {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.as_str() {
            Ok(s) => write!(f, "TextAbi({:?})", s),
            Err(_) => write!(f, "TextAbi(<invalid, len {}>)", self.len),
        }
    }
}

/// The record as seen by the raw convention.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordAbi {
    pub layout_version: u32,
    pub int_field: i32,
    pub int_array: [i32; INT_ARRAY_LEN],
    pub string_field: TextAbi,
}

impl RecordAbi {
    pub fn new(int_field: i32, int_array: [i32; INT_ARRAY_LEN], string_field: TextAbi) -> Self {
        Self {
            layout_version: LAYOUT_VERSION,
            int_field,
            int_array,
            string_field,
        }
    }

    pub fn check_layout(&self) -> Result<(), AbiError> {
        if self.layout_version == LAYOUT_VERSION {
            Ok(())
        } else {
            Err(AbiError::LayoutMismatch {
                expected: LAYOUT_VERSION,
                found: self.layout_version,
            })
        }
    }
}

/// Opaque reference to a host object. Only meaningful to the host which handed it out.
#[repr(transparent)]
#[derive(Debug, Clone, Copy)]
pub struct ObjectHandle(pub *mut c_void);

/// Host-assigned field identifier. Negative values mean "not found".
pub type RawFieldId = i32;

pub const INVALID_FIELD_ID: RawFieldId = -1;

/// Table of host callbacks handed to encapsulated entry points.
///
/// Every callback receives the table itself so the host can recover its `context`. A callback
/// that fails records a pending exception on the host side, which native code observes through
/// `exception_check`.
#[repr(C)]
pub struct HostEnv {
    pub version: u32,
    pub context: *mut c_void,

    pub get_field_id:
        unsafe extern "C" fn(env: *const HostEnv, name: StrAbi, signature: StrAbi) -> RawFieldId,
    pub get_static_field_id:
        unsafe extern "C" fn(env: *const HostEnv, name: StrAbi, signature: StrAbi) -> RawFieldId,

    pub get_int_field:
        unsafe extern "C" fn(env: *const HostEnv, obj: ObjectHandle, id: RawFieldId) -> i32,
    pub set_int_field:
        unsafe extern "C" fn(env: *const HostEnv, obj: ObjectHandle, id: RawFieldId, value: i32),

    pub get_array_length:
        unsafe extern "C" fn(env: *const HostEnv, obj: ObjectHandle, id: RawFieldId) -> i32,
    pub get_int_array_region: unsafe extern "C" fn(
        env: *const HostEnv,
        obj: ObjectHandle,
        id: RawFieldId,
        start: i32,
        len: i32,
        buf: *mut i32,
    ),
    pub set_int_array_region: unsafe extern "C" fn(
        env: *const HostEnv,
        obj: ObjectHandle,
        id: RawFieldId,
        start: i32,
        len: i32,
        buf: *const i32,
    ),

    /// Copies up to `cap` bytes into `buf` and returns the full length of the text, or a
    /// negative value on failure.
    pub get_static_text:
        unsafe extern "C" fn(env: *const HostEnv, id: RawFieldId, buf: *mut u8, cap: u64) -> i64,
    pub set_static_text: unsafe extern "C" fn(env: *const HostEnv, id: RawFieldId, value: StrAbi),

    pub throw: unsafe extern "C" fn(env: *const HostEnv, message: StrAbi),
    pub exception_check: unsafe extern "C" fn(env: *const HostEnv) -> bool,
}

pub type EncapsulatedEntry = unsafe extern "C" fn(env: *const HostEnv, obj: ObjectHandle);

pub type RawEntry = unsafe extern "C" fn(record: *mut RecordAbi);

pub type LayoutVersionFn = extern "C" fn() -> u32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_round_trip() {
        let text = TextAbi::encode("Hello, world!").unwrap();
        assert_eq!(text.len, 13);
        assert_eq!(text.as_str().unwrap(), "Hello, world!");
    }

    #[test]
    fn text_capacity_is_enforced() {
        let fits = "x".repeat(TEXT_CAPACITY);
        assert!(TextAbi::encode(&fits).is_ok());

        let too_long = "x".repeat(TEXT_CAPACITY + 1);
        assert_eq!(
            TextAbi::encode(&too_long).unwrap_err(),
            AbiError::TextTooLong {
                len: TEXT_CAPACITY + 1,
                capacity: TEXT_CAPACITY,
            }
        );
    }

    #[test]
    fn corrupt_text_is_rejected() {
        let mut text = TextAbi::encode("abc").unwrap();
        text.len = TEXT_CAPACITY as u32 + 1;
        assert_eq!(text.as_str().unwrap_err(), AbiError::InvalidText);

        text.len = 1;
        text.bytes[0] = 0xff;
        assert_eq!(text.as_str().unwrap_err(), AbiError::InvalidText);
    }

    #[test]
    fn layout_version_check() {
        let mut record = RecordAbi::new(17, [19, 23], TextAbi::encode("").unwrap());
        assert!(record.check_layout().is_ok());

        record.layout_version = LAYOUT_VERSION + 1;
        assert_eq!(
            record.check_layout().unwrap_err(),
            AbiError::LayoutMismatch {
                expected: LAYOUT_VERSION,
                found: LAYOUT_VERSION + 1,
            }
        );
    }

    #[test]
    fn str_abi_views() {
        let s = "int_field";
        let view = StrAbi::new(s);
        assert_eq!(unsafe { view.as_str() }, Some("int_field"));

        let empty = StrAbi {
            ptr: std::ptr::null(),
            len: 0,
        };
        assert_eq!(unsafe { empty.as_str() }, Some(""));
    }
}
