//! Safe native-side access to host objects through a `HostEnv`.
//!
//! Field ids are treated as active objects: a `FieldId<T>` is looked up once from a name and the
//! signature implied by `T`, after which it reads and writes values without repeating any type
//! information. `Field` and `StaticField` bundle an id with the object (or the class) that hosts
//! it, and behave as proxies for the host-side field.

use std::marker::PhantomData;

use crate::abi::{HostEnv, ObjectHandle, RawFieldId, StrAbi};
use crate::types::FieldType;
use crate::{EnvError, LAYOUT_VERSION};

/// Thin checked wrapper around a host-provided `HostEnv` table.
#[derive(Clone, Copy)]
pub struct Env<'a> {
    raw: &'a HostEnv,
}

impl<'a> Env<'a> {
    /// # Safety
    ///
    /// A non-null `ptr` must point at a valid `HostEnv` which outlives `'a`.
    pub unsafe fn from_raw(ptr: *const HostEnv) -> Result<Self, EnvError> {
        let raw = ptr.as_ref().ok_or(EnvError::NullEnv)?;
        if raw.version != LAYOUT_VERSION {
            return Err(EnvError::VersionMismatch {
                expected: LAYOUT_VERSION,
                found: raw.version,
            });
        }
        Ok(Self { raw })
    }

    fn as_ptr(&self) -> *const HostEnv {
        self.raw as *const HostEnv
    }

    /// Record a pending exception on the host.
    pub fn throw(&self, message: &str) {
        unsafe { (self.raw.throw)(self.as_ptr(), StrAbi::new(message)) }
    }

    pub fn exception_check(&self) -> bool {
        unsafe { (self.raw.exception_check)(self.as_ptr()) }
    }

    fn check(&self) -> Result<(), EnvError> {
        if self.exception_check() {
            Err(EnvError::ExceptionPending)
        } else {
            Ok(())
        }
    }

    fn lookup(&self, name: &str, ty: FieldType, is_static: bool) -> Result<RawFieldId, EnvError> {
        let signature = ty.signature();
        let lookup = if is_static {
            self.raw.get_static_field_id
        } else {
            self.raw.get_field_id
        };

        let id = unsafe { lookup(self.as_ptr(), StrAbi::new(name), StrAbi::new(signature)) };
        if id < 0 {
            return Err(EnvError::FieldNotFound {
                name: name.to_string(),
                signature,
            });
        }

        self.check()?;
        Ok(id)
    }

    pub fn field_id<T: FieldValue>(&self, name: &str) -> Result<FieldId<T>, EnvError> {
        let raw = self.lookup(name, T::FIELD_TYPE, false)?;
        Ok(FieldId {
            raw,
            _ty: PhantomData,
        })
    }

    pub fn static_field_id<T: StaticFieldValue>(
        &self,
        name: &str,
    ) -> Result<StaticFieldId<T>, EnvError> {
        let raw = self.lookup(name, T::FIELD_TYPE, true)?;
        Ok(StaticFieldId {
            raw,
            _ty: PhantomData,
        })
    }

    /// Look up a field by name and bind it to `obj`.
    pub fn field<T: FieldValue>(&self, obj: ObjectHandle, name: &str) -> Result<Field<'a, T>, EnvError> {
        let id = self.field_id(name)?;
        Ok(Field { env: *self, obj, id })
    }

    pub fn static_field<T: StaticFieldValue>(&self, name: &str) -> Result<StaticField<'a, T>, EnvError> {
        let id = self.static_field_id(name)?;
        Ok(StaticField { env: *self, id })
    }
}

/// A resolved instance field id for values of type `T`.
#[derive(Debug)]
pub struct FieldId<T> {
    raw: RawFieldId,
    _ty: PhantomData<fn() -> T>,
}

impl<T> Clone for FieldId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FieldId<T> {}

impl<T: FieldValue> FieldId<T> {
    pub fn raw(&self) -> RawFieldId {
        self.raw
    }

    pub fn get(&self, env: &Env, obj: ObjectHandle) -> Result<T, EnvError> {
        T::get(env, obj, self.raw)
    }

    pub fn set(&self, env: &Env, obj: ObjectHandle, value: &T) -> Result<(), EnvError> {
        T::set(env, obj, self.raw, value)
    }
}

/// A resolved static (class-wide) field id for values of type `T`.
#[derive(Debug)]
pub struct StaticFieldId<T> {
    raw: RawFieldId,
    _ty: PhantomData<fn() -> T>,
}

impl<T> Clone for StaticFieldId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StaticFieldId<T> {}

impl<T: StaticFieldValue> StaticFieldId<T> {
    pub fn raw(&self) -> RawFieldId {
        self.raw
    }

    pub fn get(&self, env: &Env) -> Result<T, EnvError> {
        T::get_static(env, self.raw)
    }

    pub fn set(&self, env: &Env, value: &T) -> Result<(), EnvError> {
        T::set_static(env, self.raw, value)
    }
}

/// Proxy for an instance field of a particular host object.
pub struct Field<'a, T> {
    env: Env<'a>,
    obj: ObjectHandle,
    id: FieldId<T>,
}

impl<'a, T: FieldValue> Field<'a, T> {
    pub fn get(&self) -> Result<T, EnvError> {
        self.id.get(&self.env, self.obj)
    }

    pub fn set(&mut self, value: &T) -> Result<(), EnvError> {
        self.id.set(&self.env, self.obj, value)
    }
}

impl<'a> Field<'a, Vec<i32>> {
    pub fn len(&self) -> Result<usize, EnvError> {
        array_length(&self.env, self.obj, self.id.raw)
    }

    /// Copy `buf.len()` elements starting at `start` out of the host array.
    pub fn region(&self, start: usize, buf: &mut [i32]) -> Result<(), EnvError> {
        let env = &self.env;
        unsafe {
            (env.raw.get_int_array_region)(
                env.as_ptr(),
                self.obj,
                self.id.raw,
                start as i32,
                buf.len() as i32,
                buf.as_mut_ptr(),
            )
        };
        env.check()
    }

    /// Overwrite `values.len()` elements starting at `start` in the host array.
    pub fn set_region(&mut self, start: usize, values: &[i32]) -> Result<(), EnvError> {
        let env = &self.env;
        unsafe {
            (env.raw.set_int_array_region)(
                env.as_ptr(),
                self.obj,
                self.id.raw,
                start as i32,
                values.len() as i32,
                values.as_ptr(),
            )
        };
        env.check()
    }
}

impl<'a> Field<'a, Vec<i32>> {
    /// Copy the whole host array out into a scoped buffer.
    ///
    /// Edits made through the returned guard reach the host when it is released or dropped,
    /// unless it is aborted first.
    pub fn elements(&mut self) -> Result<ArrayElements<'_, 'a>, EnvError> {
        let values = self.get()?;
        Ok(ArrayElements {
            field: self,
            values,
            released: false,
        })
    }
}

/// Scoped access to the elements of a host array.
///
/// Derefs to `[i32]`. Dropping the guard writes the elements back; a failed write on drop is
/// left pending on the host. Use `release` to observe that failure, or `abort` to discard edits.
pub struct ArrayElements<'f, 'a> {
    field: &'f mut Field<'a, Vec<i32>>,
    values: Vec<i32>,
    released: bool,
}

impl<'f, 'a> ArrayElements<'f, 'a> {
    /// Write the current elements back and keep the guard open.
    pub fn commit(&mut self) -> Result<(), EnvError> {
        self.field.set_region(0, &self.values)
    }

    /// Write the elements back and close the guard.
    pub fn release(mut self) -> Result<(), EnvError> {
        self.released = true;
        self.commit()
    }

    /// Close the guard without writing anything back.
    pub fn abort(mut self) {
        self.released = true;
    }
}

impl<'f, 'a> std::ops::Deref for ArrayElements<'f, 'a> {
    type Target = [i32];

    fn deref(&self) -> &[i32] {
        &self.values
    }
}

impl<'f, 'a> std::ops::DerefMut for ArrayElements<'f, 'a> {
    fn deref_mut(&mut self) -> &mut [i32] {
        &mut self.values
    }
}

impl<'f, 'a> Drop for ArrayElements<'f, 'a> {
    fn drop(&mut self) {
        if !self.released {
            let _ = self.commit();
        }
    }
}

/// Proxy for a static field of the class the `Env` is bound to.
pub struct StaticField<'a, T> {
    env: Env<'a>,
    id: StaticFieldId<T>,
}

impl<'a, T: StaticFieldValue> StaticField<'a, T> {
    pub fn get(&self) -> Result<T, EnvError> {
        self.id.get(&self.env)
    }

    pub fn set(&mut self, value: &T) -> Result<(), EnvError> {
        self.id.set(&self.env, value)
    }
}

/// Types which can be read from and written to an instance field.
pub trait FieldValue: Sized {
    const FIELD_TYPE: FieldType;

    fn get(env: &Env, obj: ObjectHandle, id: RawFieldId) -> Result<Self, EnvError>;
    fn set(env: &Env, obj: ObjectHandle, id: RawFieldId, value: &Self) -> Result<(), EnvError>;
}

/// Types which can be read from and written to a static field.
pub trait StaticFieldValue: Sized {
    const FIELD_TYPE: FieldType;

    fn get_static(env: &Env, id: RawFieldId) -> Result<Self, EnvError>;
    fn set_static(env: &Env, id: RawFieldId, value: &Self) -> Result<(), EnvError>;
}

impl FieldValue for i32 {
    const FIELD_TYPE: FieldType = FieldType::Int;

    fn get(env: &Env, obj: ObjectHandle, id: RawFieldId) -> Result<Self, EnvError> {
        let value = unsafe { (env.raw.get_int_field)(env.as_ptr(), obj, id) };
        env.check()?;
        Ok(value)
    }

    fn set(env: &Env, obj: ObjectHandle, id: RawFieldId, value: &Self) -> Result<(), EnvError> {
        unsafe { (env.raw.set_int_field)(env.as_ptr(), obj, id, *value) };
        env.check()
    }
}

fn array_length(env: &Env, obj: ObjectHandle, id: RawFieldId) -> Result<usize, EnvError> {
    let len = unsafe { (env.raw.get_array_length)(env.as_ptr(), obj, id) };
    env.check()?;
    Ok(len.max(0) as usize)
}

impl FieldValue for Vec<i32> {
    const FIELD_TYPE: FieldType = FieldType::IntArray;

    fn get(env: &Env, obj: ObjectHandle, id: RawFieldId) -> Result<Self, EnvError> {
        let len = array_length(env, obj, id)?;
        let mut values = vec![0; len];
        unsafe {
            (env.raw.get_int_array_region)(
                env.as_ptr(),
                obj,
                id,
                0,
                len as i32,
                values.as_mut_ptr(),
            )
        };
        env.check()?;
        Ok(values)
    }

    /// Writes the whole array. The host raises if `value` is longer than the array.
    fn set(env: &Env, obj: ObjectHandle, id: RawFieldId, value: &Self) -> Result<(), EnvError> {
        unsafe {
            (env.raw.set_int_array_region)(
                env.as_ptr(),
                obj,
                id,
                0,
                value.len() as i32,
                value.as_ptr(),
            )
        };
        env.check()
    }
}

impl StaticFieldValue for String {
    const FIELD_TYPE: FieldType = FieldType::Text;

    fn get_static(env: &Env, id: RawFieldId) -> Result<Self, EnvError> {
        let get = env.raw.get_static_text;

        // First call sizes the buffer, second call fills it.
        let len = unsafe { get(env.as_ptr(), id, std::ptr::null_mut(), 0) };
        env.check()?;
        if len < 0 {
            return Err(EnvError::InvalidText);
        }

        let mut buf = vec![0u8; len as usize];
        let copied = unsafe { get(env.as_ptr(), id, buf.as_mut_ptr(), buf.len() as u64) };
        env.check()?;
        if copied != len {
            return Err(EnvError::InvalidText);
        }

        String::from_utf8(buf).map_err(|_| EnvError::InvalidText)
    }

    fn set_static(env: &Env, id: RawFieldId, value: &Self) -> Result<(), EnvError> {
        unsafe { (env.raw.set_static_text)(env.as_ptr(), id, StrAbi::new(value)) };
        env.check()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    //! A tiny in-memory host used to exercise the wrapper without a real host process.

    use super::*;
    use std::cell::RefCell;
    use std::ffi::c_void;

    pub struct FakeObject {
        pub int_field: i32,
        pub int_array: Vec<i32>,
    }

    pub struct FakeHost {
        pub text: RefCell<String>,
        pub pending: RefCell<Option<String>>,
    }

    unsafe fn host<'a>(env: *const HostEnv) -> &'a FakeHost {
        &*((*env).context as *const FakeHost)
    }

    unsafe fn object<'a>(obj: ObjectHandle) -> &'a mut FakeObject {
        &mut *(obj.0 as *mut FakeObject)
    }

    unsafe fn raise(env: *const HostEnv, message: &str) {
        let mut pending = host(env).pending.borrow_mut();
        if pending.is_none() {
            *pending = Some(message.to_string());
        }
    }

    unsafe extern "C" fn get_field_id(env: *const HostEnv, name: StrAbi, sig: StrAbi) -> RawFieldId {
        match (name.as_str(), sig.as_str()) {
            (Some("int_field"), Some("i32")) => 0,
            (Some("int_array"), Some("[i32]")) => 1,
            _ => {
                raise(env, "no such field");
                -1
            }
        }
    }

    unsafe extern "C" fn get_static_field_id(
        env: *const HostEnv,
        name: StrAbi,
        sig: StrAbi,
    ) -> RawFieldId {
        match (name.as_str(), sig.as_str()) {
            (Some("string_field"), Some("str")) => 2,
            _ => {
                raise(env, "no such static field");
                -1
            }
        }
    }

    unsafe extern "C" fn get_int_field(_: *const HostEnv, obj: ObjectHandle, _: RawFieldId) -> i32 {
        object(obj).int_field
    }

    unsafe extern "C" fn set_int_field(_: *const HostEnv, obj: ObjectHandle, _: RawFieldId, v: i32) {
        object(obj).int_field = v;
    }

    unsafe extern "C" fn get_array_length(_: *const HostEnv, obj: ObjectHandle, _: RawFieldId) -> i32 {
        object(obj).int_array.len() as i32
    }

    unsafe extern "C" fn get_int_array_region(
        env: *const HostEnv,
        obj: ObjectHandle,
        _: RawFieldId,
        start: i32,
        len: i32,
        buf: *mut i32,
    ) {
        let array = &object(obj).int_array;
        match array.get(start as usize..(start + len) as usize) {
            Some(src) => std::slice::from_raw_parts_mut(buf, len as usize).copy_from_slice(src),
            None => raise(env, "index out of bounds"),
        }
    }

    unsafe extern "C" fn set_int_array_region(
        env: *const HostEnv,
        obj: ObjectHandle,
        _: RawFieldId,
        start: i32,
        len: i32,
        buf: *const i32,
    ) {
        let array = &mut object(obj).int_array;
        match array.get_mut(start as usize..(start + len) as usize) {
            Some(dst) => dst.copy_from_slice(std::slice::from_raw_parts(buf, len as usize)),
            None => raise(env, "index out of bounds"),
        }
    }

    unsafe extern "C" fn get_static_text(env: *const HostEnv, _: RawFieldId, buf: *mut u8, cap: u64) -> i64 {
        let text = host(env).text.borrow();
        let n = text.len().min(cap as usize);
        if n > 0 {
            std::ptr::copy_nonoverlapping(text.as_ptr(), buf, n);
        }
        text.len() as i64
    }

    unsafe extern "C" fn set_static_text(env: *const HostEnv, _: RawFieldId, value: StrAbi) {
        match value.as_str() {
            Some(s) => *host(env).text.borrow_mut() = s.to_string(),
            None => raise(env, "invalid utf8"),
        }
    }

    unsafe extern "C" fn throw(env: *const HostEnv, message: StrAbi) {
        raise(env, message.as_str().unwrap_or("<invalid utf8>"));
    }

    unsafe extern "C" fn exception_check(env: *const HostEnv) -> bool {
        host(env).pending.borrow().is_some()
    }

    pub fn fake_env(host: &FakeHost) -> HostEnv {
        HostEnv {
            version: LAYOUT_VERSION,
            context: host as *const FakeHost as *mut c_void,
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

    pub fn fake_host(text: &str) -> FakeHost {
        FakeHost {
            text: RefCell::new(text.to_string()),
            pending: RefCell::new(None),
        }
    }

    pub fn handle(obj: &mut FakeObject) -> ObjectHandle {
        ObjectHandle(obj as *mut FakeObject as *mut c_void)
    }

    #[test]
    fn fields_get_and_set() {
        let host = fake_host("Hello");
        let raw = fake_env(&host);
        let env = unsafe { Env::from_raw(&raw) }.unwrap();
        let mut obj = FakeObject {
            int_field: 17,
            int_array: vec![19, 23],
        };
        let obj = handle(&mut obj);

        let mut int_field = env.field::<i32>(obj, "int_field").unwrap();
        assert_eq!(int_field.get().unwrap(), 17);
        int_field.set(&42).unwrap();
        assert_eq!(int_field.get().unwrap(), 42);

        let mut int_array = env.field::<Vec<i32>>(obj, "int_array").unwrap();
        assert_eq!(int_array.get().unwrap(), vec![19, 23]);
        assert_eq!(int_array.len().unwrap(), 2);
        int_array.set_region(1, &[5]).unwrap();
        assert_eq!(int_array.get().unwrap(), vec![19, 5]);

        let mut text = env.static_field::<String>("string_field").unwrap();
        assert_eq!(text.get().unwrap(), "Hello");
        text.set(&"Bye".to_string()).unwrap();
        assert_eq!(*host.text.borrow(), "Bye");
    }

    #[test]
    fn signature_mismatch_is_not_found() {
        let host = fake_host("");
        let raw = fake_env(&host);
        let env = unsafe { Env::from_raw(&raw) }.unwrap();

        let err = env.field_id::<Vec<i32>>("int_field").unwrap_err();
        assert_eq!(
            err,
            EnvError::FieldNotFound {
                name: "int_field".into(),
                signature: "[i32]",
            }
        );
        assert!(env.exception_check());
    }

    #[test]
    fn out_of_bounds_region_raises() {
        let host = fake_host("");
        let raw = fake_env(&host);
        let env = unsafe { Env::from_raw(&raw) }.unwrap();
        let mut obj = FakeObject {
            int_field: 0,
            int_array: vec![1, 2],
        };
        let obj = handle(&mut obj);

        let mut int_array = env.field::<Vec<i32>>(obj, "int_array").unwrap();
        let err = int_array.set(&vec![7, 8, 9]).unwrap_err();
        assert_eq!(err, EnvError::ExceptionPending);
        assert_eq!(host.pending.borrow().as_deref(), Some("index out of bounds"));
    }

    #[test]
    fn array_elements_write_back_on_drop() {
        let host = fake_host("");
        let raw = fake_env(&host);
        let env = unsafe { Env::from_raw(&raw) }.unwrap();
        let mut object = FakeObject {
            int_field: 0,
            int_array: vec![19, 23],
        };
        let obj = handle(&mut object);

        let mut int_array = env.field::<Vec<i32>>(obj, "int_array").unwrap();
        {
            let mut elements = int_array.elements().unwrap();
            assert_eq!(&*elements, &[19, 23]);
            elements[0] = 29;
            elements[1] = 31;
        }
        assert_eq!(int_array.get().unwrap(), vec![29, 31]);

        let mut elements = int_array.elements().unwrap();
        elements[1] = 7;
        elements.commit().unwrap();
        elements[0] = 5;
        elements.release().unwrap();
        assert_eq!(int_array.get().unwrap(), vec![5, 7]);
    }

    #[test]
    fn aborted_array_elements_are_discarded() {
        let host = fake_host("");
        let raw = fake_env(&host);
        let env = unsafe { Env::from_raw(&raw) }.unwrap();
        let mut object = FakeObject {
            int_field: 0,
            int_array: vec![19, 23],
        };
        let obj = handle(&mut object);

        let mut int_array = env.field::<Vec<i32>>(obj, "int_array").unwrap();
        let mut elements = int_array.elements().unwrap();
        elements[0] = 1000;
        elements.abort();

        assert_eq!(int_array.get().unwrap(), vec![19, 23]);
        assert!(!env.exception_check());
    }

    #[test]
    fn from_raw_rejects_bad_tables() {
        assert_eq!(
            unsafe { Env::from_raw(std::ptr::null()) }.err(),
            Some(EnvError::NullEnv)
        );

        let host = fake_host("");
        let mut raw = fake_env(&host);
        raw.version = LAYOUT_VERSION + 1;
        assert_eq!(
            unsafe { Env::from_raw(&raw) }.err(),
            Some(EnvError::VersionMismatch {
                expected: LAYOUT_VERSION,
                found: LAYOUT_VERSION + 1,
            })
        );
    }
}
