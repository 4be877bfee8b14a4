use std::fmt;

/// Failures when encoding or validating data in the raw `repr(C)` layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    /// The text does not fit in the inline buffer.
    TextTooLong { len: usize, capacity: usize },
    /// The inline buffer holds an out of range length or non-utf8 bytes.
    InvalidText,
    /// The record was built against a different layout.
    LayoutMismatch { expected: u32, found: u32 },
    NullRecord,
}

impl fmt::Display for AbiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AbiError::TextTooLong { len, capacity } => write!(
                f,
                "text of {} bytes does not fit in a {} byte buffer",
                len, capacity
            ),
            AbiError::InvalidText => write!(f, "text buffer does not hold valid utf8"),
            AbiError::LayoutMismatch { expected, found } => write!(
                f,
                "record layout version {} does not match expected version {}",
                found, expected
            ),
            AbiError::NullRecord => write!(f, "record pointer is null"),
        }
    }
}

impl std::error::Error for AbiError {}

/// Failures seen by native code talking to the host through a `HostEnv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvError {
    NullEnv,
    VersionMismatch { expected: u32, found: u32 },
    FieldNotFound { name: String, signature: &'static str },
    /// The host has recorded an exception. Nothing further should be attempted.
    ExceptionPending,
    InvalidText,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EnvError::NullEnv => write!(f, "host environment pointer is null"),
            EnvError::VersionMismatch { expected, found } => write!(
                f,
                "host environment version {} does not match expected version {}",
                found, expected
            ),
            EnvError::FieldNotFound { name, signature } => {
                write!(f, "field `{}` with signature `{}` not found", name, signature)
            }
            EnvError::ExceptionPending => write!(f, "host exception pending"),
            EnvError::InvalidText => write!(f, "host returned text that is not valid utf8"),
        }
    }
}

impl std::error::Error for EnvError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_field() {
        let err = EnvError::FieldNotFound {
            name: "int_field".into(),
            signature: "i32",
        };
        assert_eq!(
            err.to_string(),
            "field `int_field` with signature `i32` not found"
        );
    }
}
