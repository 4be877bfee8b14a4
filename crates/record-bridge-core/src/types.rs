//! Type signatures for fields exposed by the host.
//!
//! A signature is the string a native caller passes alongside a field name when looking up a
//! field id. The host only hands out an id when both the name and the signature match, so a
//! resolved id already carries all of the type information needed to get and set the field.

use std::fmt;
use std::str::FromStr;

#[derive(Debug)]
pub enum TypesErr {
    UnknownSignature,
}

/// Represents a field type that is well defined across the FFI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Int,
    IntArray,
    Text,
}

impl FieldType {
    pub fn signature(&self) -> &'static str {
        match self {
            FieldType::Int => "i32",
            FieldType::IntArray => "[i32]",
            FieldType::Text => "str",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.signature())
    }
}

impl FromStr for FieldType {
    type Err = TypesErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s {
            "i32" => FieldType::Int,
            "[i32]" => FieldType::IntArray,
            "str" => FieldType::Text,
            _ => return Err(TypesErr::UnknownSignature),
        };

        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signatures_parse_back() {
        for ty in &[FieldType::Int, FieldType::IntArray, FieldType::Text] {
            assert_eq!(ty.signature().parse::<FieldType>().unwrap(), *ty);
        }
    }

    #[test]
    fn unknown_signature() {
        assert!("I".parse::<FieldType>().is_err());
        assert!("".parse::<FieldType>().is_err());
    }
}
