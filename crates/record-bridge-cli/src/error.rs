use thiserror::Error;

use record_bridge_core::AbiError;

/// Why a foreign call did not happen, or did not complete.
///
/// Caught at the call site and reported; the host carries on regardless.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForeignCallError {
    #[error("failed to load native library `{library}`: {reason}")]
    LibraryLoad { library: String, reason: String },

    #[error("native library `{library}` does not export {}", .missing.join(", "))]
    MissingExports {
        library: String,
        missing: Vec<&'static str>,
    },

    #[error("failed to resolve `{symbol}`: {reason}")]
    MissingSymbol { symbol: &'static str, reason: String },

    #[error("native library was built for layout version {found}, expected {expected}")]
    LayoutMismatch { expected: u32, found: u32 },

    /// The native side raised an exception through the host environment.
    #[error("native code raised: {0}")]
    Exception(String),

    #[error("failed to marshal record: {0}")]
    Marshal(#[from] AbiError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn display() {
        let missing = ForeignCallError::MissingExports {
            library: "libnative.so".to_string(),
            missing: vec!["a", "b"],
        };
        assert_eq!(
            missing.to_string(),
            "native library `libnative.so` does not export a, b"
        );

        let mismatch = ForeignCallError::LayoutMismatch {
            expected: 1,
            found: 2,
        };
        assert_eq!(
            mismatch.to_string(),
            "native library was built for layout version 2, expected 1"
        );
    }

    #[test]
    fn marshal_errors_keep_their_source() {
        let error = ForeignCallError::from(AbiError::NullRecord);
        assert_eq!(error, ForeignCallError::Marshal(AbiError::NullRecord));
        assert!(error.source().is_some());
        assert!(ForeignCallError::Exception("boom".to_string())
            .source()
            .is_none());
    }
}
