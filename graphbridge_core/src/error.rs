//! Unified error handling for graphbridge
//!
//! Every fallible marshalling operation returns [`BridgeResult`]. Validation
//! of identifier arrays is the exception: it reports a plain `bool`.

use graphbridge_types::DataType;
use thiserror::Error;

/// Main error type for graphbridge operations
#[derive(Debug, Error)]
pub enum BridgeError {
    /// I/O related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parsing or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// An allocation could not be satisfied
    #[error("Out of memory: failed to allocate {bytes} bytes")]
    OutOfMemory { bytes: usize },

    /// A value did not survive conversion to a 64-bit signed integer
    #[error("Narrowing conversion at index {index}: {value} does not fit in int64")]
    Narrowing { index: usize, value: String },

    /// Index past the end of a sequence
    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A dynamically-typed value or erased entry had the wrong type
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: String,
        actual: String,
    },

    /// Wrong number or shape of call arguments
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Negative or overflowing dimensions
    #[error("Invalid shape {shape:?}: {reason}")]
    InvalidShape { shape: Vec<i64>, reason: String },

    /// Typed access with an element type that does not match the array
    #[error("Dtype mismatch: array is {array}, requested {requested}")]
    DtypeMismatch { array: DataType, requested: DataType },

    /// An array required to be an identifier array is not one
    #[error("Not a valid id array: {0}")]
    InvalidIdArray(String),

    /// Mutable access to storage that other handles still share
    #[error("Array storage is shared by {refcount} handles")]
    SharedArray { refcount: usize },

    /// Device kind unknown or not usable for the operation
    #[error("Unsupported device: {0}")]
    UnsupportedDevice(String),

    /// Element type unknown or not usable for the operation
    #[error("Unsupported data type: code={code}, bits={bits}, lanes={lanes}")]
    UnsupportedDtype { code: u8, bits: u8, lanes: u16 },

    /// Null pointer received across the boundary
    #[error("Null pointer: {0}")]
    NullPointer(&'static str),

    /// Internal errors with source location for debugging.
    /// Use the `bridge_internal!()` macro to create these.
    #[error("Internal error: {message} (at {file}:{line})")]
    Internal {
        message: String,
        file: &'static str,
        line: u32,
    },
}

/// Create an internal error with automatic file/line capture.
///
/// ```rust,ignore
/// return Err(bridge_internal!("unexpected storage state: {:?}", state));
/// ```
#[macro_export]
macro_rules! bridge_internal {
    ($($arg:tt)*) => {
        $crate::error::BridgeError::Internal {
            message: format!($($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// Convenience type alias for Results using BridgeError
pub type BridgeResult<T> = std::result::Result<T, BridgeError>;

impl From<serde_yaml::Error> for BridgeError {
    fn from(err: serde_yaml::Error) -> Self {
        BridgeError::Config(format!("YAML parse error: {}", err))
    }
}

impl From<toml::de::Error> for BridgeError {
    fn from(err: toml::de::Error) -> Self {
        BridgeError::Config(format!("TOML parse error: {}", err))
    }
}

// Helper methods
impl BridgeError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        BridgeError::Config(msg.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        BridgeError::InvalidArgument(msg.into())
    }

    /// Create a type mismatch error
    pub fn type_mismatch<S: Into<String>, T: Into<String>>(expected: S, actual: T) -> Self {
        BridgeError::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an invalid shape error
    pub fn invalid_shape<S: Into<String>>(shape: &[i64], reason: S) -> Self {
        BridgeError::InvalidShape {
            shape: shape.to_vec(),
            reason: reason.into(),
        }
    }

    /// Whether the error is an allocation failure
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, BridgeError::OutOfMemory { .. })
    }
}
