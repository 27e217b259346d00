//! Error types for AES block engine and block hash operations.

use core::fmt;

/// Result type alias for block engine operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur during key derivation, encryption setup or hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Invalid key length (must be 16 bytes).
    InvalidKeyLength,

    /// Invalid hash output length (must be between 1 and 16 bytes).
    InvalidOutputLength,

    /// Invalid hash input length (must be 16 bytes).
    InvalidInputLength,

    /// The process-wide hash key schedule could not be derived.
    InitializationFailure,

    /// The hardware backend was requested on a CPU without AES instructions.
    HardwareUnavailable,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidKeyLength => write!(f, "invalid key length (must be 16 bytes)"),
            Error::InvalidOutputLength => {
                write!(f, "invalid output length (must be between 1 and 16 bytes)")
            }
            Error::InvalidInputLength => write!(f, "invalid input length (must be 16 bytes)"),
            Error::InitializationFailure => write!(f, "unable to initialize hash key schedule"),
            Error::HardwareUnavailable => {
                write!(f, "hardware AES instructions are not available on this CPU")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
