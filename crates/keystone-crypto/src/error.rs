//! Error types for engine operations.
//!
//! Every primitive reports failures synchronously through [`CryptoError`].
//! The binding layer that wraps this engine maps errors onto its own runtime
//! model through the stable numeric [`ErrorCode`] taxonomy.

use thiserror::Error;

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors from cryptographic operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Null, malformed or out-of-range input (caller bug)
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the input
        reason: String,
    },

    /// Curve lookup failed
    #[error("unsupported curve: {curve}")]
    UnsupportedCurve {
        /// Name, id or description of the curve that was requested
        curve: String,
    },

    /// Key consistency check failed
    #[error("invalid key: {reason}")]
    InvalidKey {
        /// Which check failed
        reason: String,
    },

    /// Destination capacity insufficient, detected before any write
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes required
        needed: usize,
        /// Bytes available in the destination
        available: usize,
    },

    /// Allocation failed
    #[error("out of memory: could not allocate {requested} bytes")]
    OutOfMemory {
        /// Size of the failed allocation
        requested: usize,
    },

    /// Signature or tag did not verify
    #[error("verification failed")]
    VerificationFailed,

    /// Engine invariant violated
    #[error("internal error: {reason}")]
    InternalError {
        /// Which invariant was violated
        reason: String,
    },

    /// Algorithm or curve is not available in this build
    #[error("not supported in this build: {feature}")]
    NotSupported {
        /// Name of the missing capability
        feature: String,
    },
}

impl CryptoError {
    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument { reason: reason.into() }
    }

    pub(crate) fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey { reason: reason.into() }
    }

    pub(crate) fn internal(reason: impl Into<String>) -> Self {
        Self::InternalError { reason: reason.into() }
    }

    pub(crate) fn not_supported(feature: impl Into<String>) -> Self {
        Self::NotSupported { feature: feature.into() }
    }

    /// Returns true if this error is a programmer error on the caller's side.
    ///
    /// Caller errors are deterministic: retrying the same call with the same
    /// arguments fails the same way. Everything else originates in the key
    /// material, the build, or the environment.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. } | Self::BufferTooSmall { .. })
    }

    /// Stable numeric code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::UnsupportedCurve { .. } => ErrorCode::UnsupportedCurve,
            Self::InvalidKey { .. } => ErrorCode::InvalidKey,
            Self::BufferTooSmall { .. } => ErrorCode::BufferTooSmall,
            Self::OutOfMemory { .. } => ErrorCode::OutOfMemory,
            Self::VerificationFailed => ErrorCode::VerificationFailed,
            Self::InternalError { .. } => ErrorCode::InternalError,
            Self::NotSupported { .. } => ErrorCode::NotSupported,
        }
    }
}

/// Stable error-code taxonomy exposed to the binding layer.
///
/// Values never change between releases. `Success` is returned for
/// operations that completed, including a verification that succeeded.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Operation completed
    Success = 0,
    /// See [`CryptoError::InvalidArgument`]
    InvalidArgument = -1,
    /// See [`CryptoError::UnsupportedCurve`]
    UnsupportedCurve = -2,
    /// See [`CryptoError::InvalidKey`]
    InvalidKey = -3,
    /// See [`CryptoError::BufferTooSmall`]
    BufferTooSmall = -4,
    /// See [`CryptoError::OutOfMemory`]
    OutOfMemory = -5,
    /// See [`CryptoError::VerificationFailed`]
    VerificationFailed = -6,
    /// See [`CryptoError::InternalError`]
    InternalError = -7,
    /// See [`CryptoError::NotSupported`]
    NotSupported = -8,
}

impl ErrorCode {
    /// Status code for a completed verification.
    ///
    /// Verification returns a boolean rather than an error so callers can
    /// branch without exception-driven control flow; this maps that boolean
    /// onto the code table.
    pub fn from_verification(valid: bool) -> Self {
        if valid { Self::Success } else { Self::VerificationFailed }
    }

    /// Numeric value of this code.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl<T> From<&Result<T>> for ErrorCode {
    fn from(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(err) => err.code(),
        }
    }
}
