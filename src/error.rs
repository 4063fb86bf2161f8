//! Error types for the unboxing library.

use thiserror::Error;

/// Result type for unboxing operations.
pub type Result<T> = std::result::Result<T, UnboxError>;

/// Errors that can occur while constructing codecs or decoding a frame.
#[derive(Debug, Error)]
pub enum UnboxError {
    /// A required codec property was not supplied.
    #[error("required codec property '{0}' not set")]
    MissingProperty(&'static str),

    /// A codec property was supplied but its value could not be used.
    #[error("codec property '{0}' has an unusable value")]
    InvalidProperty(&'static str),

    /// `init_capacity` was called with a size below the codec overhead.
    #[error("capacity {size} is below the codec overhead of {overhead} bytes")]
    Capacity {
        /// The requested encoded size.
        size: usize,
        /// The minimum encoded size the codec can work with.
        overhead: usize,
    },

    /// The trailing checksum did not verify.
    #[error("checksum mismatch")]
    ChecksumMismatch,

    /// Error correction exhausted its iterations with parity checks still
    /// unsatisfied. The payload is returned as-is; statistics describe the
    /// damage.
    #[error("{0} parity checks still unsatisfied after decoding")]
    Unverified(u32),

    /// A code matrix could not be constructed from the given parameters.
    #[error("code construction failed: {0}")]
    Construction(String),

    /// The codec name is not one of the supported kinds.
    #[error("unknown codec '{0}'")]
    UnknownCodec(String),

    /// Frame configuration is inconsistent or unsupported.
    #[error("configuration error: {0}")]
    Config(String),

    /// Frame metadata could not be interpreted.
    #[error("metadata error")]
    Metadata,

    /// The frame border could not be tracked.
    #[error("border tracking error")]
    BorderTracking,

    /// Input data is malformed (wrong dimensions, short buffer, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Processing was aborted by a caller-supplied callback.
    #[error("process aborted")]
    ProcessAbort,
}
