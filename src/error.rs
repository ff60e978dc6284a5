//! Error taxonomy for the hypershell core.
//!
//! Out-of-range structural queries (a shell depth that was never built, a
//! tree depth with no nodes) are not errors: they return empty results.

use thiserror::Error;

use crate::atomspace::Handle;

/// Errors surfaced synchronously to the immediate caller. Nothing is retried.
#[derive(Debug, Error)]
pub enum HypershellError {
    /// The A000081 recurrence produced a non-integral value. Indicates a bug
    /// in the recurrence, not bad input.
    #[error("A000081 recurrence is not integral at n={n}: got {value}")]
    ArithmeticConsistency { n: usize, value: f64 },

    /// An intermediate A000081 term does not fit in 128 bits.
    #[error("A000081 term for n={n} overflows 128-bit arithmetic")]
    ArithmeticOverflow { n: usize },

    /// A handle required to name an existing atom does not.
    #[error("Unknown atom handle {0}")]
    InvalidHandle(Handle),

    /// A tree node id that belongs to another tree (or is out of bounds).
    #[error("Node does not belong to this tree")]
    ForeignNode,

    /// Malformed parenthesis notation.
    #[error("Tree notation parse error at byte {position}: {message}")]
    Parse { position: usize, message: String },

    /// A caller-supplied vector has the wrong length.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Atomspace snapshot could not be encoded or decoded.
    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failure inside the numeric ops.
    #[error(transparent)]
    Neural(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, HypershellError>;
