//! Error type for frame generation and interpolation.
//!
//! Only caller-recoverable conditions are expressed here. Contract
//! violations (duplicate removed matches, capturing out of stage order)
//! fail fast with assertions instead, and degenerate inputs resolve to
//! empty output rather than an error.

use thiserror::Error;

/// Recoverable failures raised while turning values into frames.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MotionError {
    #[error("wait behavior requires a duration")]
    WaitRequiresDuration,

    #[error("static behavior requires a duration")]
    StaticRequiresDuration,

    #[error("a fixed value requires a static behavior")]
    FixedValueRequiresStatic,

    #[error("from is a color but to is not: {from} -> {to}")]
    MismatchedColorValues { from: String, to: String },

    #[error("spring behavior is not supported for composite values")]
    SpringOnComposite,
}
