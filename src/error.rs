use derive_more::Display;

use crate::types::Value;

pub type Result<T> = core::result::Result<T, MetaballError>;

/// Configuration problems detected before a cycle starts.
///
/// Numerical edge cases inside a cycle (a sample landing on a source, a flat edge)
/// are not errors: they propagate as non-finite values and the cycle still completes.
#[derive(Debug, Display, Clone, Copy, PartialEq)]
#[display("{self:?}")]
pub enum MetaballError {
    /// The grid resolution must be at least one cube per axis.
    InvalidSteps(usize),
    /// The shared ball radius must be finite and positive.
    InvalidRadius(Value),
    /// The finite-difference step must be finite and positive.
    InvalidEpsilon(Value),
    /// The bounding-box margin factor must be finite and non-negative.
    InvalidMargin(Value),
}

impl std::error::Error for MetaballError {}
