use thiserror::Error;

/// Failure classes raised while assembling samples.
///
/// These travel inside `anyhow::Error`; callers that need to tell them
/// apart can `downcast_ref::<DataError>()`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    /// Retrieval index is outside `0..len`.
    #[error("index {index} out of range for dataset of length {len}")]
    OutOfRange { index: usize, len: usize },

    /// Two arrays that must be spatially paired disagree in shape.
    #[error("shape mismatch in {context}: {left:?} vs {right:?}")]
    ShapeMismatch {
        context: String,
        left: Vec<usize>,
        right: Vec<usize>,
    },

    /// The configured mode needs masks but none were supplied.
    #[error("mode {0} requires a mask list")]
    MissingMasks(&'static str),

    /// A configuration value that cannot be clamped to a no-op.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl DataError {
    pub fn shape_mismatch(context: impl Into<String>, left: &[usize], right: &[usize]) -> Self {
        Self::ShapeMismatch {
            context: context.into(),
            left: left.to_vec(),
            right: right.to_vec(),
        }
    }
}
