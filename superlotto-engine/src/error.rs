use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Error taxonomy of the analysis engine.
///
/// `InvalidParameter` and `InsufficientData` are caller-recoverable;
/// `InvariantViolation` signals a defect (a computed result failed the
/// structural constraints of a valid draw) and should not be retried.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("insufficient data: {required} draws required, {available} available")]
    InsufficientData { required: usize, available: usize },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl EngineError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        EngineError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EngineError::InvariantViolation(_))
    }
}
