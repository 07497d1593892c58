use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the scoring engine. These mark broken input data, not
/// recoverable conditions: an expectation tree with no children or a row
/// with no target reference means an upstream writer misbehaved, and the
/// engine fails fast instead of guessing.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// A parent expectation has no child expectations to aggregate from.
    #[error("element not found: {0}")]
    ElementNotFound(String),
    /// A stored expectation row carries none of the five target references.
    #[error("expectation {id} has no target reference")]
    MissingTargetReference { id: Uuid },
}
