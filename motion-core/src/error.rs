//! Error types for engine operations.

use thiserror::Error;

/// Result type for engine operations.
pub type MotionResult<T> = Result<T, MotionError>;

/// Errors that can occur in engine operations.
///
/// None of these ever reach the page: per-element failures are logged and
/// the element is skipped.
#[derive(Debug, Error)]
pub enum MotionError {
    /// Tracked node no longer has a layout box (removed from the document).
    #[error("Node detached from document: {0}")]
    Detached(String),

    /// Class name does not belong to the animation variant set.
    #[error("Unknown animation variant: {0}")]
    UnknownVariant(String),

    /// Performance tier name not recognised.
    #[error("Unknown performance tier: {0}")]
    UnknownTier(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration or signal serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
