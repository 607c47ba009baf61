//! Render errors.

use thiserror::Error;

/// Why a render produced no image.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The input cannot be rendered at all (empty raster, bad buffer).
    #[error("image could not be decoded: {0}")]
    DecodeFailed(String),

    /// A newer request superseded this one.
    #[error("render cancelled")]
    Cancelled,

    /// Waited on a generation the session never issued.
    #[error("render generation {0} was never submitted")]
    NotSubmitted(u64),
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
