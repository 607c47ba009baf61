//! Error types for LUT parsing and import.

use std::path::PathBuf;

use thiserror::Error;

use crate::cube::MAX_DIMENSION;

/// Result type for LUT parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors produced while reading a `.cube` file.
///
/// These are per-LUT and never fatal to a render: the registry degrades
/// any of them to "LUT not found".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Missing `LUT_3D_SIZE`, or a size below 2.
    #[error("invalid LUT size")]
    InvalidSize,

    /// Lattice larger than the supported maximum.
    #[error("unsupported LUT size: {0} (max {max})", max = MAX_DIMENSION)]
    UnsupportedSize(usize),

    /// The file declares a 1D LUT.
    #[error("1D LUT is not supported")]
    Unsupported1D,

    /// Number of data lines differs from `size^3`.
    #[error("LUT data mismatch (expected {expected} lines, got {actual})")]
    DataMismatch {
        /// Lines required by the declared size.
        expected: usize,
        /// Lines actually found.
        actual: usize,
    },

    /// The file could not be read as text.
    #[error("failed to read LUT file")]
    ReadFailed,
}

/// Errors surfaced by [`LutRegistry::import`](crate::LutRegistry::import).
#[derive(Debug, Error)]
pub enum ImportError {
    /// Copying into the managed directory failed.
    #[error("failed to import {path}: {source}")]
    Io {
        /// Path that could not be read or written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The copied file is not a valid 3D cube.
    #[error("invalid LUT file: {0}")]
    Invalid(#[from] ParseError),
}

impl ImportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
