//! Adobe/Resolve `.cube` parsing (3D only).
//!
//! # Format
//!
//! ```text
//! # Comment
//! TITLE "Look"
//! LUT_3D_SIZE 33
//! DOMAIN_MIN 0.0 0.0 0.0
//! DOMAIN_MAX 1.0 1.0 1.0
//! 0.0 0.0 0.0
//! ...
//! 1.0 1.0 1.0
//! ```
//!
//! Parsing is lenient about data lines: anything that does not start with
//! three numbers is skipped, and values are clamped to [0, 1]. It is strict
//! about structure: the lattice size must be declared, lie in `2..=65`, and
//! match the number of data lines exactly. `TITLE` and `DOMAIN_*` are
//! accepted and ignored.

use std::fs;
use std::path::Path;

use tracing::trace;

use crate::{Lut3D, ParseError, ParseResult};

/// Largest supported lattice size.
pub const MAX_DIMENSION: usize = 65;

/// Reads and parses a `.cube` file.
///
/// Any read failure, including non-UTF-8 content, maps to [`ParseError::ReadFailed`].
pub fn read<P: AsRef<Path>>(path: P) -> ParseResult<Lut3D> {
    let contents = fs::read_to_string(path.as_ref()).map_err(|_| ParseError::ReadFailed)?;
    parse(&contents)
}

/// Parses `.cube` text into an anonymous [`Lut3D`].
pub fn parse(contents: &str) -> ParseResult<Lut3D> {
    // 1D files are rejected no matter what else they declare.
    if lines(contents).any(|line| line.starts_with("LUT_1D_SIZE")) {
        return Err(ParseError::Unsupported1D);
    }

    let mut size: Option<usize> = None;
    let mut rgb: Vec<[f32; 3]> = Vec::new();

    for line in lines(contents) {
        if line.starts_with("LUT_3D_SIZE") {
            if let Some(n) = parse_size(line)? {
                size = Some(n);
                rgb.reserve(n * n * n);
            }
            continue;
        }

        if line.starts_with("TITLE") || line.starts_with("DOMAIN_MIN") || line.starts_with("DOMAIN_MAX") {
            continue;
        }

        if let Some(triplet) = parse_triplet(line) {
            rgb.push(triplet);
        }
    }

    let dimension = size.ok_or(ParseError::InvalidSize)?;
    let expected = dimension * dimension * dimension;
    if rgb.len() != expected {
        return Err(ParseError::DataMismatch { expected, actual: rgb.len() });
    }

    trace!(dimension, entries = expected, "parsed cube");

    let mut rgba = Vec::with_capacity(expected * 4);
    for [r, g, b] in rgb {
        rgba.extend_from_slice(&[r, g, b, 1.0]);
    }
    Lut3D::from_rgba(dimension, rgba)
}

/// Trimmed, non-empty, non-comment lines.
fn lines(contents: &str) -> impl Iterator<Item = &str> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Size from the last token of a `LUT_3D_SIZE` line. A non-numeric token is ignored.
fn parse_size(line: &str) -> ParseResult<Option<usize>> {
    let Some(n) = line.split_whitespace().last().and_then(|t| t.parse::<i64>().ok()) else {
        return Ok(None);
    };
    if n < 2 {
        return Err(ParseError::InvalidSize);
    }
    let n = n as usize;
    if n > MAX_DIMENSION {
        return Err(ParseError::UnsupportedSize(n));
    }
    Ok(Some(n))
}

fn parse_triplet(line: &str) -> Option<[f32; 3]> {
    let mut parts = line.split_whitespace();
    let mut out = [0.0f32; 3];
    for v in &mut out {
        let value: f32 = parts.next()?.parse().ok()?;
        if value.is_nan() {
            return None;
        }
        *v = value.clamp(0.0, 1.0);
    }
    Some(out)
}
