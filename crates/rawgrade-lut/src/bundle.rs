//! Read-only preset sources behind `bundle:<name>` identifiers.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{Lut3D, ParseError, ParseResult, cube};

/// A read-only set of named presets.
pub trait BundleSource: Send + Sync {
    /// Preset names, in any order.
    fn names(&self) -> Vec<String>;

    /// Loads a preset by name. The returned LUT is anonymous; the registry names it.
    fn load(&self, name: &str) -> ParseResult<Lut3D>;
}

/// `*.cube` files in a directory. The file stem is the preset name.
#[derive(Debug, Clone)]
pub struct DirectoryBundle {
    root: PathBuf,
}

impl DirectoryBundle {
    /// Serves presets from `root`. A missing directory yields no presets.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory being served.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn is_cube(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("cube"))
}

impl BundleSource for DirectoryBundle {
    fn names(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(root = %self.root.display(), error = %e, "bundle directory unavailable");
                return Vec::new();
            }
        };

        entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_cube(path))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect()
    }

    fn load(&self, name: &str) -> ParseResult<Lut3D> {
        if name.contains(['/', '\\']) || name == ".." {
            return Err(ParseError::ReadFailed);
        }
        let path = fs::read_dir(&self.root)
            .map_err(|_| ParseError::ReadFailed)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .find(|path| {
                is_cube(path) && path.file_stem().and_then(|s| s.to_str()) == Some(name)
            })
            .ok_or(ParseError::ReadFailed)?;
        cube::read(path)
    }
}

/// A programmatic preset: lattice size plus a per-point transform.
#[derive(Debug, Clone, Copy)]
pub struct Preset {
    /// Preset name.
    pub name: &'static str,
    /// Lattice size.
    pub dimension: usize,
    /// Maps an input lattice point to its output color.
    pub transform: fn(f32, f32, f32) -> [f32; 3],
}

/// Presets generated in memory, no files involved.
#[derive(Debug, Clone)]
pub struct GeneratedPresets {
    presets: Vec<Preset>,
}

impl GeneratedPresets {
    /// Custom preset list.
    pub fn new(presets: Vec<Preset>) -> Self {
        Self { presets }
    }

    /// The looks shipped with rawgrade.
    pub fn builtin() -> Self {
        Self::new(vec![
            Preset { name: "Warm", dimension: 17, transform: warm },
            Preset { name: "Cool", dimension: 17, transform: cool },
            Preset { name: "Mono", dimension: 17, transform: mono },
            Preset { name: "Fade", dimension: 17, transform: fade },
        ])
    }
}

impl Default for GeneratedPresets {
    fn default() -> Self {
        Self::builtin()
    }
}

impl BundleSource for GeneratedPresets {
    fn names(&self) -> Vec<String> {
        self.presets.iter().map(|p| p.name.to_string()).collect()
    }

    fn load(&self, name: &str) -> ParseResult<Lut3D> {
        let preset = self
            .presets
            .iter()
            .find(|p| p.name == name)
            .ok_or(ParseError::ReadFailed)?;
        Ok(Lut3D::generate(preset.dimension, preset.transform))
    }
}

fn luma(r: f32, g: f32, b: f32) -> f32 {
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

fn warm(r: f32, g: f32, b: f32) -> [f32; 3] {
    [r * 1.06 + 0.02, g * 1.01, b * 0.90]
}

fn cool(r: f32, g: f32, b: f32) -> [f32; 3] {
    [r * 0.92, g * 1.0, b * 1.08 + 0.02]
}

fn mono(r: f32, g: f32, b: f32) -> [f32; 3] {
    let y = luma(r, g, b);
    [y, y, y]
}

/// Lifted blacks, rolled-off whites, slightly muted.
fn fade(r: f32, g: f32, b: f32) -> [f32; 3] {
    let y = luma(r, g, b);
    let lift = |v: f32| 0.08 + (v * 0.85 + y * 0.15) * 0.86;
    [lift(r), lift(g), lift(b)]
}
