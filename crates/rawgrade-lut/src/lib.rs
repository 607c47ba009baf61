//! # rawgrade-lut
//!
//! 3D Look-Up Tables for the rawgrade color pipeline.
//!
//! This crate owns everything about LUTs that does not touch pixels in bulk:
//! parsing `.cube` files, generating programmatic presets, and the registry
//! that resolves a LUT identifier to shared, cached lattice data.
//!
//! # Identifiers
//!
//! | Id | Source |
//! |----|--------|
//! | `none` | no LUT |
//! | `bundle:<name>` | read-only preset ([`DirectoryBundle`], [`GeneratedPresets`]) |
//! | `import:<uuid>` | user import, copied into the registry's storage directory |
//!
//! # Usage
//!
//! ```rust
//! use rawgrade_lut::{cube, Lut3D};
//!
//! let lut = Lut3D::identity(2);
//! assert_eq!(lut.data().len(), 2 * 2 * 2 * 4);
//!
//! let text = "LUT_3D_SIZE 2\n0 0 0\n1 0 0\n0 1 0\n1 1 0\n0 0 1\n1 0 1\n0 1 1\n1 1 1\n";
//! let parsed = cube::parse(text).unwrap();
//! assert_eq!(parsed.dimension(), 2);
//! ```
//!
//! # Data layout
//!
//! Lattice data is stored in `.cube` file order: R varies fastest, B slowest,
//! one RGBA entry (alpha = 1.0) per lattice point. The same layout is uploaded
//! verbatim as a 3D texture, so it is never reordered.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
mod id;
mod lut3d;
pub mod bundle;
pub mod cube;
pub mod prefs;
pub mod registry;

pub use bundle::{BundleSource, DirectoryBundle, GeneratedPresets};
pub use error::{ImportError, ParseError, ParseResult};
pub use id::LutId;
pub use lut3d::{Lut3D, generate_cube_data};
pub use prefs::{JsonFilePreferences, MemoryPreferences, PreferenceStore};
pub use registry::{INDEX_KEY, IndexEntry, LutOption, LutRegistry, RegistryEvent};
