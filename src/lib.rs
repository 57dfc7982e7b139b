//! Hexagonal tile-breaking for repeated textures
//!
//! Re-exports modules for use by binaries and tools.

pub mod blend;
pub mod error;
pub mod hash;
pub mod lattice;
pub mod material;
pub mod params;
pub mod procedural;
pub mod render;
pub mod texture;

pub use blend::{evaluate, evaluate_with_stats, BlendOutput, SamplePlan};
pub use error::DetileError;
pub use hash::{cell_transform, CellTransform};
pub use lattice::{decompose, CellId, LatticeSample, WeightedCell};
pub use material::{Channel, HexTiledMaterial, SurfaceSample};
pub use params::{HexTilingConfig, HexTilingParams};
pub use texture::{ColorSpace, ImageTexture, Rgba, SolidTexture, Texture};
