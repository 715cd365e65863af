//! Core library for combining many sprites into a single texture atlas.
//!
//! - Layout: MaxRects (BSSF/BLSF/BAF/BL, best run selected) and a simple row packer
//! - Alpha bleed: Nearest / Weighted / Gaussian colour reconstruction under
//!   transparent pixels, scoped to each sprite's padded region
//! - Pipeline: `combine_sprites` takes in-memory images and returns the atlas,
//!   its colour map and the placements
//!
//! Quick example:
//! ```ignore
//! use image::ImageReader;
//! use tex_combine_core::{CombineConfig, InputSprite, combine_sprites};
//! # fn main() -> anyhow::Result<()> {
//! let inputs = vec![
//!   InputSprite { key: "a".into(), image: ImageReader::open("a.png")?.decode()? },
//!   InputSprite { key: "b".into(), image: ImageReader::open("b.png")?.decode()? },
//! ];
//! let cfg = CombineConfig { canvas_width: 512, canvas_height: 512, ..Default::default() };
//! let out = combine_sprites(inputs, &cfg)?;
//! println!("placed: {}, dropped: {}", out.frames.len(), out.dropped.len());
//! # Ok(()) }
//! ```

pub mod bleed;
pub mod compositing;
pub mod config;
pub mod error;
pub mod layout;
pub mod model;
pub mod pipeline;
pub mod regions;

pub use bleed::{AlphaFix, BleedStats, fix_alpha};
pub use config::*;
pub use error::*;
pub use layout::{SpriteSize, natural_cmp, pack_layout};
pub use model::*;
pub use pipeline::*;
pub use regions::{RegionTracker, sprite_regions};

/// Convenience prelude for common types and functions.
/// Importing `tex_combine_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::bleed::{AlphaFix, BleedStats, fix_alpha};
    pub use crate::config::{
        BleedAlgorithm, CombineConfig, CombineConfigBuilder, LayoutStrategy, MaxRectsHeuristic,
    };
    pub use crate::model::{LayoutResult, LayoutStats, Placement, Rect, Size};
    pub use crate::regions::{RegionTracker, sprite_regions};
    pub use crate::{
        AtlasFrame, CombineOutput, InputSprite, bleed_layout, combine_sprites, pack_layout,
    };
}
