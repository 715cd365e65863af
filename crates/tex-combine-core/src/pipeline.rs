use std::collections::{HashMap, HashSet};
use std::hash::{DefaultHasher, Hash, Hasher};

use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::bleed::{AlphaFix, BleedStats, fix_alpha_with};
use crate::compositing::{blit_rgba, compute_trim_rect};
use crate::config::{CombineConfig, MaxRectsHeuristic};
use crate::error::{Result, TexCombineError};
use crate::layout::pack_layout;
use crate::model::{LayoutResult, LayoutStats, Rect};
use crate::regions::{RegionTracker, sprite_regions};

/// In-memory sprite to combine (key + decoded image).
pub struct InputSprite {
    pub key: String,
    pub image: DynamicImage,
}

/// A sprite's final place in the atlas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AtlasFrame {
    pub key: String,
    /// Placed rectangle within the atlas.
    pub frame: Rect,
    /// True if transparent borders were cropped before placement.
    pub trimmed: bool,
    /// Sub-rect of the original image that was placed.
    pub source: Rect,
    /// Original (untrimmed) image size.
    pub source_size: (u32, u32),
    /// Key of the sprite whose slot this one shares (identical pixels).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_of: Option<String>,
}

/// Output of a combine run: placements, the bled atlas and its colour map.
pub struct CombineOutput {
    pub frames: Vec<AtlasFrame>,
    /// Keys that did not fit the canvas, aliases of dropped sprites included.
    pub dropped: Vec<String>,
    pub heuristic: Option<MaxRectsHeuristic>,
    pub atlas: RgbaImage,
    pub color_map: RgbaImage,
    /// Counts distinct slots only; aliases are not laid out.
    pub layout_stats: LayoutStats,
    pub bleed_stats: BleedStats,
}

/// A decoded sprite ready for compositing.
pub struct PreparedSprite {
    pub rgba: RgbaImage,
    pub source: Rect,
    pub trimmed: bool,
    pub source_size: (u32, u32),
}

impl PreparedSprite {
    pub fn new(image: &DynamicImage, trim: bool) -> Self {
        let rgba = image.to_rgba8();
        let (w, h) = rgba.dimensions();
        let full = Rect::new(0, 0, w, h);
        let source = if trim {
            compute_trim_rect(&rgba).unwrap_or(full)
        } else {
            full
        };
        Self {
            trimmed: source != full,
            source,
            source_size: (w, h),
            rgba,
        }
    }

    /// Rows of the placed sub-rect, as raw RGBA bytes.
    fn source_rows(&self) -> impl Iterator<Item = &[u8]> {
        let stride = self.rgba.width() as usize * 4;
        let raw = self.rgba.as_raw();
        let x0 = self.source.x as usize * 4;
        let x1 = self.source.right() as usize * 4;
        (self.source.y..self.source.bottom()).map(move |y| {
            let row = y as usize * stride;
            &raw[row + x0..row + x1]
        })
    }

    /// Hash of the placed pixels and their size.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        (self.source.w, self.source.h).hash(&mut hasher);
        for row in self.source_rows() {
            row.hash(&mut hasher);
        }
        hasher.finish()
    }

    /// True when both sprites would draw exactly the same pixels.
    pub fn same_pixels(&self, other: &PreparedSprite) -> bool {
        self.source.w == other.source.w
            && self.source.h == other.source.h
            && self.source_rows().eq(other.source_rows())
    }
}

/// Maps every sprite whose pixels repeat an earlier one (in `order`) to that earlier key.
///
/// Only the first key of each group is laid out; the others share its slot.
pub fn find_aliases(
    order: &[String],
    sprites: &HashMap<String, PreparedSprite>,
) -> HashMap<String, String> {
    let mut buckets: HashMap<u64, Vec<&str>> = HashMap::new();
    let mut aliases = HashMap::new();
    for key in order {
        let Some(sprite) = sprites.get(key) else {
            continue;
        };
        let bucket = buckets.entry(sprite.content_hash()).or_default();
        let first = bucket
            .iter()
            .find(|c| sprites.get(**c).is_some_and(|o| o.same_pixels(sprite)))
            .copied();
        match first {
            Some(canonical) => {
                aliases.insert(key.clone(), canonical.to_string());
            }
            None => bucket.push(key.as_str()),
        }
    }
    aliases
}

/// One frame per key in `order`, aliases pointing at their group's slot.
///
/// Returns the frames and the keys (aliases included) whose slot was not placed.
pub fn atlas_frames(
    layout: &LayoutResult,
    order: &[String],
    sprites: &HashMap<String, PreparedSprite>,
    aliases: &HashMap<String, String>,
) -> (Vec<AtlasFrame>, Vec<String>) {
    let mut frames = Vec::with_capacity(order.len());
    let mut dropped = Vec::new();
    for key in order {
        let alias_of = aliases.get(key);
        let slot = alias_of.map_or(key.as_str(), String::as_str);
        match (layout.get(slot), sprites.get(key)) {
            (Some(frame), Some(s)) => frames.push(AtlasFrame {
                key: key.clone(),
                frame: *frame,
                trimmed: s.trimmed,
                source: s.source,
                source_size: s.source_size,
                alias_of: alias_of.cloned(),
            }),
            _ => dropped.push(key.clone()),
        }
    }
    (frames, dropped)
}

#[instrument(skip_all)]
/// Lays out `inputs`, draws them onto a blank canvas and repairs transparent edge colour.
///
/// Sprites with identical pixels share one slot: each still gets its own frame, with
/// `alias_of` naming the sprite that was laid out. Sprites that do not fit are reported
/// in `CombineOutput::dropped`; the canvas is always exactly `canvas_width x canvas_height`.
pub fn combine_sprites(inputs: Vec<InputSprite>, cfg: &CombineConfig) -> Result<CombineOutput> {
    cfg.validate()?;

    let mut order: Vec<String> = Vec::with_capacity(inputs.len());
    let mut prepared: HashMap<String, PreparedSprite> = HashMap::with_capacity(inputs.len());
    let mut seen: HashSet<String> = HashSet::with_capacity(inputs.len());
    for inp in inputs {
        if !seen.insert(inp.key.clone()) {
            return Err(TexCombineError::InvalidInput(format!(
                "duplicate sprite key: {}",
                inp.key
            )));
        }
        prepared.insert(inp.key.clone(), PreparedSprite::new(&inp.image, cfg.trim));
        order.push(inp.key);
    }

    let aliases = find_aliases(&order, &prepared);
    if !aliases.is_empty() {
        info!(aliases = aliases.len(), "identical sprites share a slot");
    }
    let sizes: Vec<(String, u32, u32)> = order
        .iter()
        .filter(|k| !aliases.contains_key(*k))
        .filter_map(|k| prepared.get(k).map(|p| (k.clone(), p.source.w, p.source.h)))
        .collect();

    let layout = pack_layout(sizes, cfg)?;
    let (mut atlas, regions) = compose_atlas(&layout, &prepared);

    info!(algorithm = %cfg.bleed_algorithm, "fixing alpha colour");
    let AlphaFix { color_map, stats } =
        fix_alpha_with(&mut atlas, &regions, cfg.bleed_algorithm, cfg.parallel)?;

    let (frames, dropped) = atlas_frames(&layout, &order, &prepared, &aliases);

    Ok(CombineOutput {
        frames,
        dropped,
        heuristic: layout.heuristic,
        atlas,
        color_map,
        layout_stats: layout.stats,
        bleed_stats: stats,
    })
}

/// Draws every placed sprite onto a blank canvas and collects the padded regions.
///
/// Draws run one after another; placements never overlap, so order does not matter.
pub fn compose_atlas(
    layout: &LayoutResult,
    sprites: &HashMap<String, PreparedSprite>,
) -> (RgbaImage, Vec<Rect>) {
    let (w, h) = layout.canvas;
    let mut canvas = RgbaImage::new(w, h);
    let mut tracker = RegionTracker::new(layout.margin);
    for p in &layout.placements {
        let Some(sprite) = sprites.get(&p.key) else {
            continue;
        };
        blit_rgba(&sprite.rgba, &mut canvas, p.frame.x, p.frame.y, sprite.source);
        tracker.track(&p.frame);
    }
    (canvas, tracker.into_regions())
}

/// Runs the alpha-bleed fixer over a canvas the caller composited from `layout`.
pub fn bleed_layout(
    canvas: &mut RgbaImage,
    layout: &LayoutResult,
    cfg: &CombineConfig,
) -> Result<AlphaFix> {
    if canvas.dimensions() != layout.canvas {
        return Err(TexCombineError::BufferMismatch {
            expected: layout.canvas,
            actual: canvas.dimensions(),
        });
    }
    let regions = sprite_regions(&layout.placements, layout.margin);
    fix_alpha_with(canvas, &regions, cfg.bleed_algorithm, cfg.parallel)
}
