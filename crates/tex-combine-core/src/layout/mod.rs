use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::{info, instrument, warn};

use crate::config::{CombineConfig, LayoutStrategy, MaxRectsHeuristic};
use crate::error::{Result, TexCombineError};
use crate::model::{LayoutResult, LayoutStats, Size};

pub mod maxrects;
pub mod row;
pub mod selector;

/// A sprite as seen by the layout engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteSize {
    pub key: String,
    pub size: Size,
}

impl SpriteSize {
    pub fn new(key: impl Into<String>, w: u32, h: u32) -> Self {
        Self {
            key: key.into(),
            size: Size::new(w, h),
        }
    }
}

#[instrument(skip_all)]
/// Lays out `(key, width, height)` records on a `canvas_width x canvas_height` canvas.
///
/// Sprites that do not fit are listed in `LayoutResult::dropped`; zero-area sprites are
/// dropped too. Duplicate keys and invalid configurations are errors.
pub fn pack_layout<K: Into<String>>(
    inputs: Vec<(K, u32, u32)>,
    cfg: &CombineConfig,
) -> Result<LayoutResult> {
    cfg.validate()?;

    let mut seen: HashSet<String> = HashSet::with_capacity(inputs.len());
    let mut keys: Vec<String> = Vec::with_capacity(inputs.len());
    let mut sprites: Vec<SpriteSize> = Vec::with_capacity(inputs.len());
    for (k, w, h) in inputs {
        let key: String = k.into();
        if !seen.insert(key.clone()) {
            return Err(TexCombineError::InvalidInput(format!("duplicate sprite key: {key}")));
        }
        keys.push(key.clone());
        if w == 0 || h == 0 {
            warn!(%key, w, h, "zero-area sprite dropped");
            continue;
        }
        sprites.push(SpriteSize::new(key, w, h));
    }

    let (width, height, margin) = (cfg.canvas_width, cfg.canvas_height, cfg.margin);
    let (placements, heuristic) = match cfg.layout_strategy {
        LayoutStrategy::SimpleRow => (row::pack_rows(&sprites, width, height, margin), None),
        LayoutStrategy::MaxRects => {
            let pinned;
            let heuristics: &[MaxRectsHeuristic] = match cfg.mr_heuristic {
                Some(h) => {
                    pinned = [h];
                    &pinned
                }
                None => &MaxRectsHeuristic::ALL,
            };
            match selector::select_best(&sprites, width, height, margin, heuristics, cfg.parallel) {
                Some(best) => (best.placements, Some(best.heuristic)),
                None => (Vec::new(), None),
            }
        }
    };

    let placed: HashSet<&str> = placements.iter().map(|p| p.key.as_str()).collect();
    let dropped: Vec<String> = keys
        .iter()
        .filter(|k| !placed.contains(k.as_str()))
        .cloned()
        .collect();
    let stats = LayoutStats::from_placements(&placements, keys.len(), width, height);

    info!(
        strategy = ?cfg.layout_strategy,
        heuristic = ?heuristic,
        placed = stats.placed,
        total = stats.total,
        occupancy = format!("{:.2}%", stats.occupancy * 100.0),
        "layout completed"
    );
    if !dropped.is_empty() {
        warn!(count = dropped.len(), ?dropped, "sprites did not fit the canvas");
    }

    Ok(LayoutResult {
        placements,
        dropped,
        strategy: cfg.layout_strategy,
        heuristic,
        canvas: (width, height),
        margin,
        stats,
    })
}

/// Numeric-aware ordering: digit runs compare by value, letters case-insensitively.
///
/// `"sprite2" < "sprite10"`; keys equal under that rule fall back to byte order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (ab, bb) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0usize, 0usize);
    while i < ab.len() && j < bb.len() {
        if ab[i].is_ascii_digit() && bb[j].is_ascii_digit() {
            let si = i;
            while i < ab.len() && ab[i].is_ascii_digit() {
                i += 1;
            }
            let sj = j;
            while j < bb.len() && bb[j].is_ascii_digit() {
                j += 1;
            }
            let na = trim_zeros(&ab[si..i]);
            let nb = trim_zeros(&bb[sj..j]);
            let ord = na.len().cmp(&nb.len()).then_with(|| na.cmp(nb));
            if ord != Ordering::Equal {
                return ord;
            }
        } else {
            let ord = ab[i].to_ascii_lowercase().cmp(&bb[j].to_ascii_lowercase());
            if ord != Ordering::Equal {
                return ord;
            }
            i += 1;
            j += 1;
        }
    }
    (ab.len() - i)
        .cmp(&(bb.len() - j))
        .then_with(|| a.cmp(b))
}

fn trim_zeros(digits: &[u8]) -> &[u8] {
    let first = digits.iter().position(|&d| d != b'0').unwrap_or(digits.len());
    &digits[first..]
}
