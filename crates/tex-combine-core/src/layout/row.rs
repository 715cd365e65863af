use tracing::warn;

use super::{SpriteSize, natural_cmp};
use crate::model::{Placement, Rect};

/// Greedy row packer: tallest sprites first, left to right, new row on overflow.
///
/// Packing stops at the first sprite whose row would exceed `height`; that sprite and
/// everything after it are dropped. A sprite wider than the canvas on its own is skipped.
pub fn pack_rows(sprites: &[SpriteSize], width: u32, height: u32, margin: u32) -> Vec<Placement> {
    let mut order: Vec<&SpriteSize> = sprites.iter().collect();
    order.sort_by(|a, b| {
        b.size
            .h
            .cmp(&a.size.h)
            .then_with(|| natural_cmp(&a.key, &b.key))
    });

    let pad = margin as u64 * 2;
    let (width, height) = (width as u64, height as u64);
    let mut x = 0u64;
    let mut y = 0u64;
    let mut row_h = 0u64;
    let mut placements = Vec::with_capacity(order.len());

    for s in order {
        let w = s.size.w as u64;
        let h = s.size.h as u64;
        if w + pad > width {
            warn!(key = %s.key, w, "sprite is wider than the canvas; skipped");
            continue;
        }
        if x + w + pad > width && x > 0 {
            x = 0;
            y += row_h + pad;
            row_h = 0;
        }
        row_h = row_h.max(h);
        if y + row_h + pad > height {
            warn!(key = %s.key, "not enough space for sprite; remaining sprites dropped");
            break;
        }
        placements.push(Placement {
            key: s.key.clone(),
            frame: Rect::new((x + margin as u64) as u32, (y + margin as u64) as u32, s.size.w, s.size.h),
        });
        x += w + pad;
    }
    placements
}
