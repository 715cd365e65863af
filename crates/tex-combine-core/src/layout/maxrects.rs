use super::SpriteSize;
use crate::config::MaxRectsHeuristic;
use crate::model::{Placement, Rect};

/// Free-rectangle bin packer over a fixed canvas.
///
/// The free list only ever holds maximal rectangles: after every placement
/// any free rectangle wholly contained in another is pruned.
pub struct MaxRectsPacker {
    free: Vec<Rect>,
    heuristic: MaxRectsHeuristic,
}

impl MaxRectsPacker {
    pub fn new(width: u32, height: u32, heuristic: MaxRectsHeuristic) -> Self {
        Self {
            free: vec![Rect::new(0, 0, width, height)],
            heuristic,
        }
    }

    pub fn heuristic(&self) -> MaxRectsHeuristic {
        self.heuristic
    }

    pub fn free_rects(&self) -> &[Rect] {
        &self.free
    }

    /// Reserves a `w x h` slot. Returns the reserved rectangle or `None` if nothing fits.
    pub fn insert(&mut self, w: u32, h: u32) -> Option<Rect> {
        if w == 0 || h == 0 {
            return None;
        }
        let node = self.find_position(w, h)?;
        self.place_rect(&node);
        Some(node)
    }

    fn score(&self, fr: &Rect, w: u32, h: u32) -> (i64, i64) {
        let leftover_h = fr.w as i64 - w as i64;
        let leftover_v = fr.h as i64 - h as i64;
        let short_fit = leftover_h.min(leftover_v);
        let long_fit = leftover_h.max(leftover_v);
        let area_fit = fr.area() as i64 - (w as i64 * h as i64);
        match self.heuristic {
            MaxRectsHeuristic::BestShortSideFit => (short_fit, long_fit),
            MaxRectsHeuristic::BestLongSideFit => (long_fit, short_fit),
            MaxRectsHeuristic::BestAreaFit => (area_fit, short_fit),
            MaxRectsHeuristic::BottomLeft => (fr.y as i64, fr.x as i64),
        }
    }

    fn find_position(&self, w: u32, h: u32) -> Option<Rect> {
        let mut best: Option<(Rect, (i64, i64))> = None;
        for fr in &self.free {
            if fr.w < w || fr.h < h {
                continue;
            }
            let s = self.score(fr, w, h);
            // strict comparison keeps the earliest candidate on ties
            if best.is_none_or(|(_, bs)| s < bs) {
                best = Some((Rect::new(fr.x, fr.y, w, h), s));
            }
        }
        best.map(|(r, _)| r)
    }

    fn place_rect(&mut self, node: &Rect) {
        let mut new_free: Vec<Rect> = Vec::with_capacity(self.free.len() + 4);
        for fr in self.free.iter() {
            if !fr.intersects(node) {
                new_free.push(*fr);
                continue;
            }
            split_free_node(fr, node, &mut new_free);
        }
        self.free = new_free;
        self.prune_free_list();
    }

    fn prune_free_list(&mut self) {
        let mut i = 0;
        while i < self.free.len() {
            let a = self.free[i];
            let mut remove_i = false;
            let mut j = i + 1;
            while j < self.free.len() {
                let b = self.free[j];
                if b.contains(&a) {
                    remove_i = true;
                    break;
                }
                if a.contains(&b) {
                    self.free.remove(j);
                    continue;
                }
                j += 1;
            }
            if remove_i {
                self.free.remove(i);
            } else {
                i += 1;
            }
        }
    }
}

/// Pushes the up-to-four maximal remainders of `fr` around `node`.
fn split_free_node(fr: &Rect, node: &Rect, out: &mut Vec<Rect>) {
    // above
    if node.y > fr.y {
        out.push(Rect::new(fr.x, fr.y, fr.w, node.y - fr.y));
    }
    // below
    if node.bottom() < fr.bottom() {
        out.push(Rect::new(fr.x, node.bottom(), fr.w, fr.bottom() - node.bottom()));
    }
    // left
    if node.x > fr.x {
        out.push(Rect::new(fr.x, fr.y, node.x - fr.x, fr.h));
    }
    // right
    if node.right() < fr.right() {
        out.push(Rect::new(node.right(), fr.y, fr.right() - node.right(), fr.h));
    }
}

/// Packs `sprites` with a single heuristic, starting from an empty canvas.
///
/// Sprites are taken in descending area order (then descending longest side);
/// each reserves `w + 2*margin` by `h + 2*margin` and is reported with the margin stripped.
pub fn pack_with_heuristic(
    sprites: &[SpriteSize],
    width: u32,
    height: u32,
    margin: u32,
    heuristic: MaxRectsHeuristic,
) -> Vec<Placement> {
    let mut order: Vec<&SpriteSize> = sprites.iter().collect();
    order.sort_by(|a, b| {
        b.size
            .area()
            .cmp(&a.size.area())
            .then_with(|| b.size.w.max(b.size.h).cmp(&a.size.w.max(a.size.h)))
    });

    let pad = margin.saturating_mul(2);
    let mut packer = MaxRectsPacker::new(width, height, heuristic);
    let mut placements = Vec::with_capacity(order.len());
    for s in order {
        let w = s.size.w.saturating_add(pad);
        let h = s.size.h.saturating_add(pad);
        if let Some(slot) = packer.insert(w, h) {
            placements.push(Placement {
                key: s.key.clone(),
                frame: Rect::new(slot.x + margin, slot.y + margin, s.size.w, s.size.h),
            });
        }
    }
    placements
}
