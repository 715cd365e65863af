use crate::model::{Placement, Rect};

/// Collects the padded region of every placed sprite; these scope the alpha-bleed fixer.
#[derive(Debug, Clone, Default)]
pub struct RegionTracker {
    margin: u32,
    regions: Vec<Rect>,
}

impl RegionTracker {
    pub fn new(margin: u32) -> Self {
        Self {
            margin,
            regions: Vec::new(),
        }
    }

    /// Records the region for a sprite placed at `frame`.
    pub fn track(&mut self, frame: &Rect) -> Rect {
        let region = frame.expand(self.margin);
        self.regions.push(region);
        region
    }

    pub fn regions(&self) -> &[Rect] {
        &self.regions
    }

    pub fn into_regions(self) -> Vec<Rect> {
        self.regions
    }
}

/// Padded regions for a whole layout, in placement order.
pub fn sprite_regions<K>(placements: &[Placement<K>], margin: u32) -> Vec<Rect> {
    let mut tracker = RegionTracker::new(margin);
    for p in placements {
        tracker.track(&p.frame);
    }
    tracker.into_regions()
}

/// Index pair of the first two regions that share a pixel.
pub fn find_overlap(regions: &[Rect]) -> Option<(usize, usize)> {
    for i in 0..regions.len() {
        if regions[i].is_empty() {
            continue;
        }
        for j in (i + 1)..regions.len() {
            if !regions[j].is_empty() && regions[i].intersects(&regions[j]) {
                return Some((i, j));
            }
        }
    }
    None
}
