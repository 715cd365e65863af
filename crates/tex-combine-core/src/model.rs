use serde::{Deserialize, Serialize};

use crate::config::{LayoutStrategy, MaxRectsHeuristic};

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Exclusive right edge (`x + w`, saturating at `u32::MAX`).
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.w)
    }
    /// Exclusive bottom edge (`y + h`, saturating at `u32::MAX`).
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
    /// Returns true if `r` lies fully inside `self`.
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    pub fn contains_point(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x < self.right() && y < self.bottom()
    }
    /// True if the two rectangles share at least one pixel.
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.x >= other.right()
            || other.x >= self.right()
            || self.y >= other.bottom()
            || other.y >= self.bottom())
    }
    /// Grows the rectangle by `margin` on every side, saturating at the origin.
    pub fn expand(&self, margin: u32) -> Rect {
        let x = self.x.saturating_sub(margin);
        let y = self.y.saturating_sub(margin);
        let right = self.right().saturating_add(margin);
        let bottom = self.bottom().saturating_add(margin);
        Rect::new(x, y, right - x, bottom - y)
    }
    /// Clips against a `width x height` canvas. `None` when nothing remains.
    pub fn clip(&self, width: u32, height: u32) -> Option<Rect> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let right = self.right().min(width);
        let bottom = self.bottom().min(height);
        if self.x >= right || self.y >= bottom {
            return None;
        }
        Some(Rect::new(self.x, self.y, right - self.x, bottom - self.y))
    }
}

/// Width/height of a sprite handed to the layout engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
}

/// A sprite placed by the layout engine. `frame` excludes the margin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Placement<K = String> {
    pub key: K,
    pub frame: Rect,
}

/// Utilization of a single layout run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LayoutStats {
    /// Sprites that received a placement.
    pub placed: usize,
    /// Sprites handed to the layout engine.
    pub total: usize,
    /// Sum of placed sprite areas (margin excluded).
    pub used_area: u64,
    pub canvas_area: u64,
    /// used_area / canvas_area (0.0 to 1.0).
    pub occupancy: f64,
}

impl LayoutStats {
    pub fn from_placements<K>(placements: &[Placement<K>], total: usize, width: u32, height: u32) -> Self {
        let used_area: u64 = placements.iter().map(|p| p.frame.area()).sum();
        let canvas_area = width as u64 * height as u64;
        let occupancy = if canvas_area > 0 && !placements.is_empty() {
            used_area as f64 / canvas_area as f64
        } else {
            0.0
        };
        Self {
            placed: placements.len(),
            total,
            used_area,
            canvas_area,
            occupancy,
        }
    }

    pub fn dropped(&self) -> usize {
        self.total.saturating_sub(self.placed)
    }

    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Placed: {}/{}, Occupancy: {:.2}%, Used Area: {} px², Canvas Area: {} px²",
            self.placed,
            self.total,
            self.occupancy * 100.0,
            self.used_area,
            self.canvas_area,
        )
    }
}

/// Output of the layout engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutResult {
    /// Placements in the order the layout produced them.
    pub placements: Vec<Placement>,
    /// Keys that did not fit, in input order.
    pub dropped: Vec<String>,
    pub strategy: LayoutStrategy,
    /// Heuristic that produced the placements (MaxRects only).
    pub heuristic: Option<MaxRectsHeuristic>,
    pub canvas: (u32, u32),
    pub margin: u32,
    pub stats: LayoutStats,
}

impl LayoutResult {
    pub fn get(&self, key: &str) -> Option<&Rect> {
        self.placements
            .iter()
            .find(|p| p.key == key)
            .map(|p| &p.frame)
    }
}
