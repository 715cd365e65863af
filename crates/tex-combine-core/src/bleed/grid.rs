use image::{Rgba, RgbaImage};

use super::kernel::{Blend, Kernel};
use crate::model::Rect;

/// Owned copy of one sprite region: its pixels and which of them are resolved.
///
/// Neighbour lookups never leave the grid, so a region only ever sees its own pixels.
#[derive(Debug, Clone)]
pub struct RegionGrid {
    bounds: Rect,
    pixels: Vec<[u8; 4]>,
    processed: Vec<bool>,
    fixed: Vec<bool>,
}

/// Outcome of filling one region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillReport {
    /// Passes that resolved at least one pixel.
    pub passes: usize,
    pub resolved: usize,
    /// Transparent pixels no pass could reach.
    pub unresolved: usize,
}

impl RegionGrid {
    /// Copies `bounds` out of `image`. `bounds` must already be clipped to the image.
    pub fn extract(image: &RgbaImage, bounds: Rect) -> Self {
        let len = bounds.area() as usize;
        let mut pixels = Vec::with_capacity(len);
        for y in bounds.y..bounds.bottom() {
            for x in bounds.x..bounds.right() {
                pixels.push(image.get_pixel(x, y).0);
            }
        }
        Self {
            bounds,
            pixels,
            processed: vec![false; len],
            fixed: vec![false; len],
        }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn is_processed(&self, x: u32, y: u32) -> bool {
        self.index(x, y).is_some_and(|i| self.processed[i])
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if !self.bounds.contains_point(x, y) {
            return None;
        }
        let lx = (x - self.bounds.x) as usize;
        let ly = (y - self.bounds.y) as usize;
        Some(ly * self.bounds.w as usize + lx)
    }

    /// Marks every pixel with non-zero alpha as resolved.
    pub fn mark_opaque(&mut self) {
        for (done, px) in self.processed.iter_mut().zip(&self.pixels) {
            if px[3] > 0 {
                *done = true;
            }
        }
    }

    /// Repeats fill passes until one resolves nothing.
    ///
    /// Each pass first collects every unresolved pixel with a resolved tap, then
    /// computes all of their colours from the state before the pass, then commits.
    /// Colour therefore spreads one ring outward per pass.
    pub fn fill(&mut self, kernel: &Kernel) -> FillReport {
        let mut report = FillReport::default();
        let (w, h) = (self.bounds.w as i64, self.bounds.h as i64);
        loop {
            let mut batch: Vec<(usize, [u8; 4])> = Vec::new();
            for ly in 0..h {
                for lx in 0..w {
                    let i = (ly * w + lx) as usize;
                    if self.processed[i] || self.pixels[i][3] > 0 {
                        continue;
                    }
                    if let Some(color) = self.reconstruct(lx, ly, kernel) {
                        batch.push((i, color));
                    }
                }
            }
            if batch.is_empty() {
                break;
            }
            for &(i, color) in &batch {
                self.pixels[i] = color;
                self.processed[i] = true;
                self.fixed[i] = true;
            }
            report.passes += 1;
            report.resolved += batch.len();
        }
        report.unresolved = self
            .processed
            .iter()
            .zip(&self.pixels)
            .filter(|(done, px)| !**done && px[3] == 0)
            .count();
        report
    }

    /// Colour for the transparent pixel at local `(lx, ly)`, or `None` when no tap
    /// lands on a resolved pixel. The result keeps alpha at 0.
    fn reconstruct(&self, lx: i64, ly: i64, kernel: &Kernel) -> Option<[u8; 4]> {
        let (w, h) = (self.bounds.w as i64, self.bounds.h as i64);
        let mut total = 0f32;
        let mut acc = [0f32; 3];
        let mut found = false;
        for tap in &kernel.taps {
            let nx = lx + tap.dx as i64;
            let ny = ly + tap.dy as i64;
            if nx < 0 || ny < 0 || nx >= w || ny >= h {
                continue;
            }
            let j = (ny * w + nx) as usize;
            let px = self.pixels[j];
            if !self.processed[j] && px[3] == 0 {
                continue;
            }
            found = true;
            match kernel.blend {
                Blend::First => return Some([px[0], px[1], px[2], 0]),
                Blend::Average => {
                    total += tap.weight;
                    for (a, &v) in acc.iter_mut().zip(&px[..3]) {
                        *a += v as f32 * tap.weight;
                    }
                }
            }
        }
        if !found {
            return None;
        }
        if total <= 0.0 {
            return Some([0, 0, 0, 0]);
        }
        // round to nearest; channels are not truncated
        let channel = |v: f32| (v / total).round().clamp(0.0, 255.0) as u8;
        Some([channel(acc[0]), channel(acc[1]), channel(acc[2]), 0])
    }

    /// Copies fixed pixels back into `image` and their opaque colour into `color_map`.
    pub fn write_back(&self, image: &mut RgbaImage, color_map: &mut RgbaImage) {
        let w = self.bounds.w as usize;
        for (i, px) in self.pixels.iter().enumerate() {
            if !self.fixed[i] {
                continue;
            }
            let x = self.bounds.x + (i % w) as u32;
            let y = self.bounds.y + (i / w) as u32;
            image.put_pixel(x, y, Rgba(*px));
            color_map.put_pixel(x, y, Rgba([px[0], px[1], px[2], 255]));
        }
    }
}
