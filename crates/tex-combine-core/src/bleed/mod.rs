//! Alpha-bleed repair: reconstructs colour under fully transparent pixels that
//! border opaque sprite content, so texture filtering does not pull in black.
//!
//! Each region is copied into an owned [`RegionGrid`]; grids are marked, then
//! filled, in parallel, and finally written back. Regions must not overlap.

use image::{Rgba, RgbaImage};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::BleedAlgorithm;
use crate::error::{Result, TexCombineError};
use crate::model::Rect;
use crate::regions::find_overlap;

pub mod grid;
pub mod kernel;

pub use grid::{FillReport, RegionGrid};
pub use kernel::{Blend, Kernel, Tap};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Totals over every region of one fixer run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BleedStats {
    pub regions: usize,
    /// Transparent pixels that received a colour.
    pub resolved: usize,
    /// Transparent pixels inside regions that stayed black.
    pub unresolved: usize,
    /// Most passes any single region needed.
    pub max_passes: usize,
}

/// Result of [`fix_alpha`]. The fixed pixels themselves are written into the caller's buffer.
#[derive(Debug, Clone)]
pub struct AlphaFix {
    /// Opaque copy of every pixel's (possibly reconstructed) RGB.
    pub color_map: RgbaImage,
    pub stats: BleedStats,
}

/// Same image with alpha forced to 255.
pub fn color_map_of(buffer: &RgbaImage) -> RgbaImage {
    let (w, h) = buffer.dimensions();
    RgbaImage::from_fn(w, h, |x, y| {
        let p = buffer.get_pixel(x, y);
        Rgba([p[0], p[1], p[2], 255])
    })
}

#[instrument(skip_all, fields(algorithm = %algorithm, regions = regions.len()))]
/// Reconstructs the RGB of transparent pixels inside `regions`, in place.
///
/// Fixed pixels keep alpha 0; the returned colour map holds them opaque.
/// `BleedAlgorithm::None` leaves `buffer` untouched and only builds the colour map.
/// Pixels outside every region are never touched. Overlapping regions are rejected.
pub fn fix_alpha(
    buffer: &mut RgbaImage,
    regions: &[Rect],
    algorithm: BleedAlgorithm,
) -> Result<AlphaFix> {
    fix_alpha_with(buffer, regions, algorithm, true)
}

/// [`fix_alpha`] with explicit control over rayon fan-out.
pub fn fix_alpha_with(
    buffer: &mut RgbaImage,
    regions: &[Rect],
    algorithm: BleedAlgorithm,
    parallel: bool,
) -> Result<AlphaFix> {
    let (width, height) = buffer.dimensions();
    let mut color_map = color_map_of(buffer);
    let mut stats = BleedStats::default();
    if width == 0 || height == 0 {
        return Ok(AlphaFix { color_map, stats });
    }
    let Some(kernel) = Kernel::for_algorithm(algorithm) else {
        return Ok(AlphaFix { color_map, stats });
    };

    let clipped: Vec<Rect> = regions.iter().filter_map(|r| r.clip(width, height)).collect();
    if let Some((i, j)) = find_overlap(&clipped) {
        return Err(TexCombineError::OverlappingRegions {
            first: clipped[i],
            second: clipped[j],
        });
    }

    let mut grids: Vec<RegionGrid> = clipped
        .iter()
        .map(|&r| RegionGrid::extract(buffer, r))
        .collect();
    let reports = process_grids(&mut grids, &kernel, parallel);

    for (g, report) in grids.iter().zip(&reports) {
        g.write_back(buffer, &mut color_map);
        stats.resolved += report.resolved;
        stats.unresolved += report.unresolved;
        stats.max_passes = stats.max_passes.max(report.passes);
    }
    stats.regions = grids.len();
    debug!(
        resolved = stats.resolved,
        unresolved = stats.unresolved,
        max_passes = stats.max_passes,
        "alpha bleed completed"
    );
    Ok(AlphaFix { color_map, stats })
}

/// Marking pass over every grid, then (after all have finished) the fill pass.
fn process_grids(grids: &mut [RegionGrid], kernel: &Kernel, parallel: bool) -> Vec<FillReport> {
    #[cfg(feature = "parallel")]
    {
        if parallel {
            grids.par_iter_mut().for_each(RegionGrid::mark_opaque);
            return grids.par_iter_mut().map(|g| g.fill(kernel)).collect();
        }
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    grids.iter_mut().for_each(RegionGrid::mark_opaque);
    grids.iter_mut().map(|g| g.fill(kernel)).collect()
}
