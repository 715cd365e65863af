use tracing::debug;

use super::SpriteSize;
use super::maxrects::pack_with_heuristic;
use crate::config::MaxRectsHeuristic;
use crate::model::{LayoutStats, Placement};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One MaxRects run under a fixed heuristic.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub heuristic: MaxRectsHeuristic,
    pub placements: Vec<Placement>,
    pub stats: LayoutStats,
}

impl Candidate {
    /// Ranks by placed count, then occupancy.
    fn beats(&self, other: &Candidate) -> bool {
        self.stats.placed > other.stats.placed
            || (self.stats.placed == other.stats.placed
                && self.stats.occupancy > other.stats.occupancy)
    }
}

fn run(
    sprites: &[SpriteSize],
    width: u32,
    height: u32,
    margin: u32,
    heuristic: MaxRectsHeuristic,
) -> Candidate {
    let placements = pack_with_heuristic(sprites, width, height, margin, heuristic);
    let stats = LayoutStats::from_placements(&placements, sprites.len(), width, height);
    debug!(%heuristic, placed = stats.placed, occupancy = stats.occupancy, "maxrects candidate");
    Candidate {
        heuristic,
        placements,
        stats,
    }
}

/// Runs every heuristic in `heuristics` from scratch and keeps the best run:
/// most sprites placed, then highest occupancy. Earlier heuristics win exact ties.
///
/// Returns `None` only when `heuristics` is empty.
pub fn select_best(
    sprites: &[SpriteSize],
    width: u32,
    height: u32,
    margin: u32,
    heuristics: &[MaxRectsHeuristic],
    parallel: bool,
) -> Option<Candidate> {
    let candidates: Vec<Candidate> = {
        #[cfg(feature = "parallel")]
        {
            if parallel {
                heuristics
                    .par_iter()
                    .map(|&h| run(sprites, width, height, margin, h))
                    .collect()
            } else {
                heuristics
                    .iter()
                    .map(|&h| run(sprites, width, height, margin, h))
                    .collect()
            }
        }
        #[cfg(not(feature = "parallel"))]
        {
            let _ = parallel;
            heuristics
                .iter()
                .map(|&h| run(sprites, width, height, margin, h))
                .collect()
        }
    };

    let mut best: Option<Candidate> = None;
    for cand in candidates {
        match &best {
            Some(b) if !cand.beats(b) => {}
            _ => best = Some(cand),
        }
    }
    best
}
