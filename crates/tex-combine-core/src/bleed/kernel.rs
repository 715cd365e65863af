use crate::config::BleedAlgorithm;

/// One neighbour offset and the weight its colour contributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tap {
    pub dx: i32,
    pub dy: i32,
    pub weight: f32,
}

/// How resolved neighbours are combined into a colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blend {
    /// Take the first resolved tap in order.
    First,
    /// Weighted average over every resolved tap.
    Average,
}

/// Neighbourhood used to reconstruct a transparent pixel.
///
/// The taps double as the eligibility test: a pixel is fixed in a pass
/// when at least one tap lands on a resolved pixel of the same region.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    pub taps: Vec<Tap>,
    pub blend: Blend,
}

/// Right, down, left, up, then the diagonals.
const NEIGHBORS_8: [(i32, i32); 8] = [
    (1, 0),
    (0, 1),
    (-1, 0),
    (0, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
    (1, -1),
];

/// The 8-neighbourhood plus the twelve cells at distance 2 and sqrt(5).
const NEIGHBORS_20: [(i32, i32); 20] = [
    (1, 0),
    (0, 1),
    (-1, 0),
    (0, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
    (1, -1),
    (2, 0),
    (0, 2),
    (-2, 0),
    (0, -2),
    (2, 1),
    (1, 2),
    (-1, 2),
    (-2, 1),
    (-2, -1),
    (-1, -2),
    (1, -2),
    (2, -1),
];

const LINEAR_MAX_DISTANCE: f32 = 3.0;
const GAUSSIAN_SIGMA: f32 = 2.0;

impl Kernel {
    /// Kernel for `algorithm`; `None` for `BleedAlgorithm::None`.
    pub fn for_algorithm(algorithm: BleedAlgorithm) -> Option<Kernel> {
        match algorithm {
            BleedAlgorithm::None => None,
            BleedAlgorithm::Nearest => Some(Self::build(&NEIGHBORS_8, Blend::First, |_| 1.0)),
            BleedAlgorithm::Weighted => {
                Some(Self::build(&NEIGHBORS_8, Blend::Average, linear_weight))
            }
            BleedAlgorithm::Gaussian => {
                Some(Self::build(&NEIGHBORS_20, Blend::Average, gaussian_weight))
            }
        }
    }

    fn build(offsets: &[(i32, i32)], blend: Blend, weight: impl Fn(f32) -> f32) -> Kernel {
        let taps = offsets
            .iter()
            .map(|&(dx, dy)| {
                let distance = ((dx * dx + dy * dy) as f32).sqrt();
                Tap {
                    dx,
                    dy,
                    weight: weight(distance),
                }
            })
            .collect();
        Kernel { taps, blend }
    }
}

pub fn linear_weight(distance: f32) -> f32 {
    (1.0 - distance / LINEAR_MAX_DISTANCE).max(0.0)
}

pub fn gaussian_weight(distance: f32) -> f32 {
    (-(distance * distance) / (2.0 * GAUSSIAN_SIGMA * GAUSSIAN_SIGMA)).exp()
}
