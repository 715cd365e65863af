use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TexCombineError;

/// Layout strategies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutStrategy {
    /// MaxRects free-list packing; every heuristic is tried unless one is pinned.
    MaxRects,
    /// Greedy rows, tallest sprites first. Baseline and predictable.
    SimpleRow,
}

impl FromStr for LayoutStrategy {
    type Err = TexCombineError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "maxrects" | "max-rects" => Ok(Self::MaxRects),
            "simple-row" | "simple" | "row" => Ok(Self::SimpleRow),
            _ => Err(TexCombineError::UnknownOption {
                kind: "layout strategy",
                value: s.to_string(),
            }),
        }
    }
}

/// MaxRects free-rectangle choice heuristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MaxRectsHeuristic {
    BestShortSideFit,
    BestLongSideFit,
    BestAreaFit,
    BottomLeft,
}

impl MaxRectsHeuristic {
    /// Evaluation order used when selecting the best run; earlier wins exact ties.
    pub const ALL: [MaxRectsHeuristic; 4] = [
        MaxRectsHeuristic::BestShortSideFit,
        MaxRectsHeuristic::BestLongSideFit,
        MaxRectsHeuristic::BestAreaFit,
        MaxRectsHeuristic::BottomLeft,
    ];
}

impl fmt::Display for MaxRectsHeuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BestShortSideFit => "bssf",
            Self::BestLongSideFit => "blsf",
            Self::BestAreaFit => "baf",
            Self::BottomLeft => "bl",
        };
        f.write_str(s)
    }
}

impl FromStr for MaxRectsHeuristic {
    type Err = TexCombineError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bssf" | "bestshortsidefit" => Ok(Self::BestShortSideFit),
            "blsf" | "bestlongsidefit" => Ok(Self::BestLongSideFit),
            "baf" | "bestareafit" => Ok(Self::BestAreaFit),
            "bl" | "bottomleft" => Ok(Self::BottomLeft),
            _ => Err(TexCombineError::UnknownOption {
                kind: "maxrects heuristic",
                value: s.to_string(),
            }),
        }
    }
}

/// How colour is reconstructed under fully transparent pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BleedAlgorithm {
    /// Leave pixels untouched; only the colour map is produced.
    None,
    /// Copy the first resolved 8-neighbour (right, down, left, up, diagonals).
    Nearest,
    /// Linear falloff over the 8-neighbourhood.
    Weighted,
    /// Gaussian falloff (sigma 2) over the 20-cell neighbourhood.
    Gaussian,
}

impl fmt::Display for BleedAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Nearest => "nearest",
            Self::Weighted => "weighted",
            Self::Gaussian => "gaussian",
        };
        f.write_str(s)
    }
}

impl FromStr for BleedAlgorithm {
    type Err = TexCombineError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "nearest" => Ok(Self::Nearest),
            "weighted" | "linear" => Ok(Self::Weighted),
            "gaussian" => Ok(Self::Gaussian),
            _ => Err(TexCombineError::UnknownOption {
                kind: "bleed algorithm",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CombineConfig {
    /// Atlas width in pixels. The canvas is never resized.
    pub canvas_width: u32,
    /// Atlas height in pixels.
    pub canvas_height: u32,
    /// Pixels reserved on every side of each sprite; also the bleed region padding.
    #[serde(default = "default_margin")]
    pub margin: u32,
    #[serde(default = "default_bleed_algorithm")]
    pub bleed_algorithm: BleedAlgorithm,
    #[serde(default = "default_layout_strategy")]
    pub layout_strategy: LayoutStrategy,
    /// Pin a single MaxRects heuristic. `None` runs all of them and keeps the best.
    #[serde(default)]
    pub mr_heuristic: Option<MaxRectsHeuristic>,
    /// Crop fully transparent borders off each sprite before layout.
    #[serde(default)]
    pub trim: bool,
    /// Fan work out over rayon when the "parallel" feature is on.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1024,
            canvas_height: 1024,
            margin: default_margin(),
            bleed_algorithm: default_bleed_algorithm(),
            layout_strategy: default_layout_strategy(),
            mr_heuristic: None,
            trim: false,
            parallel: default_parallel(),
        }
    }
}

impl CombineConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - Canvas dimensions are zero
    /// - The margin leaves no room for even a 1x1 sprite
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(TexCombineError::InvalidDimensions {
                width: self.canvas_width,
                height: self.canvas_height,
            });
        }

        let min_side = self.margin.saturating_mul(2).saturating_add(1);
        if min_side > self.canvas_width || min_side > self.canvas_height {
            return Err(TexCombineError::InvalidConfig(format!(
                "margin ({}) * 2 leaves no usable space in a {}x{} canvas",
                self.margin, self.canvas_width, self.canvas_height
            )));
        }

        Ok(())
    }

    /// Create a fluent builder for `CombineConfig`.
    pub fn builder() -> CombineConfigBuilder {
        CombineConfigBuilder::new()
    }
}

fn default_margin() -> u32 {
    4
}
fn default_bleed_algorithm() -> BleedAlgorithm {
    BleedAlgorithm::Gaussian
}
fn default_layout_strategy() -> LayoutStrategy {
    LayoutStrategy::MaxRects
}
fn default_parallel() -> bool {
    true
}

/// Builder for `CombineConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct CombineConfigBuilder {
    cfg: CombineConfig,
}

impl CombineConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: CombineConfig::default(),
        }
    }
    pub fn with_canvas(mut self, w: u32, h: u32) -> Self {
        self.cfg.canvas_width = w;
        self.cfg.canvas_height = h;
        self
    }
    pub fn margin(mut self, v: u32) -> Self {
        self.cfg.margin = v;
        self
    }
    pub fn bleed_algorithm(mut self, v: BleedAlgorithm) -> Self {
        self.cfg.bleed_algorithm = v;
        self
    }
    pub fn layout_strategy(mut self, v: LayoutStrategy) -> Self {
        self.cfg.layout_strategy = v;
        self
    }
    pub fn mr_heuristic(mut self, v: Option<MaxRectsHeuristic>) -> Self {
        self.cfg.mr_heuristic = v;
        self
    }
    pub fn trim(mut self, v: bool) -> Self {
        self.cfg.trim = v;
        self
    }
    pub fn parallel(mut self, v: bool) -> Self {
        self.cfg.parallel = v;
        self
    }
    pub fn build(self) -> CombineConfig {
        self.cfg
    }
}
