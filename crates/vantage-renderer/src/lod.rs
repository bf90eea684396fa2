//! Level of Detail Selection
//!
//! Turns a screen extent into a discrete [`DetailLevel`] and maps levels to
//! the scene nodes that draw them.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use vantage_core::ScreenExtent;

/// Default coverage threshold in NDC area units (2% of the normalized area)
pub const DEFAULT_COVERAGE_THRESHOLD: f32 = 0.02;

/// Discrete rendering cost chosen per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    /// Full shading; also the safe fallback
    #[default]
    High,
    /// Cheap shading path
    Low,
}

impl DetailLevel {
    /// Every level, most detailed first
    pub const ALL: [DetailLevel; 2] = [DetailLevel::High, DetailLevel::Low];

    /// Overlay label
    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "Detail: high",
            Self::Low => "Detail: low",
        }
    }

    /// Value of the shader-visible detail flag
    pub fn is_high(&self) -> bool {
        matches!(self, Self::High)
    }
}

impl std::fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// Pick a level from a covered area.
///
/// Strictly greater than `threshold` selects [`DetailLevel::High`]; an area
/// exactly at the threshold selects [`DetailLevel::Low`].
pub fn select_level(area: f32, threshold: f32) -> DetailLevel {
    if area > threshold {
        DetailLevel::High
    } else {
        DetailLevel::Low
    }
}

/// One entry of a [`DetailTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailMapping {
    pub level: DetailLevel,
    pub node: usize,
}

/// Explicit mapping from detail level to the node drawn for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailTable {
    entries: SmallVec<[DetailMapping; 2]>,
}

impl DetailTable {
    /// Table with no mappings
    pub fn empty() -> Self {
        Self {
            entries: SmallVec::new(),
        }
    }

    /// Map a level to a node, replacing any previous mapping
    pub fn set(&mut self, level: DetailLevel, node: usize) {
        match self.entries.iter_mut().find(|e| e.level == level) {
            Some(entry) => entry.node = node,
            None => self.entries.push(DetailMapping { level, node }),
        }
    }

    /// Builder form of [`DetailTable::set`]
    pub fn with(mut self, level: DetailLevel, node: usize) -> Self {
        self.set(level, node);
        self
    }

    /// Node drawn for `level`
    pub fn node_for(&self, level: DetailLevel) -> Option<usize> {
        self.entries.iter().find(|e| e.level == level).map(|e| e.node)
    }

    /// All mappings
    pub fn entries(&self) -> &[DetailMapping] {
        &self.entries
    }
}

impl Default for DetailTable {
    /// High draws node 0, Low draws node 1
    fn default() -> Self {
        Self::empty()
            .with(DetailLevel::High, 0)
            .with(DetailLevel::Low, 1)
    }
}

/// LOD configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodConfig {
    /// Area (NDC units) above which the object is drawn in high detail
    pub threshold: f32,
    /// Optional dead band around the threshold.
    ///
    /// `None` keeps the instantaneous switch, which can flicker when the
    /// object hovers at the threshold.
    pub hysteresis: Option<f32>,
    /// Level to node mapping
    pub detail_table: DetailTable,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_COVERAGE_THRESHOLD,
            hysteresis: None,
            detail_table: DetailTable::default(),
        }
    }
}

/// Outcome of one frame's selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodDecision {
    /// Selected level
    pub level: DetailLevel,
    /// Extent the decision was based on, if any corner projected
    pub extent: Option<ScreenExtent>,
    /// True when no usable extent existed and the level was carried over
    pub fallback: bool,
}

impl LodDecision {
    /// Decision for an object whose LOD is disabled
    pub fn pinned(level: DetailLevel) -> Self {
        Self {
            level,
            extent: None,
            fallback: false,
        }
    }

    /// Covered area, when an extent exists
    pub fn area(&self) -> Option<f32> {
        self.extent.map(|e| e.area())
    }
}

/// Applies the coverage threshold with the degenerate-frame fallback.
///
/// Holds configuration only. The previous frame's level is passed in by the
/// caller, so the selector itself is stateless.
#[derive(Debug, Clone)]
pub struct LodSelector {
    threshold: f32,
    hysteresis: Option<f32>,
}

impl LodSelector {
    /// Create a selector without hysteresis
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            hysteresis: None,
        }
    }

    /// Create a selector from configuration
    pub fn from_config(config: &LodConfig) -> Self {
        Self {
            threshold: config.threshold,
            hysteresis: config.hysteresis.map(|band| band.abs()),
        }
    }

    /// Coverage threshold
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Hysteresis band, if enabled
    pub fn hysteresis(&self) -> Option<f32> {
        self.hysteresis
    }

    /// Select a level for this frame.
    ///
    /// Without an extent (every corner behind the eye) the previous level is
    /// kept, or [`DetailLevel::High`] when there is none.
    pub fn select(&self, extent: Option<ScreenExtent>, previous: Option<DetailLevel>) -> LodDecision {
        let Some(extent) = extent else {
            return LodDecision {
                level: previous.unwrap_or_default(),
                extent: None,
                fallback: true,
            };
        };

        let area = extent.area();
        let level = match (self.hysteresis, previous) {
            (Some(band), Some(DetailLevel::High)) => select_level(area, self.threshold - band),
            (Some(band), Some(DetailLevel::Low)) => select_level(area, self.threshold + band),
            _ => select_level(area, self.threshold),
        };

        LodDecision {
            level,
            extent: Some(extent),
            fallback: false,
        }
    }
}

impl Default for LodSelector {
    fn default() -> Self {
        Self::new(DEFAULT_COVERAGE_THRESHOLD)
    }
}
