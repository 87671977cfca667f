//! Region segmentation module
//!
//! The core engine: given a classified [`Page`](crate::Page), compute the
//! bounding boxes of the diagrams to extract, decide how answer-choice
//! diagrams are laid out, and plan the label masks for the renderer.
//!
//! # Pipeline
//!
//! Label clustering and choice layout analysis propose candidate regions,
//! boundary resolution (or the gap fallback) turns them into concrete
//! boxes, refinement expands and then shrinks each box against protected
//! text, near-duplicates are dropped, and finally mask rectangles are
//! planned for choice letters baked into their own diagrams.
//!
//! # Example
//!
//! ```rust,no_run
//! use examseg::{PageDocument, SegmentEngine, SegmentOptions};
//! use std::path::Path;
//!
//! let page = PageDocument::load(Path::new("page.json"))
//!     .unwrap()
//!     .into_page()
//!     .unwrap();
//!
//! let engine = SegmentEngine::new(SegmentOptions::default());
//! let segmentation = engine.segment_page(&page).unwrap();
//!
//! for region in &segmentation.regions {
//!     println!("{:?} at {:?}", region.kind, region.bbox);
//! }
//! ```

mod boundary;
mod cluster;
mod dedupe;
mod engine;
mod gap;
mod layout;
mod mask;
mod refine;
mod types;

pub use boundary::BoundaryResolver;
pub use cluster::LabelClusterer;
pub use dedupe::OverlapDeduplicator;
pub use engine::{SegmentEngine, Segmentation};
pub use gap::GapDetector;
pub use layout::ChoiceLayoutAnalyzer;
pub use mask::TextMaskPlanner;
pub use refine::{BBoxRefiner, ShrinkResult};
pub use types::{
    Boundary, Gap, GapAxis, GapKind, LayoutMode, MaskArea, MaskReason, Region, RegionKind, Result,
    SegmentError,
};

// ============================================================
// Constants
// ============================================================
//
// The numeric defaults below are empirically chosen, not calibrated
// against a labeled corpus. They are configuration, not ground truth.

/// Default vertical gap that splits two label clusters (pixels)
pub const DEFAULT_GAP_THRESHOLD: f64 = 20.0;

/// Default margin kept between a region edge and neighboring content
pub const DEFAULT_MARGIN: f64 = 10.0;

/// Default minimum width for a prompt visual region
pub const DEFAULT_MIN_REGION_WIDTH: f64 = 50.0;

/// Default minimum height for a prompt visual region
pub const DEFAULT_MIN_REGION_HEIGHT: f64 = 30.0;

/// Minimum width for a choice visual region
pub const CHOICE_MIN_REGION_WIDTH: f64 = 30.0;

/// Minimum height for a choice visual region
pub const CHOICE_MIN_REGION_HEIGHT: f64 = 30.0;

/// Self-overlap ratio above which a region is a duplicate
pub const DEFAULT_OVERLAP_THRESHOLD: f64 = 0.8;

/// Choice anchors whose x-center stdev is below this fraction of the page
/// width form a vertical list
pub const DEFAULT_LAYOUT_STDEV_FACTOR: f64 = 0.1;

/// Minimum usable gap height in strict (full-page fallback) mode
pub const STRICT_MIN_GAP: f64 = 100.0;

/// Minimum usable gap height in flexible mode
pub const FLEXIBLE_MIN_GAP: f64 = 30.0;

/// Fixed padding applied to grid choice regions after clipping
pub const DEFAULT_GRID_PADDING: f64 = 20.0;

/// Answer-choice text longer than this many trimmed characters is
/// protected prose, not a bare anchor label
pub const DEFAULT_LONG_TEXT_THRESHOLD: usize = 20;

/// X-center proximity under which two anchors share a grid column
pub const COLUMN_PROXIMITY: f64 = 20.0;

// ============================================================
// Options
// ============================================================

/// Segmentation options.
///
/// Every threshold the engine consults lives here; nothing is hardcoded
/// inside logic branches.
#[derive(Debug, Clone)]
pub struct SegmentOptions {
    /// Vertical gap that splits two label clusters
    pub gap_threshold: f64,

    /// Margin between region edges and neighboring content
    pub margin: f64,

    /// Minimum prompt region width
    pub min_region_width: f64,

    /// Minimum prompt region height
    pub min_region_height: f64,

    /// Minimum choice region width
    pub choice_min_region_width: f64,

    /// Minimum choice region height
    pub choice_min_region_height: f64,

    /// Self-overlap ratio above which a region is dropped as a duplicate
    pub overlap_threshold: f64,

    /// Vertical/grid decision factor (fraction of page width)
    pub layout_stdev_factor: f64,

    /// Minimum usable gap height for the fallback detector
    pub min_gap: f64,

    /// Characters above which an answer choice is protected prose
    pub long_text_threshold: usize,

    /// Padding applied to grid choice regions after clipping
    pub grid_padding: f64,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            gap_threshold: DEFAULT_GAP_THRESHOLD,
            margin: DEFAULT_MARGIN,
            min_region_width: DEFAULT_MIN_REGION_WIDTH,
            min_region_height: DEFAULT_MIN_REGION_HEIGHT,
            choice_min_region_width: CHOICE_MIN_REGION_WIDTH,
            choice_min_region_height: CHOICE_MIN_REGION_HEIGHT,
            overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
            layout_stdev_factor: DEFAULT_LAYOUT_STDEV_FACTOR,
            min_gap: STRICT_MIN_GAP,
            long_text_threshold: DEFAULT_LONG_TEXT_THRESHOLD,
            grid_padding: DEFAULT_GRID_PADDING,
        }
    }
}

impl SegmentOptions {
    /// Create a new options builder
    pub fn builder() -> SegmentOptionsBuilder {
        SegmentOptionsBuilder::default()
    }

    /// Strict mode: the gap fallback only accepts large full-page gaps
    pub fn strict() -> Self {
        Self {
            min_gap: STRICT_MIN_GAP,
            ..Default::default()
        }
    }

    /// Flexible mode: the gap fallback accepts smaller gaps
    pub fn flexible() -> Self {
        Self {
            min_gap: FLEXIBLE_MIN_GAP,
            ..Default::default()
        }
    }

    /// Minimum region size for the given region kind
    pub fn min_size_for(&self, kind: RegionKind) -> (f64, f64) {
        match kind {
            RegionKind::PromptVisual => (self.min_region_width, self.min_region_height),
            RegionKind::ChoiceVisual => {
                (self.choice_min_region_width, self.choice_min_region_height)
            }
        }
    }
}

/// Builder for SegmentOptions
#[derive(Debug, Default)]
pub struct SegmentOptionsBuilder {
    options: SegmentOptions,
}

impl SegmentOptionsBuilder {
    /// Set the cluster gap threshold (clamped to >= 0)
    #[must_use]
    pub fn gap_threshold(mut self, threshold: f64) -> Self {
        self.options.gap_threshold = threshold.max(0.0);
        self
    }

    /// Set the content margin (clamped to >= 0)
    #[must_use]
    pub fn margin(mut self, margin: f64) -> Self {
        self.options.margin = margin.max(0.0);
        self
    }

    /// Set the minimum prompt region size
    #[must_use]
    pub fn min_region_size(mut self, width: f64, height: f64) -> Self {
        self.options.min_region_width = width.max(1.0);
        self.options.min_region_height = height.max(1.0);
        self
    }

    /// Set the minimum choice region size
    #[must_use]
    pub fn choice_min_region_size(mut self, width: f64, height: f64) -> Self {
        self.options.choice_min_region_width = width.max(1.0);
        self.options.choice_min_region_height = height.max(1.0);
        self
    }

    /// Set the duplicate overlap threshold (clamped to 0.0-1.0)
    #[must_use]
    pub fn overlap_threshold(mut self, threshold: f64) -> Self {
        self.options.overlap_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the layout stdev factor (clamped to 0.0-1.0)
    #[must_use]
    pub fn layout_stdev_factor(mut self, factor: f64) -> Self {
        self.options.layout_stdev_factor = factor.clamp(0.0, 1.0);
        self
    }

    /// Set the minimum gap height (clamped to >= 0)
    #[must_use]
    pub fn min_gap(mut self, min_gap: f64) -> Self {
        self.options.min_gap = min_gap.max(0.0);
        self
    }

    /// Set the long-text protection threshold
    #[must_use]
    pub fn long_text_threshold(mut self, chars: usize) -> Self {
        self.options.long_text_threshold = chars;
        self
    }

    /// Set the grid region padding (clamped to >= 0)
    #[must_use]
    pub fn grid_padding(mut self, padding: f64) -> Self {
        self.options.grid_padding = padding.max(0.0);
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> SegmentOptions {
        self.options
    }
}

// ============================================================
// Tests
// ============================================================
