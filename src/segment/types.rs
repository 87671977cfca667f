//! Segmentation core types
//!
//! Output records (regions, mask areas) plus the scratch values (gaps,
//! boundaries) computed and discarded within one segmentation call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::page::BBox;

// ============================================================
// Error Types
// ============================================================

/// Segmentation error types.
///
/// "No region could be constructed" is never an error; detectors return
/// `None`/empty for that. Errors are reserved for conditions where
/// returning a result would risk associating the wrong diagram with the
/// wrong choice.
#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("choice region count mismatch: {expected} anchors but {produced} regions")]
    ChoiceCountMismatch { expected: usize, produced: usize },

    #[error("unsupported grid layout: {columns} anchor columns (only 1-2 supported)")]
    UnsupportedGridLayout { columns: usize },
}

pub type Result<T> = std::result::Result<T, SegmentError>;

// ============================================================
// Regions
// ============================================================

/// What a produced region designates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    /// A diagram belonging to the question prompt
    PromptVisual,
    /// A diagram belonging to one answer choice
    ChoiceVisual,
}

/// One extracted visual region, the engine's output unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Region id, sequential in output order
    pub id: u32,

    /// Prompt or choice visual
    pub kind: RegionKind,

    /// Final bounding box, within page bounds
    pub bbox: BBox,

    /// Stable ids of the blocks this region was built from or covers
    pub member_block_ids: BTreeSet<u32>,

    /// Choice letter for choice visuals ("A", "B", ...)
    pub choice_letter: Option<char>,

    /// Detection confidence (0.0-1.0)
    pub confidence: f64,
}

// ============================================================
// Layout
// ============================================================

/// Arrangement of answer-choice diagrams on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Single column of choices
    Vertical,
    /// Multi-column/row arrangement
    Grid,
}

// ============================================================
// Gaps
// ============================================================

/// Axis a gap runs along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapAxis {
    /// The gap is a horizontal band (an empty vertical interval)
    Vertical,
    /// The gap is a vertical band
    Horizontal,
}

/// Where a gap sits relative to the avoided blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapKind {
    /// Between page top and the first block
    Top,
    /// Between two consecutive blocks
    Between,
    /// Between the last block and the effective page bottom
    Bottom,
}

impl GapKind {
    /// Selection priority: between > top > bottom
    pub fn priority(&self) -> u8 {
        match self {
            GapKind::Between => 3,
            GapKind::Top => 2,
            GapKind::Bottom => 1,
        }
    }
}

/// A candidate empty band between avoided blocks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gap {
    /// Start coordinate along the axis
    pub start: f64,

    /// End coordinate along the axis
    pub end: f64,

    /// Axis the gap interval runs along
    pub axis: GapAxis,

    /// Position relative to the avoided blocks
    pub kind: GapKind,
}

impl Gap {
    /// Extent of the gap along its axis
    pub fn size(&self) -> f64 {
        self.end - self.start
    }

    /// Selection priority of this gap's kind
    pub fn priority(&self) -> u8 {
        self.kind.priority()
    }
}

// ============================================================
// Boundaries
// ============================================================

/// Edge constraints limiting how far a candidate box may grow
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boundary {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Boundary {
    /// Convert the constraints into a bounding box
    pub fn to_bbox(&self) -> BBox {
        BBox::new(self.left, self.top, self.right, self.bottom)
    }
}

// ============================================================
// Masks
// ============================================================

/// Why a mask rectangle exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskReason {
    /// The region's own choice letter is baked into the diagram
    ChoiceLetter,
}

/// A rectangle to whiten out before rasterizing a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskArea {
    /// Rectangle to redact, in page coordinates
    pub bbox: BBox,

    /// Text of the label block the mask was derived from
    pub source_text: String,

    /// Why the mask exists
    pub reason: MaskReason,
}

// ============================================================
// Tests
// ============================================================
