//! Core types for the page model
//!
//! Contains the bounding box geometry, the classified block record, and
//! the page container everything else operates on.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

// ============================================================
// Error Types
// ============================================================

/// Page ingestion error types
#[derive(Debug, Error)]
pub enum PageError {
    #[error("Page document not found: {0}")]
    DocumentNotFound(PathBuf),

    #[error("Invalid page dimensions: {width}x{height}")]
    InvalidDimensions { width: f64, height: f64 },

    #[error("Invalid block at index {index}: {reason}")]
    InvalidBlock { index: usize, reason: String },

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PageError>;

// ============================================================
// Geometry
// ============================================================

/// Axis-aligned bounding box in page-pixel units.
///
/// Edges are `(x0, y0)` top-left and `(x1, y1)` bottom-right, matching the
/// coordinate convention of the upstream PDF block extractor (y grows
/// downward).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BBox {
    /// Create a new bounding box
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Width of the box (may be non-positive for degenerate boxes)
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Height of the box
    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Area of the box (0 for degenerate boxes)
    pub fn area(&self) -> f64 {
        if self.is_degenerate() {
            0.0
        } else {
            self.width() * self.height()
        }
    }

    /// Horizontal center
    pub fn center_x(&self) -> f64 {
        (self.x0 + self.x1) / 2.0
    }

    /// Vertical center
    pub fn center_y(&self) -> f64 {
        (self.y0 + self.y1) / 2.0
    }

    /// True if width or height is not strictly positive
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Check if this box overlaps another (shared edges do not count)
    pub fn overlaps(&self, other: &BBox) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }

    /// Vertical spans `[y0, y1]` intersect
    pub fn v_overlaps(&self, other: &BBox) -> bool {
        self.y0 < other.y1 && other.y0 < self.y1
    }

    /// Horizontal spans `[x0, x1]` intersect
    pub fn h_overlaps(&self, other: &BBox) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1
    }

    /// Check if this box fully contains another
    pub fn contains(&self, other: &BBox) -> bool {
        self.x0 <= other.x0 && self.y0 <= other.y0 && self.x1 >= other.x1 && self.y1 >= other.y1
    }

    /// Check if this box contains a point
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    /// Intersection of two boxes, `None` when they do not overlap
    pub fn intersection(&self, other: &BBox) -> Option<BBox> {
        let ix = BBox::new(
            self.x0.max(other.x0),
            self.y0.max(other.y0),
            self.x1.min(other.x1),
            self.y1.min(other.y1),
        );
        if ix.is_degenerate() {
            None
        } else {
            Some(ix)
        }
    }

    /// Intersection area, 0 when the boxes do not overlap
    pub fn intersection_area(&self, other: &BBox) -> f64 {
        self.intersection(other).map_or(0.0, |b| b.area())
    }

    /// Smallest box covering both
    pub fn merge(&self, other: &BBox) -> BBox {
        BBox::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    /// Expand every edge outward by `amount` (negative shrinks)
    pub fn pad(&self, amount: f64) -> BBox {
        BBox::new(
            self.x0 - amount,
            self.y0 - amount,
            self.x1 + amount,
            self.y1 + amount,
        )
    }

    /// Clamp the box to `[0, width] x [0, height]`
    pub fn clamp_to(&self, width: f64, height: f64) -> BBox {
        BBox::new(
            self.x0.clamp(0.0, width),
            self.y0.clamp(0.0, height),
            self.x1.clamp(0.0, width),
            self.y1.clamp(0.0, height),
        )
    }
}

// ============================================================
// Blocks
// ============================================================

/// Kind of page block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// Text block with extracted content
    Text,
    /// Embedded or rasterized image block
    Image,
}

/// Semantic category assigned by the external classifier.
///
/// The classifier tags the stable block id directly; the engine never
/// re-derives categories positionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockCategory {
    /// Question stem text
    QuestionText,
    /// Answer choice text (the anchor of a choice)
    AnswerChoice,
    /// Part header such as "Part A"
    QuestionPartHeader,
    /// Title of a prompt visual ("Figure 2")
    VisualContentTitle,
    /// Label inside or adjacent to a prompt visual
    VisualContentLabel,
    /// Label adjacent to a choice diagram
    ChoiceVisualLabel,
    /// Label with no determined owner
    OtherLabel,
    /// Unclassified
    #[serde(other)]
    Unknown,
}

impl BlockCategory {
    /// Labels that can anchor or annotate a prompt visual
    pub fn is_prompt_label(&self) -> bool {
        matches!(
            self,
            BlockCategory::VisualContentTitle
                | BlockCategory::VisualContentLabel
                | BlockCategory::OtherLabel
        )
    }

    /// Any label category (transparent to boundary expansion)
    pub fn is_label(&self) -> bool {
        self.is_prompt_label() || matches!(self, BlockCategory::ChoiceVisualLabel)
    }
}

/// A classified block on a page.
///
/// Immutable after ingestion; the `id` is assigned once, in input order,
/// and is the only identity used anywhere downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Stable integer id assigned at ingestion
    pub id: u32,

    /// Text or image
    pub kind: BlockKind,

    /// Position on the page
    pub bbox: BBox,

    /// Classifier-assigned category
    pub category: BlockCategory,

    /// Extracted text ("" for image blocks)
    pub text: String,

    /// Page this block belongs to (1-based)
    pub page_number: u32,
}

impl Block {
    /// Number of characters in the trimmed text
    pub fn trimmed_len(&self) -> usize {
        self.text.trim().chars().count()
    }

    /// An answer choice whose text is long enough to be protected prose
    /// rather than a bare anchor label
    pub fn is_long_choice(&self, long_text_threshold: usize) -> bool {
        self.category == BlockCategory::AnswerChoice && self.trimmed_len() > long_text_threshold
    }

    /// Text that an extracted region must never fully contain
    pub fn is_protected(&self, long_text_threshold: usize) -> bool {
        match self.category {
            BlockCategory::QuestionText => true,
            BlockCategory::AnswerChoice => self.is_long_choice(long_text_threshold),
            _ => false,
        }
    }

    /// Text an extracted region should not clip against (avoid set for
    /// boundary and gap resolution)
    pub fn is_avoided(&self, long_text_threshold: usize) -> bool {
        self.is_protected(long_text_threshold)
            || self.category == BlockCategory::QuestionPartHeader
    }
}

// ============================================================
// Page
// ============================================================

/// One classified page.
///
/// Blocks are held in reading order: sorted by `(y0, x0)` with a stable
/// tie-break on id.
#[derive(Debug, Clone)]
pub struct Page {
    /// Page number (1-based)
    pub page_number: u32,

    /// Page width in pixels
    pub width: f64,

    /// Page height in pixels
    pub height: f64,

    /// Blocks in reading order
    pub blocks: Vec<Block>,
}

impl Page {
    /// Create a page, sorting blocks into reading order
    pub fn new(page_number: u32, width: f64, height: f64, mut blocks: Vec<Block>) -> Self {
        blocks.sort_by(|a, b| {
            a.bbox
                .y0
                .total_cmp(&b.bbox.y0)
                .then(a.bbox.x0.total_cmp(&b.bbox.x0))
                .then(a.id.cmp(&b.id))
        });
        Self {
            page_number,
            width,
            height,
            blocks,
        }
    }

    /// Full-page bounding box
    pub fn bounds(&self) -> BBox {
        BBox::new(0.0, 0.0, self.width, self.height)
    }

    /// Blocks with the given category, in reading order
    pub fn blocks_with_category(&self, category: BlockCategory) -> Vec<&Block> {
        self.blocks
            .iter()
            .filter(|b| b.category == category)
            .collect()
    }

    /// Look up a block by its stable id
    pub fn block_by_id(&self, id: u32) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }
}

// ============================================================
// Tests
// ============================================================
