//! Page document ingestion
//!
//! Deserializes the classifier's JSON output contract and turns it into a
//! validated [`Page`]. Stable block ids are assigned here, in input order,
//! and never change afterwards.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::types::{BBox, Block, BlockCategory, BlockKind, Page, PageError, Result};

/// One block as produced by the external classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Text or image
    pub kind: BlockKind,

    /// `[x0, y0, x1, y1]` in page-pixel units
    pub bbox: [f64; 4],

    /// Classifier-assigned category
    pub category: BlockCategory,

    /// Extracted text (empty for image blocks)
    #[serde(default)]
    pub text: String,
}

/// The classifier's per-page output document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageDocument {
    /// Page number (1-based)
    pub page_number: u32,

    /// Page width in pixels
    pub width: f64,

    /// Page height in pixels
    pub height: f64,

    /// Blocks in classifier output order
    pub blocks: Vec<BlockRecord>,
}

impl PageDocument {
    /// Parse a page document from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a page document from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PageError::DocumentNotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Validate geometry and build an immutable [`Page`].
    ///
    /// Ids are assigned sequentially in input order before the reading-order
    /// sort, so they stay stable regardless of page layout. Block boxes are
    /// clamped to the page; a box that is non-finite, inverted, or entirely
    /// off-page is rejected.
    pub fn into_page(self) -> Result<Page> {
        if !self.width.is_finite()
            || !self.height.is_finite()
            || self.width <= 0.0
            || self.height <= 0.0
        {
            return Err(PageError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }

        let mut blocks = Vec::with_capacity(self.blocks.len());
        for (index, record) in self.blocks.into_iter().enumerate() {
            let [x0, y0, x1, y1] = record.bbox;
            if !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
                return Err(PageError::InvalidBlock {
                    index,
                    reason: "non-finite coordinates".to_string(),
                });
            }

            let raw = BBox::new(x0, y0, x1, y1);
            if raw.is_degenerate() {
                return Err(PageError::InvalidBlock {
                    index,
                    reason: format!("inverted or empty bbox {:?}", record.bbox),
                });
            }

            let clamped = raw.clamp_to(self.width, self.height);
            if clamped.is_degenerate() {
                return Err(PageError::InvalidBlock {
                    index,
                    reason: "bbox lies entirely outside the page".to_string(),
                });
            }

            blocks.push(Block {
                id: index as u32,
                kind: record.kind,
                bbox: clamped,
                category: record.category,
                text: record.text,
                page_number: self.page_number,
            });
        }

        Ok(Page::new(self.page_number, self.width, self.height, blocks))
    }
}

// ============================================================
// Tests
// ============================================================
