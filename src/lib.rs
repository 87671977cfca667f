//! examseg - Document region segmentation for scanned exam pages
//!
//! Given a page's text and image blocks, each tagged with a semantic
//! category by an external classifier, this crate computes the bounding
//! boxes of the visual diagrams to extract, decides whether answer-choice
//! diagrams are arranged vertically or in a grid, assigns diagram labels
//! to the correct choice, and plans mask rectangles so a choice letter is
//! not baked into its own diagram image.
//!
//! The engine is pure and stateless: no I/O, no shared mutable state,
//! deterministic output for identical input. Callers may segment many
//! pages concurrently with one engine instance.

pub mod cli;
pub mod config;
pub mod page;
pub mod segment;
pub mod visualize;

// Re-export public API
pub use cli::{Cli, Commands, SegmentArgs};
pub use config::{CliOverrides, Config, ConfigError, OutputConfig, ThresholdConfig};
pub use page::{BBox, Block, BlockCategory, BlockKind, BlockRecord, Page, PageDocument, PageError};
pub use segment::{
    BBoxRefiner, BoundaryResolver, ChoiceLayoutAnalyzer, GapDetector, LabelClusterer, LayoutMode,
    MaskArea, MaskReason, OverlapDeduplicator, Region, RegionKind, SegmentEngine, SegmentError,
    SegmentOptions, Segmentation, ShrinkResult, TextMaskPlanner,
};
pub use visualize::render_overlay;

/// Process exit codes
pub mod exit_codes {
    /// Successful completion
    pub const SUCCESS: i32 = 0;
    /// Unspecified failure
    pub const GENERAL_ERROR: i32 = 1;
    /// Input path missing
    pub const INPUT_NOT_FOUND: i32 = 2;
    /// Input present but malformed or unsegmentable
    pub const INVALID_INPUT: i32 = 3;
}
