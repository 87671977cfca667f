//! Page model module
//!
//! Immutable block/page records for one classified exam page.
//!
//! Blocks arrive from the external classifier already tagged with a
//! semantic category. Ingestion assigns each block a stable integer id,
//! validates its geometry, and sorts the page into reading order. After
//! that point nothing in the engine mutates a block.
//!
//! # Example
//!
//! ```rust,no_run
//! use examseg::PageDocument;
//! use std::path::Path;
//!
//! let doc = PageDocument::load(Path::new("page_003.json")).unwrap();
//! let page = doc.into_page().unwrap();
//!
//! println!("{} blocks on a {}x{} page", page.blocks.len(), page.width, page.height);
//! ```

mod ingest;
mod types;

pub use ingest::{BlockRecord, PageDocument};
pub use types::{BBox, Block, BlockCategory, BlockKind, Page, PageError, Result};
