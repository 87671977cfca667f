//! Bounding-box refinement
//!
//! Two deterministic passes over a seed box: expand each edge outward to
//! its natural boundary (the nearest excluded text block, else the page
//! edge), then shrink the box inward away from any excluded text it
//! still overlaps. Excluded means question text or an answer choice;
//! labels belonging to the visual itself are transparent to both passes.

use std::collections::BTreeSet;

use crate::page::{BBox, Block, BlockCategory, Page};

/// Result of the shrink pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShrinkResult {
    /// Refined box
    pub bbox: BBox,

    /// True when the minimum-size floor was reached while overlap with
    /// excluded text persisted; the box is best-effort, not clean
    pub degraded: bool,
}

/// Expand/shrink box refiner
pub struct BBoxRefiner;

impl BBoxRefiner {
    /// Text categories the refiner keeps boxes away from
    fn is_excluded(block: &Block) -> bool {
        matches!(
            block.category,
            BlockCategory::QuestionText | BlockCategory::AnswerChoice
        )
    }

    /// Grow each edge outward until the first excluded block whose
    /// perpendicular span overlaps the box, else to the page edge.
    ///
    /// Label, title, and image blocks are transparent: expansion
    /// continues through them.
    pub fn expand_to_boundaries(
        bbox: &BBox,
        blocks: &[&Block],
        page: &Page,
        margin: f64,
    ) -> BBox {
        let excluded: Vec<&Block> = blocks
            .iter()
            .filter(|b| Self::is_excluded(b))
            .copied()
            .collect();

        let left = excluded
            .iter()
            .filter(|b| b.bbox.v_overlaps(bbox) && b.bbox.x1 <= bbox.x0)
            .map(|b| b.bbox.x1)
            .fold(f64::NEG_INFINITY, f64::max);
        let left = if left.is_finite() { left + margin } else { margin };

        let right = excluded
            .iter()
            .filter(|b| b.bbox.v_overlaps(bbox) && b.bbox.x0 >= bbox.x1)
            .map(|b| b.bbox.x0)
            .fold(f64::INFINITY, f64::min);
        let right = if right.is_finite() {
            right - margin
        } else {
            page.width - margin
        };

        let top = excluded
            .iter()
            .filter(|b| b.bbox.h_overlaps(bbox) && b.bbox.y1 <= bbox.y0)
            .map(|b| b.bbox.y1)
            .fold(f64::NEG_INFINITY, f64::max);
        let top = if top.is_finite() { top + margin } else { margin };

        let bottom = excluded
            .iter()
            .filter(|b| b.bbox.h_overlaps(bbox) && b.bbox.y0 >= bbox.y1)
            .map(|b| b.bbox.y0)
            .fold(f64::INFINITY, f64::min);
        let bottom = if bottom.is_finite() {
            bottom - margin
        } else {
            page.height - margin
        };

        // Expansion only: an edge never moves inward here
        BBox::new(
            left.min(bbox.x0),
            top.min(bbox.y0),
            right.max(bbox.x1),
            bottom.max(bbox.y1),
        )
        .clamp_to(page.width, page.height)
    }

    /// Shrink the box inward while it overlaps excluded text.
    ///
    /// `exempt` blocks never count as offenders; a choice region passes
    /// its own members here so its anchoring label may stay inside.
    /// Each step removes the overlap with one block by trimming
    /// whichever edge loses the least area, subject to the minimum-size
    /// floor. When no trim can stay above the floor, the current box is
    /// returned with the `degraded` flag set, never silently presented
    /// as clean.
    pub fn shrink_away_from_text(
        bbox: &BBox,
        blocks: &[&Block],
        exempt: &BTreeSet<u32>,
        min_width: f64,
        min_height: f64,
    ) -> ShrinkResult {
        let mut excluded: Vec<&Block> = blocks
            .iter()
            .filter(|b| Self::is_excluded(b) && !exempt.contains(&b.id))
            .copied()
            .collect();
        excluded.sort_by_key(|b| b.id);

        let mut current = *bbox;

        // Each iteration removes at least one overlap or exits, so the
        // block count bounds the loop.
        for _ in 0..=excluded.len() {
            let offender = excluded.iter().find(|b| b.bbox.overlaps(&current));
            let Some(offender) = offender else {
                return ShrinkResult {
                    bbox: current,
                    degraded: false,
                };
            };

            let candidates = [
                BBox::new(offender.bbox.x1, current.y0, current.x1, current.y1),
                BBox::new(current.x0, current.y0, offender.bbox.x0, current.y1),
                BBox::new(current.x0, offender.bbox.y1, current.x1, current.y1),
                BBox::new(current.x0, current.y0, current.x1, offender.bbox.y0),
            ];

            let best = candidates
                .iter()
                .filter(|c| c.width() >= min_width && c.height() >= min_height)
                .max_by(|a, b| a.area().total_cmp(&b.area()));

            match best {
                Some(trimmed) => current = *trimmed,
                None => {
                    return ShrinkResult {
                        bbox: current,
                        degraded: true,
                    }
                }
            }
        }

        ShrinkResult {
            bbox: current,
            degraded: excluded.iter().any(|b| b.bbox.overlaps(&current)),
        }
    }
}

// ============================================================
// Tests
// ============================================================
