//! Boundary resolution
//!
//! The single place that encodes "grow until you hit protected text or
//! the page edge": turns a seed box (a label cluster's union, a gap band)
//! into a concrete region box by pushing each edge out to the nearest
//! avoided neighbor.

use crate::page::{BBox, Block, Page};
use crate::segment::types::Boundary;
use crate::segment::SegmentOptions;

/// Per-edge boundary resolver
pub struct BoundaryResolver;

impl BoundaryResolver {
    /// Resolve the four edge constraints for a seed box.
    ///
    /// Each edge independently finds the nearest avoided block whose span
    /// on the perpendicular axis overlaps the seed's span on that axis and
    /// stops just outside it (plus margin); with no such neighbor the page
    /// edge (minus margin) bounds the box.
    pub fn constraints(seed: &BBox, avoid: &[&Block], page: &Page, margin: f64) -> Boundary {
        let left = avoid
            .iter()
            .filter(|b| b.bbox.v_overlaps(seed) && b.bbox.x1 <= seed.x0)
            .map(|b| b.bbox.x1)
            .fold(f64::NEG_INFINITY, f64::max);
        let left = if left.is_finite() { left + margin } else { margin };

        let right = avoid
            .iter()
            .filter(|b| b.bbox.v_overlaps(seed) && b.bbox.x0 >= seed.x1)
            .map(|b| b.bbox.x0)
            .fold(f64::INFINITY, f64::min);
        let right = if right.is_finite() {
            right - margin
        } else {
            page.width - margin
        };

        let top = avoid
            .iter()
            .filter(|b| b.bbox.h_overlaps(seed) && b.bbox.y1 <= seed.y0)
            .map(|b| b.bbox.y1)
            .fold(f64::NEG_INFINITY, f64::max);
        let top = if top.is_finite() { top + margin } else { margin };

        let bottom = avoid
            .iter()
            .filter(|b| b.bbox.h_overlaps(seed) && b.bbox.y0 >= seed.y1)
            .map(|b| b.bbox.y0)
            .fold(f64::INFINITY, f64::min);
        let bottom = if bottom.is_finite() {
            bottom - margin
        } else {
            page.height - margin
        };

        Boundary {
            left,
            right,
            top,
            bottom,
        }
    }

    /// Resolve a seed box into a concrete bounding box.
    ///
    /// `None` means no acceptable box exists (the resolved box collapses
    /// below the minimum region size); the caller treats that as "no
    /// region found," not an error.
    pub fn resolve(
        seed: &BBox,
        avoid: &[&Block],
        page: &Page,
        options: &SegmentOptions,
    ) -> Option<BBox> {
        let bbox = Self::constraints(seed, avoid, page, options.margin)
            .to_bbox()
            .clamp_to(page.width, page.height);

        if bbox.width() < options.min_region_width || bbox.height() < options.min_region_height {
            return None;
        }
        Some(bbox)
    }

    /// Resolve a label cluster by seeding with its union box
    pub fn resolve_cluster(
        cluster: &[&Block],
        avoid: &[&Block],
        page: &Page,
        options: &SegmentOptions,
    ) -> Option<BBox> {
        let seed = Self::union_bbox(cluster)?;
        Self::resolve(&seed, avoid, page, options)
    }

    /// Union box of a group of blocks, `None` for an empty group
    pub fn union_bbox(blocks: &[&Block]) -> Option<BBox> {
        blocks
            .iter()
            .map(|b| b.bbox)
            .reduce(|acc, b| acc.merge(&b))
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{BlockCategory, BlockKind};

    fn make_block(id: u32, x0: f64, y0: f64, x1: f64, y1: f64) -> Block {
        Block {
            id,
            kind: BlockKind::Text,
            bbox: BBox::new(x0, y0, x1, y1),
            category: BlockCategory::QuestionText,
            text: "q".to_string(),
            page_number: 1,
        }
    }

    fn empty_page() -> Page {
        Page::new(1, 600.0, 800.0, Vec::new())
    }

    #[test]
    fn test_open_page_resolves_to_page_edges() {
        let page = empty_page();
        let seed = BBox::new(250.0, 350.0, 350.0, 450.0);

        let bbox = BoundaryResolver::resolve(&seed, &[], &page, &SegmentOptions::default()).unwrap();
        assert_eq!(bbox, BBox::new(10.0, 10.0, 590.0, 790.0));
    }

    #[test]
    fn test_edges_stop_outside_avoid_blocks() {
        let page = empty_page();
        let seed = BBox::new(250.0, 350.0, 350.0, 450.0);

        let above = make_block(0, 100.0, 100.0, 500.0, 200.0);
        let below = make_block(1, 100.0, 600.0, 500.0, 700.0);
        let left = make_block(2, 20.0, 300.0, 80.0, 500.0);
        let right = make_block(3, 520.0, 300.0, 580.0, 500.0);

        let bbox = BoundaryResolver::resolve(
            &seed,
            &[&above, &below, &left, &right],
            &page,
            &SegmentOptions::default(),
        )
        .unwrap();

        assert_eq!(bbox, BBox::new(90.0, 210.0, 510.0, 590.0));
    }

    #[test]
    fn test_perpendicular_overlap_required() {
        let page = empty_page();
        let seed = BBox::new(250.0, 350.0, 350.0, 450.0);

        // Above the seed but fully to the side of its horizontal span:
        // it must not constrain the top edge.
        let off_axis = make_block(0, 450.0, 100.0, 580.0, 200.0);

        let bbox =
            BoundaryResolver::resolve(&seed, &[&off_axis], &page, &SegmentOptions::default())
                .unwrap();
        assert_eq!(bbox.y0, 10.0);
        // Nor the right edge: it sits above the seed's vertical span
        assert_eq!(bbox.x1, 590.0);
    }

    #[test]
    fn test_nearest_neighbor_wins_per_edge() {
        let page = empty_page();
        let seed = BBox::new(250.0, 350.0, 350.0, 450.0);

        let far_above = make_block(0, 100.0, 50.0, 500.0, 100.0);
        let near_above = make_block(1, 100.0, 150.0, 500.0, 250.0);

        let bbox = BoundaryResolver::resolve(
            &seed,
            &[&far_above, &near_above],
            &page,
            &SegmentOptions::default(),
        )
        .unwrap();
        assert_eq!(bbox.y0, 260.0);
    }

    #[test]
    fn test_rejects_below_minimum_size() {
        let page = empty_page();
        let seed = BBox::new(250.0, 350.0, 350.0, 450.0);

        // Tight side walls leave less than the 50px minimum width
        let left = make_block(0, 0.0, 300.0, 240.0, 500.0);
        let right = make_block(1, 290.0, 300.0, 600.0, 500.0);

        let result =
            BoundaryResolver::resolve(&seed, &[&left, &right], &page, &SegmentOptions::default());
        assert!(result.is_none());
    }

    #[test]
    fn test_resolve_cluster_uses_union_seed() {
        let page = empty_page();
        let a = make_block(0, 200.0, 300.0, 260.0, 320.0);
        let b = make_block(1, 300.0, 400.0, 360.0, 420.0);

        let above = make_block(2, 100.0, 100.0, 500.0, 200.0);

        let bbox = BoundaryResolver::resolve_cluster(
            &[&a, &b],
            &[&above],
            &page,
            &SegmentOptions::default(),
        )
        .unwrap();

        assert_eq!(bbox.y0, 210.0);
        assert_eq!(bbox.x0, 10.0);
        assert_eq!(bbox.x1, 590.0);
        assert_eq!(bbox.y1, 790.0);
    }

    #[test]
    fn test_union_bbox_empty() {
        assert!(BoundaryResolver::union_bbox(&[]).is_none());
    }

    #[test]
    fn test_result_clamped_to_page() {
        // Margin pushes edges inside the page even for a seed at a corner
        let page = empty_page();
        let seed = BBox::new(0.0, 0.0, 100.0, 100.0);

        let bbox = BoundaryResolver::resolve(&seed, &[], &page, &SegmentOptions::default()).unwrap();
        assert!(bbox.x0 >= 0.0 && bbox.y0 >= 0.0);
        assert!(bbox.x1 <= page.width && bbox.y1 <= page.height);
    }
}
