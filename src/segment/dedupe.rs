//! Overlap deduplication
//!
//! Drops regions that are near-duplicates of an already-kept region.
//! Input order decides who survives, so the pass is deterministic and
//! idempotent on its own output.

use crate::page::BBox;
use crate::segment::types::Region;

/// Near-duplicate region filter
pub struct OverlapDeduplicator;

impl OverlapDeduplicator {
    /// Keep each region unless its intersection with some already-kept
    /// region, measured against its own area, exceeds `threshold`.
    pub fn dedupe(regions: Vec<Region>, threshold: f64) -> Vec<Region> {
        let mut kept: Vec<Region> = Vec::with_capacity(regions.len());

        for region in regions {
            let duplicate = kept
                .iter()
                .any(|k| Self::self_overlap(&region.bbox, &k.bbox) > threshold);
            if !duplicate {
                kept.push(region);
            }
        }
        kept
    }

    /// Fraction of `bbox` covered by `other`
    fn self_overlap(bbox: &BBox, other: &BBox) -> f64 {
        let area = bbox.area();
        if area <= 0.0 {
            return 0.0;
        }
        bbox.intersection_area(other) / area
    }
}

// ============================================================
// Tests
// ============================================================
