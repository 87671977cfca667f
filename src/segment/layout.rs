//! Choice layout analysis
//!
//! Decides whether answer-choice diagrams are stacked in one column or
//! arranged in a grid, partitions the page into per-choice regions, and
//! assigns diagram-adjacent labels to the choice they belong to.
//!
//! Producing fewer or more regions than there are choice anchors is a
//! fatal condition: a mismatched set risks associating the wrong diagram
//! with the wrong choice, which is worse than extracting nothing.

use std::collections::BTreeSet;

use crate::page::{BBox, Block, Page};
use crate::segment::types::{LayoutMode, Region, RegionKind, Result, SegmentError};
use crate::segment::{SegmentOptions, COLUMN_PROXIMITY};

/// Confidence assigned to vertical-list choice regions
const VERTICAL_CONFIDENCE: f64 = 0.9;

/// Confidence assigned to grid choice regions
const GRID_CONFIDENCE: f64 = 0.8;

/// Answer-choice arrangement analyzer
pub struct ChoiceLayoutAnalyzer;

impl ChoiceLayoutAnalyzer {
    /// Classify the choice arrangement.
    ///
    /// Choices stacked in a single column have near-identical horizontal
    /// centers; a low x-center standard deviation (relative to page
    /// width) therefore means Vertical, anything else Grid.
    pub fn detect_layout(anchors: &[&Block], page_width: f64, stdev_factor: f64) -> LayoutMode {
        if Self::x_center_stdev(anchors) < page_width * stdev_factor {
            LayoutMode::Vertical
        } else {
            LayoutMode::Grid
        }
    }

    /// Population standard deviation of anchor x-centers
    fn x_center_stdev(anchors: &[&Block]) -> f64 {
        if anchors.len() < 2 {
            return 0.0;
        }
        let centers: Vec<f64> = anchors.iter().map(|b| b.bbox.center_x()).collect();
        let mean = centers.iter().sum::<f64>() / centers.len() as f64;
        let variance =
            centers.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / centers.len() as f64;
        variance.sqrt()
    }

    /// Count distinct anchor columns by x-center proximity
    pub fn column_count(anchors: &[&Block], proximity: f64) -> usize {
        if anchors.is_empty() {
            return 0;
        }
        let mut centers: Vec<f64> = anchors.iter().map(|b| b.bbox.center_x()).collect();
        centers.sort_by(f64::total_cmp);

        let mut columns = 1;
        for pair in centers.windows(2) {
            if pair[1] - pair[0] > proximity {
                columns += 1;
            }
        }
        columns
    }

    /// First alphanumeric character of the anchor text
    pub fn choice_letter(anchor: &Block) -> Option<char> {
        anchor.text.trim().chars().find(|c| c.is_alphanumeric())
    }

    /// Compute one region per choice anchor.
    ///
    /// `qa_blocks` are the protected question/answer prose blocks plus any
    /// unowned text below the choices (footers); they clip region extents.
    /// Returns exactly `anchors.len()` regions or fails.
    pub fn compute_regions(
        anchors: &[&Block],
        labels: &[&Block],
        qa_blocks: &[&Block],
        page: &Page,
        mode: LayoutMode,
        options: &SegmentOptions,
    ) -> Result<Vec<Region>> {
        if anchors.is_empty() {
            return Ok(Vec::new());
        }

        let mut regions = match mode {
            LayoutMode::Vertical => Self::vertical_regions(anchors, labels, qa_blocks, page, options),
            LayoutMode::Grid => Self::grid_regions(anchors, labels, qa_blocks, page, options)?,
        };

        if regions.len() != anchors.len() {
            return Err(SegmentError::ChoiceCountMismatch {
                expected: anchors.len(),
                produced: regions.len(),
            });
        }

        regions.sort_by(|a, b| {
            a.bbox
                .y0
                .total_cmp(&b.bbox.y0)
                .then(a.bbox.x0.total_cmp(&b.bbox.x0))
        });
        for (index, region) in regions.iter_mut().enumerate() {
            region.id = index as u32;
        }
        Ok(regions)
    }

    // ============================================================
    // Vertical layout
    // ============================================================

    /// One full-width band per choice: from this anchor's top to just
    /// above the next anchor (the last band runs to the nearest
    /// footer-like block, else the page bottom).
    fn vertical_regions(
        anchors: &[&Block],
        labels: &[&Block],
        qa_blocks: &[&Block],
        page: &Page,
        options: &SegmentOptions,
    ) -> Vec<Region> {
        let mut sorted: Vec<&Block> = anchors.to_vec();
        sorted.sort_by(|a, b| a.bbox.y0.total_cmp(&b.bbox.y0).then(a.id.cmp(&b.id)));

        let last_bottom = sorted.last().map(|b| b.bbox.y1).unwrap_or(0.0);
        let footer_top = qa_blocks
            .iter()
            .filter(|b| b.bbox.y0 > last_bottom)
            .map(|b| b.bbox.y0)
            .fold(f64::INFINITY, f64::min);
        let page_end = if footer_top.is_finite() {
            footer_top - options.margin
        } else {
            page.height - options.margin
        };

        let mut regions = Vec::new();
        for (i, anchor) in sorted.iter().enumerate() {
            let y0 = anchor.bbox.y0;
            let y1 = match sorted.get(i + 1) {
                Some(next) => next.bbox.y0 - options.margin,
                None => page_end,
            };
            let bbox = BBox::new(options.margin, y0, page.width - options.margin, y1)
                .clamp_to(page.width, page.height);

            if bbox.width() < options.choice_min_region_width
                || bbox.height() < options.choice_min_region_height
            {
                continue;
            }

            let mut members = BTreeSet::from([anchor.id]);
            for label in labels {
                if bbox.contains_point(label.bbox.center_x(), label.bbox.center_y()) {
                    members.insert(label.id);
                }
            }

            regions.push(Region {
                id: 0,
                kind: RegionKind::ChoiceVisual,
                bbox,
                member_block_ids: members,
                choice_letter: Self::choice_letter(anchor),
                confidence: VERTICAL_CONFIDENCE,
            });
        }
        regions
    }

    // ============================================================
    // Grid layout
    // ============================================================

    /// Quadrant partition at the median anchor center, label assignment
    /// by quadrant, then clipping in raster order.
    ///
    /// The left/right clipping rule pairs each even-index choice with the
    /// next one in raster order, which is only meaningful for 2-column
    /// grids; wider grids are rejected outright rather than mis-clipped.
    fn grid_regions(
        anchors: &[&Block],
        labels: &[&Block],
        qa_blocks: &[&Block],
        page: &Page,
        options: &SegmentOptions,
    ) -> Result<Vec<Region>> {
        let columns = Self::column_count(anchors, COLUMN_PROXIMITY);
        if columns > 2 {
            return Err(SegmentError::UnsupportedGridLayout { columns });
        }

        // Raster order: top-to-bottom, then left-to-right
        let mut sorted: Vec<&Block> = anchors.to_vec();
        sorted.sort_by(|a, b| {
            a.bbox
                .y0
                .total_cmp(&b.bbox.y0)
                .then(a.bbox.x0.total_cmp(&b.bbox.x0))
                .then(a.id.cmp(&b.id))
        });

        let median_x = Self::median(sorted.iter().map(|b| b.bbox.center_x()).collect());
        let median_y = Self::median(sorted.iter().map(|b| b.bbox.center_y()).collect());
        let quadrant =
            |x: f64, y: f64| -> (bool, bool) { (x >= median_x, y >= median_y) };

        // Assign each label to the anchor occupying its quadrant; with
        // several anchors in one quadrant the nearest center wins.
        let mut assigned: Vec<Vec<&Block>> = vec![Vec::new(); sorted.len()];
        for label in labels {
            let lq = quadrant(label.bbox.center_x(), label.bbox.center_y());
            let owner = sorted
                .iter()
                .enumerate()
                .filter(|(_, a)| quadrant(a.bbox.center_x(), a.bbox.center_y()) == lq)
                .min_by(|(_, a), (_, b)| {
                    Self::center_distance(label, a)
                        .total_cmp(&Self::center_distance(label, b))
                        .then(a.id.cmp(&b.id))
                });
            if let Some((index, _)) = owner {
                assigned[index].push(*label);
            }
        }

        // Union boxes before any clipping; sibling clips reference these
        let unions: Vec<BBox> = sorted
            .iter()
            .enumerate()
            .map(|(i, anchor)| {
                assigned[i]
                    .iter()
                    .fold(anchor.bbox, |acc, label| acc.merge(&label.bbox))
            })
            .collect();

        let mut regions = Vec::new();
        for (i, anchor) in sorted.iter().enumerate() {
            let mut bbox = unions[i];

            // Clip top to the nearest qa block ending above this anchor
            let top_limit = qa_blocks
                .iter()
                .filter(|b| b.bbox.y1 <= anchor.bbox.y0)
                .map(|b| b.bbox.y1)
                .fold(f64::NEG_INFINITY, f64::max);
            if top_limit.is_finite() {
                bbox.y0 = bbox.y0.max(top_limit);
            }

            // Clip bottom to the nearest block (qa or sibling) starting below
            let bottom_limit = qa_blocks
                .iter()
                .map(|b| b.bbox)
                .chain(
                    sorted
                        .iter()
                        .enumerate()
                        .filter(|(j, _)| *j != i)
                        .map(|(_, a)| a.bbox),
                )
                .filter(|b| b.y0 >= anchor.bbox.y1)
                .map(|b| b.y0)
                .fold(f64::INFINITY, f64::min);
            if bottom_limit.is_finite() {
                bbox.y1 = bbox.y1.min(bottom_limit);
            }

            // Pair-wise horizontal clip: even index owns the left column
            if i % 2 == 0 {
                if let Some(right_union) = unions.get(i + 1) {
                    bbox.x1 = bbox.x1.min(right_union.x0);
                }
            } else {
                bbox.x0 = bbox.x0.max(unions[i - 1].x1);
            }

            // Padding comes after clipping, never before
            let bbox = bbox.pad(options.grid_padding).clamp_to(page.width, page.height);

            if bbox.width() < options.choice_min_region_width
                || bbox.height() < options.choice_min_region_height
            {
                continue;
            }

            let mut members = BTreeSet::from([anchor.id]);
            members.extend(assigned[i].iter().map(|b| b.id));

            regions.push(Region {
                id: 0,
                kind: RegionKind::ChoiceVisual,
                bbox,
                member_block_ids: members,
                choice_letter: Self::choice_letter(anchor),
                confidence: GRID_CONFIDENCE,
            });
        }
        Ok(regions)
    }

    fn median(mut values: Vec<f64>) -> f64 {
        values.sort_by(f64::total_cmp);
        let n = values.len();
        if n == 0 {
            return 0.0;
        }
        if n % 2 == 1 {
            values[n / 2]
        } else {
            (values[n / 2 - 1] + values[n / 2]) / 2.0
        }
    }

    fn center_distance(a: &Block, b: &Block) -> f64 {
        let dx = a.bbox.center_x() - b.bbox.center_x();
        let dy = a.bbox.center_y() - b.bbox.center_y();
        (dx * dx + dy * dy).sqrt()
    }
}

// ============================================================
// Tests
// ============================================================
