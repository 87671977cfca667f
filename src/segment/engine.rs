//! Segmentation pipeline
//!
//! Orchestrates one pass over a classified page: prompt visuals from
//! label clusters (with the empty-gap fallback), choice visuals from the
//! layout analyzer, refinement against protected text, deduplication,
//! and mask planning. Holds no state across pages; identical input
//! always yields identical output.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::page::{BBox, Block, BlockCategory, BlockKind, Page};
use crate::segment::boundary::BoundaryResolver;
use crate::segment::cluster::LabelClusterer;
use crate::segment::dedupe::OverlapDeduplicator;
use crate::segment::gap::GapDetector;
use crate::segment::layout::ChoiceLayoutAnalyzer;
use crate::segment::mask::TextMaskPlanner;
use crate::segment::refine::BBoxRefiner;
use crate::segment::types::{
    LayoutMode, MaskArea, Region, RegionKind, Result, SegmentError,
};
use crate::segment::SegmentOptions;

/// Confidence for label-anchored prompt regions
const PROMPT_CONFIDENCE: f64 = 0.9;

/// Confidence for gap-fallback prompt regions
const GAP_FALLBACK_CONFIDENCE: f64 = 0.5;

/// Confidence multiplier for regions whose shrink pass degraded
const DEGRADED_PENALTY: f64 = 0.5;

/// Result of segmenting one page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segmentation {
    /// Page number the result belongs to
    pub page_number: u32,

    /// Detected choice arrangement, when choice analysis ran
    pub layout_mode: Option<LayoutMode>,

    /// Regions ordered by `(y0, x0)`, ids sequential in that order
    pub regions: Vec<Region>,

    /// Mask rectangles for choice letters inside their own regions
    pub masks: Vec<MaskArea>,
}

/// The region segmentation engine.
///
/// Stateless apart from its options; one instance may be shared freely
/// across threads, one invocation per page.
#[derive(Debug, Clone, Default)]
pub struct SegmentEngine {
    options: SegmentOptions,
}

impl SegmentEngine {
    /// Create an engine with the given options
    pub fn new(options: SegmentOptions) -> Self {
        Self { options }
    }

    /// The engine's options
    pub fn options(&self) -> &SegmentOptions {
        &self.options
    }

    /// Segment one classified page into visual regions and masks.
    ///
    /// "Nothing found" comes back as an empty region list. Errors are
    /// reserved for choice questions where returning a result would risk
    /// pairing the wrong diagram with the wrong choice.
    pub fn segment_page(&self, page: &Page) -> Result<Segmentation> {
        let opts = &self.options;

        let blocks: Vec<&Block> = page.blocks.iter().collect();
        let prompt_labels: Vec<&Block> = blocks
            .iter()
            .filter(|b| b.category.is_prompt_label())
            .copied()
            .collect();
        let choice_labels: Vec<&Block> = blocks
            .iter()
            .filter(|b| b.category == BlockCategory::ChoiceVisualLabel)
            .copied()
            .collect();
        let anchors: Vec<&Block> = blocks
            .iter()
            .filter(|b| b.category == BlockCategory::AnswerChoice)
            .copied()
            .collect();
        let avoid: Vec<&Block> = blocks
            .iter()
            .filter(|b| b.is_avoided(opts.long_text_threshold))
            .copied()
            .collect();
        // Prompt regions additionally stop at choice anchors, so a
        // prompt visual never bleeds into the choices section
        let prompt_avoid: Vec<&Block> = blocks
            .iter()
            .filter(|b| {
                b.is_avoided(opts.long_text_threshold)
                    || b.category == BlockCategory::AnswerChoice
            })
            .copied()
            .collect();
        // Unowned text (page numbers, footers): pulls gap bottoms and
        // vertical choice bands upward
        let unowned: Vec<&Block> = blocks
            .iter()
            .filter(|b| {
                b.kind == BlockKind::Text
                    && !b.is_avoided(opts.long_text_threshold)
                    && !b.category.is_label()
                    && b.category != BlockCategory::AnswerChoice
            })
            .copied()
            .collect();
        let qa_and_footers: Vec<&Block> =
            avoid.iter().chain(unowned.iter()).copied().collect();

        let mut regions = Vec::new();

        // -------- Prompt visuals --------
        let clusters = LabelClusterer::cluster(&prompt_labels, opts.gap_threshold);
        debug!(
            page = page.page_number,
            labels = prompt_labels.len(),
            clusters = clusters.len(),
            "clustered prompt labels"
        );

        for cluster in &clusters {
            if let Some(region) =
                self.prompt_region_from_cluster(cluster, &prompt_avoid, &blocks, page)
            {
                regions.push(region);
            }
        }

        // The fallback only makes sense for prompt visuals: no labels to
        // anchor a cluster, and no choice diagrams claiming the gaps
        if prompt_labels.is_empty() && choice_labels.is_empty() {
            if let Some(region) = self.gap_fallback_region(&prompt_avoid, &unowned, &blocks, page) {
                debug!(page = page.page_number, "gap fallback produced a region");
                regions.push(region);
            }
        }

        // -------- Choice visuals --------
        let mut layout_mode = None;
        if !choice_labels.is_empty() && anchors.len() >= 2 {
            let mode =
                ChoiceLayoutAnalyzer::detect_layout(&anchors, page.width, opts.layout_stdev_factor);
            debug!(page = page.page_number, ?mode, anchors = anchors.len(), "choice layout");
            layout_mode = Some(mode);

            let choice_regions = ChoiceLayoutAnalyzer::compute_regions(
                &anchors,
                &choice_labels,
                &qa_and_footers,
                page,
                mode,
                opts,
            )?;

            for region in choice_regions {
                // A refined region that still swallows protected text is
                // dropped here; the count check below turns that into the
                // fatal mismatch rather than a silently wrong pairing.
                if let Some(region) = self.refine_choice_region(region, &blocks, page) {
                    regions.push(region);
                }
            }
        }

        // -------- Ordering, dedup, invariants --------
        regions.sort_by(|a, b| {
            a.bbox
                .y0
                .total_cmp(&b.bbox.y0)
                .then(a.bbox.x0.total_cmp(&b.bbox.x0))
        });
        // Dedup runs within each kind: a prompt region and a choice
        // region covering the same area are different extractions, and a
        // cross-kind drop would corrupt the choice count.
        let (choice, prompt): (Vec<Region>, Vec<Region>) = regions
            .into_iter()
            .partition(|r| r.kind == RegionKind::ChoiceVisual);
        let mut regions = OverlapDeduplicator::dedupe(prompt, opts.overlap_threshold);
        regions.extend(OverlapDeduplicator::dedupe(choice, opts.overlap_threshold));
        regions.sort_by(|a, b| {
            a.bbox
                .y0
                .total_cmp(&b.bbox.y0)
                .then(a.bbox.x0.total_cmp(&b.bbox.x0))
        });
        for (index, region) in regions.iter_mut().enumerate() {
            region.id = index as u32;
        }

        if layout_mode.is_some() {
            let produced = regions
                .iter()
                .filter(|r| r.kind == RegionKind::ChoiceVisual)
                .count();
            if produced != anchors.len() {
                return Err(SegmentError::ChoiceCountMismatch {
                    expected: anchors.len(),
                    produced,
                });
            }
        }

        // -------- Masks --------
        let masks = self.plan_masks(&regions, &anchors);

        Ok(Segmentation {
            page_number: page.page_number,
            layout_mode,
            regions,
            masks,
        })
    }

    /// Resolve one label cluster into a prompt region
    fn prompt_region_from_cluster(
        &self,
        cluster: &[&Block],
        avoid: &[&Block],
        blocks: &[&Block],
        page: &Page,
    ) -> Option<Region> {
        let opts = &self.options;
        let resolved = BoundaryResolver::resolve_cluster(cluster, avoid, page, opts)?;
        let expanded = BBoxRefiner::expand_to_boundaries(&resolved, blocks, page, opts.margin);
        let shrink = BBoxRefiner::shrink_away_from_text(
            &expanded,
            blocks,
            &BTreeSet::new(),
            opts.min_region_width,
            opts.min_region_height,
        );
        if shrink.degraded {
            warn!(
                page = page.page_number,
                bbox = ?shrink.bbox,
                "prompt region still overlaps protected text at the size floor"
            );
        }

        self.finish_prompt_region(shrink.bbox, shrink.degraded, cluster, blocks, page)
    }

    /// Build a prompt region from the best empty gap on the page.
    ///
    /// Runs only when no prompt labels exist, and only produces a region
    /// that actually covers an image block; empty whitespace between
    /// text is not a diagram.
    fn gap_fallback_region(
        &self,
        avoid: &[&Block],
        unowned: &[&Block],
        blocks: &[&Block],
        page: &Page,
    ) -> Option<Region> {
        let opts = &self.options;
        let bbox = GapDetector::find_best_bbox(avoid, unowned, page, opts)?;
        let shrink = BBoxRefiner::shrink_away_from_text(
            &bbox,
            blocks,
            &BTreeSet::new(),
            opts.min_region_width,
            opts.min_region_height,
        );

        let covers_image = blocks.iter().any(|b| {
            b.kind == BlockKind::Image
                && shrink
                    .bbox
                    .contains_point(b.bbox.center_x(), b.bbox.center_y())
        });
        if !covers_image {
            return None;
        }

        let mut region =
            self.finish_prompt_region(shrink.bbox, shrink.degraded, &[], blocks, page)?;
        region.confidence = if shrink.degraded {
            GAP_FALLBACK_CONFIDENCE * DEGRADED_PENALTY
        } else {
            GAP_FALLBACK_CONFIDENCE
        };
        Some(region)
    }

    /// Final size/containment checks and member collection for a prompt
    /// region
    fn finish_prompt_region(
        &self,
        bbox: BBox,
        degraded: bool,
        cluster: &[&Block],
        blocks: &[&Block],
        page: &Page,
    ) -> Option<Region> {
        let opts = &self.options;
        let bbox = bbox.clamp_to(page.width, page.height);
        if bbox.width() < opts.min_region_width || bbox.height() < opts.min_region_height {
            return None;
        }

        // A region that fully contains protected text is never returned
        let swallows = blocks
            .iter()
            .any(|b| b.is_protected(opts.long_text_threshold) && bbox.contains(&b.bbox));
        if swallows {
            debug!(?bbox, "dropping prompt region that swallows protected text");
            return None;
        }

        let mut members: BTreeSet<u32> = cluster.iter().map(|b| b.id).collect();
        for block in blocks {
            if block.kind == BlockKind::Image
                && bbox.contains_point(block.bbox.center_x(), block.bbox.center_y())
            {
                members.insert(block.id);
            }
        }

        let base = PROMPT_CONFIDENCE;
        Some(Region {
            id: 0,
            kind: RegionKind::PromptVisual,
            bbox,
            member_block_ids: members,
            choice_letter: None,
            confidence: if degraded { base * DEGRADED_PENALTY } else { base },
        })
    }

    /// Shrink a choice region away from protected prose.
    ///
    /// Shrink only: expanding a choice band would swallow its siblings.
    /// `None` when the refined box still fully contains a protected
    /// block, which no output region is ever allowed to do.
    fn refine_choice_region(
        &self,
        mut region: Region,
        blocks: &[&Block],
        page: &Page,
    ) -> Option<Region> {
        let opts = &self.options;
        let shrink = BBoxRefiner::shrink_away_from_text(
            &region.bbox,
            blocks,
            &region.member_block_ids,
            opts.choice_min_region_width,
            opts.choice_min_region_height,
        );
        if shrink.degraded {
            warn!(
                page = page.page_number,
                letter = ?region.choice_letter,
                "choice region still overlaps protected text at the size floor"
            );
            region.confidence *= DEGRADED_PENALTY;
        }
        region.bbox = shrink.bbox.clamp_to(page.width, page.height);

        let swallows = blocks
            .iter()
            .any(|b| b.is_protected(opts.long_text_threshold) && region.bbox.contains(&b.bbox));
        if swallows {
            debug!(
                letter = ?region.choice_letter,
                "dropping choice region that swallows protected text"
            );
            return None;
        }
        Some(region)
    }

    /// Plan a letter mask for every choice region whose anchor text
    /// starts with its own letter
    fn plan_masks(&self, regions: &[Region], anchors: &[&Block]) -> Vec<MaskArea> {
        let mut masks = Vec::new();
        for region in regions {
            if region.kind != RegionKind::ChoiceVisual {
                continue;
            }
            let Some(letter) = region.choice_letter else {
                continue;
            };
            let anchor = anchors
                .iter()
                .find(|a| region.member_block_ids.contains(&a.id));
            if let Some(anchor) = anchor {
                masks.extend(TextMaskPlanner::compute_masks(
                    &anchor.text,
                    &anchor.bbox,
                    letter,
                ));
            }
        }
        masks
    }
}

// ============================================================
// Tests
// ============================================================
