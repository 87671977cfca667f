//! Label mask planning
//!
//! Computes the small rectangle that hides a choice letter baked into
//! its own diagram, so the extracted image does not leak the answer key
//! of its region. The planner only masks what it can justify from the
//! label text itself; when the text does not start with the expected
//! letter, no mask is produced.

use crate::page::BBox;
use crate::segment::types::{MaskArea, MaskReason};

/// Extra width added to the estimated letter span (pixels)
const MASK_EXTRA_WIDTH: f64 = 5.0;

/// Mask width cap as a fraction of the label block width
const MASK_MAX_WIDTH_FRACTION: f64 = 0.2;

/// Punctuation that may follow a choice letter
const LETTER_PUNCTUATION: [char; 3] = ['.', ')', ':'];

/// Choice-letter mask planner
pub struct TextMaskPlanner;

impl TextMaskPlanner {
    /// Plan masks for a label block inside its own choice region.
    ///
    /// The masked width is estimated from the average character width of
    /// the block (`width / char count`) times the letter-plus-punctuation
    /// length, plus a small buffer, capped at 20% of the block width.
    pub fn compute_masks(block_text: &str, bbox: &BBox, choice_letter: char) -> Vec<MaskArea> {
        let trimmed = block_text.trim();
        let mut chars = trimmed.chars();

        let Some(first) = chars.next() else {
            return Vec::new();
        };
        if !first.eq_ignore_ascii_case(&choice_letter) {
            return Vec::new();
        }

        let punctuation = match chars.next() {
            Some(c) if LETTER_PUNCTUATION.contains(&c) => 1,
            _ => 0,
        };

        let char_count = trimmed.chars().count();
        if char_count == 0 || bbox.width() <= 0.0 {
            return Vec::new();
        }

        let estimated =
            (bbox.width() / char_count as f64) * (1 + punctuation) as f64 + MASK_EXTRA_WIDTH;
        let width = estimated.min(MASK_MAX_WIDTH_FRACTION * bbox.width());

        vec![MaskArea {
            bbox: BBox::new(bbox.x0, bbox.y0, bbox.x0 + width, bbox.y1),
            source_text: block_text.to_string(),
            reason: MaskReason::ChoiceLetter,
        }]
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_for_leading_letter_with_punctuation() {
        // 18 characters, block width 200: per-char width 200/18,
        // letter + dot = 2 chars, plus the 5px buffer.
        let bbox = BBox::new(10.0, 100.0, 210.0, 130.0);
        let masks = TextMaskPlanner::compute_masks("A. Diagram of cell", &bbox, 'A');

        assert_eq!(masks.len(), 1);
        let mask = &masks[0];

        let expected = (200.0 / 18.0) * 2.0 + 5.0;
        assert!((mask.bbox.width() - expected).abs() < 1e-9);
        assert!(mask.bbox.width() < 0.2 * 200.0);

        assert_eq!(mask.bbox.x0, 10.0);
        assert_eq!(mask.bbox.y0, 100.0);
        assert_eq!(mask.bbox.y1, 130.0);
        assert_eq!(mask.reason, MaskReason::ChoiceLetter);
        assert_eq!(mask.source_text, "A. Diagram of cell");
    }

    #[test]
    fn test_mask_case_insensitive() {
        let bbox = BBox::new(0.0, 0.0, 100.0, 20.0);
        assert_eq!(TextMaskPlanner::compute_masks("a) option", &bbox, 'A').len(), 1);
        assert_eq!(TextMaskPlanner::compute_masks("B: option", &bbox, 'b').len(), 1);
    }

    #[test]
    fn test_no_mask_when_text_does_not_start_with_letter() {
        let bbox = BBox::new(0.0, 0.0, 100.0, 20.0);
        assert!(TextMaskPlanner::compute_masks("scale: 1cm", &bbox, 'A').is_empty());
        assert!(TextMaskPlanner::compute_masks("", &bbox, 'A').is_empty());
        assert!(TextMaskPlanner::compute_masks("   ", &bbox, 'A').is_empty());
    }

    #[test]
    fn test_mask_without_punctuation_covers_one_char() {
        // "B 10cm" = 6 chars, width 120: per-char 20, one char + 5 = 25
        let bbox = BBox::new(0.0, 0.0, 120.0, 20.0);
        let masks = TextMaskPlanner::compute_masks("B 10cm", &bbox, 'B');
        assert!((masks[0].bbox.width() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_mask_width_capped() {
        // Very short text would estimate half the block; the cap holds
        // it at 20% of the width.
        let bbox = BBox::new(0.0, 0.0, 100.0, 20.0);
        let masks = TextMaskPlanner::compute_masks("B.", &bbox, 'B');
        assert_eq!(masks[0].bbox.width(), 20.0);
    }

    #[test]
    fn test_degenerate_bbox_produces_no_mask() {
        let bbox = BBox::new(50.0, 0.0, 50.0, 20.0);
        assert!(TextMaskPlanner::compute_masks("A. x", &bbox, 'A').is_empty());
    }
}
