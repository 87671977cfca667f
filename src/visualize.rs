//! Diagnostic overlay rendering
//!
//! Renders a per-page PNG showing the classified blocks, the produced
//! regions, and the planned masks, for eyeballing segmentation output.
//! This is a debugging aid; production rasterization of extracted
//! regions happens outside this crate.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::page::{BBox, BlockCategory, Page};
use crate::segment::{RegionKind, Segmentation};

/// Canvas background
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Outline colors
const COLOR_QUESTION: Rgb<u8> = Rgb([120, 120, 120]);
const COLOR_CHOICE: Rgb<u8> = Rgb([70, 70, 200]);
const COLOR_LABEL: Rgb<u8> = Rgb([0, 160, 90]);
const COLOR_OTHER: Rgb<u8> = Rgb([200, 200, 200]);
const COLOR_PROMPT_REGION: Rgb<u8> = Rgb([220, 60, 60]);
const COLOR_CHOICE_REGION: Rgb<u8> = Rgb([240, 140, 0]);
const COLOR_MASK: Rgb<u8> = Rgb([250, 220, 120]);

/// Render the overlay image for one segmented page
pub fn render_overlay(page: &Page, segmentation: &Segmentation) -> RgbImage {
    let width = page.width.ceil().max(1.0) as u32;
    let height = page.height.ceil().max(1.0) as u32;
    let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);

    // Masks first so outlines stay visible on top of them
    for mask in &segmentation.masks {
        if let Some(rect) = to_rect(&mask.bbox, width, height) {
            draw_filled_rect_mut(&mut canvas, rect, COLOR_MASK);
        }
    }

    for block in &page.blocks {
        let color = match block.category {
            BlockCategory::QuestionText | BlockCategory::QuestionPartHeader => COLOR_QUESTION,
            BlockCategory::AnswerChoice => COLOR_CHOICE,
            c if c.is_label() => COLOR_LABEL,
            _ => COLOR_OTHER,
        };
        if let Some(rect) = to_rect(&block.bbox, width, height) {
            draw_hollow_rect_mut(&mut canvas, rect, color);
        }
    }

    for region in &segmentation.regions {
        let color = match region.kind {
            RegionKind::PromptVisual => COLOR_PROMPT_REGION,
            RegionKind::ChoiceVisual => COLOR_CHOICE_REGION,
        };
        if let Some(rect) = to_rect(&region.bbox, width, height) {
            draw_hollow_rect_mut(&mut canvas, rect, color);
            // Double-stroke for visibility on dense pages
            if let Some(inner) = to_rect(&region.bbox.pad(-1.0), width, height) {
                draw_hollow_rect_mut(&mut canvas, inner, color);
            }
        }
    }

    canvas
}

/// Convert a page-space box into a drawable pixel rect
fn to_rect(bbox: &BBox, width: u32, height: u32) -> Option<Rect> {
    let clamped = bbox.clamp_to(width as f64, height as f64);
    if clamped.is_degenerate() {
        return None;
    }
    let w = clamped.width().round().max(1.0) as u32;
    let h = clamped.height().round().max(1.0) as u32;
    Some(Rect::at(clamped.x0.round() as i32, clamped.y0.round() as i32).of_size(w, h))
}

// ============================================================
// Tests
// ============================================================
