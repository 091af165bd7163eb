// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Draw detection boxes and their labels onto an image

use ab_glyph::{FontRef, PxScale};
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::sync::OnceLock;
use tracing::warn;

use super::Detection;

/// DejaVu Sans, see assets/fonts/LICENSE
static LABEL_FONT_BYTES: &[u8] = include_bytes!("../../../assets/fonts/DejaVuSans.ttf");

static LABEL_FONT: OnceLock<Option<FontRef<'static>>> = OnceLock::new();

const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Ultralytics default palette, indexed by class id
const PALETTE: [[u8; 3]; 20] = [
    [0xFF, 0x38, 0x38],
    [0xFF, 0x9D, 0x97],
    [0xFF, 0x70, 0x1F],
    [0xFF, 0xB2, 0x1D],
    [0xCF, 0xD2, 0x31],
    [0x48, 0xF9, 0x0A],
    [0x92, 0xCC, 0x17],
    [0x3D, 0xDB, 0x86],
    [0x1A, 0x93, 0x34],
    [0x00, 0xD4, 0xBB],
    [0x2C, 0x99, 0xA8],
    [0x00, 0xC2, 0xFF],
    [0x34, 0x45, 0x93],
    [0x64, 0x73, 0xFF],
    [0x00, 0x18, 0xEC],
    [0x84, 0x38, 0xFF],
    [0x52, 0x00, 0x85],
    [0xCB, 0x38, 0xFF],
    [0xFF, 0x95, 0xC8],
    [0xFF, 0x37, 0xC7],
];

pub fn box_color(class_id: usize) -> Rgb<u8> {
    Rgb(PALETTE[class_id % PALETTE.len()])
}

/// Outline thickness scaled to the image size, never thinner than 2px
pub fn line_width(width: u32, height: u32) -> u32 {
    let scaled = ((width + height) as f32 / 2.0 * 0.003).round() as u32;
    scaled.max(2)
}

/// Label text size in pixels for a given outline thickness
pub fn label_scale(thickness: u32) -> f32 {
    (thickness as f32 * 6.0).max(12.0)
}

/// `"<class> <confidence>"`, confidence to two decimals
pub fn label_text(detection: &Detection) -> String {
    format!("{} {:.2}", detection.class_name, detection.confidence)
}

fn label_font() -> Option<&'static FontRef<'static>> {
    LABEL_FONT
        .get_or_init(|| match FontRef::try_from_slice(LABEL_FONT_BYTES) {
            Ok(font) => Some(font),
            Err(e) => {
                warn!("Label font unusable, drawing boxes without labels: {}", e);
                None
            }
        })
        .as_ref()
}

/// Return a copy of `image` with one labelled outline per detection
pub fn annotate(image: &DynamicImage, detections: &[Detection]) -> DynamicImage {
    let mut canvas: RgbImage = image.to_rgb8();
    if detections.is_empty() {
        return DynamicImage::ImageRgb8(canvas);
    }

    let (width, height) = image.dimensions();
    let thickness = line_width(width, height);

    for detection in detections {
        draw_outline(&mut canvas, detection, thickness);
    }

    // Labels go on top so later boxes never hide earlier text
    if let Some(font) = label_font() {
        for detection in detections {
            draw_label(&mut canvas, detection, thickness, font);
        }
    }

    DynamicImage::ImageRgb8(canvas)
}

/// Filled tab with the label, above the box when it fits, else just inside it
fn draw_label(canvas: &mut RgbImage, detection: &Detection, thickness: u32, font: &FontRef<'static>) {
    let (width, height) = canvas.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    let text = label_text(detection);
    let scale = PxScale::from(label_scale(thickness));
    let (text_w, text_h) = text_size(scale, font, &text);

    let tab_w = (text_w + 4).min(width);
    let tab_h = (text_h + 3).min(height);

    let x1 = (detection.bbox.x1.round() as i64).clamp(0, width as i64 - 1);
    let y1 = (detection.bbox.y1.round() as i64).clamp(0, height as i64 - 1);

    let tab_x = x1.min(width as i64 - tab_w as i64).max(0);
    let tab_y = if y1 >= tab_h as i64 {
        y1 - tab_h as i64
    } else {
        y1.min(height as i64 - tab_h as i64).max(0)
    };

    let color = box_color(detection.class_id);
    draw_filled_rect_mut(
        canvas,
        Rect::at(tab_x as i32, tab_y as i32).of_size(tab_w, tab_h),
        color,
    );
    draw_text_mut(
        canvas,
        LABEL_TEXT_COLOR,
        tab_x as i32 + 2,
        tab_y as i32 + 1,
        scale,
        font,
        &text,
    );
}

fn draw_outline(canvas: &mut RgbImage, detection: &Detection, thickness: u32) {
    let (width, height) = canvas.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    let max_x = width as i64 - 1;
    let max_y = height as i64 - 1;
    let x1 = (detection.bbox.x1.round() as i64).clamp(0, max_x);
    let y1 = (detection.bbox.y1.round() as i64).clamp(0, max_y);
    let x2 = (detection.bbox.x2.round() as i64).clamp(0, max_x);
    let y2 = (detection.bbox.y2.round() as i64).clamp(0, max_y);
    if x2 < x1 || y2 < y1 {
        return;
    }

    let color = box_color(detection.class_id);
    let t = thickness as i64;

    // Strokes grow inward so the outline stays inside the box
    fill_rect(canvas, x1, y1, x2, (y1 + t - 1).min(y2), color);
    fill_rect(canvas, x1, (y2 - t + 1).max(y1), x2, y2, color);
    fill_rect(canvas, x1, y1, (x1 + t - 1).min(x2), y2, color);
    fill_rect(canvas, (x2 - t + 1).max(x1), y1, x2, y2, color);
}

fn fill_rect(canvas: &mut RgbImage, x1: i64, y1: i64, x2: i64, y2: i64, color: Rgb<u8>) {
    for y in y1..=y2 {
        for x in x1..=x2 {
            canvas.put_pixel(x as u32, y as u32, color);
        }
    }
}
