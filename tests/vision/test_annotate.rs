// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// tests/vision/test_annotate.rs

use fabstir_breed_assistant::vision::{
    annotate,
    detection::annotate::{box_color, line_width},
    encode_png_data_url, BoundingBox, Detection,
};
use image::{DynamicImage, GenericImageView, Rgba, RgbImage};

const GRASS: [u8; 3] = [20, 140, 20];

fn field(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb(GRASS)))
}

fn detection(class_id: usize, bbox: BoundingBox) -> Detection {
    Detection {
        class_id,
        class_name: format!("breed_{}", class_id),
        confidence: 0.8,
        bbox,
    }
}

fn rgb_at(image: &DynamicImage, x: u32, y: u32) -> [u8; 3] {
    let Rgba([r, g, b, _]) = image.get_pixel(x, y);
    [r, g, b]
}

#[test]
fn test_outline_drawn_in_class_color() {
    let image = field(200, 100);
    let dets = vec![detection(3, BoundingBox { x1: 20.0, y1: 20.0, x2: 80.0, y2: 80.0 })];

    let annotated = annotate(&image, &dets);
    let color = box_color(3).0;

    assert_eq!(annotated.dimensions(), (200, 100));
    assert_eq!(rgb_at(&annotated, 20, 20), color);
    assert_eq!(rgb_at(&annotated, 50, 21), color);
    assert_eq!(rgb_at(&annotated, 80, 50), color);
    // Interior and outside untouched
    assert_eq!(rgb_at(&annotated, 50, 50), GRASS);
    assert_eq!(rgb_at(&annotated, 150, 50), GRASS);
    // The source image is not modified
    assert_eq!(rgb_at(&image, 20, 20), GRASS);
}

#[test]
fn test_thickness_follows_image_size() {
    let image = field(2000, 2000);
    let dets = vec![detection(0, BoundingBox { x1: 100.0, y1: 100.0, x2: 900.0, y2: 900.0 })];
    let annotated = annotate(&image, &dets);
    let t = line_width(2000, 2000);

    assert_eq!(rgb_at(&annotated, 500, 100 + t - 1), box_color(0).0);
    assert_eq!(rgb_at(&annotated, 500, 100 + t), GRASS);
}

#[test]
fn test_box_past_edges_is_clamped() {
    let image = field(64, 64);
    let dets = vec![detection(1, BoundingBox { x1: -10.0, y1: -10.0, x2: 100.0, y2: 100.0 })];
    let annotated = annotate(&image, &dets);

    assert_eq!(rgb_at(&annotated, 0, 0), box_color(1).0);
    assert_eq!(rgb_at(&annotated, 63, 63), box_color(1).0);
    assert_eq!(rgb_at(&annotated, 32, 32), GRASS);
}

#[test]
fn test_annotated_image_encodes_as_png_data_url() {
    let annotated = annotate(&field(32, 32), &[]);
    let url = encode_png_data_url(&annotated).unwrap();
    assert!(url.starts_with("data:image/png;base64,iVBOR"));
}
