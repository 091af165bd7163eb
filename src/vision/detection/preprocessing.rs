// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Letterbox preprocessing for YOLO-family detectors

use image::{imageops, DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

/// Default square input size for the detector
pub const DETECTION_INPUT_SIZE: u32 = 640;

/// Gray used for letterbox padding (Ultralytics convention)
pub const LETTERBOX_FILL: u8 = 114;

/// Geometry of a letterboxed image, used to map boxes back to the original
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Scale applied to the original image
    pub gain: f32,
    /// Left padding in input pixels
    pub pad_x: f32,
    /// Top padding in input pixels
    pub pad_y: f32,
    /// Width of the resized image before padding
    pub resized_width: u32,
    /// Height of the resized image before padding
    pub resized_height: u32,
    pub orig_width: u32,
    pub orig_height: u32,
    pub input_size: u32,
}

impl Letterbox {
    /// Compute the letterbox for an image of `orig_width` x `orig_height`
    pub fn compute(orig_width: u32, orig_height: u32, input_size: u32) -> Self {
        if orig_width == 0 || orig_height == 0 {
            return Self {
                gain: 1.0,
                pad_x: 0.0,
                pad_y: 0.0,
                resized_width: 0,
                resized_height: 0,
                orig_width,
                orig_height,
                input_size,
            };
        }

        let size = input_size as f32;
        let gain = (size / orig_height as f32).min(size / orig_width as f32);

        let resized_width = ((orig_width as f32 * gain).round() as u32).clamp(1, input_size);
        let resized_height = ((orig_height as f32 * gain).round() as u32).clamp(1, input_size);

        // Split padding between both sides; the -0.1 biases odd remainders to the right/bottom
        let dw = (input_size - resized_width) as f32 / 2.0;
        let dh = (input_size - resized_height) as f32 / 2.0;

        Self {
            gain,
            pad_x: (dw - 0.1).round().max(0.0),
            pad_y: (dh - 0.1).round().max(0.0),
            resized_width,
            resized_height,
            orig_width,
            orig_height,
            input_size,
        }
    }

    /// Map a point from model input space back to original image space
    pub fn to_original(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x) / self.gain, (y - self.pad_y) / self.gain)
    }

    /// Map a point from original image space into model input space
    pub fn to_input(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.gain + self.pad_x, y * self.gain + self.pad_y)
    }
}

/// Resize preserving aspect ratio and pad to `input_size` x `input_size`
pub fn letterbox(image: &DynamicImage, input_size: u32) -> (RgbImage, Letterbox) {
    let (orig_w, orig_h) = image.dimensions();
    let geometry = Letterbox::compute(orig_w, orig_h, input_size);

    let mut canvas = RgbImage::from_pixel(
        input_size,
        input_size,
        Rgb([LETTERBOX_FILL, LETTERBOX_FILL, LETTERBOX_FILL]),
    );

    if geometry.resized_width > 0 && geometry.resized_height > 0 {
        let resized = image
            .resize_exact(
                geometry.resized_width,
                geometry.resized_height,
                imageops::FilterType::Triangle,
            )
            .to_rgb8();
        imageops::overlay(
            &mut canvas,
            &resized,
            geometry.pad_x as i64,
            geometry.pad_y as i64,
        );
    }

    (canvas, geometry)
}

/// Convert an RGB image into an NCHW tensor scaled to [0, 1]
pub fn to_nchw_tensor(rgb: &RgbImage) -> Array4<f32> {
    let (width, height) = rgb.dimensions();
    let mut tensor = Array4::zeros((1, 3, height as usize, width as usize));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    tensor
}

/// Preprocess an image for detection: letterbox + NCHW tensor [1, 3, S, S]
pub fn preprocess_for_detection(image: &DynamicImage, input_size: u32) -> (Array4<f32>, Letterbox) {
    let (canvas, geometry) = letterbox(image, input_size);
    (to_nchw_tensor(&canvas), geometry)
}
