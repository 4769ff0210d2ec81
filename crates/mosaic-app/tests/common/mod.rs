//! Shared fixtures for app integration tests.

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use mosaic_core::{PixelImage, Rgb};

/// 4x4 base image with quadrants pure red, green, blue, black.
#[allow(dead_code)]
pub fn quadrant_base() -> PixelImage {
    let colors = [
        Rgb::new(255, 0, 0),
        Rgb::new(0, 255, 0),
        Rgb::new(0, 0, 255),
        Rgb::new(0, 0, 0),
    ];
    let mut rgba = Vec::new();
    for y in 0..4u32 {
        for x in 0..4u32 {
            let color = colors[((y / 2) * 2 + (x / 2)) as usize];
            rgba.extend_from_slice(&[color.r, color.g, color.b, 255]);
        }
    }
    PixelImage::new(4, 4, rgba).expect("base fixture should be valid")
}

/// Encodes a solid-color PNG in memory.
#[allow(dead_code)]
pub fn png_bytes(width: u32, height: u32, color: Rgb) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, image::Rgba([color.r, color.g, color.b, 255]));
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("png fixture should encode");
    bytes.into_inner()
}
