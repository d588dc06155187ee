//! Synthetic textures shared by the integration tests.

#![allow(dead_code)]

use texgz::texture::{Encoding, Texture};

pub const RED: [u8; 4] = [220, 30, 40, 255];
pub const TEAL: [u8; 4] = [20, 160, 150, 255];

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Uniform RGBA-8888 texture.
pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Texture {
    Texture::filled(width, height, Encoding::Rgba8888, &color).unwrap()
}

/// Color of the checkerboard cell containing `(x, y)`.
pub fn checker_color(x: u32, y: u32, cell: u32) -> [u8; 4] {
    if (x / cell + y / cell) % 2 == 0 { RED } else { TEAL }
}

/// Square RGBA-8888 checkerboard of `RED` and `TEAL` cells.
pub fn checkerboard(size: u32, cell: u32) -> Texture {
    let mut tex = Texture::with_size(size, size, Encoding::Rgba8888).unwrap();
    for y in 0..size {
        for x in 0..size {
            tex.set_pixel(x, y, &checker_color(x, y, cell));
        }
    }
    tex
}

/// Texture whose whole allocation, padding included, holds a byte pattern.
pub fn patterned(width: u32, height: u32, stride: u32, vstride: u32, encoding: Encoding) -> Texture {
    let mut tex = Texture::new(width, height, stride, vstride, encoding).unwrap();
    for (i, b) in tex.pixels_mut().iter_mut().enumerate() {
        *b = (i * 31 + 7) as u8;
    }
    tex
}
