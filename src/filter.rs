//! Convolution, Sobel gradients and the outline (glow) generator.

use crate::texture::{Encoding, Result, TexError, Texture};
use std::sync::LazyLock;

type Kernel3 = [[f32; 3]; 3];
type Kernel5 = [[f32; 5]; 5];

// Normalized so a unit step maps to [-1, 1].
const SOBEL3_X: Kernel3 = [
    [-0.25, 0.0, 0.25],
    [-0.5, 0.0, 0.5],
    [-0.25, 0.0, 0.25],
];

const SOBEL5_X: Kernel5 = [
    [-1.0 / 48.0, -2.0 / 48.0, 0.0, 2.0 / 48.0, 1.0 / 48.0],
    [-4.0 / 48.0, -8.0 / 48.0, 0.0, 8.0 / 48.0, 4.0 / 48.0],
    [-6.0 / 48.0, -12.0 / 48.0, 0.0, 12.0 / 48.0, 6.0 / 48.0],
    [-4.0 / 48.0, -8.0 / 48.0, 0.0, 8.0 / 48.0, 4.0 / 48.0],
    [-1.0 / 48.0, -2.0 / 48.0, 0.0, 2.0 / 48.0, 1.0 / 48.0],
];

pub const OUTLINE_SIZES: [u32; 5] = [3, 5, 7, 9, 11];

/// Anti-aliased disk masks, one per entry of [`OUTLINE_SIZES`].
static OUTLINE_MASKS: LazyLock<Vec<Kernel>> = LazyLock::new(|| {
    OUTLINE_SIZES
        .iter()
        .map(|&size| {
            let n = size as usize;
            let c = (n / 2) as f32;
            let r = size as f32 / 2.0;
            let weights = (0..n * n)
                .map(|i| {
                    let dx = (i % n) as f32 - c;
                    let dy = (i / n) as f32 - c;
                    (r + 0.5 - (dx * dx + dy * dy).sqrt()).clamp(0.0, 1.0)
                })
                .collect();
            Kernel { size: n, weights }
        })
        .collect()
});

/// Direction of a gradient kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// An odd-sized square kernel, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    size: usize,
    weights: Vec<f32>,
}

impl Kernel {
    pub fn new(size: usize, weights: Vec<f32>) -> Result<Self> {
        if size % 2 == 0 || weights.len() != size * size {
            log::debug!("invalid size={size}, weights={}", weights.len());
            return Err(TexError::Validation(format!(
                "kernel needs an odd size and size² weights, got size={size} with {} weights",
                weights.len()
            )));
        }
        Ok(Self { size, weights })
    }

    fn from_rows<const N: usize>(rows: &[[f32; N]; N], axis: Axis) -> Self {
        let weights = (0..N * N)
            .map(|i| {
                let (row, col) = (i / N, i % N);
                match axis {
                    Axis::X => rows[row][col],
                    Axis::Y => rows[col][row],
                }
            })
            .collect();
        Self { size: N, weights }
    }

    /// Sobel kernel of size 3 or 5.
    pub fn sobel(size: usize, axis: Axis) -> Result<Self> {
        match size {
            3 => Ok(Self::from_rows(&SOBEL3_X, axis)),
            5 => Ok(Self::from_rows(&SOBEL5_X, axis)),
            _ => Err(TexError::Validation(format!(
                "sobel kernels come in sizes 3 and 5, not {size}"
            ))),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn weight(&self, x: usize, y: usize) -> f32 {
        self.weights[y * self.size + x]
    }
}

impl Texture {
    /// Convolve a `LUMINANCE-F` texture.
    ///
    /// Pixels closer than `size/2` to the edge of the logical region keep
    /// their input value. With `rescale`, results are mapped from `[-1, 1]`
    /// to `[0, 1]` (`0.5 * v + 0.5`).
    pub fn convolve_copy(&self, kernel: &Kernel, rescale: bool) -> Result<Texture> {
        if self.encoding() != Encoding::LuminanceFloat {
            log::debug!("invalid convolve encoding={}", self.encoding());
            return Err(TexError::Validation(format!(
                "convolve needs LUMINANCE-F, got {}",
                self.encoding()
            )));
        }
        let mut out = self.clone();
        let half = (kernel.size / 2) as u32;
        let (w, h) = (self.width(), self.height());
        if w <= 2 * half || h <= 2 * half {
            return Ok(out);
        }

        for y in half..h - half {
            for x in half..w - half {
                let mut sum = 0.0;
                for ky in 0..kernel.size {
                    for kx in 0..kernel.size {
                        let sx = x + kx as u32 - half;
                        let sy = y + ky as u32 - half;
                        sum += kernel.weight(kx, ky) * self.pixel_f32(sx, sy);
                    }
                }
                if rescale {
                    sum = 0.5 * sum + 0.5;
                }
                out.set_pixel_f32(x, y, sum);
            }
        }
        Ok(out)
    }

    /// Sobel gradient maps `(gx, gy)`, rescaled into `[0, 1]`.
    pub fn gradient(&self, size: usize) -> Result<(Texture, Texture)> {
        let gx = self.convolve_copy(&Kernel::sobel(size, Axis::X)?, true)?;
        let gy = self.convolve_copy(&Kernel::sobel(size, Axis::Y)?, true)?;
        Ok((gx, gy))
    }

    /// Glow an `ALPHA` or `LUMINANCE` texture into a `LUMINANCE-ALPHA` one.
    ///
    /// The canvas grows by `size/2` on every side. Each output alpha is the
    /// maximum of `mask weight × source value` over the mask footprint;
    /// luminance is white.
    pub fn outline(&self, size: u32) -> Result<Texture> {
        if !matches!(self.encoding(), Encoding::Alpha8 | Encoding::Luminance8) {
            log::debug!("invalid outline encoding={}", self.encoding());
            return Err(TexError::Validation(format!(
                "outline needs ALPHA or LUMINANCE, got {}",
                self.encoding()
            )));
        }
        let Some(index) = OUTLINE_SIZES.iter().position(|&s| s == size) else {
            log::debug!("invalid outline size={size}");
            return Err(TexError::Validation(format!(
                "outline size must be one of {OUTLINE_SIZES:?}, got {size}"
            )));
        };
        let mask = &OUTLINE_MASKS[index];
        let half = (size / 2) as i64;
        let (w, h) = (self.width(), self.height());
        let mut out = Texture::with_size(w + 2 * half as u32, h + 2 * half as u32, Encoding::LuminanceAlpha88)?;

        for oy in 0..out.height() {
            for ox in 0..out.width() {
                let mut best = 0.0f32;
                for my in 0..mask.size {
                    let sy = oy as i64 - 2 * half + my as i64;
                    if sy < 0 || sy >= h as i64 {
                        continue;
                    }
                    for mx in 0..mask.size {
                        let sx = ox as i64 - 2 * half + mx as i64;
                        if sx < 0 || sx >= w as i64 {
                            continue;
                        }
                        let v = mask.weight(mx, my) * self.pixel(sx as u32, sy as u32)[0] as f32;
                        best = best.max(v);
                    }
                }
                out.set_pixel(ox, oy, &[255, (best + 0.5).min(255.0) as u8]);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(width: u32, height: u32) -> Texture {
        let mut tex = Texture::with_size(width, height, Encoding::LuminanceFloat).unwrap();
        for y in 0..height {
            for x in 0..width {
                tex.set_pixel_f32(x, y, x as f32 * 0.1);
            }
        }
        tex
    }

    #[test]
    fn kernel_rejects_even_sizes() {
        assert!(Kernel::new(2, vec![0.0; 4]).is_err());
        assert!(Kernel::new(3, vec![0.0; 8]).is_err());
        assert!(Kernel::sobel(7, Axis::X).is_err());
    }

    #[test]
    fn sobel_y_is_transposed_x() {
        let x = Kernel::sobel(5, Axis::X).unwrap();
        let y = Kernel::sobel(5, Axis::Y).unwrap();
        for i in 0..5 {
            for j in 0..5 {
                assert_eq!(x.weight(i, j), y.weight(j, i));
            }
        }
    }

    #[test]
    fn identity_kernel_copies() {
        let mut weights = vec![0.0; 9];
        weights[4] = 1.0;
        let k = Kernel::new(3, weights).unwrap();
        let tex = ramp(5, 5);
        assert_eq!(tex.convolve_copy(&k, false).unwrap(), tex);
    }

    #[test]
    fn horizontal_ramp_has_constant_x_gradient() {
        let tex = ramp(8, 6);
        // slope 0.1 per pixel: 3x3 responds 0.2, 5x5 responds 12.8/48
        for (size, expected) in [(3, 0.6), (5, 0.5 + 0.5 * 12.8 / 48.0)] {
            let (gx, gy) = tex.gradient(size).unwrap();
            let half = (size / 2) as u32;
            for y in half..6 - half {
                for x in half..8 - half {
                    let v = gx.pixel_f32(x, y);
                    assert!((v - expected).abs() < 1e-5, "size {size} at ({x},{y}): {v}");
                    assert!((gy.pixel_f32(x, y) - 0.5).abs() < 1e-5);
                }
            }
            // border untouched
            assert_eq!(gx.pixel_f32(0, 0), 0.0);
            assert_eq!(gx.pixel_f32(7, 5), tex.pixel_f32(7, 5));
        }
    }

    #[test]
    fn convolve_needs_float_luminance() {
        let tex = Texture::with_size(4, 4, Encoding::Luminance8).unwrap();
        assert!(tex.gradient(3).is_err());
    }

    #[test]
    fn convolve_on_tiny_texture_is_a_copy() {
        let tex = ramp(2, 2);
        assert_eq!(tex.convolve_copy(&Kernel::sobel(3, Axis::X).unwrap(), true).unwrap(), tex);
    }

    #[test]
    fn outline_of_a_dot_is_a_disk() {
        let dot = Texture::filled(1, 1, Encoding::Alpha8, &[255]).unwrap();
        let out = dot.outline(3).unwrap();
        assert_eq!(out.encoding(), Encoding::LuminanceAlpha88);
        assert_eq!((out.width(), out.height()), (3, 3));
        assert_eq!(out.pixel(1, 1), &[255, 255]);
        assert_eq!(out.pixel(1, 0), &[255, 255]);
        let corner = out.pixel(0, 0)[1];
        assert!(corner > 0 && corner < 255, "corner alpha {corner}");
        assert!(out.pixels().chunks(2).all(|p| p[0] == 255));
    }

    #[test]
    fn outline_grows_canvas_by_half_mask() {
        let tex = Texture::with_size(4, 2, Encoding::Luminance8).unwrap();
        let out = tex.outline(11).unwrap();
        assert_eq!((out.width(), out.height()), (14, 12));
        assert!(out.pixels().chunks(2).all(|p| p == [255, 0]));
    }

    #[test]
    fn outline_rejects_bad_input() {
        let tex = Texture::with_size(2, 2, Encoding::Alpha8).unwrap();
        assert!(tex.outline(4).is_err());
        let rgba = Texture::with_size(2, 2, Encoding::Rgba8888).unwrap();
        assert!(rgba.outline(3).is_err());
    }
}
