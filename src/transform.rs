//! Geometric transforms over [`Texture`].
//!
//! | Operation | Input | Output extents |
//! |---|---|---|
//! | `crop` | any | tight `(right-left+1) × (bottom-top+1)` |
//! | `pad` | any | stride/vstride rounded up to powers of two |
//! | `flip_vertical` | any | unchanged |
//! | `downscale` | 8-bit encodings, each axis 1 or even | tight `max(w/2,1) × max(h/2,1)` |
//! | `downscale_any` | anything convertible | as `downscale` |
//! | `sample` / `resize` | 8-bit encodings | one pixel / tight target size |
//! | `blit` | same encoding both sides | destination unchanged |
//!
//! Every `_copy` operation leaves `self` alone. The in-place forms build the
//! copy first and then move it into `self`.

use crate::texture::{Encoding, Result, TexError, Texture};

/// A rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when the rectangle is non-empty and lies within `width × height`.
    fn fits(&self, width: u32, height: u32) -> bool {
        let right = self.x as u64 + self.width as u64;
        let bottom = self.y as u64 + self.height as u64;
        self.width > 0 && self.height > 0 && right <= width as u64 && bottom <= height as u64
    }
}

fn require_byte(tex: &Texture, op: &str) -> Result<()> {
    if !tex.encoding().is_byte() {
        log::debug!("invalid {op} encoding={}", tex.encoding());
        return Err(TexError::Validation(format!(
            "{op} needs an 8-bit encoding, got {}",
            tex.encoding()
        )));
    }
    Ok(())
}

/// Copy `rows` rows of `row_len` bytes between two allocations.
fn copy_rows(src: &Texture, src_at: (u32, u32), dst: &mut Texture, dst_at: (u32, u32), size: (u32, u32)) {
    let row_len = size.0 as usize * src.bytes_per_pixel();
    for i in 0..size.1 {
        let s = src.offset(src_at.0, src_at.1 + i);
        let d = dst.offset(dst_at.0, dst_at.1 + i);
        dst.pixels_mut()[d..d + row_len].copy_from_slice(&src.pixels()[s..s + row_len]);
    }
}

impl Texture {
    // ========================================================================
    // Crop / pad / flip
    // ========================================================================

    /// Copy the inclusive rectangle `top..=bottom × left..=right` into a new,
    /// tightly packed texture.
    ///
    /// ```
    /// # use texgz::texture::{Encoding, Texture};
    /// let tex = Texture::with_size(8, 6, Encoding::Rgba8888).unwrap();
    /// let out = tex.crop_copy(0, 0, 5, 7).unwrap();
    /// assert_eq!((out.width(), out.height(), out.stride()), (8, 6, 8));
    /// assert!(tex.crop_copy(3, 0, 2, 7).is_err());
    /// ```
    pub fn crop_copy(&self, top: u32, left: u32, bottom: u32, right: u32) -> Result<Texture> {
        if top > bottom || left > right || right >= self.width() || bottom >= self.height() {
            log::debug!("invalid top={top}, left={left}, bottom={bottom}, right={right}");
            return Err(TexError::Validation(format!(
                "crop ({top},{left})-({bottom},{right}) outside {}x{}",
                self.width(),
                self.height()
            )));
        }
        let width = right - left + 1;
        let height = bottom - top + 1;
        let mut tex = Texture::with_size(width, height, self.encoding())?;
        copy_rows(self, (left, top), &mut tex, (0, 0), (width, height));
        Ok(tex)
    }

    pub fn crop(&mut self, top: u32, left: u32, bottom: u32, right: u32) -> Result<()> {
        *self = self.crop_copy(top, left, bottom, right)?;
        Ok(())
    }

    /// Grow stride and vstride to the next powers of two, zero-filling the new area.
    pub fn pad_copy(&self) -> Result<Texture> {
        let (stride, vstride) = match (
            self.stride().checked_next_power_of_two(),
            self.vstride().checked_next_power_of_two(),
        ) {
            (Some(s), Some(v)) => (s, v),
            _ => {
                return Err(TexError::Validation(format!(
                    "cannot pad {}x{} to a power of two",
                    self.stride(),
                    self.vstride()
                )));
            }
        };
        if stride == self.stride() && vstride == self.vstride() {
            return Ok(self.clone());
        }

        let mut tex = Texture::new(self.width(), self.height(), stride, vstride, self.encoding())?;
        copy_rows(self, (0, 0), &mut tex, (0, 0), (self.width(), self.height()));
        Ok(tex)
    }

    pub fn pad(&mut self) -> Result<()> {
        if self.is_pot() {
            return Ok(());
        }
        *self = self.pad_copy()?;
        Ok(())
    }

    /// Reverse the order of all `vstride` rows.
    pub fn flip_vertical_copy(&self) -> Texture {
        let mut tex = self.blank_like(self.encoding());
        let row = self.row_bytes();
        for (dst, src) in tex
            .pixels_mut()
            .chunks_exact_mut(row)
            .zip(self.pixels().chunks_exact(row).rev())
        {
            dst.copy_from_slice(src);
        }
        tex
    }

    pub fn flip_vertical(&mut self) {
        *self = self.flip_vertical_copy();
    }

    // ========================================================================
    // Box filter
    // ========================================================================

    /// Halve the texture with a 2×2 box filter.
    ///
    /// Each axis must be 1 or even. A 1-pixel axis is kept at 1 and the
    /// filter degenerates to 2×1 or 1×2; a 1×1 texture is copied. Averages
    /// are truncated.
    pub fn downscale(&self) -> Result<Texture> {
        require_byte(self, "downscale")?;
        let (w, h) = (self.width(), self.height());
        if (w != 1 && w % 2 != 0) || (h != 1 && h % 2 != 0) {
            log::debug!("invalid width={w}, height={h}");
            return Err(TexError::Validation(format!(
                "downscale needs each axis to be 1 or even, got {w}x{h}"
            )));
        }
        if w == 1 && h == 1 {
            return Ok(self.clone());
        }

        let (ow, oh) = ((w / 2).max(1), (h / 2).max(1));
        let (fx, fy) = (if w == 1 { 1 } else { 2 }, if h == 1 { 1 } else { 2 });
        let count = fx * fy;
        let bpp = self.bytes_per_pixel();
        let mut tex = Texture::with_size(ow, oh, self.encoding())?;
        let mut sum = vec![0u32; bpp];
        for y in 0..oh {
            for x in 0..ow {
                sum.fill(0);
                for dy in 0..fy {
                    for dx in 0..fx {
                        let p = self.pixel(x * fx + dx, y * fy + dy);
                        for (s, &c) in sum.iter_mut().zip(p) {
                            *s += c as u32;
                        }
                    }
                }
                let o = tex.offset(x, y);
                for (d, s) in tex.pixels_mut()[o..o + bpp].iter_mut().zip(&sum) {
                    *d = (s / count) as u8;
                }
            }
        }
        Ok(tex)
    }

    /// [`downscale`](Self::downscale) for any encoding: non-8-bit input is
    /// expanded to RGBA-8888, filtered, then converted back.
    pub fn downscale_any(&self) -> Result<Texture> {
        if self.encoding().is_byte() {
            return self.downscale();
        }
        self.convert_copy(Encoding::Rgba8888)?
            .downscale()?
            .convert_copy(self.encoding())
    }

    /// The base texture followed by successive downscales.
    ///
    /// `levels` counts the base; `0` continues until a 1×1 level is reached.
    pub fn mipmap_chain(&self, levels: usize) -> Result<Vec<Texture>> {
        let mut chain = vec![self.clone()];
        loop {
            let last = &chain[chain.len() - 1];
            let done = if levels == 0 {
                last.width() == 1 && last.height() == 1
            } else {
                chain.len() >= levels
            };
            if done {
                break;
            }
            let next = last.downscale_any()?;
            log::debug!("mipmap level={} {}x{}", chain.len(), next.width(), next.height());
            chain.push(next);
        }
        Ok(chain)
    }

    // ========================================================================
    // Bilinear sampling
    // ========================================================================

    /// Bilinearly sample the logical region at normalized `(u, v)`.
    ///
    /// `u = 0` and `u = 1` hit the centers of the first and last columns.
    /// Coordinates outside `[0, 1]` are clamped. `out` receives one pixel.
    pub fn sample(&self, u: f32, v: f32, out: &mut [u8]) -> Result<()> {
        require_byte(self, "sample")?;
        if out.len() != self.bytes_per_pixel() {
            return Err(TexError::PixelLength {
                expected: self.bytes_per_pixel(),
                actual: out.len(),
            });
        }
        self.sample_unchecked(u, v, out);
        Ok(())
    }

    fn sample_unchecked(&self, u: f32, v: f32, out: &mut [u8]) {
        let pu = u.clamp(0.0, 1.0) * (self.width() - 1) as f32;
        let pv = v.clamp(0.0, 1.0) * (self.height() - 1) as f32;
        self.sample_pixel(pu, pv, out);
    }

    /// Bilinear read at pixel coordinates, clamped to the logical region.
    fn sample_pixel(&self, pu: f32, pv: f32, out: &mut [u8]) {
        let pu = pu.clamp(0.0, (self.width() - 1) as f32);
        let pv = pv.clamp(0.0, (self.height() - 1) as f32);
        let u0 = (pu as u32).min(self.width() - 1);
        let v0 = (pv as u32).min(self.height() - 1);
        let u1 = (u0 + 1).min(self.width() - 1);
        let v1 = (v0 + 1).min(self.height() - 1);
        let fu = pu - u0 as f32;
        let fv = pv - v0 as f32;

        let p00 = self.pixel(u0, v0);
        let p10 = self.pixel(u1, v0);
        let p01 = self.pixel(u0, v1);
        let p11 = self.pixel(u1, v1);
        for (i, o) in out.iter_mut().enumerate() {
            let top = p00[i] as f32 + fu * (p10[i] as f32 - p00[i] as f32);
            let bottom = p01[i] as f32 + fu * (p11[i] as f32 - p01[i] as f32);
            *o = (top + fv * (bottom - top) + 0.5).clamp(0.0, 255.0) as u8;
        }
    }

    /// Resample the logical region to a tight `width × height` texture.
    ///
    /// Each destination pixel center is mapped onto the source, so a
    /// same-size resize is the identity and a 1-pixel axis reads the middle.
    pub fn resize(&self, width: u32, height: u32) -> Result<Texture> {
        require_byte(self, "resize")?;
        let mut tex = Texture::with_size(width, height, self.encoding())?;
        let center =
            |i: u32, src: u32, dst: u32| (i as f32 + 0.5) * src as f32 / dst as f32 - 0.5;
        let bpp = self.bytes_per_pixel();
        for y in 0..height {
            let pv = center(y, self.height(), height);
            for x in 0..width {
                let o = tex.offset(x, y);
                let pu = center(x, self.width(), width);
                self.sample_pixel(pu, pv, &mut tex.pixels_mut()[o..o + bpp]);
            }
        }
        Ok(tex)
    }

    // ========================================================================
    // Blit
    // ========================================================================

    /// Copy `from` (a rectangle of `src`) into `self` with its top-left at `to`.
    ///
    /// Both rectangles must lie within the logical regions and the encodings
    /// must match. Nothing is written on failure.
    pub fn blit(&mut self, src: &Texture, from: Rect, to: (u32, u32)) -> Result<()> {
        if src.encoding() != self.encoding() {
            log::debug!("invalid src={}, dst={}", src.encoding(), self.encoding());
            return Err(TexError::Validation(format!(
                "blit from {} into {}",
                src.encoding(),
                self.encoding()
            )));
        }
        let target = Rect::new(to.0, to.1, from.width, from.height);
        if !from.fits(src.width(), src.height()) || !target.fits(self.width(), self.height()) {
            log::debug!("invalid from={from:?}, to={to:?}");
            return Err(TexError::Validation(format!(
                "blit {}x{} from ({},{}) to ({},{}) out of bounds",
                from.width, from.height, from.x, from.y, to.0, to.1
            )));
        }
        copy_rows(src, (from.x, from.y), self, to, (from.width, from.height));
        Ok(())
    }
}
