//! Format conversion through a canonical RGBA-8888 hub.
//!
//! Every supported encoding has one *expand* routine (to RGBA-8888) and
//! one *contract* routine (from RGBA-8888). Converting A → B is
//! `contract_B(expand_A(tex))`, with two shortcuts that never visit the
//! hub:
//!
//! - A → A is a plain deep copy.
//! - `LUMINANCE` ↔ `ALPHA` only changes the tag; both are one byte per pixel.
//!
//! Packed 16-bit encodings are stored little-endian with red in the most
//! significant bits (`RGBA-4444` is `rrrr gggg bbbb aaaa`). Expansion uses
//! rounding lookup tables (`v * 255 / max`), contraction truncates to the
//! narrower width, so a 16-bit round trip is off by less than one
//! quantization step.
//!
//! `LUMINANCE-S` is storage-only: it converts to nothing but itself.

use crate::texture::{Encoding, Result, TexError, Texture};
use std::borrow::Cow;

/// Rounding expansion of an n-bit value to 8 bits, `N = 2^n`.
const fn expand_table<const N: usize>() -> [u8; N] {
    let max = (N - 1) as u32;
    let mut table = [0u8; N];
    let mut i = 0;
    while i < N {
        table[i] = ((2 * i as u32 * 255 + max) / (2 * max)) as u8;
        i += 1;
    }
    table
}

const TABLE_1TO8: [u8; 2] = expand_table::<2>();
const TABLE_4TO8: [u8; 16] = expand_table::<16>();
const TABLE_5TO8: [u8; 32] = expand_table::<32>();
const TABLE_6TO8: [u8; 64] = expand_table::<64>();

#[inline]
fn luminance(rgba: &[u8]) -> u8 {
    let sum = rgba[0] as u32 + rgba[1] as u32 + rgba[2] as u32;
    (sum / 3).min(255) as u8
}

fn map_pixels(src: &Texture, to: Encoding, f: impl Fn(&[u8], &mut [u8])) -> Texture {
    let mut dst = src.blank_like(to);
    let sbpp = src.bytes_per_pixel();
    let dbpp = to.bytes_per_pixel();
    for (s, d) in src
        .pixels()
        .chunks_exact(sbpp)
        .zip(dst.pixels_mut().chunks_exact_mut(dbpp))
    {
        f(s, d);
    }
    dst
}

/// Expand any convertible encoding to RGBA-8888.
fn expand(src: &Texture) -> Result<Cow<'_, Texture>> {
    let to = Encoding::Rgba8888;
    let hub = match src.encoding() {
        Encoding::Rgba8888 => return Ok(Cow::Borrowed(src)),
        Encoding::Rgba4444 => map_pixels(src, to, |s, d| {
            let v = u16::from_le_bytes([s[0], s[1]]) as usize;
            d[0] = TABLE_4TO8[(v >> 12) & 0xF];
            d[1] = TABLE_4TO8[(v >> 8) & 0xF];
            d[2] = TABLE_4TO8[(v >> 4) & 0xF];
            d[3] = TABLE_4TO8[v & 0xF];
        }),
        Encoding::Rgb565 => map_pixels(src, to, |s, d| {
            let v = u16::from_le_bytes([s[0], s[1]]) as usize;
            d[0] = TABLE_5TO8[(v >> 11) & 0x1F];
            d[1] = TABLE_6TO8[(v >> 5) & 0x3F];
            d[2] = TABLE_5TO8[v & 0x1F];
            d[3] = 0xFF;
        }),
        Encoding::Rgba5551 => map_pixels(src, to, |s, d| {
            let v = u16::from_le_bytes([s[0], s[1]]) as usize;
            d[0] = TABLE_5TO8[(v >> 11) & 0x1F];
            d[1] = TABLE_5TO8[(v >> 6) & 0x1F];
            d[2] = TABLE_5TO8[(v >> 1) & 0x1F];
            d[3] = TABLE_1TO8[v & 0x1];
        }),
        Encoding::Rgb888 => map_pixels(src, to, |s, d| {
            d[..3].copy_from_slice(&s[..3]);
            d[3] = 0xFF;
        }),
        Encoding::Luminance8 => map_pixels(src, to, |s, d| {
            d[..3].fill(s[0]);
            d[3] = 0xFF;
        }),
        Encoding::Alpha8 => map_pixels(src, to, |s, d| {
            d[..3].fill(0xFF);
            d[3] = s[0];
        }),
        Encoding::LuminanceAlpha88 => map_pixels(src, to, |s, d| {
            d[..3].fill(s[0]);
            d[3] = s[1];
        }),
        Encoding::LuminanceFloat => map_pixels(src, to, |s, d| {
            let f = f32::from_le_bytes([s[0], s[1], s[2], s[3]]);
            let l = (255.0 * f + 0.5).clamp(0.0, 255.0) as u8;
            d[..3].fill(l);
            d[3] = 0xFF;
        }),
        Encoding::Bgra8888 => map_pixels(src, to, |s, d| {
            d[0] = s[2];
            d[1] = s[1];
            d[2] = s[0];
            d[3] = s[3];
        }),
        Encoding::LuminanceShort => {
            log::debug!("could not convert {} to RGBA-8888", src.encoding());
            return Err(TexError::UnsupportedConversion {
                from: src.encoding(),
                to,
            });
        }
    };
    Ok(Cow::Owned(hub))
}

/// Contract an RGBA-8888 texture to `to`.
fn contract(hub: &Texture, to: Encoding) -> Result<Texture> {
    debug_assert_eq!(hub.encoding(), Encoding::Rgba8888);
    let tex = match to {
        Encoding::Rgba8888 => hub.clone(),
        Encoding::Rgba4444 => map_pixels(hub, to, |s, d| {
            let v = ((s[0] as u16 >> 4) << 12)
                | ((s[1] as u16 >> 4) << 8)
                | ((s[2] as u16 >> 4) << 4)
                | (s[3] as u16 >> 4);
            d.copy_from_slice(&v.to_le_bytes());
        }),
        Encoding::Rgb565 => map_pixels(hub, to, |s, d| {
            let v = ((s[0] as u16 >> 3) << 11) | ((s[1] as u16 >> 2) << 5) | (s[2] as u16 >> 3);
            d.copy_from_slice(&v.to_le_bytes());
        }),
        Encoding::Rgba5551 => map_pixels(hub, to, |s, d| {
            let v = ((s[0] as u16 >> 3) << 11)
                | ((s[1] as u16 >> 3) << 6)
                | ((s[2] as u16 >> 3) << 1)
                | (s[3] as u16 >> 7);
            d.copy_from_slice(&v.to_le_bytes());
        }),
        Encoding::Rgb888 => map_pixels(hub, to, |s, d| d.copy_from_slice(&s[..3])),
        Encoding::Luminance8 => map_pixels(hub, to, |s, d| d[0] = luminance(s)),
        Encoding::Alpha8 => map_pixels(hub, to, |s, d| d[0] = s[3]),
        Encoding::LuminanceAlpha88 => map_pixels(hub, to, |s, d| {
            d[0] = luminance(s);
            d[1] = s[3];
        }),
        // red carries the luminance
        Encoding::LuminanceFloat => map_pixels(hub, to, |s, d| {
            d.copy_from_slice(&(s[0] as f32 / 255.0).to_le_bytes());
        }),
        Encoding::Bgra8888 => map_pixels(hub, to, |s, d| {
            d[0] = s[2];
            d[1] = s[1];
            d[2] = s[0];
            d[3] = s[3];
        }),
        Encoding::LuminanceShort => {
            log::debug!("could not convert RGBA-8888 to {to}");
            return Err(TexError::UnsupportedConversion {
                from: Encoding::Rgba8888,
                to,
            });
        }
    };
    Ok(tex)
}

fn is_relabel(from: Encoding, to: Encoding) -> bool {
    matches!(
        (from, to),
        (Encoding::Luminance8, Encoding::Alpha8) | (Encoding::Alpha8, Encoding::Luminance8)
    )
}

impl Texture {
    /// Return a converted copy; `self` is untouched.
    pub fn convert_copy(&self, to: Encoding) -> Result<Texture> {
        let from = self.encoding();
        if from == to {
            return Ok(self.clone());
        }
        if is_relabel(from, to) {
            let mut tex = self.clone();
            tex.relabel(to);
            return Ok(tex);
        }

        let hub = expand(self)?;
        contract(&hub, to).map_err(|e| match e {
            TexError::UnsupportedConversion { .. } => TexError::UnsupportedConversion { from, to },
            other => other,
        })
    }

    /// Convert in place. On failure `self` keeps its original encoding and pixels.
    pub fn convert(&mut self, to: Encoding) -> Result<()> {
        let from = self.encoding();
        if from == to {
            return Ok(());
        }
        if is_relabel(from, to) {
            self.relabel(to);
            return Ok(());
        }
        *self = self.convert_copy(to)?;
        Ok(())
    }
}
