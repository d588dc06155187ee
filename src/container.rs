//! PNG / JPEG adapters over the `image` crate and extension-based dispatch.
//!
//! | Extension | Load | Save |
//! |---|---|---|
//! | `.texgz` | [`codec::import`] | [`codec::export`] |
//! | `.png` | 8-bit RGB or RGBA only | RGB for RGB sources, RGBA otherwise |
//! | `.jpg` / `.jpeg` | 3-component only | converted to RGB-888 |
//!
//! Saved images always cover the logical region; stride padding is dropped.

use crate::codec;
use crate::texture::{Encoding, Result, TexError, Texture};
use image::codecs::jpeg::{JpegDecoder, JpegEncoder};
use image::codecs::png::{PngDecoder, PngEncoder};
use image::{ColorType, ExtendedColorType, ImageDecoder, ImageEncoder};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Seek, Write};
use std::path::Path;

/// File kinds recognised by [`load`] and [`save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Texgz,
    Png,
    Jpeg,
}

impl Container {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "texgz" => Ok(Container::Texgz),
            "png" => Ok(Container::Png),
            "jpg" | "jpeg" => Ok(Container::Jpeg),
            other => Err(TexError::Validation(format!(
                "unsupported file type '{other}' for {}",
                path.display()
            ))),
        }
    }
}

/// Tight copy of the logical region, or `tex` itself when already tight.
fn logical(tex: Texture) -> Result<Texture> {
    if tex.stride() == tex.width() && tex.vstride() == tex.height() {
        return Ok(tex);
    }
    tex.crop_copy(0, 0, tex.height() - 1, tex.width() - 1)
}

fn decode<D: ImageDecoder>(decoder: D, encoding: Encoding) -> Result<Texture> {
    let (width, height) = decoder.dimensions();
    let mut pixels = vec![0u8; decoder.total_bytes() as usize];
    decoder.read_image(&mut pixels)?;
    Texture::from_pixels(width, height, width, height, encoding, pixels)
}

// ============================================================================
// PNG
// ============================================================================

pub fn import_png_from<R: BufRead + Seek>(reader: R) -> Result<Texture> {
    let decoder = PngDecoder::new(reader)?;
    let encoding = match decoder.color_type() {
        ColorType::Rgb8 => Encoding::Rgb888,
        ColorType::Rgba8 => Encoding::Rgba8888,
        other => {
            log::debug!("invalid png color={other:?}");
            return Err(TexError::Format(format!(
                "PNG must be 8-bit RGB or RGBA, found {other:?}"
            )));
        }
    };
    decode(decoder, encoding)
}

pub fn import_png(path: &Path) -> Result<Texture> {
    import_png_from(BufReader::new(File::open(path)?))
}

pub fn export_png_to<W: Write>(tex: &Texture, writer: W) -> Result<()> {
    let (encoding, color) = match tex.encoding() {
        Encoding::Rgb888 | Encoding::Rgb565 => (Encoding::Rgb888, ExtendedColorType::Rgb8),
        _ => (Encoding::Rgba8888, ExtendedColorType::Rgba8),
    };
    let out = logical(tex.convert_copy(encoding)?)?;
    PngEncoder::new(writer).write_image(out.pixels(), out.width(), out.height(), color)?;
    Ok(())
}

pub fn export_png(tex: &Texture, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    export_png_to(tex, &mut writer)?;
    writer.flush()?;
    Ok(())
}

// ============================================================================
// JPEG
// ============================================================================

pub fn import_jpeg_from<R: BufRead + Seek>(reader: R) -> Result<Texture> {
    let decoder = JpegDecoder::new(reader)?;
    if decoder.color_type() != ColorType::Rgb8 {
        log::debug!("invalid jpeg color={:?}", decoder.color_type());
        return Err(TexError::Format(format!(
            "JPEG must have 3 components, found {:?}",
            decoder.color_type()
        )));
    }
    decode(decoder, Encoding::Rgb888)
}

pub fn import_jpeg(path: &Path) -> Result<Texture> {
    import_jpeg_from(BufReader::new(File::open(path)?))
}

/// Encode as baseline JPEG; `quality` is clamped to 1–100.
pub fn export_jpeg_to<W: Write>(tex: &Texture, writer: W, quality: u8) -> Result<()> {
    let out = logical(tex.convert_copy(Encoding::Rgb888)?)?;
    JpegEncoder::new_with_quality(writer, quality.clamp(1, 100)).write_image(
        out.pixels(),
        out.width(),
        out.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(())
}

pub fn export_jpeg(tex: &Texture, path: &Path, quality: u8) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    export_jpeg_to(tex, &mut writer, quality)?;
    writer.flush()?;
    Ok(())
}

// ============================================================================
// Dispatch
// ============================================================================

/// Load a texture, choosing the decoder by extension.
pub fn load(path: &Path) -> Result<Texture> {
    match Container::from_path(path)? {
        Container::Texgz => codec::import(path),
        Container::Png => import_png(path),
        Container::Jpeg => import_jpeg(path),
    }
}

/// Save a texture, choosing the encoder by extension.
pub fn save(tex: &Texture, path: &Path, jpeg_quality: u8) -> Result<()> {
    match Container::from_path(path)? {
        Container::Texgz => codec::export(tex, path),
        Container::Png => export_png(tex, path),
        Container::Jpeg => export_jpeg(tex, path, jpeg_quality),
    }
}
