use super::Result;
use super::encoding::Encoding;
use super::error::TexError;
use serde::Serialize;

/// An owned raster with explicit stride padding and encoding tag.
///
/// `width × height` is the logical image; `stride × vstride` is the
/// allocation, which may be larger (e.g. after padding to a power of two).
/// The pixel buffer always holds exactly
/// `bytes_per_pixel × stride × vstride` bytes, row-major, tightly packed
/// at `stride` pixels per row.
///
/// `Clone` is a deep copy. Operations with a `_copy` suffix return a new
/// texture; their in-place twins build the same copy and then replace
/// `self`, so a failed call never leaves the receiver half-modified.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    width: u32,
    height: u32,
    stride: u32,
    vstride: u32,
    encoding: Encoding,
    pixels: Vec<u8>,
}

/// Serializable summary of a texture's metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub vstride: u32,
    pub encoding: &'static str,
    pub bytes: usize,
}

fn check_dimensions(width: u32, height: u32, stride: u32, vstride: u32) -> Result<()> {
    if width == 0 || height == 0 || width > stride || height > vstride {
        log::debug!(
            "invalid width={width}, height={height}, stride={stride}, vstride={vstride}"
        );
        return Err(TexError::InvalidDimensions {
            width,
            height,
            stride,
            vstride,
        });
    }
    Ok(())
}

impl Texture {
    /// Allocate a zero-filled texture.
    pub fn new(width: u32, height: u32, stride: u32, vstride: u32, encoding: Encoding) -> Result<Self> {
        check_dimensions(width, height, stride, vstride)?;
        let size = encoding.bytes_per_pixel() * stride as usize * vstride as usize;
        Ok(Self {
            width,
            height,
            stride,
            vstride,
            encoding,
            pixels: vec![0; size],
        })
    }

    /// Allocate a zero-filled texture with no padding.
    pub fn with_size(width: u32, height: u32, encoding: Encoding) -> Result<Self> {
        Self::new(width, height, width, height, encoding)
    }

    /// Wrap caller-supplied pixels. The length must match the allocation exactly.
    pub fn from_pixels(
        width: u32,
        height: u32,
        stride: u32,
        vstride: u32,
        encoding: Encoding,
        pixels: Vec<u8>,
    ) -> Result<Self> {
        check_dimensions(width, height, stride, vstride)?;
        let expected = encoding.bytes_per_pixel() * stride as usize * vstride as usize;
        if pixels.len() != expected {
            log::debug!("invalid pixels len={}, expected={expected}", pixels.len());
            return Err(TexError::PixelLength {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            stride,
            vstride,
            encoding,
            pixels,
        })
    }

    /// Fill a tight `width × height` texture with one pixel value.
    pub fn filled(width: u32, height: u32, encoding: Encoding, pixel: &[u8]) -> Result<Self> {
        let bpp = encoding.bytes_per_pixel();
        if pixel.len() != bpp {
            return Err(TexError::PixelLength {
                expected: bpp,
                actual: pixel.len(),
            });
        }
        let mut tex = Self::with_size(width, height, encoding)?;
        for chunk in tex.pixels.chunks_exact_mut(bpp) {
            chunk.copy_from_slice(pixel);
        }
        Ok(tex)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn vstride(&self) -> u32 {
        self.vstride
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.encoding.bytes_per_pixel()
    }

    /// Bytes in the whole allocation (`bpp × stride × vstride`).
    pub fn size(&self) -> usize {
        self.pixels.len()
    }

    /// Bytes in one allocated row.
    pub fn row_bytes(&self) -> usize {
        self.bytes_per_pixel() * self.stride as usize
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn info(&self) -> TextureInfo {
        TextureInfo {
            width: self.width,
            height: self.height,
            stride: self.stride,
            vstride: self.vstride,
            encoding: self.encoding.name(),
            bytes: self.size(),
        }
    }

    /// Both allocation extents are powers of two.
    pub fn is_pot(&self) -> bool {
        self.stride.is_power_of_two() && self.vstride.is_power_of_two()
    }

    pub(crate) fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.stride as usize + x as usize) * self.bytes_per_pixel()
    }

    /// Bytes of the pixel at `(x, y)` in the allocated region.
    ///
    /// # Panics
    /// If `(x, y)` lies outside `stride × vstride`.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        assert!(x < self.stride && y < self.vstride, "pixel ({x}, {y}) out of range");
        let o = self.offset(x, y);
        &self.pixels[o..o + self.bytes_per_pixel()]
    }

    /// Read a pixel with coordinates clamped into the logical region.
    pub fn pixel_clamped(&self, x: i64, y: i64) -> &[u8] {
        let x = x.clamp(0, self.width as i64 - 1) as u32;
        let y = y.clamp(0, self.height as i64 - 1) as u32;
        self.pixel(x, y)
    }

    /// Overwrite the pixel at `(x, y)`.
    ///
    /// # Panics
    /// If `(x, y)` lies outside `stride × vstride` or `value` has the wrong length.
    pub fn set_pixel(&mut self, x: u32, y: u32, value: &[u8]) {
        assert!(x < self.stride && y < self.vstride, "pixel ({x}, {y}) out of range");
        let o = self.offset(x, y);
        let bpp = self.bytes_per_pixel();
        self.pixels[o..o + bpp].copy_from_slice(value);
    }

    /// Value of a `LUMINANCE-F` pixel.
    pub fn pixel_f32(&self, x: u32, y: u32) -> f32 {
        debug_assert_eq!(self.encoding, Encoding::LuminanceFloat);
        let p = self.pixel(x, y);
        f32::from_le_bytes([p[0], p[1], p[2], p[3]])
    }

    pub fn set_pixel_f32(&mut self, x: u32, y: u32, value: f32) {
        debug_assert_eq!(self.encoding, Encoding::LuminanceFloat);
        self.set_pixel(x, y, &value.to_le_bytes());
    }

    /// Change the encoding tag without touching the pixels.
    ///
    /// Only valid between encodings of the same byte layout.
    pub(crate) fn relabel(&mut self, encoding: Encoding) {
        debug_assert_eq!(self.bytes_per_pixel(), encoding.bytes_per_pixel());
        self.encoding = encoding;
    }

    /// Same extents as `self`, zero-filled, in another encoding.
    pub(crate) fn blank_like(&self, encoding: Encoding) -> Self {
        let size = encoding.bytes_per_pixel() * self.stride as usize * self.vstride as usize;
        Self {
            width: self.width,
            height: self.height,
            stride: self.stride,
            vstride: self.vstride,
            encoding,
            pixels: vec![0; size],
        }
    }
}
