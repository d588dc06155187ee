//! Pixel type / format tags and the closed table of supported pairs.
//!
//! The numeric values are the OpenGL ES enums and are what the `.texgz`
//! header stores on disk, so they must never change.
//!
//! | Encoding | Type | Format | Bytes |
//! |---|---|---|---|
//! | `RGBA-4444` | `UNSIGNED_SHORT_4_4_4_4` | `RGBA` | 2 |
//! | `RGBA-5551` | `UNSIGNED_SHORT_5_5_5_1` | `RGBA` | 2 |
//! | `RGB-565` | `UNSIGNED_SHORT_5_6_5` | `RGB` | 2 |
//! | `RGBA-8888` | `UNSIGNED_BYTE` | `RGBA` | 4 |
//! | `BGRA-8888` | `UNSIGNED_BYTE` | `BGRA` | 4 |
//! | `RGB-888` | `UNSIGNED_BYTE` | `RGB` | 3 |
//! | `LUMINANCE` | `UNSIGNED_BYTE` | `LUMINANCE` | 1 |
//! | `ALPHA` | `UNSIGNED_BYTE` | `ALPHA` | 1 |
//! | `LUMINANCE-ALPHA` | `UNSIGNED_BYTE` | `LUMINANCE_ALPHA` | 2 |
//! | `LUMINANCE-S` | `SHORT` | `LUMINANCE` | 2 |
//! | `LUMINANCE-F` | `FLOAT` | `LUMINANCE` | 4 |

use super::error::TexError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Numeric component encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PixelType {
    UnsignedShort4444,
    UnsignedShort5551,
    UnsignedShort565,
    UnsignedByte,
    Short,
    Float,
}

impl PixelType {
    pub const fn code(self) -> u32 {
        match self {
            PixelType::UnsignedShort4444 => 0x8033,
            PixelType::UnsignedShort5551 => 0x8034,
            PixelType::UnsignedShort565 => 0x8363,
            PixelType::UnsignedByte => 0x1401,
            PixelType::Short => 0x1402,
            PixelType::Float => 0x1406,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0x8033 => Some(PixelType::UnsignedShort4444),
            0x8034 => Some(PixelType::UnsignedShort5551),
            0x8363 => Some(PixelType::UnsignedShort565),
            0x1401 => Some(PixelType::UnsignedByte),
            0x1402 => Some(PixelType::Short),
            0x1406 => Some(PixelType::Float),
            _ => None,
        }
    }
}

/// Channel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PixelFormat {
    Rgb,
    Rgba,
    Bgra,
    Alpha,
    Luminance,
    LuminanceAlpha,
}

impl PixelFormat {
    pub const fn code(self) -> u32 {
        match self {
            PixelFormat::Rgb => 0x1907,
            PixelFormat::Rgba => 0x1908,
            PixelFormat::Bgra => 0x80E1,
            PixelFormat::Alpha => 0x1906,
            PixelFormat::Luminance => 0x1909,
            PixelFormat::LuminanceAlpha => 0x190A,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0x1907 => Some(PixelFormat::Rgb),
            0x1908 => Some(PixelFormat::Rgba),
            0x80E1 => Some(PixelFormat::Bgra),
            0x1906 => Some(PixelFormat::Alpha),
            0x1909 => Some(PixelFormat::Luminance),
            0x190A => Some(PixelFormat::LuminanceAlpha),
            _ => None,
        }
    }
}

/// One of the supported (type, format) pairs.
///
/// Holding an `Encoding` is proof that the pair is valid, so everything
/// downstream (bytes-per-pixel, conversion dispatch) is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Encoding {
    Rgba4444,
    Rgba5551,
    Rgb565,
    Rgba8888,
    Bgra8888,
    Rgb888,
    Luminance8,
    Alpha8,
    LuminanceAlpha88,
    LuminanceShort,
    LuminanceFloat,
}

impl Encoding {
    pub const ALL: [Encoding; 11] = [
        Encoding::Rgba4444,
        Encoding::Rgba5551,
        Encoding::Rgb565,
        Encoding::Rgba8888,
        Encoding::Bgra8888,
        Encoding::Rgb888,
        Encoding::Luminance8,
        Encoding::Alpha8,
        Encoding::LuminanceAlpha88,
        Encoding::LuminanceShort,
        Encoding::LuminanceFloat,
    ];

    /// Look up the encoding for a (type, format) pair.
    pub fn new(ty: PixelType, format: PixelFormat) -> Result<Self, TexError> {
        use PixelFormat as F;
        use PixelType as T;
        let encoding = match (ty, format) {
            (T::UnsignedShort4444, F::Rgba) => Encoding::Rgba4444,
            (T::UnsignedShort5551, F::Rgba) => Encoding::Rgba5551,
            (T::UnsignedShort565, F::Rgb) => Encoding::Rgb565,
            (T::UnsignedByte, F::Rgba) => Encoding::Rgba8888,
            (T::UnsignedByte, F::Bgra) => Encoding::Bgra8888,
            (T::UnsignedByte, F::Rgb) => Encoding::Rgb888,
            (T::UnsignedByte, F::Luminance) => Encoding::Luminance8,
            (T::UnsignedByte, F::Alpha) => Encoding::Alpha8,
            (T::UnsignedByte, F::LuminanceAlpha) => Encoding::LuminanceAlpha88,
            (T::Short, F::Luminance) => Encoding::LuminanceShort,
            (T::Float, F::Luminance) => Encoding::LuminanceFloat,
            _ => {
                log::debug!("invalid type={ty:?}, format={format:?}");
                return Err(TexError::UnsupportedEncoding {
                    ty: ty.code(),
                    format: format.code(),
                });
            }
        };
        Ok(encoding)
    }

    /// Look up the encoding from raw header codes.
    pub fn from_codes(ty: u32, format: u32) -> Result<Self, TexError> {
        match (PixelType::from_code(ty), PixelFormat::from_code(format)) {
            (Some(t), Some(f)) => Self::new(t, f),
            _ => {
                log::debug!("invalid type=0x{ty:X}, format=0x{format:X}");
                Err(TexError::UnsupportedEncoding { ty, format })
            }
        }
    }

    pub const fn pixel_type(self) -> PixelType {
        match self {
            Encoding::Rgba4444 => PixelType::UnsignedShort4444,
            Encoding::Rgba5551 => PixelType::UnsignedShort5551,
            Encoding::Rgb565 => PixelType::UnsignedShort565,
            Encoding::Rgba8888
            | Encoding::Bgra8888
            | Encoding::Rgb888
            | Encoding::Luminance8
            | Encoding::Alpha8
            | Encoding::LuminanceAlpha88 => PixelType::UnsignedByte,
            Encoding::LuminanceShort => PixelType::Short,
            Encoding::LuminanceFloat => PixelType::Float,
        }
    }

    pub const fn pixel_format(self) -> PixelFormat {
        match self {
            Encoding::Rgba4444 | Encoding::Rgba5551 | Encoding::Rgba8888 => PixelFormat::Rgba,
            Encoding::Rgb565 | Encoding::Rgb888 => PixelFormat::Rgb,
            Encoding::Bgra8888 => PixelFormat::Bgra,
            Encoding::Luminance8 | Encoding::LuminanceShort | Encoding::LuminanceFloat => {
                PixelFormat::Luminance
            }
            Encoding::Alpha8 => PixelFormat::Alpha,
            Encoding::LuminanceAlpha88 => PixelFormat::LuminanceAlpha,
        }
    }

    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Encoding::Luminance8 | Encoding::Alpha8 => 1,
            Encoding::Rgba4444
            | Encoding::Rgba5551
            | Encoding::Rgb565
            | Encoding::LuminanceAlpha88
            | Encoding::LuminanceShort => 2,
            Encoding::Rgb888 => 3,
            Encoding::Rgba8888 | Encoding::Bgra8888 | Encoding::LuminanceFloat => 4,
        }
    }

    /// True for the 8-bit-per-channel encodings the box filter and sampler accept.
    pub const fn is_byte(self) -> bool {
        matches!(self.pixel_type(), PixelType::UnsignedByte)
    }

    /// Name used on the command line and in reports.
    pub const fn name(self) -> &'static str {
        match self {
            Encoding::Rgba4444 => "RGBA-4444",
            Encoding::Rgba5551 => "RGBA-5551",
            Encoding::Rgb565 => "RGB-565",
            Encoding::Rgba8888 => "RGBA-8888",
            Encoding::Bgra8888 => "BGRA-8888",
            Encoding::Rgb888 => "RGB-888",
            Encoding::Luminance8 => "LUMINANCE",
            Encoding::Alpha8 => "ALPHA",
            Encoding::LuminanceAlpha88 => "LUMINANCE-ALPHA",
            Encoding::LuminanceShort => "LUMINANCE-S",
            Encoding::LuminanceFloat => "LUMINANCE-F",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = TexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Encoding::ALL
            .into_iter()
            .find(|e| e.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| TexError::Validation(format!("unknown format '{s}'")))
    }
}
