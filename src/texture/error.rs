use super::encoding::Encoding;
use thiserror::Error;

/// Failure of any texture operation.
///
/// Validation and format problems are detected before anything is
/// mutated; the receiver of a failed call is always left as it was.
#[derive(Error, Debug)]
pub enum TexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Malformed data: {0}")]
    Format(String),
    #[error("Unsupported type=0x{ty:X}, format=0x{format:X}")]
    UnsupportedEncoding { ty: u32, format: u32 },
    #[error("Cannot convert {from} to {to}")]
    UnsupportedConversion { from: Encoding, to: Encoding },
    #[error("Invalid dimensions width={width}, height={height}, stride={stride}, vstride={vstride}")]
    InvalidDimensions {
        width: u32,
        height: u32,
        stride: u32,
        vstride: u32,
    },
    #[error("Pixel buffer has {actual} bytes, expected {expected}")]
    PixelLength { expected: usize, actual: usize },
    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),
}

impl TexError {
    /// Short reads/writes and missing files, as opposed to bad requests or bad data.
    pub fn is_io(&self) -> bool {
        match self {
            TexError::Io(_) => true,
            TexError::Image(image::ImageError::IoError(_)) => true,
            _ => false,
        }
    }
}
