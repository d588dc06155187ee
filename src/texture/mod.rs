//! The tagged pixel buffer.
//!
//! - **Encoding**: the closed set of (type, format) pairs and their wire codes
//! - **Tex**: [`Texture`], which owns its pixels and knows its stride padding
//! - **Error**: [`TexError`], shared by every subsystem that touches pixels

pub mod encoding;
mod error;
mod tex;

pub use encoding::{Encoding, PixelFormat, PixelType};
pub use error::TexError;
pub use tex::{Texture, TextureInfo};

/// Result type for texture operations.
pub type Result<T> = std::result::Result<T, TexError>;
