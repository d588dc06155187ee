//! # texgz
//!
//! A pixel-buffer toolkit for GPU texture assets. A [`texture::Texture`] is a
//! 2-D raster with an explicit allocation (`stride × vstride`) around its
//! logical region (`width × height`) and one of eleven OpenGL ES pixel
//! encodings.
//!
//! # Data Flow
//!
//! ```text
//! PNG / JPEG / .texgz / .mtex
//!         │  container, codec, tiles
//!         ▼
//!      Texture ──convert──▶ Texture
//!         │
//!         ├─ transform   crop, pad, flip, downscale, resize, blit, mipmaps
//!         ├─ filter      convolution, Sobel gradients, outline glow
//!         └─ slic        superpixel clustering
//!         │
//!         ▼
//! PNG / JPEG / .texgz / .mtex
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`texture`] | `Texture`, `Encoding` and `TexError` |
//! | [`convert`] | Pixel encoding conversion through RGBA-8888 |
//! | [`codec`] | Gzip-streamed `.texgz` files and zlib blocks |
//! | [`transform`] | Crop, pad, flip, downscale, bilinear sample/resize, blit |
//! | [`filter`] | Kernels, Sobel gradients and outline masks |
//! | [`slic`] | SLIC superpixel clustering |
//! | [`container`] | PNG / JPEG adapters and extension-based dispatch |
//! | [`tiles`] | `.mtex` tile archives and `.mgm` tile lookup |
//! | [`config`] | `texgz.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Copy, Then Swap
//!
//! Every in-place operation (`convert`, `crop`, `pad`, `flip_vertical`) builds
//! the result with its `*_copy` twin and only then replaces the receiver. A
//! failed call leaves the texture exactly as it was.
//!
//! ## RGBA-8888 as the Hub
//!
//! Conversions between two non-identical encodings expand the source into
//! RGBA-8888 and contract from there. Pairs without information loss
//! (e.g. RGBA-8888 ↔ BGRA-8888, RGB-888 → RGBA-8888 → RGB-888) are exact.
//!
//! ## One Byte Order on Disk
//!
//! Headers are always written little-endian. Readers accept either order and
//! tell them apart by the byte order of the magic number.

pub mod codec;
pub mod config;
pub mod container;
pub mod convert;
pub mod filter;
pub mod output;
pub mod slic;
pub mod texture;
pub mod tiles;
pub mod transform;
