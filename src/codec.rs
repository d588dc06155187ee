//! `.texgz` codec: a 28-byte header followed by raw pixels, deflated.
//!
//! ## Header
//!
//! Seven 32-bit integers: magic `0x000B00D9`, type, format, width, height,
//! stride, vstride. Headers are written little-endian. On read, a header
//! whose magic only matches after a byte swap is decoded big-endian.
//!
//! ## Variants
//!
//! | Variant | Framing | Length |
//! |---|---|---|
//! | Streamed (`import`/`export`) | gzip over header + pixels | self-delimiting |
//! | Block (`import_block`/`export_block`) | zlib over header + pixels | caller supplies the exact span |
//!
//! The block variant exists for embedding textures back-to-back inside
//! another container; see [`crate::tiles`].

use crate::texture::{Encoding, Result, TexError, Texture};
use flate2::read::GzDecoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use flate2::write::{GzEncoder, ZlibEncoder};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

pub const MAGIC: u32 = 0x000B_00D9;
pub const HEADER_SIZE: usize = 28;

/// Upper bound on how far deflate can expand its input.
const MAX_DEFLATE_RATIO: usize = 1032;

/// Decoded `.texgz` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub encoding: Encoding,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub vstride: u32,
}

impl Header {
    pub fn of(tex: &Texture) -> Self {
        Self {
            encoding: tex.encoding(),
            width: tex.width(),
            height: tex.height(),
            stride: tex.stride(),
            vstride: tex.vstride(),
        }
    }

    /// Bytes of pixel payload following the header.
    pub fn payload_size(&self) -> Result<usize> {
        (self.stride as usize)
            .checked_mul(self.vstride as usize)
            .and_then(|n| n.checked_mul(self.encoding.bytes_per_pixel()))
            .ok_or_else(|| {
                TexError::Format(format!(
                    "payload overflow stride={}, vstride={}",
                    self.stride, self.vstride
                ))
            })
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let fields = [
            MAGIC,
            self.encoding.pixel_type().code(),
            self.encoding.pixel_format().code(),
            self.width,
            self.height,
            self.stride,
            self.vstride,
        ];
        let mut out = [0u8; HEADER_SIZE];
        for (chunk, v) in out.chunks_exact_mut(4).zip(fields) {
            chunk.copy_from_slice(&v.to_le_bytes());
        }
        out
    }

    pub fn parse(bytes: &[u8; HEADER_SIZE]) -> Result<Self> {
        let word = |i: usize| [bytes[4 * i], bytes[4 * i + 1], bytes[4 * i + 2], bytes[4 * i + 3]];
        let read: fn([u8; 4]) -> u32 = if u32::from_le_bytes(word(0)) == MAGIC {
            u32::from_le_bytes
        } else if u32::from_be_bytes(word(0)) == MAGIC {
            u32::from_be_bytes
        } else {
            log::debug!("invalid magic=0x{:X}", u32::from_le_bytes(word(0)));
            return Err(TexError::Format(format!(
                "bad magic 0x{:08X}",
                u32::from_le_bytes(word(0))
            )));
        };

        let encoding = Encoding::from_codes(read(word(1)), read(word(2)))?;
        let header = Self {
            encoding,
            width: read(word(3)),
            height: read(word(4)),
            stride: read(word(5)),
            vstride: read(word(6)),
        };
        header.check()?;
        Ok(header)
    }

    fn check(&self) -> Result<()> {
        let valid = self.width > 0
            && self.height > 0
            && self.width <= self.stride
            && self.height <= self.vstride;
        if !valid {
            log::debug!("invalid header {self:?}");
            return Err(TexError::InvalidDimensions {
                width: self.width,
                height: self.height,
                stride: self.stride,
                vstride: self.vstride,
            });
        }
        self.payload_size().map(|_| ())
    }

    fn texture(&self, pixels: Vec<u8>) -> Result<Texture> {
        Texture::from_pixels(
            self.width,
            self.height,
            self.stride,
            self.vstride,
            self.encoding,
            pixels,
        )
    }
}

// ============================================================================
// Streamed
// ============================================================================

/// Write `tex` as a gzip stream.
pub fn export_stream<W: Write>(tex: &Texture, writer: W) -> Result<()> {
    let mut gz = GzEncoder::new(writer, Compression::default());
    gz.write_all(&Header::of(tex).to_bytes())?;
    gz.write_all(tex.pixels())?;
    gz.finish()?;
    Ok(())
}

/// Read one texture from a gzip stream.
///
/// The stream must end right after the payload; trailing bytes and a
/// damaged gzip trailer are errors. The payload buffer grows with the data
/// actually inflated, not with the size the header declares.
pub fn import_stream<R: Read>(reader: R) -> Result<Texture> {
    let mut gz = GzDecoder::new(reader);
    let mut raw = [0u8; HEADER_SIZE];
    gz.read_exact(&mut raw)?;
    let header = Header::parse(&raw)?;

    let expected = header.payload_size()?;
    let mut pixels = Vec::new();
    (&mut gz).take(expected as u64).read_to_end(&mut pixels)?;
    if pixels.len() != expected {
        log::debug!("invalid size={}, expected={expected}", pixels.len());
        return Err(TexError::Format(format!(
            "stream holds {} payload bytes, expected {expected}",
            pixels.len()
        )));
    }

    let mut rest = Vec::new();
    gz.read_to_end(&mut rest)?;
    if !rest.is_empty() {
        log::debug!("invalid trailing={}", rest.len());
        return Err(TexError::Format(format!(
            "{} trailing bytes after payload",
            rest.len()
        )));
    }
    header.texture(pixels)
}

/// Write a `.texgz` file.
pub fn export(tex: &Texture, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    export_stream(tex, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Read a `.texgz` file.
pub fn import(path: &Path) -> Result<Texture> {
    import_stream(BufReader::new(File::open(path)?))
}

// ============================================================================
// Block
// ============================================================================

/// Compress header + pixels into one zlib block.
pub fn compress_block(tex: &Texture) -> Result<Vec<u8>> {
    let mut z = ZlibEncoder::new(Vec::new(), Compression::default());
    z.write_all(&Header::of(tex).to_bytes())?;
    z.write_all(tex.pixels())?;
    Ok(z.finish()?)
}

/// Decode a block produced by [`compress_block`].
///
/// The header is inflated first so the expected payload size is known
/// before the pixels are allocated. The stream must then end, checksum
/// included, after exactly `28 + payload` inflated bytes.
pub fn decompress_block(block: &[u8]) -> Result<Texture> {
    let corrupt = |e: flate2::DecompressError| TexError::Format(format!("corrupt block: {e}"));
    let mut z = Decompress::new(true);

    let mut raw = Vec::with_capacity(HEADER_SIZE);
    z.decompress_vec(block, &mut raw, FlushDecompress::None)
        .map_err(corrupt)?;
    let raw: [u8; HEADER_SIZE] = raw.as_slice().try_into().map_err(|_| {
        log::debug!("invalid header size={}", raw.len());
        TexError::Format(format!("block too short for a header: {} bytes", raw.len()))
    })?;
    let header = Header::parse(&raw)?;

    let expected = header.payload_size()?;
    if expected > block.len().saturating_mul(MAX_DEFLATE_RATIO) {
        log::debug!("invalid expected={expected}, block={}", block.len());
        return Err(TexError::Format(format!(
            "{} byte block cannot hold a {expected} byte payload",
            block.len()
        )));
    }
    let mut pixels = Vec::with_capacity(expected + 1);
    let consumed = z.total_in() as usize;
    let status = z
        .decompress_vec(&block[consumed..], &mut pixels, FlushDecompress::Finish)
        .map_err(corrupt)?;
    if status != Status::StreamEnd || pixels.len() != expected {
        log::debug!(
            "invalid size={}, expected={expected}, status={status:?}",
            pixels.len()
        );
        return Err(TexError::Format(format!(
            "block holds {} payload bytes, expected {expected} and a complete stream",
            pixels.len()
        )));
    }
    header.texture(pixels)
}

/// Write one compressed block and return its length in bytes.
///
/// The length is not recorded anywhere in the block; the caller must keep it
/// to read the block back.
pub fn export_block<W: Write>(tex: &Texture, mut writer: W) -> Result<usize> {
    let block = compress_block(tex)?;
    writer.write_all(&block)?;
    Ok(block.len())
}

/// Read exactly `len` bytes from `reader` and decode them as one block.
pub fn import_block<R: Read>(mut reader: R, len: usize) -> Result<Texture> {
    let mut block = vec![0u8; len];
    reader.read_exact(&mut block)?;
    decompress_block(&block)
}

/// Write a file holding a single block.
pub fn export_block_file(tex: &Texture, path: &Path) -> Result<usize> {
    let mut file = File::create(path)?;
    let len = export_block(tex, &mut file)?;
    file.flush()?;
    Ok(len)
}

/// Read a file holding a single block; the span is the whole file.
pub fn import_block_file(path: &Path) -> Result<Texture> {
    let block = std::fs::read(path)?;
    decompress_block(&block)
}
