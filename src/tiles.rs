//! Multi-tile archives keyed by a small `(dx, dy)` grid position.
//!
//! ## `.mtex`
//!
//! ```text
//! u16 count
//! 64 × { u8 dx, u8 dy, u32 end }      unused slots are zero
//! block-compressed tiles, back to back
//! ```
//!
//! All integers are little-endian. The header is always 386 bytes, so the
//! first tile starts at offset 386 and tile `i` spans from the end of tile
//! `i - 1` to its own `end`. Each tile is a [`codec`] block.
//!
//! ## `.mgm`
//!
//! Same header shape, big-endian, with JPEG payloads. Only single-tile
//! lookup is supported.

use crate::codec;
use crate::container;
use crate::texture::{Result, TexError, Texture};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Grid positions per axis.
pub const GRID: u8 = 8;
/// Header slots.
pub const MAX_TILES: usize = 64;
/// Header size and offset of the first tile.
pub const HEADER_SIZE: u32 = 2 + 6 * MAX_TILES as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    dx: u8,
    dy: u8,
    end: u32,
}

#[derive(Debug, Clone, Copy)]
enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    fn u16(self, b: [u8; 2]) -> u16 {
        match self {
            ByteOrder::Little => u16::from_le_bytes(b),
            ByteOrder::Big => u16::from_be_bytes(b),
        }
    }

    fn u32(self, b: [u8; 4]) -> u32 {
        match self {
            ByteOrder::Little => u32::from_le_bytes(b),
            ByteOrder::Big => u32::from_be_bytes(b),
        }
    }
}

fn check_key(dx: u8, dy: u8) -> Result<()> {
    if dx >= GRID || dy >= GRID {
        log::debug!("invalid dx={dx}, dy={dy}");
        return Err(TexError::Validation(format!(
            "tile ({dx},{dy}) outside the {GRID}x{GRID} grid"
        )));
    }
    Ok(())
}

/// Read the fixed header; only the first `count` slots are meaningful.
fn read_header<R: Read>(reader: &mut R, order: ByteOrder) -> Result<Vec<Entry>> {
    let mut raw = [0u8; HEADER_SIZE as usize];
    reader.read_exact(&mut raw)?;
    let count = order.u16([raw[0], raw[1]]) as usize;
    if count > MAX_TILES {
        log::debug!("invalid count={count}");
        return Err(TexError::Format(format!(
            "tile count {count} exceeds {MAX_TILES}"
        )));
    }
    raw[2..]
        .chunks_exact(6)
        .take(count)
        .map(|c| {
            let entry = Entry {
                dx: c[0],
                dy: c[1],
                end: order.u32([c[2], c[3], c[4], c[5]]),
            };
            check_key(entry.dx, entry.dy).map_err(|_| {
                TexError::Format(format!("tile ({},{}) outside the grid", entry.dx, entry.dy))
            })?;
            Ok(entry)
        })
        .collect()
}

/// Byte span `[start, end)` of entry `i`.
fn span(entries: &[Entry], i: usize) -> Result<(u32, u32)> {
    let start = if i == 0 { HEADER_SIZE } else { entries[i - 1].end };
    let end = entries[i].end;
    if end <= start {
        log::debug!("invalid end={end}, start={start}");
        return Err(TexError::Format(format!(
            "tile ({},{}) has empty span {start}..{end}",
            entries[i].dx, entries[i].dy
        )));
    }
    Ok((start, end))
}

fn find(entries: &[Entry], dx: u8, dy: u8) -> Result<usize> {
    entries
        .iter()
        .position(|e| e.dx == dx && e.dy == dy)
        .ok_or_else(|| TexError::Validation(format!("no tile ({dx},{dy})")))
}

/// An ordered set of textures keyed by `(dx, dy)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileArchive {
    tiles: BTreeMap<(u8, u8), Texture>,
}

impl TileArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tile. Keys must lie on the 8×8 grid and be unique.
    pub fn insert(&mut self, dx: u8, dy: u8, tex: Texture) -> Result<()> {
        check_key(dx, dy)?;
        if self.tiles.contains_key(&(dx, dy)) {
            return Err(TexError::Validation(format!("duplicate tile ({dx},{dy})")));
        }
        self.tiles.insert((dx, dy), tex);
        Ok(())
    }

    pub fn get(&self, dx: u8, dy: u8) -> Option<&Texture> {
        self.tiles.get(&(dx, dy))
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tiles in key order.
    pub fn iter(&self) -> impl Iterator<Item = ((u8, u8), &Texture)> {
        self.tiles.iter().map(|(&k, v)| (k, v))
    }

    pub fn export_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let mut blocks = Vec::with_capacity(self.tiles.len());
        let mut header = vec![0u8; HEADER_SIZE as usize];
        header[0..2].copy_from_slice(&(self.tiles.len() as u16).to_le_bytes());
        let mut end = HEADER_SIZE;
        for (slot, (&(dx, dy), tex)) in header[2..].chunks_exact_mut(6).zip(&self.tiles) {
            let block = codec::compress_block(tex)?;
            end = u32::try_from(block.len())
                .ok()
                .and_then(|n| end.checked_add(n))
                .ok_or_else(|| TexError::Validation("tile archive exceeds 4 GiB".to_string()))?;
            slot[0] = dx;
            slot[1] = dy;
            slot[2..6].copy_from_slice(&end.to_le_bytes());
            blocks.push(block);
        }

        writer.write_all(&header)?;
        for block in &blocks {
            writer.write_all(block)?;
        }
        Ok(())
    }

    pub fn export(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.export_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn import_from<R: Read>(mut reader: R) -> Result<Self> {
        let entries = read_header(&mut reader, ByteOrder::Little)?;
        let mut archive = Self::new();
        for (i, entry) in entries.iter().enumerate() {
            let (start, end) = span(&entries, i)?;
            let tex = codec::import_block(&mut reader, (end - start) as usize)?;
            archive.insert(entry.dx, entry.dy, tex).map_err(|_| {
                TexError::Format(format!("duplicate tile ({},{})", entry.dx, entry.dy))
            })?;
        }
        Ok(archive)
    }

    pub fn import(path: &Path) -> Result<Self> {
        Self::import_from(BufReader::new(File::open(path)?))
    }
}

/// Decode one tile of an `.mtex` stream without reading the others.
pub fn import_tile_from<R: Read + Seek>(mut reader: R, dx: u8, dy: u8) -> Result<Texture> {
    check_key(dx, dy)?;
    let entries = read_header(&mut reader, ByteOrder::Little)?;
    let i = find(&entries, dx, dy)?;
    let (start, end) = span(&entries, i)?;
    reader.seek(SeekFrom::Start(start as u64))?;
    codec::import_block(reader, (end - start) as usize)
}

pub fn import_tile(path: &Path, dx: u8, dy: u8) -> Result<Texture> {
    import_tile_from(BufReader::new(File::open(path)?), dx, dy)
}

/// Decode the JPEG tile `(dx, dy)` of an `.mgm` stream.
pub fn import_mgm_tile_from<R: Read + Seek>(mut reader: R, dx: u8, dy: u8) -> Result<Texture> {
    let entries = read_header(&mut reader, ByteOrder::Big)?;
    let i = find(&entries, dx, dy)?;
    let (start, end) = span(&entries, i)?;
    reader.seek(SeekFrom::Start(start as u64))?;
    let mut jpeg = vec![0u8; (end - start) as usize];
    reader.read_exact(&mut jpeg)?;
    container::import_jpeg_from(Cursor::new(jpeg))
}

pub fn import_mgm_tile(path: &Path, dx: u8, dy: u8) -> Result<Texture> {
    import_mgm_tile_from(BufReader::new(File::open(path)?), dx, dy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::Encoding;
    use image::codecs::jpeg::JpegEncoder;
    use image::{ExtendedColorType, ImageEncoder};

    fn tile(v: u8) -> Texture {
        Texture::filled(4, 4, Encoding::Rgba8888, &[v, v, v, 255]).unwrap()
    }

    fn archive() -> TileArchive {
        let mut a = TileArchive::new();
        a.insert(0, 0, tile(10)).unwrap();
        a.insert(3, 1, tile(20)).unwrap();
        a.insert(7, 7, Texture::filled(2, 3, Encoding::Luminance8, &[5]).unwrap())
            .unwrap();
        a
    }

    #[test]
    fn insert_rejects_duplicates_and_off_grid_keys() {
        let mut a = archive();
        assert!(a.insert(3, 1, tile(1)).is_err());
        assert!(a.insert(8, 0, tile(1)).is_err());
        assert_eq!(a.len(), 3);
        assert_eq!(a.get(3, 1), Some(&tile(20)));
        assert!(a.get(1, 3).is_none());
    }

    #[test]
    fn header_layout() {
        let mut buf = Vec::new();
        archive().export_to(&mut buf).unwrap();
        assert_eq!(&buf[0..2], &3u16.to_le_bytes());
        assert_eq!(&buf[2..4], &[0, 0]);
        assert_eq!(&buf[8..10], &[3, 1]);
        let last_end = u32::from_le_bytes([buf[16], buf[17], buf[18], buf[19]]);
        assert_eq!(last_end as usize, buf.len());
        assert!(buf[20..HEADER_SIZE as usize].iter().all(|&b| b == 0));
    }

    #[test]
    fn archive_round_trip() {
        let a = archive();
        let mut buf = Vec::new();
        a.export_to(&mut buf).unwrap();
        assert_eq!(TileArchive::import_from(&buf[..]).unwrap(), a);
    }

    #[test]
    fn empty_archive_is_just_a_header() {
        let mut buf = Vec::new();
        TileArchive::new().export_to(&mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE as usize);
        assert!(TileArchive::import_from(&buf[..]).unwrap().is_empty());
    }

    #[test]
    fn single_tile_lookup() {
        let mut buf = Vec::new();
        archive().export_to(&mut buf).unwrap();
        let t = import_tile_from(Cursor::new(&buf), 3, 1).unwrap();
        assert_eq!(t, tile(20));
        let t = import_tile_from(Cursor::new(&buf), 7, 7).unwrap();
        assert_eq!(t.encoding(), Encoding::Luminance8);
        assert!(import_tile_from(Cursor::new(&buf), 1, 1).is_err());
    }

    #[test]
    fn truncated_archive_fails() {
        let mut buf = Vec::new();
        archive().export_to(&mut buf).unwrap();
        buf.truncate(buf.len() - 1);
        assert!(TileArchive::import_from(&buf[..]).unwrap_err().is_io());
    }

    #[test]
    fn corrupt_count_is_a_format_error() {
        let mut buf = vec![0u8; HEADER_SIZE as usize];
        buf[0] = 65;
        assert!(matches!(TileArchive::import_from(&buf[..]), Err(TexError::Format(_))));
    }

    #[test]
    fn mgm_tile_lookup() {
        let jpegs: Vec<Vec<u8>> = [40u8, 220]
            .iter()
            .map(|&v| {
                let mut out = Vec::new();
                JpegEncoder::new_with_quality(&mut out, 95)
                    .write_image(&[v; 8 * 8 * 3], 8, 8, ExtendedColorType::Rgb8)
                    .unwrap();
                out
            })
            .collect();

        let mut file = vec![0u8; HEADER_SIZE as usize];
        file[0..2].copy_from_slice(&2u16.to_be_bytes());
        let mut end = HEADER_SIZE;
        for (i, (key, jpeg)) in [(1u8, 2u8), (5, 6)].iter().zip(&jpegs).enumerate() {
            end += jpeg.len() as u32;
            let slot = 2 + 6 * i;
            file[slot] = key.0;
            file[slot + 1] = key.1;
            file[slot + 2..slot + 6].copy_from_slice(&end.to_be_bytes());
        }
        for jpeg in &jpegs {
            file.extend_from_slice(jpeg);
        }

        let t = import_mgm_tile_from(Cursor::new(&file), 5, 6).unwrap();
        assert_eq!((t.width(), t.height()), (8, 8));
        assert!(t.pixels().iter().all(|&b| (b as i32 - 220).abs() <= 3));
        assert!(import_mgm_tile_from(Cursor::new(&file), 2, 1).is_err());
    }
}
