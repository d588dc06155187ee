//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Info
//!
//! ```text
//! tree.texgz
//!     Size: 200x100 (stride 256x128)
//!     Encoding: RGBA-8888
//!     Bytes: 131072
//! ```
//!
//! ## Mipmap
//!
//! ```text
//! 000 256x256 → tree-0.texgz
//! 001 128x128 → tree-1.texgz
//! ```
//!
//! ## Tiles
//!
//! ```text
//! 3 tiles
//!     (0,0) 256x256 RGB-565
//!     (0,1) 256x256 RGB-565
//! ```
//!
//! ## Batch
//!
//! ```text
//! a.png → out/a.texgz
//! b.png: failed (PNG must be 8-bit RGB or RGBA, found L8)
//!
//! Converted 1 of 2 files
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::texture::TextureInfo;
use crate::tiles::TileArchive;
use std::path::{Path, PathBuf};

/// Format a 0-based index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn size_line(info: &TextureInfo) -> String {
    if info.stride == info.width && info.vstride == info.height {
        format!("{}x{}", info.width, info.height)
    } else {
        format!(
            "{}x{} (stride {}x{})",
            info.width, info.height, info.stride, info.vstride
        )
    }
}

// ============================================================================
// Info
// ============================================================================

pub fn format_texture_info(path: &Path, info: &TextureInfo) -> Vec<String> {
    vec![
        path.display().to_string(),
        format!("{}Size: {}", indent(1), size_line(info)),
        format!("{}Encoding: {}", indent(1), info.encoding),
        format!("{}Bytes: {}", indent(1), info.bytes),
    ]
}

pub fn print_texture_info(path: &Path, info: &TextureInfo) {
    for line in format_texture_info(path, info) {
        println!("{}", line);
    }
}

// ============================================================================
// Single conversions (convert, resize)
// ============================================================================

pub fn format_written(dst: &Path, info: &TextureInfo) -> Vec<String> {
    vec![format!(
        "{} {} → {}",
        size_line(info),
        info.encoding,
        dst.display()
    )]
}

pub fn print_written(dst: &Path, info: &TextureInfo) {
    for line in format_written(dst, info) {
        println!("{}", line);
    }
}

// ============================================================================
// Mipmap
// ============================================================================

pub fn format_mipmap_output(levels: &[(PathBuf, TextureInfo)]) -> Vec<String> {
    levels
        .iter()
        .enumerate()
        .map(|(i, (path, info))| {
            format!(
                "{} {}x{} → {}",
                format_index(i),
                info.width,
                info.height,
                path.display()
            )
        })
        .collect()
}

pub fn print_mipmap_output(levels: &[(PathBuf, TextureInfo)]) {
    for line in format_mipmap_output(levels) {
        println!("{}", line);
    }
}

// ============================================================================
// SLIC
// ============================================================================

/// Summary of a finished clustering run.
#[derive(Debug, Clone, PartialEq)]
pub struct SlicReport {
    pub k: u32,
    pub steps: usize,
    pub outputs: Vec<PathBuf>,
}

pub fn format_slic_output(report: &SlicReport) -> Vec<String> {
    let mut lines = vec![format!(
        "{} superpixels ({}x{}), {} steps",
        report.k as usize * report.k as usize,
        report.k,
        report.k,
        report.steps
    )];
    for path in &report.outputs {
        lines.push(format!("{}{}", indent(1), path.display()));
    }
    lines
}

pub fn print_slic_output(report: &SlicReport) {
    for line in format_slic_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tile archives
// ============================================================================

pub fn format_tile_list(archive: &TileArchive) -> Vec<String> {
    let count = archive.len();
    let mut lines = vec![format!(
        "{} tile{}",
        count,
        if count == 1 { "" } else { "s" }
    )];
    for ((dx, dy), tex) in archive.iter() {
        lines.push(format!(
            "{}({},{}) {}x{} {}",
            indent(1),
            dx,
            dy,
            tex.width(),
            tex.height(),
            tex.encoding()
        ));
    }
    lines
}

pub fn print_tile_list(archive: &TileArchive) {
    for line in format_tile_list(archive) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch
// ============================================================================

/// Outcome of one file in a batch conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub source: PathBuf,
    pub result: Result<PathBuf, String>,
}

pub fn format_batch_output(entries: &[BatchEntry]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut converted = 0;
    for entry in entries {
        match &entry.result {
            Ok(dst) => {
                converted += 1;
                lines.push(format!("{} → {}", entry.source.display(), dst.display()));
            }
            Err(e) => lines.push(format!("{}: failed ({})", entry.source.display(), e)),
        }
    }
    lines.push(String::new());
    lines.push(format!(
        "Converted {} of {} file{}",
        converted,
        entries.len(),
        if entries.len() == 1 { "" } else { "s" }
    ));
    lines
}

pub fn print_batch_output(entries: &[BatchEntry]) {
    for line in format_batch_output(entries) {
        println!("{}", line);
    }
}
