use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use texgz::output::{BatchEntry, SlicReport};
use texgz::slic::Slic;
use texgz::texture::{Encoding, Texture};
use texgz::tiles::TileArchive;
use texgz::{config, container, output, tiles};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "texgz")]
#[command(about = "Pixel-buffer toolkit for GPU texture assets")]
#[command(long_about = "\
Pixel-buffer toolkit for GPU texture assets

Converts between PNG, JPEG and the gzip-compressed .texgz format, changes
pixel encodings, builds mipmap chains, runs SLIC superpixel clustering and
packs tiles into .mtex archives.

Formats:
  RGBA-8888  BGRA-8888  RGB-888  RGB-565  RGBA-4444  RGBA-5551
  LUMINANCE  ALPHA  LUMINANCE-ALPHA  LUMINANCE-S  LUMINANCE-F

Files are recognised by extension: .texgz, .png, .jpg/.jpeg.

Run 'texgz gen-config' to generate a documented texgz.toml.")]
#[command(version)]
struct Cli {
    /// Tool configuration file (optional)
    #[arg(long, default_value = config::CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a texture to another pixel format and/or container
    Convert {
        format: Encoding,
        src: PathBuf,
        dst: PathBuf,
        /// Read tile DX DY from an .mtex or .mgm archive
        #[arg(long, num_args = 2, value_names = ["DX", "DY"])]
        tile: Option<Vec<u8>>,
    },
    /// Convert every image under a directory to .texgz, in parallel
    Batch {
        format: Encoding,
        dir: PathBuf,
        out: PathBuf,
    },
    /// Write a mipmap chain as PREFIX-0.texgz, PREFIX-1.texgz, ...
    Mipmap { src: PathBuf, prefix: String },
    /// Resample to a new size with bilinear filtering
    Resize {
        src: PathBuf,
        dst: PathBuf,
        width: u32,
        height: u32,
    },
    /// Cluster PREFIX.png into superpixels
    Slic { prefix: String },
    /// Pack textures into an .mtex tile archive
    Pack {
        dst: PathBuf,
        /// Tiles as DX,DY=FILE
        #[arg(required = true, value_parser = parse_tile_spec)]
        tiles: Vec<TileSpec>,
    },
    /// Extract every tile of an .mtex archive as PREFIX-DX-DY.texgz
    Unpack { src: PathBuf, prefix: String },
    /// Show dimensions and encoding of a texture
    Info {
        src: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock texgz.toml with all options documented
    GenConfig,
}

#[derive(Debug, Clone)]
struct TileSpec {
    dx: u8,
    dy: u8,
    path: PathBuf,
}

/// Parse `DX,DY=FILE`.
fn parse_tile_spec(s: &str) -> Result<TileSpec, String> {
    let (key, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected DX,DY=FILE, got '{s}'"))?;
    let (dx, dy) = key
        .split_once(',')
        .ok_or_else(|| format!("expected DX,DY before '=', got '{key}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u8>()
            .map_err(|e| format!("bad tile coordinate '{v}': {e}"))
    };
    Ok(TileSpec {
        dx: parse(dx)?,
        dy: parse(dy)?,
        path: PathBuf::from(path),
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Convert {
            format,
            src,
            dst,
            tile,
        } => {
            let config = config::load_config_file(&cli.config)?;
            let mut tex = match tile.as_deref() {
                Some(&[dx, dy]) => load_tile(&src, dx, dy)?,
                _ => container::load(&src)?,
            };
            tex.convert(format)?;
            container::save(&tex, &dst, config.jpeg.quality)?;
            output::print_written(&dst, &tex.info());
        }
        Command::Batch { format, dir, out } => {
            let config = config::load_config_file(&cli.config)?;
            init_thread_pool(&config.processing);
            let entries = batch_convert(format, &dir, &out)?;
            output::print_batch_output(&entries);
        }
        Command::Mipmap { src, prefix } => {
            let config = config::load_config_file(&cli.config)?;
            let tex = container::load(&src)?;
            let chain = tex.mipmap_chain(config.mipmap.levels)?;
            let mut written = Vec::with_capacity(chain.len());
            for (i, level) in chain.iter().enumerate() {
                let path = PathBuf::from(format!("{prefix}-{i}.texgz"));
                texgz::codec::export(level, &path)?;
                written.push((path, level.info()));
            }
            output::print_mipmap_output(&written);
        }
        Command::Resize {
            src,
            dst,
            width,
            height,
        } => {
            let config = config::load_config_file(&cli.config)?;
            let tex = container::load(&src)?;
            let out = tex.resize(width, height)?;
            container::save(&out, &dst, config.jpeg.quality)?;
            output::print_written(&dst, &out.info());
        }
        Command::Slic { prefix } => {
            let config = config::load_config_file(&cli.config)?;
            let report = run_slic(&config.slic, &prefix)?;
            output::print_slic_output(&report);
        }
        Command::Pack { dst, tiles } => {
            let mut archive = TileArchive::new();
            for spec in tiles {
                archive.insert(spec.dx, spec.dy, container::load(&spec.path)?)?;
            }
            archive.export(&dst)?;
            output::print_tile_list(&archive);
        }
        Command::Unpack { src, prefix } => {
            let archive = TileArchive::import(&src)?;
            for ((dx, dy), tex) in archive.iter() {
                let path = PathBuf::from(format!("{prefix}-{dx}-{dy}.texgz"));
                texgz::codec::export(tex, &path)?;
            }
            output::print_tile_list(&archive);
        }
        Command::Info { src, json } => {
            let tex = container::load(&src)?;
            let info = tex.info();
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                output::print_texture_info(&src, &info);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Read one tile from an `.mgm` (JPEG tiles) or `.mtex` archive.
fn load_tile(path: &Path, dx: u8, dy: u8) -> texgz::texture::Result<Texture> {
    let is_mgm = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("mgm"));
    if is_mgm {
        tiles::import_mgm_tile(path, dx, dy)
    } else {
        tiles::import_tile(path, dx, dy)
    }
}

/// Convert every PNG/JPEG/texgz file under `dir` into `out`, keeping the
/// relative layout.
fn batch_convert(
    format: Encoding,
    dir: &Path,
    out: &Path,
) -> Result<Vec<BatchEntry>, Box<dyn std::error::Error>> {
    let mut sources = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && container::Container::from_path(entry.path()).is_ok() {
            sources.push(entry.into_path());
        }
    }
    log::debug!("batch dir={}, files={}", dir.display(), sources.len());

    let entries = plan_batch(dir, out, sources)
        .into_par_iter()
        .map(|(source, dst)| {
            let result = dst.and_then(|dst| {
                convert_file(format, &source, &dst)
                    .map(|_| dst)
                    .map_err(|e| e.to_string())
            });
            BatchEntry { source, result }
        })
        .collect();
    Ok(entries)
}

/// Map each source to `out/<relative path>.texgz`.
///
/// Sources that share a destination (`a.png` and `a.jpg`) all fail instead
/// of racing on the same file.
fn plan_batch(
    dir: &Path,
    out: &Path,
    sources: Vec<PathBuf>,
) -> Vec<(PathBuf, Result<PathBuf, String>)> {
    let dsts: Vec<PathBuf> = sources
        .iter()
        .map(|source| {
            let rel = source.strip_prefix(dir).unwrap_or(source);
            out.join(rel).with_extension("texgz")
        })
        .collect();
    let mut claims: HashMap<&Path, usize> = HashMap::new();
    for dst in &dsts {
        *claims.entry(dst.as_path()).or_default() += 1;
    }
    let shared: HashSet<PathBuf> = claims
        .into_iter()
        .filter(|&(_, n)| n > 1)
        .map(|(dst, _)| dst.to_path_buf())
        .collect();

    sources
        .into_iter()
        .zip(dsts)
        .map(|(source, dst)| {
            let result = if shared.contains(&dst) {
                log::debug!("invalid dst={}, shared", dst.display());
                Err(format!(
                    "{} is also the output of another source",
                    dst.display()
                ))
            } else {
                Ok(dst)
            };
            (source, result)
        })
        .collect()
}

fn convert_file(format: Encoding, src: &Path, dst: &Path) -> texgz::texture::Result<()> {
    let mut tex = container::load(src)?;
    tex.convert(format)?;
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent)?;
    }
    texgz::codec::export(&tex, dst)
}

/// Cluster `PREFIX.png` and write the centroid, mean and deviation images.
fn run_slic(
    slic_config: &config::SlicConfig,
    prefix: &str,
) -> Result<SlicReport, Box<dyn std::error::Error>> {
    let src = PathBuf::from(format!("{prefix}.png"));
    let mut tex = container::load(&src)?;
    tex.convert(Encoding::Rgba8888)?;

    let params = slic_config.params();
    let mut slic = Slic::new(&tex, params)?;
    slic.solve(slic_config.steps);

    let stem = format!(
        "{}-{}-{}-{}-{}",
        prefix,
        params.size,
        (10.0 * params.compactness) as i32,
        params.neighborhood,
        u8::from(params.recenter)
    );
    let outputs = [
        (format!("{stem}.png"), slic.output()?),
        (format!("{stem}-avg.png"), slic.output_mean()?),
        (format!("{stem}-stddev.png"), slic.output_stddev()?),
    ];
    let mut written = Vec::with_capacity(outputs.len());
    for (name, image) in outputs {
        let path = PathBuf::from(name);
        container::export_png(&image, &path)?;
        written.push(path);
    }

    Ok(SlicReport {
        k: slic.k(),
        steps: slic.steps(),
        outputs: written,
    })
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_spec_parses() {
        let spec = parse_tile_spec("3,7=tiles/a.png").unwrap();
        assert_eq!((spec.dx, spec.dy), (3, 7));
        assert_eq!(spec.path, PathBuf::from("tiles/a.png"));
    }

    #[test]
    fn tile_spec_rejects_garbage() {
        assert!(parse_tile_spec("3,7").is_err());
        assert!(parse_tile_spec("3=a.png").is_err());
        assert!(parse_tile_spec("x,1=a.png").is_err());
        assert!(parse_tile_spec("300,1=a.png").is_err());
    }

    #[test]
    fn batch_plan_keeps_relative_layout() {
        let dir = Path::new("in");
        let plan = plan_batch(
            dir,
            Path::new("out"),
            vec![dir.join("a.png"), dir.join("sub/b.jpg")],
        );
        assert_eq!(plan[0].1, Ok(PathBuf::from("out/a.texgz")));
        assert_eq!(plan[1].1, Ok(PathBuf::from("out/sub/b.texgz")));
    }

    #[test]
    fn batch_plan_fails_sources_sharing_an_output() {
        let dir = Path::new("in");
        let plan = plan_batch(
            dir,
            Path::new("out"),
            vec![dir.join("a.jpg"), dir.join("a.png"), dir.join("b.png")],
        );
        assert!(plan[0].1.as_ref().is_err_and(|e| e.contains("a.texgz")));
        assert!(plan[1].1.is_err());
        assert_eq!(plan[2].1, Ok(PathBuf::from("out/b.texgz")));
        assert_eq!(plan[1].0, dir.join("a.png"));
    }

    #[test]
    fn batch_with_colliding_stems_writes_nothing_for_them() {
        let tmp = tempfile::TempDir::new().unwrap();
        let (dir, out) = (tmp.path().join("in"), tmp.path().join("out"));
        std::fs::create_dir_all(&dir).unwrap();
        let tex = Texture::filled(4, 4, Encoding::Rgb888, &[10, 20, 30]).unwrap();
        container::save(&tex, &dir.join("a.png"), 90).unwrap();
        container::save(&tex, &dir.join("a.jpg"), 90).unwrap();
        container::save(&tex, &dir.join("b.png"), 90).unwrap();

        let entries = batch_convert(Encoding::Rgba8888, &dir, &out).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries.iter().filter(|e| e.result.is_ok()).count(), 1);
        assert!(!out.join("a.texgz").exists());
        assert!(out.join("b.texgz").exists());
    }

    #[test]
    fn cli_parses_convert_with_tile() {
        let cli = Cli::try_parse_from([
            "texgz", "convert", "rgb-565", "a.mgm", "b.texgz", "--tile", "1", "2",
        ])
        .unwrap();
        match cli.command {
            Command::Convert { format, tile, .. } => {
                assert_eq!(format, Encoding::Rgb565);
                assert_eq!(tile, Some(vec![1, 2]));
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["texgz", "convert", "RGB-999", "a.png", "b.png"]).is_err());
    }
}
