//! Tool configuration module.
//!
//! Handles loading, validating, and merging `texgz.toml`. User values are
//! merged on top of the stock defaults, so a config file only needs the keys
//! it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [slic]
//! size = 16                 # Superpixel edge (power of two)
//! compactness = 10.0        # Spatial weight m
//! neighborhood = 3          # Gradient search window (odd, < size)
//! recenter = true           # Move centers to the centroid each step
//! steps = 10                # Iterations (>= 1)
//! distance = "euclidean"    # or "legacy"
//! accumulation = "incremental"  # or "assigned"
//!
//! [mipmap]
//! levels = 0                # 0 = down to 1x1
//!
//! [jpeg]
//! quality = 90              # 1-100
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::slic::{Accumulation, ColorDistance, SlicParams};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up by [`load_config`].
pub const CONFIG_FILE: &str = "texgz.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `texgz.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TexgzConfig {
    /// Superpixel clustering settings.
    pub slic: SlicConfig,
    /// Mipmap chain settings.
    pub mipmap: MipmapConfig,
    /// JPEG output settings.
    pub jpeg: JpegConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl TexgzConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let slic = &self.slic;
        if !slic.size.is_power_of_two() {
            return Err(ConfigError::Validation(
                "slic.size must be a power of two".into(),
            ));
        }
        if slic.neighborhood % 2 != 1 || slic.neighborhood >= slic.size {
            return Err(ConfigError::Validation(
                "slic.neighborhood must be odd and smaller than slic.size".into(),
            ));
        }
        if slic.steps == 0 {
            return Err(ConfigError::Validation(
                "slic.steps must be at least 1".into(),
            ));
        }
        if !slic.compactness.is_finite() || slic.compactness < 0.0 {
            return Err(ConfigError::Validation(
                "slic.compactness must be a non-negative number".into(),
            ));
        }
        if !(1..=100).contains(&self.jpeg.quality) {
            return Err(ConfigError::Validation("jpeg.quality must be 1-100".into()));
        }
        Ok(())
    }
}

/// SLIC superpixel settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlicConfig {
    pub size: u32,
    pub compactness: f32,
    pub neighborhood: u32,
    pub recenter: bool,
    pub steps: usize,
    pub distance: ColorDistance,
    pub accumulation: Accumulation,
}

impl Default for SlicConfig {
    fn default() -> Self {
        let params = SlicParams::default();
        Self {
            size: params.size,
            compactness: params.compactness,
            neighborhood: params.neighborhood,
            recenter: params.recenter,
            steps: 10,
            distance: params.distance,
            accumulation: params.accumulation,
        }
    }
}

impl SlicConfig {
    pub fn params(&self) -> SlicParams {
        SlicParams {
            size: self.size,
            compactness: self.compactness,
            neighborhood: self.neighborhood,
            recenter: self.recenter,
            distance: self.distance,
            accumulation: self.accumulation,
        }
    }
}

/// Mipmap chain settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MipmapConfig {
    /// Levels including the base; `0` continues down to 1×1.
    pub levels: usize,
}

/// JPEG output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JpegConfig {
    pub quality: u8,
}

impl Default for JpegConfig {
    fn default() -> Self {
        Self { quality: 90 }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers for batch conversion.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(TexgzConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a TOML file as a raw value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<TexgzConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: TexgzConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `texgz.toml` from the given directory, falling back to defaults.
pub fn load_config(dir: &Path) -> Result<TexgzConfig, ConfigError> {
    load_config_file(&dir.join(CONFIG_FILE))
}

/// Load an explicit config file path, falling back to defaults if absent.
pub fn load_config_file(path: &Path) -> Result<TexgzConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    log::debug!("config path={}, found={}", path.display(), overlay.is_some());
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `texgz.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# texgz Configuration
# ===================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# SLIC superpixels (`texgz slic`)
# ---------------------------------------------------------------------------
[slic]
# Superpixel edge in pixels. Must be a power of two below the image width.
size = 16

# Compactness: weight of spatial distance against color distance.
compactness = 10.0

# Window searched for the lowest-gradient seed position. Odd, below size.
neighborhood = 3

# Move each center to the centroid of its pixels after every step.
recenter = true

# Number of assignment/update iterations (at least 1).
steps = 10

# Color distance: "euclidean" (r, g, b, a summed) or "legacy"
# (blue and alpha multiplied, matches older tools).
distance = "euclidean"

# Which pixels feed a cluster's mean and centroid: "incremental" (every
# pixel the cluster improved during the scan, even if another cluster took
# it over later) or "assigned" (only the pixels it owns at the end).
accumulation = "incremental"

# ---------------------------------------------------------------------------
# Mipmaps (`texgz mipmap`)
# ---------------------------------------------------------------------------
[mipmap]
# Levels to write, counting the base image. 0 continues down to 1x1.
levels = 0

# ---------------------------------------------------------------------------
# JPEG output
# ---------------------------------------------------------------------------
[jpeg]
# Encoding quality (1 = worst, 100 = best).
quality = 90

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for `texgz batch`.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = TexgzConfig::default();
        assert_eq!(config.slic.size, 16);
        assert_eq!(config.slic.compactness, 10.0);
        assert_eq!(config.slic.neighborhood, 3);
        assert!(config.slic.recenter);
        assert_eq!(config.slic.steps, 10);
        assert_eq!(config.slic.distance, ColorDistance::Euclidean);
        assert_eq!(config.slic.accumulation, Accumulation::Incremental);
        assert_eq!(config.mipmap.levels, 0);
        assert_eq!(config.jpeg.quality, 90);
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[slic]
size = 32
distance = "legacy"
accumulation = "assigned"
"#;
        let config: TexgzConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.slic.size, 32);
        assert_eq!(config.slic.distance, ColorDistance::Legacy);
        assert_eq!(config.slic.accumulation, Accumulation::Assigned);
        // Default values preserved
        assert_eq!(config.slic.neighborhood, 3);
        assert_eq!(config.jpeg.quality, 90);
    }

    #[test]
    fn slic_params_mirror_config() {
        let config = SlicConfig {
            size: 8,
            compactness: 2.5,
            neighborhood: 5,
            recenter: false,
            steps: 1,
            distance: ColorDistance::Legacy,
            accumulation: Accumulation::Assigned,
        };
        let p = config.params();
        assert_eq!((p.size, p.neighborhood, p.recenter), (8, 5, false));
        assert_eq!(p.compactness, 2.5);
        assert_eq!(p.distance, ColorDistance::Legacy);
        assert_eq!(p.accumulation, Accumulation::Assigned);
    }

    // =========================================================================
    // Processing
    // =========================================================================

    #[test]
    fn effective_threads_clamped_to_cores() {
        let config = ProcessingConfig {
            max_processes: Some(99999),
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"quality = 90"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"quality = 70"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("quality").unwrap().as_integer(), Some(70));
    }

    #[test]
    fn merge_toml_preserves_base_keys() {
        let base = stock_defaults_value();
        let overlay: toml::Value = toml::from_str("[slic]\nsteps = 3").unwrap();
        let merged = merge_toml(base, overlay);
        let slic = merged.get("slic").unwrap();
        assert_eq!(slic.get("steps").unwrap().as_integer(), Some(3));
        assert_eq!(slic.get("size").unwrap().as_integer(), Some(16));
    }

    // =========================================================================
    // Loading and validation
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, TexgzConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE),
            "[jpeg]\nquality = 75\n[mipmap]\nlevels = 4\n",
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.jpeg.quality, 75);
        assert_eq!(config.mipmap.levels, 4);
        assert_eq!(config.slic.size, 16);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "this is not toml [[[").unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "[slic]\nsize = 16\nsmoothness = 2\n").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_distance_rejected() {
        let result: Result<TexgzConfig, _> = toml::from_str("[slic]\ndistance = \"manhattan\"");
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_bad_values() {
        for overlay in [
            "[slic]\nsize = 12",
            "[slic]\nneighborhood = 4",
            "[slic]\nneighborhood = 17",
            "[slic]\ncompactness = -1.0",
            "[slic]\nsteps = 0",
            "[jpeg]\nquality = 0",
            "[jpeg]\nquality = 101",
        ] {
            let ov: toml::Value = toml::from_str(overlay).unwrap();
            let result = resolve_config(stock_defaults_value(), Some(ov));
            assert!(
                matches!(result, Err(ConfigError::Validation(_))),
                "{overlay} should fail validation"
            );
        }
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(TexgzConfig::default().validate().is_ok());
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: TexgzConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, TexgzConfig::default());
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let content = stock_config_toml();
        for section in ["[slic]", "[mipmap]", "[jpeg]", "[processing]"] {
            assert!(content.contains(section), "missing {section}");
        }
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value();
        assert!(val.is_table());
        for section in ["slic", "mipmap", "jpeg", "processing"] {
            assert!(val.get(section).is_some(), "missing {section}");
        }
    }
}
