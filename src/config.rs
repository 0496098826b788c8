//! Setup configuration module.
//!
//! Handles loading and validating `setup.toml`. Stock defaults are
//! overridden by whatever the file sets; command-line flags override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! context = "Development"         # Settings context the driver is written for
//! settings_dir = "Configuration"  # Root of the YAML settings tree
//!
//! [samples]
//! dir = "resources/test-images"   # Holds Test.jpg, Test.gif, Test.png
//!
//! # Replace the built-in driver list. Order is worst to best:
//! # the LAST ready entry becomes the preferred driver.
//! [[handlers]]
//! driver_name = "Rust"
//! description = "Pure Rust decoders"
//!
//! [[handlers]]
//! driver_name = "Vips"
//! description = "libvips, untrusted loaders blocked"
//! required_configuration = [{ key = "VIPS_BLOCK_UNTRUSTED", value = "true" }]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::handlers::{DriverDescriptor, SampleImage, builtin_descriptors, default_sample_images};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Default name of the config file, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "setup.toml";

/// Setup configuration loaded from `setup.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SetupConfig {
    /// Settings context, e.g. `Development` or `Production`.
    pub context: String,
    /// Root of the YAML settings tree.
    pub settings_dir: PathBuf,
    /// Sample images every driver must decode.
    pub samples: SamplesConfig,
    /// Driver list, worst to best. Empty means the built-in list.
    pub handlers: Vec<DriverDescriptor>,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            context: "Development".to_string(),
            settings_dir: PathBuf::from("Configuration"),
            samples: SamplesConfig::default(),
            handlers: Vec::new(),
        }
    }
}

/// Sample image settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplesConfig {
    /// Directory holding `Test.jpg`, `Test.gif` and `Test.png`.
    /// When absent, see [`bundled_samples_dir`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// Explicit `{ format, path }` list, replacing the three defaults.
    pub images: Vec<SampleImage>,
}

/// Where the Debian package installs the sample images.
pub const INSTALLED_SAMPLES_DIR: &str = "/usr/share/imaging-setup/test-images";

/// Directory with the sample images shipped with this tool.
///
/// The first directory holding all three images wins:
/// [`INSTALLED_SAMPLES_DIR`], then `test-images` next to the executable,
/// then the crate's `resources/test-images`. When none is complete, the
/// crate directory is returned and the probe reports the missing file.
pub fn bundled_samples_dir() -> PathBuf {
    first_complete_samples_dir(&samples_dir_candidates()).unwrap_or_else(source_samples_dir)
}

fn source_samples_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("resources/test-images")
}

fn samples_dir_candidates() -> Vec<PathBuf> {
    let mut dirs = vec![PathBuf::from(INSTALLED_SAMPLES_DIR)];
    let exe = std::env::current_exe().ok();
    if let Some(exe_dir) = exe.as_deref().and_then(Path::parent) {
        dirs.push(exe_dir.join("test-images"));
    }
    dirs.push(source_samples_dir());
    dirs
}

fn first_complete_samples_dir(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates
        .iter()
        .find(|dir| {
            default_sample_images(dir)
                .iter()
                .all(|sample| sample.path.is_file())
        })
        .cloned()
}

impl SetupConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.context.trim().is_empty() {
            return Err(ConfigError::Validation("context must not be empty".into()));
        }
        if self.context.contains(['/', '\\']) || self.context == ".." {
            return Err(ConfigError::Validation(
                "context must be a plain name, not a path".into(),
            ));
        }
        for (i, handler) in self.handlers.iter().enumerate() {
            if handler.driver_name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "handlers[{i}].driver_name must not be empty"
                )));
            }
            if handler.required_configuration.iter().any(|c| c.key.is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "handlers[{i}].required_configuration keys must not be empty"
                )));
            }
        }
        let mut formats = HashSet::new();
        for image in &self.samples.images {
            if image.format.is_empty() {
                return Err(ConfigError::Validation(
                    "samples.images format must not be empty".into(),
                ));
            }
            if !formats.insert(image.format.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "samples.images lists format \"{}\" twice",
                    image.format
                )));
            }
        }
        Ok(())
    }

    /// Driver list to probe, worst to best.
    pub fn descriptors(&self) -> Vec<DriverDescriptor> {
        if self.handlers.is_empty() {
            builtin_descriptors()
        } else {
            self.handlers.clone()
        }
    }

    /// Sample images to decode, in probe order.
    pub fn sample_images(&self) -> Vec<SampleImage> {
        if !self.samples.images.is_empty() {
            return self.samples.images.clone();
        }
        let dir = self
            .samples
            .dir
            .clone()
            .unwrap_or_else(bundled_samples_dir);
        default_sample_images(&dir)
    }
}

// =============================================================================
// Config loading and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SetupConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely, so a
///   `[[handlers]]` list replaces the default list as a whole.
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

/// Load config from `path`.
///
/// A missing file yields the stock defaults. Unknown keys and invalid
/// values are errors.
pub fn load_config(path: &Path) -> Result<SetupConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = if path.exists() {
        let content = fs::read_to_string(path)?;
        let overlay: toml::Value = toml::from_str(&content)?;
        merge_toml(base, overlay)
    } else {
        base
    };
    let config: SetupConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `setup.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Image Setup Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# Settings context the chosen image driver is written for.
# The driver ends up in <settings_dir>/<context>/Settings.Imagehandling.yaml
context = "Development"

# Root of the YAML settings tree.
settings_dir = "Configuration"

# ---------------------------------------------------------------------------
# Sample images
# ---------------------------------------------------------------------------
# Every driver must decode all of them to count as ready.
[samples]
# Directory holding Test.jpg, Test.gif and Test.png.
# Defaults to the images bundled with imaging-setup.
# dir = "resources/test-images"

# Or list formats explicitly (probed in this order):
# images = [
#   { format = "jpg", path = "samples/Test.jpg" },
#   { format = "webp", path = "samples/Test.webp" },
# ]

# ---------------------------------------------------------------------------
# Image handlers
# ---------------------------------------------------------------------------
# Leave out to use the built-in list:
#   Rust, Gmagick, Imagick, Vips (tools), Vips (hardened)
#
# The list is ordered WORST to BEST: the last ready entry is preferred.
# A driver may appear more than once with different requirements.
#
# [[handlers]]
# driver_name = "Rust"
# description = "Pure Rust decoders"
#
# [[handlers]]
# driver_name = "Imagick"
# description = "ImageMagick command-line tools"
# required_extension = "magick"
#
# [[handlers]]
# driver_name = "Vips"
# description = "libvips, untrusted loaders blocked"
# required_configuration = [{ key = "VIPS_BLOCK_UNTRUSTED", value = "true" }]
"##
}
