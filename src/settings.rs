//! Application settings in YAML files.
//!
//! Settings are layered: global files first, then the files of the active
//! context, each overriding the previous one. Maps merge key by key; any
//! other value is replaced.
//!
//! ```text
//! Configuration/
//! ├── Settings.yaml                       # global
//! └── Development/
//!     ├── Settings.yaml                   # context overrides
//!     └── Settings.Imagehandling.yaml     # written by `image-handler`
//! ```
//!
//! Within a directory, every `Settings*.yaml` is loaded in file name order.
//!
//! Paths into the settings tree are dotted, e.g. `Imaging.driver`.

use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("YAML error in {}: {source}", path.display())]
    InvalidFile {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Settings path of the image handler block.
pub const IMAGE_HANDLER_PATH: &str = "Imaging";

/// File the image handler choice is written to, per context.
pub const IMAGE_HANDLER_FILE: &str = "Settings.Imagehandling.yaml";

/// Merged view of all settings files for one context.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    merged: Value,
}

impl SettingsStore {
    /// Load global then context settings from `settings_dir`.
    ///
    /// Missing directories are fine and contribute nothing.
    pub fn load(settings_dir: &Path, context: &str) -> Result<Self, SettingsError> {
        let mut merged = Value::Mapping(Mapping::new());
        for dir in [settings_dir.to_path_buf(), settings_dir.join(context)] {
            for file in settings_files(&dir)? {
                let layer = read_yaml(&file)?;
                merge(&mut merged, layer);
            }
        }
        Ok(Self { merged })
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, SettingsError> {
        Ok(Self {
            merged: serde_yaml::from_str(yaml)?,
        })
    }

    /// Look up a dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.merged, |node, key| node.as_mapping()?.get(key))
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }
}

fn settings_files(dir: &Path) -> Result<Vec<PathBuf>, SettingsError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("Settings") && n.ends_with(".yaml"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Parse a YAML file; an empty file is an empty map.
fn read_yaml(path: &Path) -> Result<Value, SettingsError> {
    let content = fs::read_to_string(path)?;
    let value: Value = serde_yaml::from_str(&content).map_err(|source| SettingsError::InvalidFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(match value {
        Value::Null => Value::Mapping(Mapping::new()),
        v => v,
    })
}

/// Deep-merge `overlay` into `base`.
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Set `value` at dotted `path`, creating maps on the way.
///
/// A non-map value in the way is replaced by a map.
pub fn set_value_by_path(root: &mut Value, path: &str, value: Value) {
    let mut node = root;
    for key in path.split('.') {
        if !node.is_mapping() {
            *node = Value::Mapping(Mapping::new());
        }
        let Value::Mapping(map) = node else {
            unreachable!("node was just made a mapping");
        };
        node = map.entry(Value::String(key.to_string())).or_insert(Value::Null);
    }
    *node = value;
}

/// Merge `value` at `path` into `file`, keeping everything else in it.
///
/// Maps already at `path` are merged key by key, so sibling keys survive.
/// Creates the file (and its directory) when missing. Returns the YAML of
/// just the written fragment, for display.
pub fn write_settings(file: &Path, path: &str, value: Value) -> Result<String, SettingsError> {
    let mut settings = if file.exists() {
        read_yaml(file)?
    } else {
        Value::Mapping(Mapping::new())
    };
    let mut fragment = Value::Mapping(Mapping::new());
    set_value_by_path(&mut fragment, path, value);
    merge(&mut settings, fragment.clone());

    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file, serde_yaml::to_string(&settings)?)?;

    Ok(serde_yaml::to_string(&fragment)?)
}

/// The `Imaging` block selecting `driver`, enabling it when needed.
pub fn image_handler_settings(driver: &str, enable_driver: bool) -> Value {
    let mut block = Value::Mapping(Mapping::new());
    set_value_by_path(&mut block, "driver", Value::String(driver.to_string()));
    if enable_driver {
        set_value_by_path(
            &mut block,
            &format!("enabledDrivers.{driver}"),
            Value::Bool(true),
        );
    }
    block
}

/// `<settings_dir>/<context>/Settings.Imagehandling.yaml`
pub fn image_handler_settings_file(settings_dir: &Path, context: &str) -> PathBuf {
    settings_dir.join(context).join(IMAGE_HANDLER_FILE)
}
