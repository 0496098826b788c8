//! Shared test utilities.
//!
//! Provides a scriptable [`FakeHost`] and throwaway sample image sets.
//! Pair them with [`MockDrivers`](crate::imaging::backend::tests::MockDrivers):
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = mock_samples(&["jpg", "gif"]);
//! let host = FakeHost::with_extensions(&["gd"]).with_config("ffi.enable", "1");
//! let result = probe_all(&descriptors, &tmp.samples, &host, &drivers).unwrap();
//! ```

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tempfile::TempDir;

use crate::handlers::{HostFacts, SampleImage};

/// The sample images bundled with the crate.
pub fn sample_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("resources/test-images")
}

// =========================================================================
// Host
// =========================================================================

#[derive(Debug, Default)]
pub struct FakeHost {
    extensions: HashSet<String>,
    config: HashMap<String, String>,
    source: Option<String>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extensions(extensions: &[&str]) -> Self {
        Self {
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_config(mut self, key: &str, value: &str) -> Self {
        self.config.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }
}

impl HostFacts for FakeHost {
    fn is_extension_loaded(&self, extension: &str) -> bool {
        self.extensions.contains(extension)
    }

    fn configuration_value(&self, key: &str) -> Option<String> {
        self.config.get(key).cloned()
    }

    fn configuration_source(&self) -> Option<String> {
        self.source.clone()
    }
}

// =========================================================================
// Sample images
// =========================================================================

/// Sample files in a temp dir. Keep the struct alive while probing.
pub struct MockSamples {
    pub dir: TempDir,
    pub samples: Vec<SampleImage>,
}

/// One file per format whose bytes start with the format name, so
/// `MockDrivers::breaking(driver, format)` can fail exactly that format.
pub fn mock_samples(formats: &[&str]) -> MockSamples {
    let dir = TempDir::new().unwrap();
    let samples = formats
        .iter()
        .map(|format| {
            let path = dir.path().join(format!("Test.{format}"));
            std::fs::write(&path, format!("{format}-sample-bytes")).unwrap();
            SampleImage {
                format: format.to_string(),
                path,
            }
        })
        .collect();
    MockSamples { dir, samples }
}
