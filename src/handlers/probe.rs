//! Capability probe: which image drivers actually work on this host.
//!
//! For each descriptor, in order, reasons for non-readiness are collected:
//!
//! ```text
//! 1. required extension loaded?          → "Required extension ... is not loaded."
//! 2. driver available in image library?  → "Image driver ... is not available."
//! 3. each required configuration value   → "Configuration ... is not set to ..."
//! 4. (only if 1-3 found nothing)
//!    decode every sample image           → "Image format ... not supported: ..."
//! ```
//!
//! A descriptor is ready iff nothing was found. Unreadiness is data, never
//! an error. The only failure is a sample image that cannot be read from
//! disk, which means the installation itself is broken.

use super::descriptor::{ConfigRequirement, DriverDescriptor};
use super::diagnostics::{DiagnosticsCollection, DriverDiagnostics};
use super::host::HostFacts;
use crate::imaging::DriverFactory;
use crate::settings::SettingsStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error(
        "Sample image for format \"{format}\" at {} could not be read: {source}",
        path.display()
    )]
    SampleImage {
        format: String,
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A sample file every driver must decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SampleImage {
    pub format: String,
    pub path: PathBuf,
}

/// Formats every driver must handle, probed in this order.
pub const REQUIRED_IMAGE_FORMATS: &[(&str, &str)] = &[
    ("jpg", "Test.jpg"),
    ("gif", "Test.gif"),
    ("png", "Test.png"),
];

/// Sample images for [`REQUIRED_IMAGE_FORMATS`] inside `dir`.
pub fn default_sample_images(dir: &Path) -> Vec<SampleImage> {
    REQUIRED_IMAGE_FORMATS
        .iter()
        .map(|(format, file)| SampleImage {
            format: format.to_string(),
            path: dir.join(file),
        })
        .collect()
}

/// Probe every descriptor against the host.
///
/// Returns one diagnostics entry per descriptor, in input order.
pub fn probe_all(
    descriptors: &[DriverDescriptor],
    samples: &[SampleImage],
    host: &impl HostFacts,
    drivers: &impl DriverFactory,
) -> Result<DiagnosticsCollection, ProbeError> {
    let loaded = load_samples(samples)?;

    let items = descriptors
        .iter()
        .map(|descriptor| {
            let reasons = probe_one(descriptor, &loaded, host, drivers);
            log::debug!(
                "image driver {} ({}): {}",
                descriptor.driver_name,
                descriptor.description,
                if reasons.is_empty() {
                    "ready".to_string()
                } else {
                    format!("{} problem(s)", reasons.len())
                }
            );
            DriverDiagnostics::new(descriptor.clone(), reasons)
        })
        .collect();

    Ok(DiagnosticsCollection::new(items))
}

fn load_samples(samples: &[SampleImage]) -> Result<Vec<(&str, Vec<u8>)>, ProbeError> {
    samples
        .iter()
        .map(|s| {
            std::fs::read(&s.path)
                .map(|bytes| (s.format.as_str(), bytes))
                .map_err(|source| ProbeError::SampleImage {
                    format: s.format.clone(),
                    path: s.path.clone(),
                    source,
                })
        })
        .collect()
}

fn probe_one(
    descriptor: &DriverDescriptor,
    samples: &[(&str, Vec<u8>)],
    host: &impl HostFacts,
    drivers: &impl DriverFactory,
) -> Vec<String> {
    let mut reasons = Vec::new();
    let ext = &descriptor.required_extension;
    let name = &descriptor.driver_name;

    if !ext.is_empty() && !host.is_extension_loaded(ext) {
        reasons.push(format!("Required extension \"{ext}\" is not loaded."));
    }
    if !drivers.is_driver_available(name) {
        reasons.push(format!("Image driver \"{name}\" is not available."));
    }
    for requirement in &descriptor.required_configuration {
        if let Some(reason) = check_configuration(requirement, host) {
            reasons.push(reason);
        }
    }

    if reasons.is_empty() {
        find_unsupported_formats(name, samples, drivers, &mut reasons);
    }
    reasons
}

/// `true` is also satisfied by `1`: boolean flags read back as `1` on some hosts.
fn configuration_matches(expected: &str, actual: Option<&str>) -> bool {
    match actual {
        Some(actual) => actual == expected || (expected == "true" && actual == "1"),
        None => false,
    }
}

fn check_configuration(requirement: &ConfigRequirement, host: &impl HostFacts) -> Option<String> {
    let ConfigRequirement { key, value } = requirement;
    let actual = host.configuration_value(key);
    if configuration_matches(value, actual.as_deref()) {
        return None;
    }
    let shown = actual.as_deref().unwrap_or("<unset>");
    let mut reason = format!(
        "Configuration \"{key}\" is not set to \"{value}\", but to \"{shown}\" instead.\n        export {key}={value}"
    );
    if let Some(source) = host.configuration_source() {
        reason.push_str(&format!("    # set in {source}"));
    }
    Some(reason)
}

fn find_unsupported_formats(
    driver_name: &str,
    samples: &[(&str, Vec<u8>)],
    drivers: &impl DriverFactory,
    reasons: &mut Vec<String>,
) {
    let driver = match drivers.create_driver(driver_name) {
        Ok(driver) => driver,
        Err(e) => {
            reasons.push(format!("Image driver \"{driver_name}\" could not be created: {e}"));
            return;
        }
    };
    for (format, bytes) in samples {
        if let Err(e) = driver.load(bytes) {
            log::debug!("{driver_name} failed to decode {format}: {e}");
            reasons.push(format!("Image format \"{format}\" not supported: {e}"));
        }
    }
}

/// The configured handler list plus everything needed to probe it.
///
/// Every call re-probes the host; nothing is cached.
pub struct ImageHandlerService<H, D> {
    descriptors: Vec<DriverDescriptor>,
    samples: Vec<SampleImage>,
    host: H,
    drivers: D,
}

impl<H: HostFacts, D: DriverFactory> ImageHandlerService<H, D> {
    /// `descriptors` must be ordered worst to best.
    pub fn new(
        descriptors: Vec<DriverDescriptor>,
        samples: Vec<SampleImage>,
        host: H,
        drivers: D,
    ) -> Self {
        Self {
            descriptors,
            samples,
            host,
            drivers,
        }
    }

    pub fn descriptors(&self) -> &[DriverDescriptor] {
        &self.descriptors
    }

    pub fn determine_availability(&self) -> Result<DiagnosticsCollection, ProbeError> {
        probe_all(&self.descriptors, &self.samples, &self.host, &self.drivers)
    }

    /// Ready descriptors, worst to best.
    pub fn available_handlers(&self) -> Result<Vec<DriverDescriptor>, ProbeError> {
        Ok(self
            .determine_availability()?
            .ready_descriptors()
            .cloned()
            .collect())
    }

    pub fn preferred_handler(&self) -> Result<Option<DriverDescriptor>, ProbeError> {
        Ok(self
            .determine_availability()?
            .preferred()
            .map(|d| d.descriptor.clone()))
    }
}

/// Whether `Imaging.enabledDrivers.<name>` is switched on.
pub fn is_driver_enabled_in_configuration(settings: &SettingsStore, driver_name: &str) -> bool {
    settings
        .get(&format!("Imaging.enabledDrivers.{driver_name}"))
        .and_then(serde_yaml::Value::as_bool)
        .unwrap_or(false)
}
