//! Runtime health checks.
//!
//! Each [`Healthcheck`] maps current configuration and host state to a
//! [`Health`]: a message plus one of the [`Status`] levels. The CLI runs all
//! checks and fails when any of them reports [`Status::Error`].

use crate::handlers::{DiagnosticsCollection, ProbeError};
use crate::settings::{IMAGE_HANDLER_PATH, SettingsStore};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Warning,
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Ok => "OK",
            Status::Warning => "WARNING",
            Status::Error => "ERROR",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Health {
    pub message: String,
    pub status: Status,
}

impl Health {
    pub fn new(message: impl Into<String>, status: Status) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }
}

/// Where the checks are being run from.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthcheckEnvironment {
    /// Technical details (driver names, error messages) may be shown.
    /// Off for anything that could be reached anonymously.
    pub safe_to_leak_technical_details: bool,
}

pub trait Healthcheck {
    fn title(&self) -> &str;

    fn execute(&self, environment: &HealthcheckEnvironment) -> Health;
}

/// Compares the configured image driver with the best one the host offers.
///
/// Takes the probe result as given so the caller decides when to probe.
pub struct ImageHandlerHealthcheck<'a> {
    settings: &'a SettingsStore,
    diagnostics: Result<&'a DiagnosticsCollection, &'a ProbeError>,
}

impl<'a> ImageHandlerHealthcheck<'a> {
    pub fn new(
        settings: &'a SettingsStore,
        diagnostics: Result<&'a DiagnosticsCollection, &'a ProbeError>,
    ) -> Self {
        Self {
            settings,
            diagnostics,
        }
    }
}

impl Healthcheck for ImageHandlerHealthcheck<'_> {
    fn title(&self) -> &str {
        "Image handling"
    }

    fn execute(&self, environment: &HealthcheckEnvironment) -> Health {
        let driver_path = format!("{IMAGE_HANDLER_PATH}.driver");
        let Some(configured) = self.settings.get_str(&driver_path).filter(|d| !d.is_empty()) else {
            return Health::new(
                format!(
                    "No image driver in {driver_path} configured. For configuration you can use `imaging-setup image-handler`"
                ),
                Status::Error,
            );
        };

        let diagnostics = match self.diagnostics {
            Ok(d) => d,
            Err(e) => {
                let detail = if environment.safe_to_leak_technical_details {
                    format!(": {e}")
                } else {
                    String::new()
                };
                return Health::new(
                    format!(
                        "Image drivers could not be checked, the installation is incomplete{detail}"
                    ),
                    Status::Error,
                );
            }
        };

        if !diagnostics.is_ready(configured) {
            let name = if environment.safe_to_leak_technical_details {
                format!(" \"{configured}\"")
            } else {
                String::new()
            };
            return Health::new(
                format!(
                    "The configured image driver{name} is not usable on this host. For configuration you can use `imaging-setup image-handler`"
                ),
                Status::Error,
            );
        }

        if diagnostics.preferred_driver_name() != Some(configured) {
            return Health::new(
                format!(
                    "A better image driver than the configured {driver_path} is available. For configuration you can use `imaging-setup image-handler`"
                ),
                Status::Warning,
            );
        }

        Health::new("The image driver is correctly setup", Status::Ok)
    }
}

/// Run every check, in order.
pub fn run_healthchecks(
    checks: &[&dyn Healthcheck],
    environment: &HealthcheckEnvironment,
) -> Vec<(String, Health)> {
    checks
        .iter()
        .map(|check| (check.title().to_string(), check.execute(environment)))
        .collect()
}

/// The most severe status among the results; `Ok` when there are none.
pub fn overall_status(results: &[(String, Health)]) -> Status {
    results
        .iter()
        .map(|(_, h)| h.status)
        .max()
        .unwrap_or(Status::Ok)
}
