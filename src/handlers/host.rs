//! Read-only host facts the probe depends on.
//!
//! The probe never touches process-wide state directly; it asks a
//! [`HostFacts`] implementation. [`SystemHost`] answers from the real
//! machine: an "extension" is an executable on `PATH`, configuration values
//! are environment variables.

use crate::imaging::find_executable;

pub trait HostFacts {
    /// Is the named host capability present?
    fn is_extension_loaded(&self, extension: &str) -> bool;

    /// Current value of a configuration key, `None` when unset.
    fn configuration_value(&self, key: &str) -> Option<String>;

    /// Where configuration values are set, for remediation hints.
    fn configuration_source(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Default)]
pub struct SystemHost;

impl SystemHost {
    pub fn new() -> Self {
        Self
    }
}

impl HostFacts for SystemHost {
    fn is_extension_loaded(&self, extension: &str) -> bool {
        find_executable(extension).is_some()
    }

    fn configuration_value(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn configuration_source(&self) -> Option<String> {
        Some("the process environment".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_host_reads_environment() {
        // PATH is set in every test environment we run under.
        assert!(SystemHost::new().configuration_value("PATH").is_some());
        assert!(
            SystemHost::new()
                .configuration_value("IMAGING_SETUP_SURELY_UNSET_KEY")
                .is_none()
        );
    }

    #[test]
    fn system_host_misses_nonexistent_extension() {
        assert!(!SystemHost::new().is_extension_loaded("imaging-setup-no-such-tool"));
    }
}
