//! Image handler descriptors: what a driver needs from the host.
//!
//! # Preference Order
//!
//! Descriptor lists are ordered **worst to best**. The probe keeps this
//! order, and the preferred driver is the *last* ready entry. Reversing a
//! list silently inverts the preference, so every list in this crate (the
//! built-in [`SUPPORTED_HANDLERS_BY_PREFERENCE`] and `[[handlers]]` in
//! `setup.toml`) follows the same convention.
//!
//! # Duplicate Names
//!
//! One driver may be listed more than once with different requirements,
//! e.g. libvips used through its tools or with untrusted loaders blocked.
//! Each entry is probed on its own; readiness per driver name is answered
//! by [`DiagnosticsCollection::is_ready`](super::DiagnosticsCollection::is_ready).

use serde::{Deserialize, Serialize};

/// One expected host configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigRequirement {
    pub key: String,
    pub value: String,
}

/// Static declaration of an image driver and its host requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriverDescriptor {
    pub driver_name: String,
    pub description: String,
    /// Host capability that must be present; empty means none.
    #[serde(default)]
    pub required_extension: String,
    /// Checked in declared order.
    #[serde(default)]
    pub required_configuration: Vec<ConfigRequirement>,
}

impl DriverDescriptor {
    pub fn new(driver_name: &str, description: &str) -> Self {
        Self {
            driver_name: driver_name.to_string(),
            description: description.to_string(),
            required_extension: String::new(),
            required_configuration: Vec::new(),
        }
    }

    pub fn requiring_extension(mut self, extension: &str) -> Self {
        self.required_extension = extension.to_string();
        self
    }

    pub fn requiring_configuration(mut self, key: &str, value: &str) -> Self {
        self.required_configuration.push(ConfigRequirement {
            key: key.to_string(),
            value: value.to_string(),
        });
        self
    }
}

/// Compile-time form of a [`DriverDescriptor`].
#[derive(Debug, Clone, Copy)]
pub struct BuiltinHandler {
    pub driver_name: &'static str,
    pub description: &'static str,
    pub required_extension: &'static str,
    pub required_configuration: &'static [(&'static str, &'static str)],
}

impl From<&BuiltinHandler> for DriverDescriptor {
    fn from(h: &BuiltinHandler) -> Self {
        h.required_configuration.iter().fold(
            DriverDescriptor::new(h.driver_name, h.description)
                .requiring_extension(h.required_extension),
            |d, (key, value)| d.requiring_configuration(key, value),
        )
    }
}

/// Supported handlers, sorted from worst-fitting to best-fitting.
pub const SUPPORTED_HANDLERS_BY_PREFERENCE: &[BuiltinHandler] = &[
    BuiltinHandler {
        driver_name: "Rust",
        description: "Pure Rust decoders - always available, slow on large images",
        required_extension: "",
        required_configuration: &[],
    },
    BuiltinHandler {
        driver_name: "Gmagick",
        description: "GraphicsMagick command-line tools",
        required_extension: "gm",
        required_configuration: &[],
    },
    // ImageMagick is better maintained than GraphicsMagick, so it ranks higher.
    BuiltinHandler {
        driver_name: "Imagick",
        description: "ImageMagick command-line tools",
        required_extension: "magick",
        required_configuration: &[],
    },
    BuiltinHandler {
        driver_name: "Vips",
        description: "(legacy tool mode) - fast and memory efficient, needs the vips tools on PATH",
        required_extension: "vips",
        required_configuration: &[],
    },
    BuiltinHandler {
        driver_name: "Vips",
        description: "(hardened mode) - fast and memory efficient, untrusted loaders blocked",
        required_extension: "",
        required_configuration: &[("VIPS_BLOCK_UNTRUSTED", "true")],
    },
];

/// The built-in descriptor list, worst to best.
pub fn builtin_descriptors() -> Vec<DriverDescriptor> {
    SUPPORTED_HANDLERS_BY_PREFERENCE
        .iter()
        .map(DriverDescriptor::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_list_keeps_duplicate_vips_entries() {
        let descriptors = builtin_descriptors();
        let vips: Vec<_> = descriptors
            .iter()
            .filter(|d| d.driver_name == "Vips")
            .collect();
        assert_eq!(vips.len(), 2);
        assert_eq!(vips[0].required_extension, "vips");
        assert!(vips[1].required_extension.is_empty());
        assert_eq!(
            vips[1].required_configuration,
            vec![ConfigRequirement {
                key: "VIPS_BLOCK_UNTRUSTED".into(),
                value: "true".into()
            }]
        );
    }

    #[test]
    fn builtin_list_is_worst_to_best() {
        let names: Vec<_> = builtin_descriptors()
            .into_iter()
            .map(|d| d.driver_name)
            .collect();
        assert_eq!(names, ["Rust", "Gmagick", "Imagick", "Vips", "Vips"]);
    }

    #[test]
    fn builder_preserves_configuration_order() {
        let d = DriverDescriptor::new("Vips", "ffi")
            .requiring_configuration("b", "1")
            .requiring_configuration("a", "2");
        let keys: Vec<_> = d.required_configuration.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, ["b", "a"]);
    }

    #[test]
    fn descriptor_deserializes_with_defaults() {
        let d: DriverDescriptor =
            toml::from_str("driver_name = \"Imagick\"\ndescription = \"im\"").unwrap();
        assert!(d.required_extension.is_empty());
        assert!(d.required_configuration.is_empty());
    }
}
