//! Integration tests: probe the real image library with the bundled samples.
//!
//! Host facts are scripted so results don't depend on which toolkits the
//! machine running the tests has installed; only the built-in `Rust` driver
//! is expected to decode.
//!
//! Run with: cargo test --test probe_host

use imaging_setup::config::{SetupConfig, bundled_samples_dir};
use imaging_setup::handlers::{
    DriverDescriptor, HostFacts, ImageHandlerService, ProbeError, SampleImage,
    default_sample_images, probe_all,
};
use imaging_setup::health::{
    Healthcheck, HealthcheckEnvironment, ImageHandlerHealthcheck, Status,
};
use imaging_setup::imaging::SystemDrivers;
use imaging_setup::settings::{self, SettingsStore};
use std::collections::HashMap;

#[derive(Default)]
struct ScriptedHost {
    extensions: Vec<&'static str>,
    config: HashMap<&'static str, &'static str>,
}

impl HostFacts for ScriptedHost {
    fn is_extension_loaded(&self, extension: &str) -> bool {
        self.extensions.contains(&extension)
    }

    fn configuration_value(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.to_string())
    }
}

#[test]
fn rust_driver_ready_with_bundled_samples() {
    let samples = default_sample_images(&bundled_samples_dir());
    let descriptors = vec![DriverDescriptor::new("Rust", "pure Rust")];

    let result = probe_all(&descriptors, &samples, &ScriptedHost::default(), &SystemDrivers::new())
        .unwrap();

    let rust = result.iter().next().unwrap();
    assert!(rust.is_ready, "unexpected reasons: {:?}", rust.status_details);
    assert_eq!(result.preferred_driver_name(), Some("Rust"));
}

#[test]
fn unknown_driver_after_rust_is_not_preferred() {
    let samples = default_sample_images(&bundled_samples_dir());
    let descriptors = vec![
        DriverDescriptor::new("Rust", "pure Rust"),
        DriverDescriptor::new("Gd", "not provided by this library").requiring_extension("gd"),
    ];
    let host = ScriptedHost {
        extensions: vec!["gd"],
        ..Default::default()
    };

    let result = probe_all(&descriptors, &samples, &host, &SystemDrivers::new()).unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result.ready_count(), 1);
    assert_eq!(result.unavailable_count(), 1);
    assert_eq!(result.preferred_driver_name(), Some("Rust"));
    let gd = result.iter().nth(1).unwrap();
    assert_eq!(gd.status_details, ["Image driver \"Gd\" is not available."]);
}

#[test]
fn corrupt_sample_marks_driver_unready() {
    let tmp = tempfile::TempDir::new().unwrap();
    let mut samples = default_sample_images(&bundled_samples_dir());
    let broken = tmp.path().join("Broken.gif");
    std::fs::write(&broken, b"GIF89a truncated").unwrap();
    samples[1] = SampleImage {
        format: "gif".into(),
        path: broken,
    };

    let result = probe_all(
        &[DriverDescriptor::new("Rust", "")],
        &samples,
        &ScriptedHost::default(),
        &SystemDrivers::new(),
    )
    .unwrap();

    let rust = result.iter().next().unwrap();
    assert!(!rust.is_ready);
    assert_eq!(rust.status_details.len(), 1);
    assert!(rust.status_details[0].starts_with("Image format \"gif\" not supported:"));
}

#[test]
fn missing_sample_dir_is_fatal() {
    let tmp = tempfile::TempDir::new().unwrap();
    let samples = default_sample_images(&tmp.path().join("nope"));

    let err = probe_all(
        &[DriverDescriptor::new("Rust", "")],
        &samples,
        &ScriptedHost::default(),
        &SystemDrivers::new(),
    )
    .unwrap_err();

    let ProbeError::SampleImage { format, .. } = err;
    assert_eq!(format, "jpg");
}

#[test]
fn hardened_vips_needs_configuration() {
    let config = SetupConfig::default();
    let descriptors = config.descriptors();
    let hardened = descriptors.last().unwrap().clone();
    assert_eq!(hardened.driver_name, "Vips");

    let result = probe_all(
        &[hardened],
        &config.sample_images(),
        &ScriptedHost::default(),
        &SystemDrivers::new(),
    )
    .unwrap();

    let details = &result.iter().next().unwrap().status_details;
    assert!(details.iter().any(|d| {
        d.contains("\"VIPS_BLOCK_UNTRUSTED\"") && d.contains("export VIPS_BLOCK_UNTRUSTED=true")
    }));
}

#[test]
fn write_then_check_health() {
    let tmp = tempfile::TempDir::new().unwrap();
    let service = ImageHandlerService::new(
        vec![DriverDescriptor::new("Rust", "pure Rust")],
        default_sample_images(&bundled_samples_dir()),
        ScriptedHost::default(),
        SystemDrivers::new(),
    );
    let preferred = service.preferred_handler().unwrap().unwrap();

    let file = settings::image_handler_settings_file(tmp.path(), "Testing");
    settings::write_settings(
        &file,
        settings::IMAGE_HANDLER_PATH,
        settings::image_handler_settings(&preferred.driver_name, true),
    )
    .unwrap();

    let store = SettingsStore::load(tmp.path(), "Testing").unwrap();
    let diagnostics = service.determine_availability().unwrap();
    let health = ImageHandlerHealthcheck::new(&store, Ok(&diagnostics))
        .execute(&HealthcheckEnvironment::default());
    assert_eq!(health.status, Status::Ok);
}
