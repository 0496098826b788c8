//! Image handler selection: descriptors, host probing and diagnostics.
//!
//! ```text
//! descriptors (worst → best) ─┐
//! sample images ──────────────┼─▶ probe_all ─▶ DiagnosticsCollection
//! HostFacts + DriverFactory ──┘                 ├─ ready_count / unavailable_count
//!                                               ├─ is_ready(name)
//!                                               └─ preferred_driver_name
//! ```

pub mod descriptor;
pub mod diagnostics;
pub mod host;
pub mod probe;

pub use descriptor::{
    ConfigRequirement, DriverDescriptor, SUPPORTED_HANDLERS_BY_PREFERENCE, builtin_descriptors,
};
pub use diagnostics::{DiagnosticsCollection, DriverDiagnostics};
pub use host::{HostFacts, SystemHost};
pub use probe::{
    ImageHandlerService, ProbeError, SampleImage, default_sample_images,
    is_driver_enabled_in_configuration, probe_all,
};
