//! # Imaging Setup
//!
//! Finds out which image drivers work on this host, picks the best one, and
//! writes that choice into the application's YAML settings.
//!
//! # Architecture
//!
//! ```text
//! setup.toml ─▶ config ─▶ descriptors (worst → best) + sample images
//!                               │
//!          HostFacts ──────────▶ probe_all ◀────────── DriverFactory
//!                               │
//!                     DiagnosticsCollection
//!                 ┌─────────────┼──────────────┐
//!              diagnose     image-handler     health
//!                          (settings YAML)
//! ```
//!
//! The probe is a pure function of its inputs: host state is reached only
//! through the [`handlers::HostFacts`] and [`imaging::DriverFactory`]
//! traits, so unit tests run against fakes and every call re-probes.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`handlers`] | Driver descriptors, the capability probe, diagnostics queries |
//! | [`imaging`] | Driver factory: pure Rust decoders and command-line toolkits |
//! | [`settings`] | Layered YAML settings, read and written by dotted path |
//! | [`health`] | Health check model and the image handling check |
//! | [`config`] | `setup.toml` loading and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Unreadiness Is Data
//!
//! A driver that is missing, misconfigured or fails to decode a sample is a
//! normal result, recorded as human-readable reasons. Only a sample image
//! that cannot be read aborts the probe: that is a broken installation, not
//! a property of any driver.
//!
//! ## Worst-to-Best Ordering
//!
//! Descriptor lists are ranked by position. The preferred driver is the
//! last ready entry, see [`handlers::descriptor`].
//!
//! ## Decoding, Not Just Detecting
//!
//! A toolkit being installed says little about its delegates. Every driver
//! has to decode real JPEG, GIF and PNG files before it counts as ready.

pub mod config;
pub mod handlers;
pub mod health;
pub mod imaging;
pub mod output;
pub mod settings;

#[cfg(test)]
pub(crate) mod test_helpers;
