//! Image library access: which drivers exist and can they decode.
//!
//! | Driver | Crate / tool |
//! |---|---|
//! | **Rust** | `image` crate (JPEG, PNG, GIF, TIFF, WebP decoders) |
//! | **Gmagick** | GraphicsMagick `gm` |
//! | **Imagick** | ImageMagick `magick` |
//! | **Vips** | libvips `vipsheader` |
//!
//! The module is split into:
//! - **Backend**: [`DriverFactory`] and [`ImageDriver`] traits
//! - **Drivers**: [`SystemDrivers`], the host-backed factory

pub mod backend;
pub mod drivers;

pub use backend::{BackendError, Dimensions, DriverFactory, ImageDriver};
pub use drivers::{SystemDrivers, find_executable};
