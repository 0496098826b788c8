//! Image driver backend traits and shared types.
//!
//! A [`DriverFactory`] knows which drivers exist on this host and builds
//! them on demand. Each driver implements [`ImageDriver`], which decodes a
//! byte buffer and reports the image dimensions. That is enough to prove
//! that the driver really understands a format, not just that it is
//! installed.
//!
//! The production factory is
//! [`SystemDrivers`](super::drivers::SystemDrivers). Tests substitute
//! [`tests::MockDrivers`].

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unknown image driver \"{0}\"")]
    UnknownDriver(String),
    #[error("Decoding failed: {0}")]
    DecodeFailed(String),
}

/// Result of decoding an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A constructed image driver.
pub trait ImageDriver {
    /// Decode an in-memory image.
    fn load(&self, bytes: &[u8]) -> Result<Dimensions, BackendError>;
}

/// The image library: answers availability questions and builds drivers.
///
/// Availability is a library-level check ("is the binary/codec there at
/// all"), independent of any host extension requirement a descriptor
/// declares.
pub trait DriverFactory {
    fn is_driver_available(&self, driver_name: &str) -> bool;

    fn create_driver(&self, driver_name: &str) -> Result<Box<dyn ImageDriver>, BackendError>;
}
