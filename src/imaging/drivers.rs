//! Production drivers: the built-in pure Rust decoder and the command-line
//! toolkits found on `PATH`.
//!
//! ## Driver mapping
//!
//! | Driver | Backed by | Decode check |
//! |---|---|---|
//! | `Rust` | `image` crate, compiled in | `image::load_from_memory` |
//! | `Gmagick` | GraphicsMagick `gm` | `gm identify -format "%w %h"` |
//! | `Imagick` | ImageMagick 7 `magick` | `magick identify -format "%w %h"` |
//! | `Vips` | libvips `vipsheader` | `vipsheader -f width` / `-f height` |
//!
//! The command-line drivers write the buffer to a temp file first; all three
//! toolkits sniff the format from the file contents, so no extension is
//! needed.

use super::backend::{BackendError, Dimensions, DriverFactory, ImageDriver};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

/// How a command-line toolkit is asked for the dimensions of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    /// `<program> identify -format "%w %h\n" <file>` (ImageMagick, GraphicsMagick).
    Identify,
    /// `vipsheader -f width <file>` then `-f height`.
    VipsHeader,
}

const TOOL_DRIVERS: &[(&str, &str, Dialect)] = &[
    ("Gmagick", "gm", Dialect::Identify),
    ("Imagick", "magick", Dialect::Identify),
    ("Vips", "vipsheader", Dialect::VipsHeader),
];

pub const RUST_DRIVER: &str = "Rust";

/// Locate an executable on `PATH`.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(executable_file_name(name)))
        .find(|candidate| candidate.is_file())
}

#[cfg(windows)]
fn executable_file_name(name: &str) -> String {
    format!("{name}.exe")
}

#[cfg(not(windows))]
fn executable_file_name(name: &str) -> String {
    name.to_string()
}

/// The driver factory backed by this host.
///
/// Driver names are matched case-insensitively, so `imagick` and `Imagick`
/// resolve to the same toolkit.
#[derive(Debug, Default)]
pub struct SystemDrivers;

impl SystemDrivers {
    pub fn new() -> Self {
        Self
    }
}

fn tool_for(driver_name: &str) -> Option<(&'static str, &'static str, Dialect)> {
    TOOL_DRIVERS
        .iter()
        .find(|(name, _, _)| name.eq_ignore_ascii_case(driver_name))
        .copied()
}

impl DriverFactory for SystemDrivers {
    fn is_driver_available(&self, driver_name: &str) -> bool {
        if driver_name.eq_ignore_ascii_case(RUST_DRIVER) {
            return true;
        }
        tool_for(driver_name).is_some_and(|(_, program, _)| find_executable(program).is_some())
    }

    fn create_driver(&self, driver_name: &str) -> Result<Box<dyn ImageDriver>, BackendError> {
        if driver_name.eq_ignore_ascii_case(RUST_DRIVER) {
            return Ok(Box::new(RustDriver));
        }
        let (_, program, dialect) =
            tool_for(driver_name).ok_or_else(|| BackendError::UnknownDriver(driver_name.into()))?;
        let program = find_executable(program).ok_or_else(|| {
            BackendError::DecodeFailed(format!("\"{program}\" was not found on PATH"))
        })?;
        Ok(Box::new(ToolDriver { program, dialect }))
    }
}

/// Pure Rust decoding through the `image` crate.
pub struct RustDriver;

impl ImageDriver for RustDriver {
    fn load(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| BackendError::DecodeFailed(e.to_string()))?;
        Ok(Dimensions {
            width: img.width(),
            height: img.height(),
        })
    }
}

struct ToolDriver {
    program: PathBuf,
    dialect: Dialect,
}

impl ImageDriver for ToolDriver {
    fn load(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(bytes)?;
        file.flush()?;

        match self.dialect {
            Dialect::Identify => {
                let out = run(
                    &self.program,
                    &["identify", "-format", "%w %h\n"],
                    file.path(),
                )?;
                parse_identify_output(&out)
            }
            Dialect::VipsHeader => {
                let width = run(&self.program, &["-f", "width"], file.path())?;
                let height = run(&self.program, &["-f", "height"], file.path())?;
                Ok(Dimensions {
                    width: parse_number(&width)?,
                    height: parse_number(&height)?,
                })
            }
        }
    }
}

/// Run a toolkit command against `file` and return its stdout.
fn run(program: &Path, args: &[&str], file: &Path) -> Result<String, BackendError> {
    let out = Command::new(program).args(args).arg(file).output()?;
    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        return Err(BackendError::DecodeFailed(format!(
            "{} exited with {}: {}",
            program.display(),
            out.status,
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&out.stdout).into_owned())
}

/// Parse `"<w> <h>"` from identify output. Animated images print one line
/// per frame; the first frame wins.
fn parse_identify_output(out: &str) -> Result<Dimensions, BackendError> {
    let line = out
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| BackendError::DecodeFailed("identify printed nothing".into()))?;
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(w), Some(h)) => Ok(Dimensions {
            width: parse_number(w)?,
            height: parse_number(h)?,
        }),
        _ => Err(BackendError::DecodeFailed(format!(
            "unexpected identify output: {line}"
        ))),
    }
}

fn parse_number(s: &str) -> Result<u32, BackendError> {
    s.trim()
        .parse()
        .map_err(|_| BackendError::DecodeFailed(format!("not a dimension: {:?}", s.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::sample_dir;

    #[test]
    fn rust_driver_is_always_available() {
        let drivers = SystemDrivers::new();
        assert!(drivers.is_driver_available("Rust"));
        assert!(drivers.is_driver_available("rust"));
    }

    #[test]
    fn unknown_driver_is_unavailable() {
        let drivers = SystemDrivers::new();
        assert!(!drivers.is_driver_available("Gd"));
        assert!(matches!(
            drivers.create_driver("Gd"),
            Err(BackendError::UnknownDriver(name)) if name == "Gd"
        ));
    }

    #[test]
    fn rust_driver_decodes_bundled_samples() {
        let driver = SystemDrivers::new().create_driver("Rust").unwrap();
        for file in ["Test.jpg", "Test.gif", "Test.png"] {
            let bytes = std::fs::read(sample_dir().join(file)).unwrap();
            let dims = driver.load(&bytes).unwrap();
            assert_eq!(dims, Dimensions { width: 16, height: 16 }, "{file}");
        }
    }

    #[test]
    fn rust_driver_rejects_garbage() {
        let err = RustDriver.load(b"definitely not an image").unwrap_err();
        assert!(matches!(err, BackendError::DecodeFailed(_)));
    }

    #[test]
    fn identify_output_first_frame_wins() {
        let dims = parse_identify_output("16 16\n16 16\n").unwrap();
        assert_eq!(dims, Dimensions { width: 16, height: 16 });
    }

    #[test]
    fn identify_output_rejects_junk() {
        assert!(parse_identify_output("").is_err());
        assert!(parse_identify_output("16").is_err());
        assert!(parse_identify_output("wide tall").is_err());
    }

    #[test]
    fn tool_lookup_is_case_insensitive() {
        assert_eq!(tool_for("imagick").map(|t| t.1), Some("magick"));
        assert_eq!(tool_for("VIPS").map(|t| t.1), Some("vipsheader"));
        assert!(tool_for("Gd").is_none());
    }
}
