//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure and do no I/O.
//!
//! # Output Format
//!
//! ## Diagnose
//!
//! ```text
//! Image handlers (2 of 5 ready)
//! 001 Rust [ready]
//!     Pure Rust decoders - always available, slow on large images
//! 002 Gmagick [unavailable]
//!     GraphicsMagick command-line tools
//!     - Required extension "gm" is not loaded.
//!     - Image driver "Gmagick" is not available.
//!
//! Preferred: Imagick
//! ```
//!
//! ## Health
//!
//! ```text
//! [WARNING] Image handling
//!     A better image driver than the configured Imaging.driver is available: ...
//! ```

use crate::handlers::{DiagnosticsCollection, DriverDescriptor};
use crate::health::Health;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Push a possibly multi-line text, keeping continuation lines indented.
fn push_block(lines: &mut Vec<String>, prefix: &str, text: &str) {
    let mut parts = text.lines();
    if let Some(first) = parts.next() {
        lines.push(format!("{prefix}{first}"));
    }
    let continuation = " ".repeat(prefix.chars().count());
    for rest in parts {
        lines.push(format!("{continuation}{}", rest.trim_start()));
    }
}

// ============================================================================
// Diagnose
// ============================================================================

pub fn format_diagnostics(diagnostics: &DiagnosticsCollection) -> Vec<String> {
    let mut lines = vec![format!(
        "Image handlers ({} of {} ready)",
        diagnostics.ready_count(),
        diagnostics.len()
    )];

    for (i, d) in diagnostics.iter().enumerate() {
        let state = if d.is_ready { "ready" } else { "unavailable" };
        lines.push(format!(
            "{} {} [{}]",
            format_index(i + 1),
            d.driver_name(),
            state
        ));
        if !d.descriptor.description.is_empty() {
            lines.push(format!("{}{}", indent(1), d.descriptor.description));
        }
        for reason in &d.status_details {
            push_block(&mut lines, &format!("{}- ", indent(1)), reason);
        }
    }

    lines.push(String::new());
    match diagnostics.preferred_driver_name() {
        Some(name) => lines.push(format!("Preferred: {name}")),
        None => lines.push("Preferred: none".to_string()),
    }
    lines
}

pub fn print_diagnostics(diagnostics: &DiagnosticsCollection) {
    for line in format_diagnostics(diagnostics) {
        println!("{}", line);
    }
}

// ============================================================================
// Image handler selection
// ============================================================================

/// Driver name → description pairs to choose from, one per name.
///
/// A name listed more than once keeps its first position and the
/// description of its best (last) ready entry.
pub fn handler_choices<'a>(
    ready: impl IntoIterator<Item = &'a DriverDescriptor>,
) -> Vec<(String, String)> {
    let mut choices: Vec<(String, String)> = Vec::new();
    for d in ready {
        match choices.iter_mut().find(|(name, _)| *name == d.driver_name) {
            Some(choice) => choice.1 = d.description.clone(),
            None => choices.push((d.driver_name.clone(), d.description.clone())),
        }
    }
    choices
}

/// What to do with the `--driver` a user asked for.
#[derive(Debug, PartialEq, Eq)]
pub enum DriverSelection {
    /// A ready driver, under its canonical name.
    Ready(String),
    /// The requested driver is not among the ready ones.
    NotReady(String),
    /// Nothing requested: prompt, or take the preferred driver.
    Ask,
}

/// Match a requested driver name against `choices`, ignoring ASCII case.
///
/// An empty or blank request counts as no request.
pub fn resolve_driver(choices: &[(String, String)], requested: Option<&str>) -> DriverSelection {
    let Some(requested) = requested.map(str::trim).filter(|r| !r.is_empty()) else {
        return DriverSelection::Ask;
    };
    match choices
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(requested))
    {
        Some((name, _)) => DriverSelection::Ready(name.clone()),
        None => DriverSelection::NotReady(requested.to_string()),
    }
}

/// Position of `preferred` in `choices`, the prompt's default selection.
pub fn preferred_choice_index(choices: &[(String, String)], preferred: &str) -> usize {
    choices
        .iter()
        .position(|(name, _)| name == preferred)
        .unwrap_or(0)
}

/// One line per choice, as shown in the interactive select.
pub fn format_choice(name: &str, description: &str) -> String {
    if description.is_empty() {
        name.to_string()
    } else {
        format!("{name} {description}")
    }
}

pub fn no_handler_message(windows: bool) -> String {
    let hint = if windows {
        " To get basic image support during development, install ImageMagick and make sure magick.exe is on your PATH."
    } else {
        ""
    };
    format!("No supported image handler found.{hint}")
}

pub fn format_settings_written(fragment: &str, file: &Path, enabled: bool) -> Vec<String> {
    let mut lines = Vec::new();
    if enabled {
        lines.push("Enabled driver.".to_string());
    }
    lines.push(String::new());
    lines.extend(fragment.lines().map(str::to_string));
    lines.push(String::new());
    lines.push(format!(
        "The new image handler setting were written to {}",
        file.display()
    ));
    lines
}

pub fn print_settings_written(fragment: &str, file: &Path, enabled: bool) {
    for line in format_settings_written(fragment, file, enabled) {
        println!("{}", line);
    }
}

// ============================================================================
// Health
// ============================================================================

pub fn format_health_results(results: &[(String, Health)]) -> Vec<String> {
    let mut lines = Vec::new();
    for (title, health) in results {
        lines.push(format!("[{}] {}", health.status, title));
        push_block(&mut lines, &indent(1), &health.message);
    }
    lines
}

pub fn print_health_results(results: &[(String, Health)]) {
    for line in format_health_results(results) {
        println!("{}", line);
    }
}
