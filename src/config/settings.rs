//! The settings file.
//!
//! Older settings files only carry `remove_fn` and `remove_photos`; every
//! other key falls back to its default.

use crate::error::{Error, Result};
use crate::vcard::{ConversionOptions, OrganizationDetection};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;

/// Keys accepted by [`Settings::set`].
pub const SETTINGS_KEYS: [&str; 5] = [
    "remove_fn",
    "remove_photos",
    "org_detection",
    "mark_organizations",
    "normalize_parameters",
];

/// Persisted conversion preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Settings {
    pub remove_fn: bool,
    pub remove_photos: bool,
    pub org_detection: OrganizationDetection,
    pub mark_organizations: bool,
    pub normalize_parameters: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            remove_fn: true,
            remove_photos: true,
            org_detection: OrganizationDetection::Auto,
            mark_organizations: false,
            normalize_parameters: true,
        }
    }
}

impl Settings {
    /// Conversion options these settings describe.
    #[must_use]
    pub const fn to_options(&self) -> ConversionOptions {
        ConversionOptions {
            remove_photos: self.remove_photos,
            remove_formatted_name: self.remove_fn,
            organization_detection: self.org_detection,
            mark_organizations: self.mark_organizations,
            normalize_parameters: self.normalize_parameters,
        }
    }

    /// Set one key from its textual value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for unknown keys or unparsable values.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let flag = || {
            parse_bool(value).ok_or_else(|| {
                Error::InvalidArgument(format!("'{value}' is not a boolean for {key}"))
            })
        };

        match key.to_ascii_lowercase().replace('-', "_").as_str() {
            "remove_fn" => self.remove_fn = flag()?,
            "remove_photos" => self.remove_photos = flag()?,
            "mark_organizations" => self.mark_organizations = flag()?,
            "normalize_parameters" => self.normalize_parameters = flag()?,
            "org_detection" => {
                self.org_detection =
                    <OrganizationDetection as clap::ValueEnum>::from_str(value, true).map_err(
                        |_| Error::InvalidArgument(format!("'{value}' is not a valid org_detection")),
                    )?;
            }
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "unknown settings key '{key}' (expected one of {})",
                    SETTINGS_KEYS.join(", ")
                )));
            }
        }
        Ok(())
    }
}

/// Parse yes/no style answers.
#[must_use]
pub fn parse_bool(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "yes" | "y" | "true" | "1" | "on" => Some(true),
        "no" | "n" | "false" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Load settings from `path`, or defaults when there is no file.
///
/// # Errors
///
/// Returns `Config` if the file exists but cannot be read or parsed.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let Some(path) = path.filter(|p| p.exists()) else {
        tracing::debug!("No settings file, using defaults");
        return Ok(Settings::default());
    };

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read settings file: {e}")))?;

    let settings = serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse {}: {e}", path.display()))
    })?;

    tracing::debug!(path = %path.display(), "Loaded settings");
    Ok(settings)
}

/// Save settings as pretty-printed JSON, creating parent directories.
///
/// # Errors
///
/// Returns `Config` if the file cannot be written.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| Error::Config(format!("Failed to create settings directory: {e}")))?;
    }

    let content = serde_json::to_string_pretty(settings)
        .map_err(|e| Error::Config(format!("Failed to serialize settings: {e}")))?;

    fs::write(path, content + "\n")
        .map_err(|e| Error::Config(format!("Failed to write settings file: {e}")))?;

    tracing::info!(path = %path.display(), "Saved settings");
    Ok(())
}

/// Ask the first-time setup questions.
///
/// An empty answer takes the default (yes); anything that is not a
/// recognizable "yes" means no.
///
/// # Errors
///
/// Returns an error if reading the answers or writing the prompts fails.
pub fn interactive_setup<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Settings> {
    writeln!(output, "\nFirst time setup - Please configure your preferences:")?;
    writeln!(output, "(Press Enter for default values)")?;

    let remove_fn = ask(input, output, "Remove FN (Formatted Name) field? (yes/no) [yes]: ")?;
    let remove_photos = ask(input, output, "Remove embedded photos? (yes/no) [yes]: ")?;

    Ok(Settings {
        remove_fn,
        remove_photos,
        ..Settings::default()
    })
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<bool> {
    write!(output, "{question}")?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim();

    Ok(answer.is_empty() || parse_bool(answer).unwrap_or(false))
}
