//! Configuration management.
//!
//! This module resolves where the settings file lives and loads it.
//!
//! # Architecture
//!
//! Settings are a small JSON file with the user's conversion preferences:
//! - **Local**: `vcard_settings.json` in the working directory, next to the
//!   `contacts.vcf` export (the layout the tool has always used)
//! - **Global**: `<config dir>/vcconv/settings.json` for users who convert
//!   from many places
//!
//! Command-line flags always win over whatever the file says.

mod settings;

pub use settings::{
    interactive_setup, load_settings, parse_bool, save_settings, Settings, SETTINGS_KEYS,
};

use std::path::{Path, PathBuf};

/// Settings file name looked up in the working directory.
pub const LOCAL_SETTINGS_FILE: &str = "vcard_settings.json";

/// Environment variable overriding the settings path.
pub const SETTINGS_ENV: &str = "VCCONV_SETTINGS";

/// Default input file name.
pub const DEFAULT_INPUT: &str = "contacts.vcf";

/// Default output file name.
pub const DEFAULT_OUTPUT: &str = "contacts_v4.vcf";

/// Get the global settings file location.
#[must_use]
pub fn global_settings_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "vcconv").map(|d| d.config_dir().join("settings.json"))
}

/// Explicit path, then `VCCONV_SETTINGS`.
fn override_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(SETTINGS_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    None
}

/// Resolve the settings file to read.
///
/// Priority:
/// 1. If `explicit_path` is provided, use it directly
/// 2. `VCCONV_SETTINGS` environment variable
/// 3. `./vcard_settings.json` if it exists
/// 4. Global location: `<config dir>/vcconv/settings.json`
///
/// The returned path may not exist; callers fall back to defaults then.
#[must_use]
pub fn resolve_settings_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = override_path(explicit_path) {
        return Some(path);
    }

    let local = PathBuf::from(LOCAL_SETTINGS_FILE);
    if local.is_file() {
        return Some(local);
    }

    global_settings_path()
}

/// Resolve where `config init` writes.
///
/// Same priority as [`resolve_settings_path`], except that without an
/// override a new file goes to the working directory unless `global` is set.
#[must_use]
pub fn settings_target_path(explicit_path: Option<&Path>, global: bool) -> Option<PathBuf> {
    if let Some(path) = override_path(explicit_path) {
        return Some(path);
    }

    if global {
        global_settings_path()
    } else {
        Some(PathBuf::from(LOCAL_SETTINGS_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_settings_path_with_explicit() {
        let explicit = PathBuf::from("/custom/path/settings.json");
        let result = resolve_settings_path(Some(&explicit));
        assert_eq!(result, Some(explicit));
    }

    #[test]
    fn test_settings_target_path_with_explicit_ignores_global() {
        let explicit = PathBuf::from("/custom/settings.json");
        assert_eq!(
            settings_target_path(Some(&explicit), true),
            Some(explicit)
        );
    }

    #[test]
    fn test_global_settings_path_ends_with_file_name() {
        if let Some(path) = global_settings_path() {
            assert!(path.ends_with("settings.json"));
            assert!(path.to_string_lossy().contains("vcconv"));
        }
    }

    #[test]
    fn test_default_file_names() {
        assert_eq!(DEFAULT_INPUT, "contacts.vcf");
        assert_eq!(DEFAULT_OUTPUT, "contacts_v4.vcf");
        assert_eq!(LOCAL_SETTINGS_FILE, "vcard_settings.json");
    }
}
