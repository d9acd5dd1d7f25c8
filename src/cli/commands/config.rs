//! Config command implementations.

use crate::cli::ConfigCommands;
use crate::config::{
    interactive_setup, load_settings, resolve_settings_path, save_settings,
    settings_target_path, Settings,
};
use crate::error::{Error, Result};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct ShowOutput<'a> {
    path: Option<&'a Path>,
    exists: bool,
    settings: &'a Settings,
}

#[derive(Serialize)]
struct PathOutput<'a> {
    path: &'a Path,
    exists: bool,
}

#[derive(Serialize)]
struct ResetOutput<'a> {
    path: &'a Path,
    removed: bool,
}

/// Execute config subcommands.
///
/// # Errors
///
/// Returns an error if the settings file cannot be read or written, or a
/// key/value given to `set` is invalid.
pub fn execute(command: &ConfigCommands, settings_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let explicit = settings_path.map(PathBuf::as_path);
    match command {
        ConfigCommands::Show => show(explicit, json),
        ConfigCommands::Path => path(explicit, json),
        ConfigCommands::Init {
            global,
            force,
            defaults,
        } => init(explicit, *global, *force, *defaults, json),
        ConfigCommands::Set { key, value } => set(explicit, key, value, json),
        ConfigCommands::Reset => reset(explicit, json),
    }
}

fn resolved(explicit: Option<&Path>) -> Result<PathBuf> {
    resolve_settings_path(explicit)
        .ok_or_else(|| Error::Config("Could not determine settings location".to_string()))
}

fn show(explicit: Option<&Path>, json: bool) -> Result<()> {
    let path = resolve_settings_path(explicit);
    let exists = path.as_deref().is_some_and(Path::exists);
    let settings = load_settings(path.as_deref())?;

    if json {
        let output = ShowOutput {
            path: path.as_deref(),
            exists,
            settings: &settings,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    match (&path, exists) {
        (Some(p), true) => println!("{} {}", "Settings:".bold(), p.display()),
        (Some(p), false) => println!(
            "{} {} {}",
            "Settings:".bold(),
            p.display(),
            "(not created, showing defaults)".dimmed()
        ),
        (None, _) => println!("{} {}", "Settings:".bold(), "defaults".dimmed()),
    }
    println!("  remove_fn:            {}", settings.remove_fn);
    println!("  remove_photos:        {}", settings.remove_photos);
    println!("  org_detection:        {}", settings.org_detection);
    println!("  mark_organizations:   {}", settings.mark_organizations);
    println!("  normalize_parameters: {}", settings.normalize_parameters);
    Ok(())
}

fn path(explicit: Option<&Path>, json: bool) -> Result<()> {
    let path = resolved(explicit)?;
    let exists = path.exists();

    if json {
        let output = PathOutput { path: &path, exists };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", path.display());
    }
    Ok(())
}

fn init(explicit: Option<&Path>, global: bool, force: bool, defaults: bool, json: bool) -> Result<()> {
    let path = settings_target_path(explicit, global)
        .ok_or_else(|| Error::Config("Could not determine global config directory".to_string()))?;

    if path.exists() && !force {
        return Err(Error::AlreadyInitialized { path });
    }

    let ask = !defaults && !json && io::stdin().is_terminal();
    let settings = if ask {
        interactive_setup(&mut io::stdin().lock(), &mut io::stdout())?
    } else {
        Settings::default()
    };

    save_settings(&path, &settings)?;

    if json {
        let output = ShowOutput {
            path: Some(&path),
            exists: true,
            settings: &settings,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{} {}", "Saved settings to".green(), path.display());
    }
    Ok(())
}

fn set(explicit: Option<&Path>, key: &str, value: &str, json: bool) -> Result<()> {
    let path = resolved(explicit)?;
    let mut settings = load_settings(Some(&path))?;
    settings.set(key, value)?;
    save_settings(&path, &settings)?;

    if json {
        let output = ShowOutput {
            path: Some(&path),
            exists: true,
            settings: &settings,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Set {} = {} in {}", key.bold(), value, path.display());
    }
    Ok(())
}

fn reset(explicit: Option<&Path>, json: bool) -> Result<()> {
    let path = resolved(explicit)?;
    let removed = path.exists();
    if removed {
        fs::remove_file(&path)?;
        tracing::info!(path = %path.display(), "Removed settings file");
    }

    if json {
        let output = ResetOutput {
            path: &path,
            removed,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if removed {
        println!("Removed {}", path.display());
    } else {
        println!("No settings file at {}", path.display());
    }
    Ok(())
}
