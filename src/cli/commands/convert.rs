//! Convert command implementation.
//!
//! Reads the Apple export, applies the saved settings (overridden by
//! flags), and writes the vCard 4.0 result. The first run without a
//! settings file asks the setup questions, the way the tool always has.

use crate::cli::ConvertArgs;
use crate::config::{
    interactive_setup, load_settings, resolve_settings_path, save_settings, Settings,
    LOCAL_SETTINGS_FILE,
};
use crate::error::Result;
use crate::io::{atomic_write, read_input, STDIO_PATH};
use crate::vcard::{convert_with_report, ConversionReport};
use colored::Colorize;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct ConvertOutput<'a> {
    input: &'a Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a Path>,
    dry_run: bool,
    #[serde(flatten)]
    report: &'a ConversionReport,
}

/// Execute the convert command.
///
/// # Errors
///
/// Returns an error if the input cannot be read, the settings file is
/// broken, or the output cannot be written.
pub fn execute(
    args: &ConvertArgs,
    settings_path: Option<&PathBuf>,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let settings = effective_settings(args, settings_path.map(PathBuf::as_path), json)?;
    let options = args.options(&settings);
    tracing::debug!(?options, "Conversion options");

    let input = read_input(&args.input)?;
    let conversion = convert_with_report(&input, &options);
    let report = &conversion.report;

    for index in &report.malformed_records {
        tracing::warn!(record = index, "Record has no END:VCARD; converted as-is");
    }
    if report.records == 0 {
        tracing::warn!(input = %args.input.display(), "No vCard records found in input");
    }

    let to_stdout = args.writes_stdout();
    if args.dry_run {
        tracing::info!("Dry run, nothing written");
    } else if to_stdout {
        let mut stdout = io::stdout().lock();
        stdout.write_all(conversion.output.as_bytes())?;
        stdout.flush()?;
    } else {
        atomic_write(&args.output, &conversion.output)?;
    }

    // The converted text owns stdout in that mode; the summary would corrupt it.
    if to_stdout && !args.dry_run {
        return Ok(());
    }

    let output = (!to_stdout).then_some(args.output.as_path());
    if json {
        let payload = ConvertOutput {
            input: &args.input,
            output,
            dry_run: args.dry_run,
            report,
        };
        println!("{}", serde_json::to_string(&payload)?);
    } else if !quiet {
        print_summary(report, output, args.dry_run);
    }

    Ok(())
}

/// Saved settings, or the answers to the first-run questions.
///
/// Questions are only asked when nothing was saved yet, a person is at
/// the terminal, and stdin is not carrying the vCard itself.
fn effective_settings(args: &ConvertArgs, explicit: Option<&Path>, json: bool) -> Result<Settings> {
    let path = resolve_settings_path(explicit);
    let saved = path.as_deref().is_some_and(Path::exists);

    let interactive = !json
        && args.input.as_os_str() != STDIO_PATH
        && io::stdin().is_terminal()
        && io::stdout().is_terminal();

    if saved || !interactive {
        return load_settings(path.as_deref());
    }

    let settings = interactive_setup(&mut io::stdin().lock(), &mut io::stdout())?;
    let target = explicit.map_or_else(|| PathBuf::from(LOCAL_SETTINGS_FILE), Path::to_path_buf);
    save_settings(&target, &settings)?;
    println!("Settings saved to {}", target.display());
    Ok(settings)
}

fn print_summary(report: &ConversionReport, output: Option<&Path>, dry_run: bool) {
    let verb = if dry_run { "Would convert" } else { "Converted" };
    let noun = if report.records == 1 { "contact" } else { "contacts" };
    println!("{} {} {noun}", verb.green().bold(), report.records);

    if let Some(path) = output {
        let label = if dry_run { "Would write" } else { "Output" };
        println!("  {label}: {}", path.display());
    }

    let details = [
        ("Organizations", report.organizations),
        ("Formatted names derived", report.derived_formatted_names),
        ("Apple-specific lines removed", report.apple_lines_removed),
        ("Photos removed", report.photos_removed),
        ("Formatted names removed", report.formatted_names_removed),
    ];
    for (label, count) in details.into_iter().filter(|(_, count)| *count > 0) {
        println!("  {label}: {count}");
    }

    if !report.malformed_records.is_empty() {
        println!(
            "  {} {} record(s) without END:VCARD",
            "Warning:".yellow().bold(),
            report.malformed_records.len()
        );
    }

    if !dry_run {
        println!();
        println!("Next: import the file at contacts.google.com > Import.");
    }
}
