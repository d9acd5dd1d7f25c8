//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Settings, DEFAULT_INPUT, DEFAULT_OUTPUT};
use crate::vcard::{ConversionOptions, OrganizationDetection};

pub mod commands;

/// Convert Apple Contacts vCard 3.0 exports to vCard 4.0 for Google Contacts
#[derive(Parser, Debug)]
#[command(name = "vcconv", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (default: ./vcard_settings.json, then the user config dir)
    #[arg(long, global = true, env = "VCCONV_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a vCard 3.0 export to vCard 4.0
    Convert(ConvertArgs),

    /// Show or change the saved conversion settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Print version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Convert
// ============================================================================

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Apple Contacts export to read ("-" for stdin)
    #[arg(default_value = DEFAULT_INPUT)]
    pub input: PathBuf,

    /// Where to write the vCard 4.0 file ("-" for stdout)
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Write the converted document to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,

    /// Drop embedded photos
    #[arg(long, conflicts_with = "keep_photos")]
    pub remove_photos: bool,

    /// Keep embedded photos
    #[arg(long)]
    pub keep_photos: bool,

    /// Drop FN (formatted name) fields
    #[arg(long, conflicts_with = "keep_fn")]
    pub remove_fn: bool,

    /// Keep FN (formatted name) fields
    #[arg(long)]
    pub keep_fn: bool,

    /// How to recognize company contacts
    #[arg(long, value_enum)]
    pub org_detection: Option<OrganizationDetection>,

    /// Add KIND:org to company contacts
    #[arg(long)]
    pub mark_orgs: bool,

    /// Leave parameter names as exported (no type= to TYPE= rewrite)
    #[arg(long)]
    pub keep_param_case: bool,

    /// Convert and report without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

impl ConvertArgs {
    /// Settings, overridden by whichever flags were given.
    #[must_use]
    pub fn options(&self, settings: &Settings) -> ConversionOptions {
        let mut options = settings.to_options();

        if self.remove_photos {
            options.remove_photos = true;
        } else if self.keep_photos {
            options.remove_photos = false;
        }

        if self.remove_fn {
            options.remove_formatted_name = true;
        } else if self.keep_fn {
            options.remove_formatted_name = false;
        }

        if let Some(detection) = self.org_detection {
            options.organization_detection = detection;
        }
        if self.mark_orgs {
            options.mark_organizations = true;
        }
        if self.keep_param_case {
            options.normalize_parameters = false;
        }

        options
    }

    /// Whether the converted text goes to stdout.
    #[must_use]
    pub fn writes_stdout(&self) -> bool {
        self.stdout || self.output.as_os_str() == crate::io::STDIO_PATH
    }
}

// ============================================================================
// Config
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective settings
    Show,

    /// Print the settings file path
    Path,

    /// Create the settings file (asks when run in a terminal)
    Init {
        /// Write to the user config dir instead of ./vcard_settings.json
        #[arg(long)]
        global: bool,

        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,

        /// Skip the questions and write the defaults
        #[arg(long)]
        defaults: bool,
    },

    /// Change one setting
    Set {
        /// Setting name (remove_fn, remove_photos, org_detection, mark_organizations, normalize_parameters)
        key: String,

        /// New value
        value: String,
    },

    /// Delete the settings file
    Reset,
}
