//! vcconv - Apple Contacts vCard 3.0 to vCard 4.0 converter
//!
//! This crate provides the conversion core and the `vcconv` CLI around it.
//!
//! # Architecture
//!
//! - [`vcard`] - Line-level vCard 3.0 to 4.0 conversion (never fails)
//! - [`cli`] - Command-line interface using clap
//! - [`config`] - Settings file resolution and first-run setup
//! - [`io`] - Reading exports and atomic output writes
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod vcard;

pub use error::{Error, Result};
pub use vcard::{convert, convert_with_report, ConversionOptions};
