//! Command implementations.

pub mod completions;
pub mod config;
pub mod convert;
pub mod version;
