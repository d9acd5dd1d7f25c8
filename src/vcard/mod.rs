//! Apple vCard 3.0 to vCard 4.0 conversion.
//!
//! The conversion is a pure function over text:
//!
//! 1. [`Document::parse`] splits the input into records, keeping every
//!    physical line and its terminator.
//! 2. Each logical line is tagged with a [`PropertyKind`].
//! 3. [`convert_with_report`] rewrites records line by line and reassembles
//!    the document.
//!
//! # Example
//!
//! ```
//! use vcconv::vcard::{convert, ConversionOptions};
//!
//! let input = "BEGIN:VCARD\nVERSION:3.0\nN:;;;;\nORG:Acme Corp;;\nEND:VCARD\n";
//! let output = convert(input, &ConversionOptions::default());
//! assert_eq!(
//!     output,
//!     "BEGIN:VCARD\nVERSION:4.0\nN:;;;;\nFN:Acme Corp\nORG:Acme Corp;;\nEND:VCARD\n"
//! );
//! ```

mod convert;
mod document;
mod options;
mod property;

#[cfg(test)]
mod tests;

pub use convert::{convert, convert_with_report, Conversion, ConversionReport};
pub use document::{Document, LogicalLine, PhysicalLine, Record, Segment};
pub use options::{ConversionOptions, OrganizationDetection};
pub use property::{ContentLine, PropertyKind};
