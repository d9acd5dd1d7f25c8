//! File operations around the conversion.
//!
//! - Reading the Apple export (file or stdin)
//! - Atomic writes: write to temp file, sync to disk, then rename

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::error::{Error, Result};

/// Path meaning "standard input / output".
pub const STDIO_PATH: &str = "-";

/// Read the whole input document.
///
/// `-` reads standard input.
///
/// # Errors
///
/// Returns `InputNotFound` if the file does not exist, `InvalidInput` if it
/// is not UTF-8, and `Io` for other read failures.
pub fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == STDIO_PATH {
        let mut bytes = Vec::new();
        std::io::stdin().read_to_end(&mut bytes)?;
        return decode(bytes, path);
    }

    if !path.exists() {
        return Err(Error::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let bytes = fs::read(path)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Read input");
    decode(bytes, path)
}

fn decode(bytes: Vec<u8>, path: &Path) -> Result<String> {
    let mut text = String::from_utf8(bytes).map_err(|e| {
        Error::InvalidInput(format!(
            "{} is not valid UTF-8 (byte offset {})",
            path.display(),
            e.utf8_error().valid_up_to()
        ))
    })?;

    // Apple's exporter may prepend a byte order mark.
    if text.starts_with('\u{feff}') {
        text.drain(..'\u{feff}'.len_utf8());
    }
    Ok(text)
}

/// Write content to a file atomically.
///
/// This function:
/// 1. Writes content to a temporary file next to the target
/// 2. Calls `fsync` to ensure data is on disk
/// 3. Atomically renames the temp file to the target path
///
/// If any step fails, the original file (if any) remains untouched.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    fs::rename(&temp_path, path)?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "Wrote output");

    Ok(())
}
