//! Ignore-file maintenance
//!
//! Append-only edits to files like `.gitignore` and `.prettierignore`:
//! an entry is added once, matched against existing lines exactly, and
//! existing content is never rewritten.

use std::path::Path;
use tracing::debug;

/// Ensure `entry` appears as an exact line in `file`. Missing files are
/// created. Returns whether the file changed.
pub fn ensure_ignore_entry(file: &Path, entry: &str) -> std::io::Result<bool> {
    let existing = match std::fs::read_to_string(file) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(err) => return Err(err),
    };

    if existing.lines().any(|line| line == entry) {
        return Ok(false);
    }

    let mut updated = existing;
    if updated.is_empty() {
        updated.push_str(entry);
        updated.push('\n');
    } else {
        if !updated.ends_with('\n') {
            updated.push('\n');
        }
        // leading blank line separates the appended entry
        updated.push('\n');
        updated.push_str(entry);
        updated.push('\n');
    }
    std::fs::write(file, updated)?;
    debug!("Added '{}' to {}", entry, file.display());
    Ok(true)
}
