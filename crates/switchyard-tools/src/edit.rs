//! Text edits on top of a [`FileSystem`]
//!
//! Each edit reads the whole file, computes the new text in memory and
//! issues exactly one write, so a failed edit leaves the file untouched.

use crate::error::{Error, Result};
use crate::fs::FileSystem;
use tracing::debug;

/// Replace every occurrence of `find` with `replace`.
///
/// Returns the number of replacements. Fails without writing when `find`
/// is empty or does not occur in the file.
pub async fn replace_text(
    fs: &dyn FileSystem,
    path: &str,
    find: &str,
    replace: &str,
) -> Result<usize> {
    if find.is_empty() {
        return Err(Error::InvalidInput("search text must not be empty".to_string()));
    }

    let original = fs.read_all_text(path).await?;
    let count = original.matches(find).count();
    if count == 0 {
        return Err(Error::InvalidInput(format!(
            "search text not found in '{path}'"
        )));
    }

    let updated = original.replace(find, replace);
    fs.write_all_text(path, &updated).await?;
    debug!(path = %path, replacements = count, "Replaced text");
    Ok(count)
}

/// Append `content` to a file, creating it when missing.
///
/// Returns the new length of the file in bytes.
pub async fn append_text(fs: &dyn FileSystem, path: &str, content: &str) -> Result<usize> {
    let mut text = if fs.file_exists(path).await? {
        fs.read_all_text(path).await?
    } else {
        String::new()
    };
    text.push_str(content);
    fs.write_all_text(path, &text).await?;
    Ok(text.len())
}
