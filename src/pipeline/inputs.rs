//! Input discovery.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File extensions picked up from the input tree. Matching is case-sensitive.
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["jpg", "png"];

/// Recursively collect every supported image under `root`, sorted by path.
///
/// Symbolic links to directories are not followed.
///
/// # Errors
///
/// Returns an error if `root` or any directory below it cannot be read.
pub fn enumerate_inputs<P: AsRef<Path>>(root: P) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    walk(root.as_ref(), &mut found)?;
    found.sort();
    Ok(found)
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if entry.file_type()?.is_dir() {
            walk(&path, found)?;
        } else if is_supported(&path) && path.is_file() {
            found.push(path);
        }
    }
    Ok(())
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
}
