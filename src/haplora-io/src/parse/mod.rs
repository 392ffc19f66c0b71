use std::{fs, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use log::trace;

mod error;
pub use error::ParseError;

/// Attempt to create the parent directories of a path (if needed).
pub fn create_parent_directory(path: &Path) -> Result<()> {
    let parent_dir = path.parent().unwrap_or(path);
    fs::create_dir_all(parent_dir)
        .map_err(ParseError::CreateParentDirectory)
        .with_context(|| format!("While attempting to create output directory '{}'", path.display()))?;
    Ok(())
}

/// Attempt to convert a path to string.
pub fn maybe_to_str(path: &Path) -> Result<&str> {
    path.to_str().ok_or(ParseError::InvalidFilename)
        .context("While converting path to string")
}

/// Check whether a file may be written: raise an error when it already
/// exists and the user did not explicitly allow overwriting.
pub fn can_write_file(overwrite: bool, path: &Path) -> Result<()> {
    if !overwrite && path.exists() {
        return Err(ParseError::OverwriteDisallowed { path: path.to_path_buf() })
            .context("While ensuring that file permissions were appropriate");
    }
    Ok(())
}

/// Iterate over the contents of an OS-directory and search for all files
/// matching a given list of extensions. Chained extensions such as
/// 'legend.gz' are matched by suffix, on purpose.
pub fn fetch_input_files(input_dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(input_dir)
        .with_context(|| format!("While reading directory '{}'", input_dir.display()))?
        .filter_map(|file| {
            let file = file.ok()?.path();
            let name = file.to_str().unwrap_or("");
            extensions.iter()
                .any(|ext| name.ends_with(&format!(".{ext}")))
                .then_some(file)
        })
        .collect();

    if files.is_empty() {
        return Err(ParseError::MissingInput)
            .with_context(|| format!(
                "While searching for *.{{{}}} files in '{}'",
                extensions.join(","),
                input_dir.display()
            ));
    }
    files.sort();
    trace!("Input file candidates: {files:#?}");
    Ok(files)
}
