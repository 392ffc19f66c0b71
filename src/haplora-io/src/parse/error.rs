use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to create parent directory")]
    CreateParentDirectory(#[source] std::io::Error),

    #[error("{path} already exists. Use --overwrite to allow file overwrite")]
    OverwriteDisallowed { path: PathBuf },

    #[error("Path contains invalid UTF-8 characters")]
    InvalidFilename,

    #[error("No file matching the requested extension(s) was found")]
    MissingInput,
}
