use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PanelReaderError {
    #[error("no '*.{0}' file was found in the panel directory")]
    NotFound(&'static str),

    #[error("multiple '*.{0}' candidates were found in the panel directory: {1:?}")]
    MultipleFound(&'static str, Vec<PathBuf>),

    #[error("[line {line}] expected at least {expected} whitespace-separated fields, found {found}")]
    FieldCount { line: usize, expected: usize, found: usize },

    #[error("[line {line}] invalid haplotype state '{value}' (expected 0 or 1)")]
    InvalidHaplotypeState { line: usize, value: String },

    #[error("[line {line}] haplotype row holds {found} columns, while the first row holds {expected}")]
    RaggedHaplotypeRow { line: usize, expected: usize, found: usize },
}
