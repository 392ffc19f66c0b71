use thiserror::Error;

#[derive(Error, Debug)]
pub enum ObsReaderError {
    #[error("[line {line}] expected at least 3 whitespace-separated fields (position, read id, base), found {found}")]
    FieldCount { line: usize, found: usize },
}
