use thiserror::Error;

#[derive(Error, Debug)]
#[error("Failed to parse the provided character into a valid allele")]
pub struct ParseAlleleError;
