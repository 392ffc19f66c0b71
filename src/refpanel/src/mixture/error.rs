use thiserror::Error;

/// Malformed ancestry specifications. Fatal: resolved once, before any
/// window work starts.
#[derive(Error, Debug)]
pub enum InvalidMixtureError {
    #[error("an ancestry mixture requires at least one superpopulation label")]
    NoLabels,

    #[error("superpopulation '{0}' was provided more than once")]
    DuplicateLabel(String),

    #[error("superpopulation '{label}' is absent from the reference panel (available: {available})")]
    UnknownSuperpopulation { label: String, available: String },

    #[error("{labels} superpopulation label(s) were provided, along with {proportions} proportion(s)")]
    ProportionCountMismatch { labels: usize, proportions: usize },

    #[error("ancestry proportions must be strictly positive (got {0})")]
    NonPositiveProportion(f64),

    #[error("ancestry proportions must sum to 1 (got {0})")]
    InvalidProportionSum(f64),
}
