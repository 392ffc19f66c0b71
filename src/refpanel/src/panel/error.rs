use genome::Position;
use thiserror::Error;

/// Structural inconsistencies between the legend, haplotype matrix and
/// sample table. All of these are fatal: they surface once, at load time,
/// before any window is processed.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("the legend defines {legend} SNPs, but the haplotype matrix contains {haplotypes} rows")]
    RowCountMismatch { legend: usize, haplotypes: usize },

    #[error("haplotype row {row} defines {found} columns, expected {expected} (two per sample)")]
    ColumnCountMismatch { row: usize, expected: usize, found: usize },

    #[error("legend positions are not strictly increasing at row {row} (position {position}). \
             Use --allow-duplicates if the legend intentionally carries duplicated positions")]
    UnsortedLegend { row: usize, position: Position },

    #[error("legend positions are decreasing at row {row} (position {position})")]
    DecreasingLegend { row: usize, position: Position },

    #[error("sample '{0}' carries an empty superpopulation label")]
    MissingSuperpopulation(String),

    #[error("the reference panel contains no SNPs")]
    EmptyPanel,

    #[error("the reference panel contains no samples")]
    NoSamples,
}
