use std::fmt::{self, Display, Formatter};

pub mod generic_writer;
pub use generic_writer::{GenericWriter, WriterError};

pub mod report;
pub use report::{ReportMetadata, ScanReport, SummaryRecord, WindowRecord};

/// Output compression scheme. A presentation-layer concern: the writers only
/// expose the hook, nothing downstream depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Gzip,
}

impl Compression {
    /// Filename suffix appended to compressed outputs.
    #[must_use]
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Gzip => ".gz",
        }
    }
}

impl Display for Compression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
        }.fmt(f)
    }
}
