mod allele;
pub use allele::{Allele, ParseAlleleError};

use std::cmp::Ordering;
use std::error::Error;
use std::hash::{Hash, Hasher};

use anyhow::{Context, Result};

use crate::coordinate::Position;

/// A biallelic SNP record from a reference-panel legend.
///
/// Equality, ordering and hashing consider the position only: legend
/// positions are unique along a chromosome, and windows/lookups are keyed by
/// position, not by allele content.
#[derive(Debug, Clone)]
pub struct SnpCoord {
    pub id: String,
    pub position: Position,
    pub reference: Allele,
    pub alternate: Allele,
}

impl SnpCoord {
    pub fn new(id: impl Into<String>, position: impl Into<Position>, reference: Allele, alternate: Allele) -> Self {
        Self { id: id.into(), position: position.into(), reference, alternate }
    }

    /// Fallible constructor, parsing the provided alleles.
    pub fn try_new<T>(id: impl Into<String>, position: impl Into<Position>, reference: T, alternate: T) -> Result<Self>
    where
        T: TryInto<Allele>,
        T::Error: Error + Sync + Send + 'static,
    {
        let position = position.into();
        let context = || format!("While parsing SNP at position {position}");
        let reference = reference.try_into().with_context(context)?;
        let alternate = alternate.try_into().with_context(context)?;
        Ok(Self { id: id.into(), position, reference, alternate })
    }

    /// Whether `base` matches either of this SNP's declared alleles.
    #[must_use]
    pub fn carries(&self, base: Allele) -> bool {
        base == self.reference || base == self.alternate
    }
}

impl std::fmt::Display for SnpCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}/{}", self.id, self.position, self.reference, self.alternate)
    }
}

impl PartialEq<Self> for SnpCoord {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
    }
}

impl Eq for SnpCoord {}

impl Ord for SnpCoord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.position.cmp(&other.position)
    }
}

impl PartialOrd for SnpCoord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for SnpCoord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.position.hash(state);
    }
}
