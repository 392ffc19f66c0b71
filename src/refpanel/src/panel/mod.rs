use ahash::AHashMap;
use itertools::Itertools;
use log::debug;

use genome::{Position, SnpCoord};
use popbits::BitSlab;

use crate::sample::SampleRecord;

mod error;
pub use error::SchemaError;

/// An immutable, in-memory phased reference panel: an ordered SNP legend, a
/// bit-packed haplotype matrix (one row per SNP, one bit per haplotype,
/// 0 = reference allele, 1 = alternate allele) and the sample table mapping
/// haplotype columns to individuals and superpopulations.
///
/// Loaded once per run; every later stage only holds shared references.
#[derive(Debug)]
pub struct ReferencePanel {
    legend: Vec<SnpCoord>,
    rows: Vec<BitSlab>,
    samples: Vec<SampleRecord>,
    superpop_masks: AHashMap<String, BitSlab>,
    n_haplotypes: usize,
}

impl ReferencePanel {
    /// Assemble a panel from its three loaded artifacts, checking their
    /// mutual consistency.
    ///
    /// # Errors
    /// Returns a [`SchemaError`] whenever row/column counts disagree, the
    /// legend is out of order, or a sample lacks a superpopulation label.
    /// Duplicated legend positions are rejected unless `allow_duplicates`.
    pub fn from_parts(
        legend: Vec<SnpCoord>,
        rows: Vec<BitSlab>,
        samples: Vec<SampleRecord>,
        allow_duplicates: bool,
    ) -> Result<Self, SchemaError> {
        if legend.is_empty() {
            return Err(SchemaError::EmptyPanel);
        }
        if samples.is_empty() {
            return Err(SchemaError::NoSamples);
        }
        if legend.len() != rows.len() {
            return Err(SchemaError::RowCountMismatch { legend: legend.len(), haplotypes: rows.len() });
        }

        let n_haplotypes = 2 * samples.len();
        for (row, bits) in rows.iter().enumerate() {
            if bits.len() != n_haplotypes {
                return Err(SchemaError::ColumnCountMismatch {
                    row,
                    expected: n_haplotypes,
                    found: bits.len(),
                });
            }
        }

        for (row, pair) in legend.windows(2).enumerate() {
            let (previous, current) = (pair[0].position, pair[1].position);
            if current < previous {
                return Err(SchemaError::DecreasingLegend { row: row + 1, position: current });
            }
            if current == previous && !allow_duplicates {
                return Err(SchemaError::UnsortedLegend { row: row + 1, position: current });
            }
        }

        for sample in &samples {
            if sample.superpopulation.is_empty() {
                return Err(SchemaError::MissingSuperpopulation(sample.id.clone()));
            }
        }

        let superpop_masks = Self::build_superpop_masks(&samples, n_haplotypes);
        debug!(
            "Reference panel: {} SNPs x {} haplotypes ({} superpopulations: {})",
            legend.len(),
            n_haplotypes,
            superpop_masks.len(),
            superpop_masks.keys().sorted().join(", ")
        );

        Ok(Self { legend, rows, samples, superpop_masks, n_haplotypes })
    }

    // One precomputed boolean column mask per superpopulation; subsetting
    // and ancestry mixtures are pure mask operations afterwards.
    fn build_superpop_masks(samples: &[SampleRecord], n_haplotypes: usize) -> AHashMap<String, BitSlab> {
        let mut masks: AHashMap<String, BitSlab> = AHashMap::new();
        for (index, sample) in samples.iter().enumerate() {
            let mask = masks
                .entry(sample.superpopulation.clone())
                .or_insert_with(|| BitSlab::zeroes(n_haplotypes));
            mask.set(2 * index, true);
            mask.set(2 * index + 1, true);
        }
        masks
    }

    #[must_use]
    pub fn n_snps(&self) -> usize {
        self.legend.len()
    }

    #[must_use]
    pub fn n_haplotypes(&self) -> usize {
        self.n_haplotypes
    }

    #[must_use]
    pub fn samples(&self) -> &[SampleRecord] {
        &self.samples
    }

    #[must_use]
    pub fn snp(&self, index: usize) -> &SnpCoord {
        &self.legend[index]
    }

    /// The haplotype bit row of the SNP at `index` (bit j set ⟺ haplotype j
    /// carries the alternate allele).
    #[must_use]
    pub fn row(&self, index: usize) -> &BitSlab {
        &self.rows[index]
    }

    /// Binary search the ordered legend for a physical position.
    /// With duplicated positions allowed, returns the first matching row.
    #[must_use]
    pub fn find(&self, position: Position) -> Option<usize> {
        let index = self.legend.partition_point(|snp| snp.position < position);
        (index < self.legend.len() && self.legend[index].position == position).then_some(index)
    }

    /// Superpopulation labels present in the sample table, sorted.
    pub fn superpopulations(&self) -> impl Iterator<Item = &String> {
        self.superpop_masks.keys().sorted()
    }

    /// The haplotype-column mask of a superpopulation. The mask borrows no
    /// matrix storage: subsetting never copies the haplotypes.
    #[must_use]
    pub fn superpop_mask(&self, label: &str) -> Option<&BitSlab> {
        self.superpop_masks.get(label)
    }

    /// Alternate-allele frequency of the SNP at `index`, restricted to the
    /// haplotype columns of `mask`.
    #[must_use]
    pub fn alt_frequency(&self, index: usize, mask: &BitSlab) -> f64 {
        let eligible = mask.count_ones();
        if eligible == 0 {
            return 0.0;
        }
        self.rows[index].intersection_count(mask) as f64 / eligible as f64
    }
}
