//! Shared test fixtures.

use genome::{Allele, SnpCoord};
use popbits::BitSlab;

use crate::panel::ReferencePanel;
use crate::sample::{SampleRecord, Sex};

/// The documented toy panel: 3 SNPs (positions 123, 456, 789), 4 individuals
/// (8 haplotypes), two superpopulations. CEU1's second haplotype (column 1)
/// reads alt/ref/alt; YRI1's haplotypes (columns 4, 5) differ from it at
/// every position.
pub(crate) fn toy_panel() -> ReferencePanel {
    let legend = vec![
        SnpCoord::new("rs11", 123, Allele::A, Allele::G),
        SnpCoord::new("rs22", 456, Allele::T, Allele::C),
        SnpCoord::new("rs33", 789, Allele::G, Allele::A),
    ];
    let rows = vec![
        //                   CEU1        CEU2         YRI1          YRI2
        BitSlab::from_bits(&[false, true, true, false, false, false, true, false]),
        BitSlab::from_bits(&[true, false, false, true, true, true, false, true]),
        BitSlab::from_bits(&[false, true, false, false, false, false, false, true]),
    ];
    let samples = vec![
        SampleRecord::new("CEU1", "CEU", "EUR", Sex::Female),
        SampleRecord::new("CEU2", "CEU", "EUR", Sex::Male),
        SampleRecord::new("YRI1", "YRI", "AFR", Sex::Female),
        SampleRecord::new("YRI2", "YRI", "AFR", Sex::Male),
    ];
    ReferencePanel::from_parts(legend, rows, samples, false).expect("valid toy panel")
}
