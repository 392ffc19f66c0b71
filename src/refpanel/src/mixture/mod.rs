use itertools::Itertools;
use log::debug;

use popbits::BitSlab;

use crate::panel::ReferencePanel;

mod error;
pub use error::InvalidMixtureError;

/// Accepted deviation between 1.0 and the sum of user-provided ancestry
/// proportions.
pub const PROPORTION_SUM_TOLERANCE: f64 = 1e-6;

/// One superpopulation's share of an ancestry mixture.
#[derive(Debug, Clone)]
pub struct MixtureComponent {
    pub label: String,
    pub weight: f64,
    pub mask: BitSlab,
    pub n_columns: usize,
}

/// A sample's declared ancestry makeup, resolved against the panel into a
/// weighting over haplotype columns.
///
/// Frequencies are estimated per superpopulation and combined as the
/// proportion-weighted mean — the same rule is applied to single-SNP allele
/// frequencies (haplotype-frequency filtering) and to joint frequencies of
/// read-support sets (scenario likelihoods). Columns outside every component
/// carry weight zero everywhere.
#[derive(Debug, Clone)]
pub struct AncestryMixture {
    components: Vec<MixtureComponent>,
    eligible: BitSlab,
}

impl AncestryMixture {
    /// Resolve superpopulation labels (and optional explicit proportions)
    /// against the panel's sample table.
    ///
    /// A single label receives weight 1; several labels without explicit
    /// proportions are weighted uniformly.
    ///
    /// # Errors
    /// [`InvalidMixtureError`] when labels are empty, duplicated or unknown,
    /// or when explicit proportions are malformed.
    pub fn resolve(
        panel: &ReferencePanel,
        labels: &[String],
        proportions: Option<&[f64]>,
    ) -> Result<Self, InvalidMixtureError> {
        use InvalidMixtureError::*;
        if labels.is_empty() {
            return Err(NoLabels);
        }
        if let Some(duplicate) = labels.iter().duplicates().next() {
            return Err(DuplicateLabel(duplicate.clone()));
        }

        let weights: Vec<f64> = match proportions {
            None => vec![1.0 / labels.len() as f64; labels.len()],
            Some(proportions) => {
                if proportions.len() != labels.len() {
                    return Err(ProportionCountMismatch {
                        labels: labels.len(),
                        proportions: proportions.len(),
                    });
                }
                if let Some(bad) = proportions.iter().find(|p| **p <= 0.0) {
                    return Err(NonPositiveProportion(*bad));
                }
                let sum: f64 = proportions.iter().sum();
                if (sum - 1.0).abs() > PROPORTION_SUM_TOLERANCE {
                    return Err(InvalidProportionSum(sum));
                }
                proportions.to_vec()
            }
        };

        let mut components = Vec::with_capacity(labels.len());
        let mut eligible = BitSlab::zeroes(panel.n_haplotypes());
        for (label, weight) in labels.iter().zip(weights) {
            let mask = panel.superpop_mask(label).ok_or_else(|| UnknownSuperpopulation {
                label: label.clone(),
                available: panel.superpopulations().join(", "),
            })?;
            eligible |= mask;
            components.push(MixtureComponent {
                label: label.clone(),
                weight,
                n_columns: mask.count_ones(),
                mask: mask.clone(),
            });
        }

        debug!(
            "Ancestry mixture: {} ({} eligible haplotypes)",
            components.iter().map(|c| format!("{}={:.3}", c.label, c.weight)).join(" "),
            eligible.count_ones()
        );
        Ok(Self { components, eligible })
    }

    #[must_use]
    pub fn components(&self) -> &[MixtureComponent] {
        &self.components
    }

    /// Union of all component column masks.
    #[must_use]
    pub fn eligible(&self) -> &BitSlab {
        &self.eligible
    }

    #[must_use]
    pub fn n_eligible(&self) -> usize {
        self.eligible.count_ones()
    }

    /// Proportion-weighted frequency of a haplotype-column set: for each
    /// component, the fraction of its columns present in `bits`, combined by
    /// mixture weight. `bits` may be a single panel row or an
    /// AND-accumulated read-support set.
    #[must_use]
    pub fn weighted_frequency(&self, bits: &BitSlab) -> f64 {
        self.components.iter()
            .map(|c| c.weight * bits.intersection_count(&c.mask) as f64 / c.n_columns as f64)
            .sum()
    }
}
