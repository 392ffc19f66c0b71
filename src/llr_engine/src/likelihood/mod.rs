use std::fmt::{self, Display, Formatter};

use popbits::BitSlab;
use refpanel::AncestryMixture;

use crate::scorer::ScoredRead;

/// Competing ploidy scenarios, each defined by its haplotype-copy multiset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ploidy {
    /// A single haplotype copy.
    Monosomy,
    /// Two unmatched haplotypes.
    Disomy,
    /// Single Parental Homolog: two identical copies plus one unmatched.
    Sph,
    /// Both Parental Homologs: three unmatched haplotypes.
    Bph,
}

impl Ploidy {
    /// Total number of haplotype copies the scenario assumes.
    #[must_use]
    pub const fn n_copies(&self) -> u32 {
        match self {
            Self::Monosomy => 1,
            Self::Disomy => 2,
            Self::Sph | Self::Bph => 3,
        }
    }
}

impl Display for Ploidy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Monosomy => "monosomy",
            Self::Disomy => "disomy",
            Self::Sph => "SPH",
            Self::Bph => "BPH",
        }.fmt(f)
    }
}

/// Floor applied to log-likelihoods when a scenario assigns zero probability
/// to the observed reads. Close to ln(f64::MIN_POSITIVE); large enough to
/// dominate any real evaluation, finite enough to keep LLRs well-defined.
pub const LOG_LIKELIHOOD_FLOOR: f64 = -708.0;

fn ln_guarded(likelihood: f64) -> f64 {
    if likelihood > 0.0 {
        likelihood.ln().max(LOG_LIKELIHOOD_FLOOR)
    } else {
        LOG_LIKELIHOOD_FLOOR
    }
}

/// The four scenario likelihoods of one read set.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioLikelihoods {
    pub monosomy: f64,
    pub disomy: f64,
    pub sph: f64,
    pub bph: f64,
}

impl ScenarioLikelihoods {
    #[must_use]
    pub fn get(&self, scenario: Ploidy) -> f64 {
        match scenario {
            Ploidy::Monosomy => self.monosomy,
            Ploidy::Disomy => self.disomy,
            Ploidy::Sph => self.sph,
            Ploidy::Bph => self.bph,
        }
    }

    /// `ln L(a) - ln L(b)`, floored in log space. Antisymmetric by
    /// construction: `log_ratio(a, b) == -log_ratio(b, a)` exactly.
    #[must_use]
    pub fn log_ratio(&self, a: Ploidy, b: Ploidy) -> f64 {
        ln_guarded(self.get(a)) - ln_guarded(self.get(b))
    }
}

/// Evaluates the joint probability of a window's scored reads under each
/// ploidy scenario.
///
/// Model: every read independently originates from one of the scenario's
/// haplotype copies, drawn uniformly; reads landing on copies of the same
/// haplotype are tied together through the joint frequency of their combined
/// support sets in the reference panel. Averaging over all read-to-copy
/// assignments collapses to sums of `F(S) * F(S̄)` products over read
/// subsets, with `F` the ancestry-weighted joint frequency.
pub struct LikelihoodModel<'a> {
    mixture: &'a AncestryMixture,
}

impl<'a> LikelihoodModel<'a> {
    #[must_use]
    pub fn new(mixture: &'a AncestryMixture) -> Self {
        Self { mixture }
    }

    /// Joint frequencies `F(S)` for every subset `S` of `reads`, indexed by
    /// subset bitmask. `F(∅) = 1`.
    ///
    /// Support-set intersections are AND-folded depth-first, so each of the
    /// `2^n` subsets costs a single wide-bitset AND plus popcounts.
    #[must_use]
    pub fn joint_frequencies(&self, reads: &[&ScoredRead]) -> Vec<f64> {
        let n = reads.len();
        debug_assert!(n < usize::BITS as usize, "read subset mask would overflow");
        let mut freqs = vec![0.0; 1 << n];
        freqs[0] = 1.0;

        fn descend(
            mixture: &AncestryMixture,
            reads: &[&ScoredRead],
            acc: &BitSlab,
            subset: usize,
            next: usize,
            freqs: &mut [f64],
        ) {
            for i in next..reads.len() {
                let joined = acc & &reads[i].support;
                let with_i = subset | 1 << i;
                freqs[with_i] = mixture.weighted_frequency(&joined);
                descend(mixture, reads, &joined, with_i, i + 1, freqs);
            }
        }

        // The root accumulator spans every eligible column: F of a single
        // read is then just the weighted frequency of its own support.
        let root = self.mixture.eligible().clone();
        descend(self.mixture, reads, &root, 0, 0, &mut freqs);
        freqs
    }

    /// All four scenario likelihoods from a table of joint frequencies.
    #[must_use]
    pub fn scenario_likelihoods(freqs: &[f64]) -> ScenarioLikelihoods {
        let size = freqs.len();
        debug_assert!(size.is_power_of_two());
        let n = size.trailing_zeros();
        let full = size - 1;

        // conv[t] = Σ_{u ⊆ t} F(u) * F(t \ u): the ordered two-way splits.
        let mut conv = vec![0.0; size];
        for t in 0..size {
            let mut u = t;
            loop {
                conv[t] += freqs[u] * freqs[t ^ u];
                if u == 0 {
                    break;
                }
                u = (u - 1) & t;
            }
        }

        let monosomy = freqs[full];
        let disomy = conv[full] / 2f64.powi(n as i32);

        let mut sph = 0.0;
        let mut bph = 0.0;
        for s in 0..size {
            // 2^|s| assignments put exactly the reads of s on the duplicated
            // homolog; the rest land on the singleton.
            sph += (1_u64 << (s as u64).count_ones()) as f64 * freqs[s] * freqs[full ^ s];
            bph += freqs[s] * conv[full ^ s];
        }
        let three_pow_n = 3f64.powi(n as i32);
        sph /= three_pow_n;
        bph /= three_pow_n;

        ScenarioLikelihoods { monosomy, disomy, sph, bph }
    }

    /// Log-likelihood ratio of `pair.0` against `pair.1` for a read set.
    #[must_use]
    pub fn llr(&self, reads: &[&ScoredRead], pair: (Ploidy, Ploidy)) -> f64 {
        let freqs = self.joint_frequencies(reads);
        let likelihoods = Self::scenario_likelihoods(&freqs);
        likelihoods.log_ratio(pair.0, pair.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use genome::{Allele, SnpCoord};
    use refpanel::{ReferencePanel, SampleRecord, Sex};

    const EPSILON: f64 = 1e-12;

    /// A 10-SNP, 3-individual (6 haplotype) single-superpopulation panel
    /// with a deliberately uneven allele distribution.
    fn small_panel() -> ReferencePanel {
        let legend: Vec<SnpCoord> = (1..=10)
            .map(|i| SnpCoord::new(format!("rs{i}"), i * 100, Allele::A, Allele::C))
            .collect();
        let rows = (0..10_usize)
            .map(|i| {
                let bits: Vec<bool> = (0..6).map(|hap| (i * 7 + hap * 3) % 5 < 2).collect();
                popbits::BitSlab::from_bits(&bits)
            })
            .collect();
        let samples = vec![
            SampleRecord::new("S1", "POP", "EUR", Sex::Unknown),
            SampleRecord::new("S2", "POP", "EUR", Sex::Unknown),
            SampleRecord::new("S3", "POP", "EUR", Sex::Unknown),
        ];
        ReferencePanel::from_parts(legend, rows, samples, false).expect("valid panel")
    }

    fn mixture(panel: &ReferencePanel) -> AncestryMixture {
        AncestryMixture::resolve(panel, &["EUR".to_string()], None).expect("valid mixture")
    }

    fn read(id: &str, support_columns: &[usize]) -> ScoredRead {
        ScoredRead {
            id: id.to_string(),
            support: popbits::BitSlab::from_indices(6, support_columns),
            n_sites: 1,
            score: 1,
        }
    }

    #[test]
    fn joint_frequencies_of_two_reads() {
        let panel = small_panel();
        let mixture = mixture(&panel);
        let model = LikelihoodModel::new(&mixture);

        let r1 = read("r1", &[0, 1, 2]);
        let r2 = read("r2", &[1, 2, 3, 4]);
        let freqs = model.joint_frequencies(&[&r1, &r2]);

        assert_eq!(freqs.len(), 4);
        assert!((freqs[0] - 1.0).abs() < EPSILON);
        assert!((freqs[0b01] - 3.0 / 6.0).abs() < EPSILON);
        assert!((freqs[0b10] - 4.0 / 6.0).abs() < EPSILON);
        assert!((freqs[0b11] - 2.0 / 6.0).abs() < EPSILON); // columns {1, 2}
    }

    /// The two-read scenario likelihoods collapse to textbook closed forms:
    /// MONOSOMY = ab, DISOMY = (ab + a·b)/2, SPH = (5ab + 4a·b)/9,
    /// BPH = (ab + 2a·b)/3, with a, b the marginals and ab the joint.
    #[test]
    fn two_read_closed_forms() {
        let panel = small_panel();
        let mixture = mixture(&panel);
        let model = LikelihoodModel::new(&mixture);

        let r1 = read("r1", &[0, 1, 2]);
        let r2 = read("r2", &[1, 2, 3, 4]);
        let freqs = model.joint_frequencies(&[&r1, &r2]);
        let (a, b, ab) = (freqs[0b01], freqs[0b10], freqs[0b11]);

        let got = LikelihoodModel::scenario_likelihoods(&freqs);
        assert!((got.monosomy - ab).abs() < EPSILON);
        assert!((got.disomy - (ab + a * b) / 2.0).abs() < EPSILON);
        assert!((got.sph - (5.0 * ab + 4.0 * a * b) / 9.0).abs() < EPSILON);
        assert!((got.bph - (ab + 2.0 * a * b) / 3.0).abs() < EPSILON);
    }

    /// Same exercise with three reads:
    /// MONOSOMY = abc, DISOMY = (abc + ab·c + ac·b + bc·a)/4,
    /// SPH = abc/3 + 2(ab·c + ac·b + bc·a)/9,
    /// BPH = (abc + 2(ab·c + ac·b + bc·a + a·b·c))/9.
    #[test]
    fn three_read_closed_forms() {
        let panel = small_panel();
        let mixture = mixture(&panel);
        let model = LikelihoodModel::new(&mixture);

        let r1 = read("r1", &[0, 1, 2, 5]);
        let r2 = read("r2", &[1, 2, 3, 4]);
        let r3 = read("r3", &[0, 2, 4, 5]);
        let freqs = model.joint_frequencies(&[&r1, &r2, &r3]);
        let (a, b, c) = (freqs[0b001], freqs[0b010], freqs[0b100]);
        let (ab, ac, bc) = (freqs[0b011], freqs[0b101], freqs[0b110]);
        let abc = freqs[0b111];

        let got = LikelihoodModel::scenario_likelihoods(&freqs);
        let splits = ab * c + ac * b + bc * a;
        assert!((got.monosomy - abc).abs() < EPSILON);
        assert!((got.disomy - (abc + splits) / 4.0).abs() < EPSILON);
        assert!((got.sph - (abc / 3.0 + 2.0 * splits / 9.0)).abs() < EPSILON);
        assert!((got.bph - (abc + 2.0 * (splits + a * b * c)) / 9.0).abs() < EPSILON);
    }

    #[test]
    fn llr_is_antisymmetric() {
        let panel = small_panel();
        let mixture = mixture(&panel);
        let model = LikelihoodModel::new(&mixture);

        let r1 = read("r1", &[0, 1, 2]);
        let r2 = read("r2", &[1, 2, 3, 4]);
        let r3 = read("r3", &[0, 2, 4, 5]);
        let reads = [&r1, &r2, &r3];

        use Ploidy::*;
        for a in [Monosomy, Disomy, Sph, Bph] {
            for b in [Monosomy, Disomy, Sph, Bph] {
                let forward = model.llr(&reads, (a, b));
                let backward = model.llr(&reads, (b, a));
                assert_eq!(forward, -backward, "LLR({a}, {b}) must equal -LLR({b}, {a})");
            }
        }
    }

    #[test]
    fn zero_likelihood_hits_the_floor() {
        let panel = small_panel();
        let mixture = mixture(&panel);
        let model = LikelihoodModel::new(&mixture);

        // Two reads with disjoint supports: no single haplotype carries
        // both, so monosomy has probability zero.
        let r1 = read("r1", &[0, 1]);
        let r2 = read("r2", &[2, 3]);
        let freqs = model.joint_frequencies(&[&r1, &r2]);
        let likelihoods = LikelihoodModel::scenario_likelihoods(&freqs);

        assert_eq!(likelihoods.monosomy, 0.0);
        let llr = likelihoods.log_ratio(Ploidy::Monosomy, Ploidy::Disomy);
        assert!(llr.is_finite());
        assert!(llr <= LOG_LIKELIHOOD_FLOOR - ln_guarded(likelihoods.disomy));
    }

    #[test]
    fn single_read_is_scenario_blind() {
        // With one read, every scenario reduces to the read's marginal
        // frequency: the LLR must be exactly zero.
        let panel = small_panel();
        let mixture = mixture(&panel);
        let model = LikelihoodModel::new(&mixture);

        let r1 = read("r1", &[0, 3, 5]);
        let freqs = model.joint_frequencies(&[&r1]);
        let likelihoods = LikelihoodModel::scenario_likelihoods(&freqs);
        assert!((likelihoods.monosomy - likelihoods.bph).abs() < EPSILON);
        assert!((likelihoods.disomy - likelihoods.sph).abs() < EPSILON);
        assert!(model.llr(&[&r1], (Ploidy::Bph, Ploidy::Sph)).abs() < EPSILON);
    }
}
