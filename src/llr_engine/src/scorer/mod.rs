use ahash::AHashMap;
use log::{debug, info};

use genome::{Allele, Position};
use popbits::{BitSlab, PlaneCounter};
use refpanel::{AncestryMixture, ObservationTable, ObservedBase, ReferencePanel};

use crate::window::GenomicWindow;

/// Scoring knobs.
/// - `min_hf`: a SNP contributes only when its ancestry-weighted alternate
///   frequency lies strictly inside `(min_hf, 1 - min_hf)`; near-fixed sites
///   carry no discriminating signal and mostly inject genotyping noise.
/// - `min_score`: reads whose best per-haplotype agreement count falls under
///   this bound are too uninformative to keep.
#[derive(Debug, Clone, Copy)]
pub struct ScoreParams {
    pub min_hf: f64,
    pub min_score: usize,
}

/// A read admitted into likelihood evaluation.
/// `support` has one bit per haplotype column: set ⟺ that haplotype carries
/// every allele the read was observed with (over its contributing SNPs).
#[derive(Debug, Clone)]
pub struct ScoredRead {
    pub id: String,
    pub support: BitSlab,
    pub n_sites: usize,
    pub score: usize,
}

/// Outcome of scoring one window's reads.
#[derive(Debug, Default)]
pub struct WindowScores {
    pub reads: Vec<ScoredRead>,
    pub n_informative_snps: usize,
    pub n_mismatch_bases: usize,
    pub n_filtered_reads: usize,
}

#[derive(Debug, Clone, Copy)]
struct Site {
    index: usize,
    informative: bool,
}

/// Scores a window's reads against every ancestry-eligible reference
/// haplotype.
///
/// The hot path is pure wide-bitset arithmetic: per-SNP allele rows are
/// AND-folded into a per-read support vector, while a bit-plane counter
/// tallies per-haplotype mismatches so the best agreement count (the read
/// score) never requires transposing the matrix.
pub struct HaplotypeScorer<'a> {
    panel: &'a ReferencePanel,
    mixture: &'a AncestryMixture,
    params: ScoreParams,
    sites: AHashMap<Position, Site>,
}

impl<'a> HaplotypeScorer<'a> {
    /// Precompute, for every observed position, its legend row and whether
    /// it passes the haplotype-frequency filter.
    pub fn new(
        panel: &'a ReferencePanel,
        mixture: &'a AncestryMixture,
        params: ScoreParams,
        obs: &ObservationTable,
    ) -> Self {
        let mut sites = AHashMap::with_capacity(obs.n_positions());
        let mut n_informative = 0_usize;
        for position in obs.positions() {
            let Some(index) = panel.find(position) else { continue };
            let frequency = mixture.weighted_frequency(panel.row(index));
            let informative = frequency > params.min_hf && frequency < 1.0 - params.min_hf;
            n_informative += usize::from(informative);
            sites.insert(position, Site { index, informative });
        }
        info!(
            "{n_informative}/{} observed site(s) pass the haplotype-frequency filter (min-HF: {})",
            sites.len(),
            params.min_hf
        );
        Self { panel, mixture, params, sites }
    }

    /// Whether the SNP at `position` contributes to scoring.
    #[must_use]
    pub fn is_informative(&self, position: Position) -> bool {
        self.sites.get(&position).is_some_and(|site| site.informative)
    }

    /// Number of observed sites passing the haplotype-frequency filter.
    #[must_use]
    pub fn n_informative_sites(&self) -> usize {
        self.sites.values().filter(|site| site.informative).count()
    }

    /// Score every read of `window` and drop the ones under `min_score`.
    #[must_use]
    pub fn score_window(&self, window: &GenomicWindow, obs: &ObservationTable) -> WindowScores {
        let mut scores = WindowScores::default();

        // Regroup the window's observations per source read, keeping the
        // window's first-seen read order for determinism.
        let mut per_read: AHashMap<&str, Vec<(Site, Allele)>> = AHashMap::new();
        for position in &window.positions {
            let site = self.sites[position];
            if site.informative {
                scores.n_informative_snps += 1;
            }
            let observed: &[ObservedBase] = obs.get(*position).unwrap_or(&[]);
            for base in observed {
                per_read.entry(&base.read_id).or_default().push((site, base.base));
            }
        }

        for read_id in &window.read_ids {
            let Some(bases) = per_read.get(read_id.as_str()) else { continue };
            match self.score_read(read_id, bases) {
                Some(read) if read.score >= self.params.min_score => scores.reads.push(read),
                Some(_) | None => scores.n_filtered_reads += 1,
            }
            scores.n_mismatch_bases += bases.iter()
                .filter(|(site, base)| {
                    site.informative && !self.panel.snp(site.index).carries(*base)
                })
                .count();
        }

        debug!(
            "window {}: {} read(s) kept, {} filtered, {} informative SNP(s)",
            window.range,
            scores.reads.len(),
            scores.n_filtered_reads,
            scores.n_informative_snps
        );
        scores
    }

    // Fold the read's per-SNP allele rows into its support vector, counting
    // per-haplotype mismatches along the way.
    fn score_read(&self, read_id: &str, bases: &[(Site, Allele)]) -> Option<ScoredRead> {
        let eligible = self.mixture.eligible();
        let mut support = eligible.clone();
        let mut mismatches = PlaneCounter::new(self.panel.n_haplotypes());
        let mut n_sites = 0_usize;

        for (site, base) in bases {
            if !site.informative {
                continue;
            }
            let snp = self.panel.snp(site.index);
            let row = self.panel.row(site.index);
            // Haplotypes agreeing with this observation: the row itself for
            // an alternate call, its complement for a reference call.
            let agree = if *base == snp.alternate {
                row.clone()
            } else if *base == snp.reference {
                !row
            } else {
                continue; // neither declared allele; counted by the caller
            };
            support &= &agree;
            mismatches.add(&!&agree);
            n_sites += 1;
        }

        if n_sites == 0 {
            return None;
        }
        let best_agreement = mismatches.min_count(eligible).map(|min| n_sites - min)?;
        Some(ScoredRead {
            id: read_id.to_string(),
            support,
            n_sites,
            score: best_agreement,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use genome::{SnpCoord, WindowRange};
    use refpanel::{CollisionPolicy, ObsRecord, SampleRecord, Sex};

    /// The documented toy panel (3 SNPs at 123/456/789, 8 haplotypes).
    /// Column 1 (CEU1, second haplotype) reads alt/ref/alt; YRI1's columns
    /// (4, 5) differ from it at every position.
    fn toy_panel() -> ReferencePanel {
        let legend = vec![
            SnpCoord::new("rs11", 123, Allele::A, Allele::G),
            SnpCoord::new("rs22", 456, Allele::T, Allele::C),
            SnpCoord::new("rs33", 789, Allele::G, Allele::A),
        ];
        let rows = vec![
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

    fn mixture(panel: &ReferencePanel, labels: &[&str]) -> AncestryMixture {
        let labels: Vec<String> = labels.iter().map(ToString::to_string).collect();
        AncestryMixture::resolve(panel, &labels, None).expect("valid mixture")
    }

    /// One read spanning all three SNPs, matching CEU1's second haplotype.
    fn hap2_records() -> Vec<ObsRecord> {
        vec![
            ObsRecord { position: Position(123), read_id: "read-1".into(), base: Allele::G },
            ObsRecord { position: Position(456), read_id: "read-1".into(), base: Allele::T },
            ObsRecord { position: Position(789), read_id: "read-1".into(), base: Allele::A },
        ]
    }

    fn window_over(obs: &ObservationTable) -> GenomicWindow {
        let positions: Vec<Position> = obs.positions().collect();
        let read_ids = vec!["read-1".to_string()];
        GenomicWindow {
            range: WindowRange::new(0, 1_000),
            positions,
            read_ids,
        }
    }

    #[test]
    fn read_matching_one_haplotype_scores_maximal() {
        let panel = toy_panel();
        let mixture = mixture(&panel, &["EUR", "AFR"]);
        let mut rng = fastrand::Rng::with_seed(0);
        let obs = ObservationTable::from_records(hap2_records(), &panel, CollisionPolicy::KeepAll, &mut rng);
        let scorer = HaplotypeScorer::new(&panel, &mixture, ScoreParams { min_hf: 0.1, min_score: 1 }, &obs);

        let scores = scorer.score_window(&window_over(&obs), &obs);
        assert_eq!(scores.reads.len(), 1);
        let read = &scores.reads[0];
        assert_eq!(read.n_sites, 3);
        assert_eq!(read.score, 3, "some haplotype agrees everywhere");
        // Only column 1 (CEU1's second haplotype) is fully compatible.
        assert_eq!(read.support.iter_ones().collect::<Vec<_>>(), [1]);
        // YRI1's haplotypes (columns 4, 5) disagree at every site.
        assert!(!read.support.get(4));
        assert!(!read.support.get(5));
    }

    #[test]
    fn single_superpopulation_zeroes_foreign_columns() {
        let panel = toy_panel();
        let eur_only = mixture(&panel, &["EUR"]);
        let mut rng = fastrand::Rng::with_seed(0);
        let obs = ObservationTable::from_records(hap2_records(), &panel, CollisionPolicy::KeepAll, &mut rng);
        let scorer = HaplotypeScorer::new(&panel, &eur_only, ScoreParams { min_hf: 0.1, min_score: 1 }, &obs);

        let scores = scorer.score_window(&window_over(&obs), &obs);
        let read = &scores.reads[0];
        // AFR columns can never enter the support set.
        for column in 4..8 {
            assert!(!read.support.get(column));
        }
    }

    #[test]
    fn min_hf_filter_is_monotonic() {
        let panel = toy_panel();
        let mixture = mixture(&panel, &["EUR", "AFR"]);
        let mut rng = fastrand::Rng::with_seed(0);
        let obs = ObservationTable::from_records(hap2_records(), &panel, CollisionPolicy::KeepAll, &mut rng);

        let mut previous = usize::MAX;
        for min_hf in [0.0, 0.1, 0.2, 0.3, 0.4, 0.49] {
            let scorer = HaplotypeScorer::new(&panel, &mixture, ScoreParams { min_hf, min_score: 0 }, &obs);
            let informative = scorer.n_informative_sites();
            assert!(informative <= previous, "raising min-HF must never add sites");
            previous = informative;
        }
    }

    #[test]
    fn mismatching_bases_are_counted_not_scored() {
        let panel = toy_panel();
        let mixture = mixture(&panel, &["EUR", "AFR"]);
        let mut records = hap2_records();
        records.push(ObsRecord { position: Position(456), read_id: "read-2".into(), base: Allele::G });
        let mut rng = fastrand::Rng::with_seed(0);
        let obs = ObservationTable::from_records(records, &panel, CollisionPolicy::KeepAll, &mut rng);
        let scorer = HaplotypeScorer::new(&panel, &mixture, ScoreParams { min_hf: 0.1, min_score: 1 }, &obs);

        let mut window = window_over(&obs);
        window.read_ids.push("read-2".to_string());
        let scores = scorer.score_window(&window, &obs);
        // read-2's only base matches neither declared allele: no usable site.
        assert_eq!(scores.reads.len(), 1);
        assert_eq!(scores.n_filtered_reads, 1);
        assert_eq!(scores.n_mismatch_bases, 1);
    }

    #[test]
    fn min_score_excludes_noisy_reads() {
        let panel = toy_panel();
        let mixture = mixture(&panel, &["EUR", "AFR"]);
        // alt/alt/alt is carried by no single haplotype: the support set is
        // empty and the best per-haplotype agreement stops at 2.
        let records = vec![
            ObsRecord { position: Position(123), read_id: "read-1".into(), base: Allele::G },
            ObsRecord { position: Position(456), read_id: "read-1".into(), base: Allele::C },
            ObsRecord { position: Position(789), read_id: "read-1".into(), base: Allele::A },
        ];
        let mut rng = fastrand::Rng::with_seed(0);
        let obs = ObservationTable::from_records(records, &panel, CollisionPolicy::KeepAll, &mut rng);

        let lenient = HaplotypeScorer::new(&panel, &mixture, ScoreParams { min_hf: 0.1, min_score: 2 }, &obs);
        let scores = lenient.score_window(&window_over(&obs), &obs);
        assert_eq!(scores.reads.len(), 1);
        assert_eq!(scores.reads[0].score, 2);
        assert!(scores.reads[0].support.iter_ones().next().is_none());

        let strict = HaplotypeScorer::new(&panel, &mixture, ScoreParams { min_hf: 0.1, min_score: 3 }, &obs);
        let scores = strict.score_window(&window_over(&obs), &obs);
        assert_eq!(scores.reads.len(), 0);
        assert_eq!(scores.n_filtered_reads, 1);
    }
}
