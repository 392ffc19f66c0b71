use genome::Position;
use refpanel::AncestryMixture;

use crate::likelihood::{LikelihoodModel, Ploidy};
use crate::scorer::{ScoredRead, WindowScores};
use crate::summary::{WindowResult, WindowStatus};
use crate::window::GenomicWindow;

mod moments;
pub use moments::RunningMoments;

/// Resampling knobs.
/// - `min_reads`: windows under this many scorable reads are flagged
///   non-informative.
/// - `max_reads`: cap on the reads entering one likelihood evaluation.
/// - `reps`: number of bootstrap draws when the cap is exceeded.
/// - `seed`: global seed; each window derives its own RNG stream from it.
#[derive(Debug, Clone, Copy)]
pub struct BootstrapParams {
    pub min_reads: usize,
    pub max_reads: usize,
    pub reps: usize,
    pub seed: u64,
}

// Weyl-sequence increment of splitmix64: spreads consecutive window starts
// across the seed space.
const SEED_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// The RNG seed of the window starting at `start`. Derived from the window's
/// own coordinates so results are reproducible whatever the worker pool
/// size or window evaluation order.
#[must_use]
pub fn window_seed(global_seed: u64, start: Position) -> u64 {
    global_seed ^ u64::from(start).wrapping_mul(SEED_GAMMA)
}

/// Produces a variance-controlled LLR estimate per window.
///
/// Windows over `max_reads` are repeatedly subsampled without replacement
/// (partial Fisher–Yates); the reported LLR is the mean across draws with
/// the standard error of that mean. Windows within `[min_reads, max_reads]`
/// are evaluated exactly, once, with no standard error.
pub struct BootstrapAggregator<'a> {
    model: LikelihoodModel<'a>,
    params: BootstrapParams,
    pair: (Ploidy, Ploidy),
}

impl<'a> BootstrapAggregator<'a> {
    #[must_use]
    pub fn new(mixture: &'a AncestryMixture, params: BootstrapParams, pair: (Ploidy, Ploidy)) -> Self {
        Self { model: LikelihoodModel::new(mixture), params, pair }
    }

    #[must_use]
    pub fn evaluate(&self, window: &GenomicWindow, scores: &WindowScores) -> WindowResult {
        let n_reads = scores.reads.len();
        let mut result = WindowResult {
            range: window.range,
            status: WindowStatus::Informative,
            llr: None,
            std_err: None,
            n_reads,
            n_snps: scores.n_informative_snps,
        };

        if n_reads < self.params.min_reads {
            result.status = WindowStatus::Insufficient;
            return result;
        }

        if n_reads <= self.params.max_reads {
            let reads: Vec<&ScoredRead> = scores.reads.iter().collect();
            result.llr = Some(self.model.llr(&reads, self.pair));
            return result;
        }

        let mut rng = fastrand::Rng::with_seed(window_seed(self.params.seed, window.range.start));
        let mut indices: Vec<usize> = (0..n_reads).collect();
        let mut moments = RunningMoments::default();
        for _ in 0..self.params.reps {
            // Partial Fisher–Yates: the first max_reads slots end up holding
            // a uniform without-replacement draw.
            for slot in 0..self.params.max_reads {
                let swap_with = rng.usize(slot..n_reads);
                indices.swap(slot, swap_with);
            }
            let draw: Vec<&ScoredRead> = indices[..self.params.max_reads]
                .iter()
                .map(|index| &scores.reads[*index])
                .collect();
            moments.update(self.model.llr(&draw, self.pair));
        }

        result.llr = Some(moments.mean());
        result.std_err = Some(moments.std_err());
        result
    }
}
