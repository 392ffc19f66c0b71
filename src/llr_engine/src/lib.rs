//! The haplotype-based LLR engine: window partitioning, read scoring
//! against reference haplotypes, scenario likelihoods, bootstrap
//! aggregation and chromosome-level summary.

use anyhow::Result;
use indicatif::{ParallelProgressIterator, ProgressBar};
use log::{info, warn};
use rayon::prelude::*;

use refpanel::{AncestryMixture, ObservationTable, ReferencePanel};

pub mod window;
pub use window::{GenomicWindow, WindowPartitioner};

pub mod scorer;
pub use scorer::{HaplotypeScorer, ScoreParams, ScoredRead, WindowScores};

pub mod likelihood;
pub use likelihood::{LikelihoodModel, Ploidy, ScenarioLikelihoods};

pub mod bootstrap;
pub use bootstrap::{BootstrapAggregator, BootstrapParams};

pub mod summary;
pub use summary::{ChromosomeSummary, WindowResult, WindowStatus};

mod error;
pub use error::EngineError;

/// Full parameter set of one chromosome scan.
#[derive(Debug, Clone, Copy)]
pub struct EngineParams {
    /// Window width in base pairs; 0 selects adaptive windows.
    pub window_size: u32,
    /// Shift applied to the fixed-width window grid.
    pub offset: u32,
    pub min_reads: usize,
    pub max_reads: usize,
    /// Bootstrap draws per over-populated window.
    pub reps: usize,
    pub min_hf: f64,
    pub min_score: usize,
    pub seed: u64,
    /// Scenario pair scored as LLR(pair.0, pair.1).
    pub pair: (Ploidy, Ploidy),
    pub threads: usize,
}

/// Everything one chromosome scan produces.
#[derive(Debug)]
pub struct ScanOutcome {
    pub windows: Vec<WindowResult>,
    pub summary: ChromosomeSummary,
}

/// Evaluate a whole chromosome.
///
/// Inputs are loaded and validated by the caller; from here on, windows are
/// independent work units evaluated on a fixed-size rayon pool, sharing
/// nothing but read-only references. Results come back in ascending genomic
/// order regardless of completion order, and per-window seeding keeps runs
/// bit-identical whatever the pool size.
pub fn run(
    panel: &ReferencePanel,
    obs: &ObservationTable,
    mixture: &AncestryMixture,
    params: &EngineParams,
) -> Result<ScanOutcome> {
    info!("Scoring {} vs. {}", params.pair.0, params.pair.1);
    let scorer = HaplotypeScorer::new(
        panel,
        mixture,
        ScoreParams { min_hf: params.min_hf, min_score: params.min_score },
        obs,
    );

    let windows = WindowPartitioner::new(params.window_size, params.offset, params.min_reads)
        .partition(obs);
    if windows.is_empty() {
        warn!("No genomic window could be formed: the observation table is empty");
    }

    let aggregator = BootstrapAggregator::new(
        mixture,
        BootstrapParams {
            min_reads: params.min_reads,
            max_reads: params.max_reads,
            reps: params.reps,
            seed: params.seed,
        },
        params.pair,
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(params.threads)
        .build()
        .map_err(EngineError::BuildThreadPool)?;
    info!(
        "Evaluating {} window(s) over {} worker thread(s)",
        windows.len(),
        pool.current_num_threads()
    );

    let bar = match logger::try_multi() {
        Some(multi) => multi.add(ProgressBar::new(windows.len() as u64)),
        None => ProgressBar::hidden(),
    };
    let results: Vec<WindowResult> = pool.install(|| {
        windows.par_iter()
            .progress_with(bar)
            .map(|window| {
                let scores = scorer.score_window(window, obs);
                aggregator.evaluate(window, &scores)
            })
            .collect()
    });

    let summary = ChromosomeSummary::from_windows(&results);
    info!("Chromosome summary | {summary}");
    Ok(ScanOutcome { windows: results, summary })
}
