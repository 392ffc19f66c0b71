use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{Compression, GenericWriter};

/// Run-level metadata echoed into the report, so every output file is
/// self-describing and reproducible from its own header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub chromosome: String,
    pub scenario_pair: [String; 2],
    pub ancestries: Vec<String>,
    pub proportions: Vec<f64>,
    pub seed: u64,
    pub window_size: u32,
    pub offset: u32,
    pub min_reads: usize,
    pub max_reads: usize,
    pub reps: usize,
    pub min_hf: f64,
    pub min_score: usize,
}

/// One window's serialized statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowRecord {
    pub start: u32,
    pub end: u32,
    pub informative: bool,
    pub llr: Option<f64>,
    pub std_err: Option<f64>,
    pub n_reads: usize,
    pub n_snps: usize,
}

/// Chromosome-level serialized summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub mean_llr: Option<f64>,
    pub std_err: Option<f64>,
    pub n_windows: usize,
    pub n_informative: usize,
    pub n_excluded: usize,
    pub fraction_negative: Option<f64>,
}

/// The full keyed report: windows indexed by their start position (the
/// interval is repeated inside each record), plus the summary.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScanReport {
    pub metadata: ReportMetadata,
    pub windows: BTreeMap<u32, WindowRecord>,
    pub summary: SummaryRecord,
}

impl ScanReport {
    #[must_use]
    pub fn new(metadata: ReportMetadata, windows: Vec<WindowRecord>, summary: SummaryRecord) -> Self {
        let windows = windows.into_iter().map(|record| (record.start, record)).collect();
        Self { metadata, windows, summary }
    }

    /// Serialize to YAML and persist, honoring the compression hook.
    pub fn write(&self, path: &Path, compression: Compression) -> Result<()> {
        let yaml = serde_yaml::to_string(self)
            .context("While serializing the scan report to yaml")?;
        GenericWriter::new(Some(path), compression)?
            .write_str(&yaml)
            .with_context(|| format!("While writing the scan report to '{}'", path.display()))
    }
}
