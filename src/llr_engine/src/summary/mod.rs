use std::fmt::{self, Display, Formatter};

use genome::WindowRange;

pub const DISPL_SEP: &str = " - ";
pub const FLOAT_FORMAT_PRECISION: usize = 6;
pub const COUNT_FORMAT_LEN: usize = 6;
pub const STATUS_FORMAT_LEN: usize = 13;
pub const LLR_FORMAT_LEN: usize = 12;

/// Whether a window carried enough reads to be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStatus {
    Informative,
    /// Fewer scorable reads than `min-reads`: recorded, excluded from
    /// chromosome-level means, never silently dropped.
    Insufficient,
}

impl Display for WindowStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Informative => "informative",
            Self::Insufficient => "insufficient",
        }.fmt(f)
    }
}

/// One window's evaluated statistics. Immutable once emitted.
///
/// `std_err` is None exactly when no resampling occurred (exact evaluation
/// or non-informative window).
#[derive(Debug, Clone)]
pub struct WindowResult {
    pub range: WindowRange,
    pub status: WindowStatus,
    pub llr: Option<f64>,
    pub std_err: Option<f64>,
    pub n_reads: usize,
    pub n_snps: usize,
}

impl WindowResult {
    pub const FILE_HEADER: &'static str = "start - end - status - llr - std_err - reads - snps";

    #[must_use]
    pub fn is_informative(&self) -> bool {
        self.status == WindowStatus::Informative
    }
}

fn format_optional(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{value:.FLOAT_FORMAT_PRECISION$}"),
        None => String::from("NA"),
    }
}

// Pretty-printed with ' - ' separators; the output writer turns these into
// tab-separated fields.
impl Display for WindowResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f,
            "{}{DISPL_SEP}{: <STATUS_FORMAT_LEN$}{DISPL_SEP}{: >LLR_FORMAT_LEN$}{DISPL_SEP}{: >LLR_FORMAT_LEN$}{DISPL_SEP}{: >COUNT_FORMAT_LEN$}{DISPL_SEP}{: >COUNT_FORMAT_LEN$}",
            self.range,
            self.status,
            format_optional(self.llr),
            format_optional(self.std_err),
            self.n_reads,
            self.n_snps,
        )
    }
}

/// Chromosome-level reduction over all informative windows.
#[derive(Debug, Clone)]
pub struct ChromosomeSummary {
    pub mean_llr: Option<f64>,
    pub std_err: Option<f64>,
    pub n_windows: usize,
    pub n_informative: usize,
    pub n_excluded: usize,
    pub fraction_negative: Option<f64>,
}

impl ChromosomeSummary {
    /// Aggregate window results. Windows flagged insufficient count towards
    /// `n_excluded` only; exact-evaluation windows (no standard error)
    /// contribute zero to the propagated error term.
    #[must_use]
    pub fn from_windows(windows: &[WindowResult]) -> Self {
        let informative: Vec<&WindowResult> = windows.iter()
            .filter(|window| window.is_informative() && window.llr.is_some())
            .collect();

        let n_windows = windows.len();
        let n_informative = informative.len();
        let n_excluded = n_windows - n_informative;
        if informative.is_empty() {
            return Self {
                mean_llr: None,
                std_err: None,
                n_windows,
                n_informative,
                n_excluded,
                fraction_negative: None,
            };
        }

        let count = n_informative as f64;
        let mean_llr = informative.iter().filter_map(|w| w.llr).sum::<f64>() / count;
        let variance_sum: f64 = informative.iter()
            .map(|w| w.std_err.map_or(0.0, |se| se * se))
            .sum();
        let std_err = variance_sum.sqrt() / count;
        let n_negative = informative.iter()
            .filter(|w| w.llr.is_some_and(|llr| llr < 0.0))
            .count();

        Self {
            mean_llr: Some(mean_llr),
            std_err: Some(std_err),
            n_windows,
            n_informative,
            n_excluded,
            fraction_negative: Some(n_negative as f64 / count),
        }
    }
}

impl Display for ChromosomeSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f,
            "mean LLR: {} (s.e. {}) | informative windows: {}/{} | excluded: {} | fraction negative: {}",
            format_optional(self.mean_llr),
            format_optional(self.std_err),
            self.n_informative,
            self.n_windows,
            self.n_excluded,
            format_optional(self.fraction_negative),
        )
    }
}
