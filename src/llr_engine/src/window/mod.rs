use ahash::AHashSet;
use log::warn;

use genome::{Position, WindowRange};
use refpanel::ObservationTable;

/// A genomic window: its interval, the member SNP positions carrying at
/// least one observation, and the distinct reads contributing them (in
/// first-seen order).
#[derive(Debug, Clone)]
pub struct GenomicWindow {
    pub range: WindowRange,
    pub positions: Vec<Position>,
    pub read_ids: Vec<String>,
}

impl GenomicWindow {
    #[must_use]
    pub fn n_reads(&self) -> usize {
        self.read_ids.len()
    }
}

/// Splits a chromosome's observed SNP positions into an ordered,
/// non-overlapping sequence of windows.
///
/// `window_size == 0` selects adaptive mode: each window grows until it has
/// accumulated `min_reads` distinct reads, trading spatial resolution for a
/// stable per-window sample size.
#[derive(Debug, Clone, Copy)]
pub struct WindowPartitioner {
    pub window_size: u32,
    pub offset: u32,
    pub min_reads: usize,
}

impl WindowPartitioner {
    #[must_use]
    pub fn new(window_size: u32, offset: u32, min_reads: usize) -> Self {
        Self { window_size, offset, min_reads }
    }

    #[must_use]
    pub fn partition(&self, obs: &ObservationTable) -> Vec<GenomicWindow> {
        match self.window_size {
            0 => self.partition_adaptive(obs),
            _ => self.partition_fixed(obs),
        }
    }

    /// Fixed-width windows on the grid `offset + k * window_size`. Only
    /// windows containing at least one observed SNP are materialized;
    /// under-populated windows are still emitted and flagged downstream.
    fn partition_fixed(&self, obs: &ObservationTable) -> Vec<GenomicWindow> {
        let mut windows: Vec<GenomicWindow> = Vec::new();
        let mut seen: AHashSet<String> = AHashSet::new();
        let mut skipped_before_offset = 0_usize;

        for (position, observed) in obs.iter() {
            if position.0 < self.offset {
                skipped_before_offset += 1;
                continue;
            }
            let k = (position.0 - self.offset) / self.window_size;
            let start = self.offset + k * self.window_size;
            let range = WindowRange::new(start, start.saturating_add(self.window_size));

            if windows.last().map(|w| w.range) != Some(range) {
                seen.clear();
                windows.push(GenomicWindow { range, positions: Vec::new(), read_ids: Vec::new() });
            }
            let window = windows.last_mut().expect("window was just pushed");
            window.positions.push(position);
            for base in observed {
                if seen.insert(base.read_id.clone()) {
                    window.read_ids.push(base.read_id.clone());
                }
            }
        }

        if skipped_before_offset > 0 {
            warn!("{skipped_before_offset} observed position(s) lie before --offset and were not windowed");
        }
        windows
    }

    /// Adaptive windows: accumulate SNPs until `min_reads` distinct reads
    /// have been gathered, then close after the last included SNP. The next
    /// window starts at the following SNP; the final window may stay short.
    fn partition_adaptive(&self, obs: &ObservationTable) -> Vec<GenomicWindow> {
        let mut windows = Vec::new();
        let mut current: Option<GenomicWindow> = None;
        let mut seen: AHashSet<String> = AHashSet::new();

        for (position, observed) in obs.iter() {
            if position.0 < self.offset {
                continue;
            }
            let window = current.get_or_insert_with(|| {
                seen.clear();
                GenomicWindow {
                    range: WindowRange::new(position, position + 1),
                    positions: Vec::new(),
                    read_ids: Vec::new(),
                }
            });
            window.positions.push(position);
            window.range.end = position + 1;
            for base in observed {
                if seen.insert(base.read_id.clone()) {
                    window.read_ids.push(base.read_id.clone());
                }
            }
            if window.read_ids.len() >= self.min_reads {
                windows.extend(current.take());
            }
        }
        windows.extend(current.take());
        windows
    }
}
