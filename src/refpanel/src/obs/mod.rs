use std::collections::BTreeMap;

use log::{info, warn};

use genome::{Allele, Position};

use crate::panel::ReferencePanel;

/// One line of an upstream observation table: a quality-filtered base call
/// at a known SNP position, tagged with its source read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObsRecord {
    pub position: Position,
    pub read_id: String,
    pub base: Allele,
}

/// An observed (allele, read-id) pair at some SNP position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedBase {
    pub base: Allele,
    pub read_id: String,
}

/// What to do when several observations target the same SNP position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Keep every observation (the default: multiple reads over one SNP are
    /// genuine signal at higher depths).
    #[default]
    KeepAll,
    /// Keep the first observation seen in input order.
    KeepFirst,
    /// Keep one observation, drawn uniformly. Deterministic for a fixed
    /// seed: positions are visited in ascending order.
    KeepRandom,
    /// Drop the position entirely.
    Drop,
}

/// Load-time accounting, reported once after construction.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObsLoadStats {
    pub total: usize,
    pub kept: usize,
    pub unknown_position: usize,
    pub collided_positions: usize,
}

/// Per-chromosome table of observed bases, keyed by SNP position and
/// restricted to positions present in the reference panel's legend.
/// Read-only after construction.
#[derive(Debug)]
pub struct ObservationTable {
    observations: BTreeMap<Position, Vec<ObservedBase>>,
}

impl ObservationTable {
    /// Build the table from raw upstream records.
    ///
    /// Records at positions absent from the panel legend are dropped and
    /// counted. The collision policy is applied afterwards, position by
    /// position in ascending order, so `KeepRandom` is reproducible for a
    /// fixed `rng` seed.
    pub fn from_records(
        records: Vec<ObsRecord>,
        panel: &ReferencePanel,
        policy: CollisionPolicy,
        rng: &mut fastrand::Rng,
    ) -> Self {
        let mut stats = ObsLoadStats { total: records.len(), ..Default::default() };

        let mut observations: BTreeMap<Position, Vec<ObservedBase>> = BTreeMap::new();
        for record in records {
            if panel.find(record.position).is_none() {
                stats.unknown_position += 1;
                continue;
            }
            observations.entry(record.position)
                .or_default()
                .push(ObservedBase { base: record.base, read_id: record.read_id });
        }

        let mut dropped_positions = Vec::new();
        for (position, observed) in observations.iter_mut() {
            if observed.len() < 2 {
                continue;
            }
            stats.collided_positions += 1;
            match policy {
                CollisionPolicy::KeepAll => (),
                CollisionPolicy::KeepFirst => observed.truncate(1),
                CollisionPolicy::KeepRandom => {
                    let keep = observed.swap_remove(rng.usize(0..observed.len()));
                    *observed = vec![keep];
                }
                CollisionPolicy::Drop => dropped_positions.push(*position),
            }
        }
        for position in dropped_positions {
            observations.remove(&position);
        }

        stats.kept = observations.values().map(Vec::len).sum();
        if stats.unknown_position > 0 {
            warn!(
                "{} observation(s) target positions absent from the reference panel and were ignored",
                stats.unknown_position
            );
        }
        info!(
            "Observation table: {} observation(s) kept over {} position(s) ({} collided)",
            stats.kept,
            observations.len(),
            stats.collided_positions
        );

        Self { observations }
    }

    #[must_use]
    pub fn get(&self, position: Position) -> Option<&[ObservedBase]> {
        self.observations.get(&position).map(Vec::as_slice)
    }

    /// Observed positions with their bases, in ascending position order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &[ObservedBase])> {
        self.observations.iter().map(|(pos, observed)| (*pos, observed.as_slice()))
    }

    /// Observed positions, ascending.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.observations.keys().copied()
    }

    #[must_use]
    pub fn n_positions(&self) -> usize {
        self.observations.len()
    }

    #[must_use]
    pub fn n_observations(&self) -> usize {
        self.observations.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}
