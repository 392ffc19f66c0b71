use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use genome::{Allele, Position, SnpCoord};
use popbits::BitSlab;
use refpanel::{ReferencePanel, SampleRecord, Sex};

use crate::parse;
use crate::read::open_text;

mod error;
pub use error::PanelReaderError;

pub const LEGEND_EXT: [&str; 2] = ["legend", "legend.gz"];
pub const HAP_EXT: [&str; 2] = ["hap", "hap.gz"];
pub const SAMPLES_EXT: [&str; 2] = ["samples", "samples.gz"];

/// The three reference-panel artifacts, IMPUTE2-style:
/// - `*.legend`  : `id position ref alt` (header line expected)
/// - `*.hap`     : space-separated 0/1 matrix, one row per legend SNP
/// - `*.samples` : `sample population group sex` (header line expected)
/// All three may be gzipped.
#[derive(Debug, Clone)]
pub struct PanelFiles {
    pub legend: PathBuf,
    pub haplotypes: PathBuf,
    pub samples: PathBuf,
}

impl PanelFiles {
    /// Discover the panel artifacts inside a directory, requiring exactly
    /// one candidate per extension.
    pub fn from_dir(panel_dir: &Path) -> Result<Self> {
        Ok(Self {
            legend: Self::fetch_unique(panel_dir, &LEGEND_EXT)?,
            haplotypes: Self::fetch_unique(panel_dir, &HAP_EXT)?,
            samples: Self::fetch_unique(panel_dir, &SAMPLES_EXT)?,
        })
    }

    fn fetch_unique(panel_dir: &Path, extensions: &'static [&'static str; 2]) -> Result<PathBuf> {
        use PanelReaderError::{MultipleFound, NotFound};
        let err_msg = || format!("While searching for panel files in '{}'", panel_dir.display());
        let mut candidates = parse::fetch_input_files(panel_dir, extensions)
            .map_err(|_| NotFound(extensions[0]))
            .with_context(err_msg)?;
        match candidates.len() {
            1 => Ok(candidates.swap_remove(0)),
            _ => Err(MultipleFound(extensions[0], candidates)).with_context(err_msg),
        }
    }
}

/// Load and assemble a full reference panel.
///
/// # Errors
/// IO/parse failures from the individual readers, or a
/// [`refpanel::SchemaError`] when the three artifacts disagree.
pub fn read_panel(files: &PanelFiles, allow_duplicates: bool) -> Result<ReferencePanel> {
    let legend = read_legend(&files.legend)?;
    let haplotypes = read_haplotypes(&files.haplotypes)?;
    let samples = read_samples(&files.samples)?;
    info!(
        "Loaded panel artifacts: {} legend row(s), {} haplotype row(s), {} sample(s)",
        legend.len(),
        haplotypes.len(),
        samples.len()
    );
    let panel = ReferencePanel::from_parts(legend, haplotypes, samples, allow_duplicates)
        .context("While assembling the reference panel")?;
    Ok(panel)
}

/// Parse an IMPUTE2-style legend file.
pub fn read_legend(path: &Path) -> Result<Vec<SnpCoord>> {
    let err_msg = || format!("While parsing legend file '{}'", path.display());
    let mut legend = Vec::new();

    for (index, line) in open_text(path)?.lines().enumerate() {
        let line = line.with_context(err_msg)?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() || (index == 0 && fields[0] == "id") {
            continue;
        }
        if fields.len() < 4 {
            return Err(PanelReaderError::FieldCount { line: index + 1, expected: 4, found: fields.len() })
                .with_context(err_msg);
        }
        let position = fields[1].parse::<Position>()
            .with_context(|| format!("[line {}] invalid position '{}'", index + 1, fields[1]))
            .with_context(err_msg)?;
        let reference = fields[2].parse::<Allele>()
            .with_context(|| format!("[line {}] invalid reference allele '{}'", index + 1, fields[2]))
            .with_context(err_msg)?;
        let alternate = fields[3].parse::<Allele>()
            .with_context(|| format!("[line {}] invalid alternate allele '{}'", index + 1, fields[3]))
            .with_context(err_msg)?;
        legend.push(SnpCoord::new(fields[0], position, reference, alternate));
    }
    Ok(legend)
}

/// Parse an IMPUTE2-style haplotypes file into per-SNP bit rows.
pub fn read_haplotypes(path: &Path) -> Result<Vec<BitSlab>> {
    let err_msg = || format!("While parsing haplotypes file '{}'", path.display());
    let mut rows: Vec<BitSlab> = Vec::new();
    let mut width: Option<usize> = None;

    for (index, line) in open_text(path)?.lines().enumerate() {
        let line = line.with_context(err_msg)?;
        if line.trim().is_empty() {
            continue;
        }
        let bits = line.split_whitespace()
            .map(|value| match value {
                "0" => Ok(false),
                "1" => Ok(true),
                _ => Err(PanelReaderError::InvalidHaplotypeState {
                    line: index + 1,
                    value: value.to_string(),
                }),
            })
            .collect::<Result<Vec<bool>, PanelReaderError>>()
            .with_context(err_msg)?;

        let expected = *width.get_or_insert(bits.len());
        if bits.len() != expected {
            return Err(PanelReaderError::RaggedHaplotypeRow { line: index + 1, expected, found: bits.len() })
                .with_context(err_msg);
        }
        rows.push(BitSlab::from_bits(&bits));
    }
    Ok(rows)
}

/// Parse a sample table: `sample population group sex`, the trailing sex
/// field being optional.
pub fn read_samples(path: &Path) -> Result<Vec<SampleRecord>> {
    let err_msg = || format!("While parsing samples file '{}'", path.display());
    let mut samples = Vec::new();

    for (index, line) in open_text(path)?.lines().enumerate() {
        let line = line.with_context(err_msg)?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() || (index == 0 && fields[0] == "sample") {
            continue;
        }
        if fields.len() < 3 {
            return Err(PanelReaderError::FieldCount { line: index + 1, expected: 3, found: fields.len() })
                .with_context(err_msg);
        }
        let sex = fields.get(3).map_or(Sex::Unknown, |field| Sex::from(*field));
        samples.push(SampleRecord::new(fields[0], fields[1], fields[2], sex));
    }
    Ok(samples)
}
