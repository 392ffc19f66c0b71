use std::fmt::{self, Display, Formatter};
use std::fs::File;
use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgEnum, Args, Parser, Subcommand};
use log::debug;
use serde::{Deserialize, Serialize};

mod error;
pub use error::ParserError;

#[derive(Parser, Debug, Serialize, Deserialize)]
#[clap(name="haplora-rs", author, version, about, long_about = None)]
#[clap(propagate_version = true)]
/// HAPLORA-rs: haplotype-based classification of chromosomal aneuploidy origin
pub struct Cli {
    /// Set the verbosity level (-v -vv -vvv)
    ///
    /// Set the verbosity level of this program. Multiple levels allowed {n}
    ///
    /// -v: Info  |  -vv: Debug  | -vvv: Trace {n}
    ///
    /// Note that the program will still output warnings by default, even when this flag is off.
    /// Use the --quiet/-q flag to disable them.
    #[clap(short='v', long, parse(from_occurrences), global=true)]
    pub verbose: u8,

    /// Disable warnings.
    ///
    /// By default, warnings are emitted and redirected to the console, even when verbose mode
    /// is off. Use this argument to disable this. Only errors will be displayed.
    #[clap(short='q', long, global=true)]
    pub quiet: bool,

    #[clap(subcommand)]
    pub commands: Commands,
}

impl Cli {
    /// Serialize command line arguments within a `.yaml` file.
    ///
    /// # Behavior
    /// - File naming follows the convention '{current time}-scan.yaml', with current time
    ///   formatted as `YYYY`-`MM`-`DD`T`hhmmss`.
    /// - The file is written at the root of the user-provided `--output-dir` folder.
    ///
    /// # Errors
    /// When `serde_yaml` fails to parse `Self` to a string, or the output file
    /// cannot be written.
    pub fn serialize(&self) -> Result<()> {
        let serialized = serde_yaml::to_string(&self)
            .map_err(|err| anyhow::anyhow!("Failed to serialize command line arguments. got [{err}]"))?;

        debug!("\n---- Command line args ----\n{}\n---", serialized);

        let current_time = chrono::offset::Local::now().format("%Y-%m-%dT%H%M%S").to_string();
        let output_file = match &self.commands {
            Commands::Scan { common, scan: _ } => {
                std::fs::create_dir_all(&common.output_dir)?;
                common.output_dir.join(format!("{current_time}-scan.yaml"))
            }
            Commands::FromYaml { yaml: _ } | Commands::Cite => return Ok(()),
        };

        std::fs::write(&output_file, serialized)
            .map_err(|e| anyhow::anyhow!("Unable to serialize arguments into {}: [{e}]", output_file.display()))
    }

    /// Deserialize a `.yaml` file into command line arguments.
    ///
    /// # Errors
    /// - Returns `FileNotFound` or `PermissionDenied` if the provided `.yaml` is invalid,
    ///   or does not carry read permissions.
    /// - When `serde_yaml` fails to parse the provided file to `Self`.
    pub fn deserialize(yaml: &PathBuf) -> Result<Self> {
        Ok(serde_yaml::from_reader(File::open(yaml)?)?)
    }
}

#[derive(Subcommand, Debug, Serialize, Deserialize)]
pub enum Commands {
    /// Scan one chromosome's observations for aneuploidy-origin evidence.
    Scan {
        #[clap(flatten)]
        common: Common,
        #[clap(flatten)]
        scan: Box<Scan>, // Box<T> to mitigate the large size difference between variants.
    },

    /// Run haplora-rs using a previously generated .yaml configuration file.
    ///
    /// This allows users to easily re-apply a haplora-rs command using the exact same
    /// parameters and arguments.
    FromYaml {
        yaml: PathBuf,
    },

    /// Print all citations tied to this project.
    Cite,
}

#[derive(Args, Debug, Serialize, Deserialize)]
pub struct Common {
    /// Output directory where results are written.
    #[clap(short, long, default_value="haplora-output")]
    pub output_dir: PathBuf,

    /// Overwrite existing output files.
    #[clap(long)]
    pub overwrite: bool,

    /// Number of worker threads used for window evaluation (0 = one per core).
    #[clap(short='t', long, default_value_t=1)]
    pub threads: usize,

    /// Global RNG seed (randomly assigned when unspecified).
    ///
    /// Drives the per-window bootstrap streams and the keep-random collision
    /// policy. Runs with identical inputs, parameters and seed are
    /// bit-identical, whatever the thread count.
    #[clap(long, required(false), default_value_t=fastrand::u64(u64::MIN..=u64::MAX))]
    pub seed: u64,

    /// Compression applied to the yaml report.
    #[clap(long, arg_enum, default_value_t=CompressMode::None)]
    pub compress: CompressMode,
}

#[derive(Args, Debug, Serialize, Deserialize)]
pub struct Scan {
    /// Directory containing the reference panel artifacts.
    ///
    /// Exactly one *.legend, one *.hap and one *.samples file (optionally
    /// gzipped) must be present.
    #[clap(short, long, required(true))]
    pub panel: PathBuf,

    /// Per-chromosome observation table (position, read id, base).
    #[clap(short='i', long, required(true))]
    pub obs: PathBuf,

    /// Chromosome label, used for reporting and output file naming.
    #[clap(short, long, required(true))]
    pub chromosome: String,

    /// Genomic window width, in base pairs. 0 switches to adaptive windows,
    /// which grow until they hold --min-reads distinct reads.
    #[clap(short, long, default_value_t=100_000)]
    pub window_size: u32,

    /// Shift applied to the fixed-width window grid.
    #[clap(long, default_value_t=0)]
    pub offset: u32,

    /// Minimal number of scorable reads for a window to be informative.
    #[clap(long, default_value_t=6)]
    pub min_reads: usize,

    /// Maximal number of reads entering a single likelihood evaluation.
    /// Windows holding more reads are bootstrap-subsampled.
    #[clap(long, default_value_t=8)]
    pub max_reads: usize,

    /// Number of bootstrap draws per over-populated window.
    #[clap(long, default_value_t=32)]
    pub reps: usize,

    /// Haplotype-frequency filter: SNPs contribute only when their
    /// ancestry-weighted alternate frequency lies strictly inside
    /// (min-hf, 1 - min-hf).
    #[clap(long, default_value_t=0.05)]
    pub min_hf: f64,

    /// Minimal per-read score (best per-haplotype agreement count).
    #[clap(long, default_value_t=1)]
    pub min_score: usize,

    /// Superpopulation label(s) describing the sample's ancestry makeup.
    #[clap(short, long, multiple_values(true), required(true))]
    pub ancestry: Vec<String>,

    /// Explicit ancestry proportions, aligned with --ancestry and summing
    /// to 1. Omitted: uniform weights.
    #[clap(long, multiple_values(true))]
    pub proportions: Option<Vec<f64>>,

    /// Scenario pair scored as LLR(first, second).
    #[clap(long, arg_enum, number_of_values(2), default_values_t=vec![Scenario::Bph, Scenario::Sph])]
    pub pair: Vec<Scenario>,

    /// What to do when several observations target the same position.
    #[clap(long, arg_enum, default_value_t=CollisionMode::KeepAll)]
    pub collision: CollisionMode,

    /// Accept duplicated positions within the panel legend.
    #[clap(long)]
    pub allow_duplicates: bool,
}

impl Scan {
    /// Bounds-check the numeric run parameters.
    pub fn validate(&self) -> Result<(), ParserError> {
        if self.min_reads < 3 {
            return Err(ParserError::InvalidMinReads(self.min_reads));
        }
        if !(2..=16).contains(&self.max_reads) {
            return Err(ParserError::InvalidMaxReads(self.max_reads));
        }
        if self.reps == 0 {
            return Err(ParserError::InvalidReps);
        }
        if !(0.0..0.5).contains(&self.min_hf) {
            return Err(ParserError::InvalidMinHf(self.min_hf));
        }
        // clap enforces this on the command line; replayed yaml configurations don't go through clap.
        if self.pair.len() != 2 {
            return Err(ParserError::InvalidScenarioPair(self.pair.len()));
        }
        Ok(())
    }
}

#[derive(ArgEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scenario { Monosomy, Disomy, Sph, Bph }

impl Display for Scenario {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Monosomy => "monosomy",
            Self::Disomy => "disomy",
            Self::Sph => "sph",
            Self::Bph => "bph",
        }.fmt(f)
    }
}

#[derive(ArgEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionMode { KeepAll, KeepFirst, KeepRandom, Drop }

impl Display for CollisionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeepAll => "keep-all",
            Self::KeepFirst => "keep-first",
            Self::KeepRandom => "keep-random",
            Self::Drop => "drop",
        }.fmt(f)
    }
}

#[derive(ArgEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressMode { None, Gzip }

impl Display for CompressMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
        }.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scan_args(ancestry: &[&str], extra: &[&str]) -> Vec<String> {
        let mut args: Vec<String> = [
            "haplora-rs", "scan",
            "--panel", "panel-dir",
            "--obs", "chr21.obs.tsv",
            "--chromosome", "chr21",
            "--ancestry",
        ].iter().map(ToString::to_string).collect();
        args.extend(ancestry.iter().map(ToString::to_string));
        args.extend(extra.iter().map(ToString::to_string));
        args
    }

    #[test]
    fn parse_a_minimal_scan() {
        let cli = Cli::try_parse_from(scan_args(&["EUR"], &[])).expect("valid arguments");
        let Commands::Scan { common, scan } = cli.commands else {
            panic!("expected a scan subcommand");
        };
        assert_eq!(common.threads, 1);
        assert_eq!(scan.window_size, 100_000);
        assert_eq!(scan.pair, vec![Scenario::Bph, Scenario::Sph]);
        assert_eq!(scan.collision, CollisionMode::KeepAll);
        scan.validate().expect("defaults are valid");
    }

    #[test]
    fn parse_an_explicit_mixture_and_pair() {
        let cli = Cli::try_parse_from(scan_args(&["EUR", "EAS"], &[
            "--proportions", "0.8", "0.2",
            "--pair", "disomy", "monosomy",
            "--collision", "keep-random",
            "--compress", "gzip",
        ])).expect("valid arguments");
        let Commands::Scan { common, scan } = cli.commands else {
            panic!("expected a scan subcommand");
        };
        assert_eq!(scan.ancestry, vec!["EUR", "EAS"]);
        assert_eq!(scan.proportions, Some(vec![0.8, 0.2]));
        assert_eq!(scan.pair, vec![Scenario::Disomy, Scenario::Monosomy]);
        assert_eq!(scan.collision, CollisionMode::KeepRandom);
        assert_eq!(common.compress, CompressMode::Gzip);
    }

    #[test]
    fn out_of_bounds_parameters_are_rejected() {
        let scan = |extra: &[&str]| {
            let cli = Cli::try_parse_from(scan_args(&["EUR"], extra)).expect("parseable arguments");
            let Commands::Scan { scan, .. } = cli.commands else { panic!("expected scan") };
            scan.validate()
        };
        assert!(matches!(scan(&["--min-reads", "2"]), Err(ParserError::InvalidMinReads(2))));
        assert!(matches!(scan(&["--max-reads", "17"]), Err(ParserError::InvalidMaxReads(17))));
        assert!(matches!(scan(&["--max-reads", "1"]), Err(ParserError::InvalidMaxReads(1))));
        assert!(matches!(scan(&["--reps", "0"]), Err(ParserError::InvalidReps)));
        assert!(matches!(scan(&["--min-hf", "0.5"]), Err(ParserError::InvalidMinHf(_))));
    }

    #[test]
    fn yaml_roundtrip() -> Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let mut cli = Cli::try_parse_from(scan_args(&["EUR"], &["--seed", "1234"])).expect("valid arguments");
        if let Commands::Scan { common, .. } = &mut cli.commands {
            common.output_dir = tmpdir.path().to_path_buf();
        }
        cli.serialize()?;

        let yaml = std::fs::read_dir(tmpdir.path())?
            .map(|entry| entry.expect("readable dir entry").path())
            .find(|path| path.extension().is_some_and(|ext| ext == "yaml"))
            .expect("a serialized yaml configuration");
        let parsed = Cli::deserialize(&yaml)?;
        let Commands::Scan { common, scan } = parsed.commands else { panic!("expected scan") };
        assert_eq!(common.seed, 1234);
        assert_eq!(scan.chromosome, "chr21");
        Ok(())
    }
}
