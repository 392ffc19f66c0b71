extern crate parser;
extern crate logger;

#[macro_use]
extern crate log;

use anyhow::{Context, Result};

use haplora_io::parse;
use haplora_io::read;
use haplora_io::write::{Compression, ReportMetadata, ScanReport, SummaryRecord, WindowRecord};
use llr_engine::{EngineParams, Ploidy, ScanOutcome, WindowResult};
use parser::{Cli, CollisionMode, Commands, CompressMode, Scenario};
use refpanel::{AncestryMixture, ObservationTable, ReferencePanel};

pub fn cite() {
    // If this ever becomes bloated, consider using the 'indoc' crate.
    const CITATIONS: &str = r###"
    A. If you plan to use HAPLORA-rs in your work, please cite the original
       publication of the statistical method it implements:

        1. Ariad, D., Yan, S.M., Victor, A.R., Barnes, F.L., Zouves, C.G.,
        Viotti, M., McCoy, R.C. Haplotype-aware inference of human chromosome
        abnormalities. PNAS 118 (46) e2109307118 (2021).
        https://doi.org/10.1073/pnas.2109307118


    B. If you plan to use a reference panel derived from the
       1000genomes-phase 3 variant callset described in the README and
       examples, please cite the 1000 Genomes Project Consortium:

       1. The 1000 Genomes Project Consortium. A global reference for human
          genetic variation. Nature 526, 68-74 (2015).
          https://doi.org/10.1038/nature15393

    "###;
    println!("{CITATIONS}");
}

const fn to_ploidy(scenario: Scenario) -> Ploidy {
    match scenario {
        Scenario::Monosomy => Ploidy::Monosomy,
        Scenario::Disomy => Ploidy::Disomy,
        Scenario::Sph => Ploidy::Sph,
        Scenario::Bph => Ploidy::Bph,
    }
}

const fn to_collision_policy(mode: CollisionMode) -> refpanel::CollisionPolicy {
    match mode {
        CollisionMode::KeepAll => refpanel::CollisionPolicy::KeepAll,
        CollisionMode::KeepFirst => refpanel::CollisionPolicy::KeepFirst,
        CollisionMode::KeepRandom => refpanel::CollisionPolicy::KeepRandom,
        CollisionMode::Drop => refpanel::CollisionPolicy::Drop,
    }
}

const fn to_compression(mode: CompressMode) -> Compression {
    match mode {
        CompressMode::None => Compression::None,
        CompressMode::Gzip => Compression::Gzip,
    }
}

/// Unpack the parsed command line and run the appropriate module.
pub fn run(cli: Cli) -> Result<()> {
    match cli.commands {
        Commands::Scan { common, scan } => run_scan(&common, &scan),

        Commands::FromYaml { yaml } => {
            let cli = Cli::deserialize(&yaml)
                .with_context(|| format!("Unable to deserialize arguments from '{}'", yaml.display()))?;
            run(cli)
        }

        Commands::Cite => {
            cite();
            Ok(())
        }
    }
}

fn run_scan(common: &parser::Common, scan: &parser::Scan) -> Result<()> {
    scan.validate()?;
    fastrand::seed(common.seed);
    info!("Global RNG seed: {}", common.seed);

    let compression = to_compression(common.compress);

    // ----------------------------- Resolve output files before the heavy lifting.
    let windows_path = common.output_dir.join(format!("{}.windows.tsv", scan.chromosome));
    let report_path = common.output_dir
        .join(format!("{}.llr.yaml{}", scan.chromosome, compression.suffix()));
    parse::create_parent_directory(&windows_path)?;
    parse::can_write_file(common.overwrite, &windows_path)?;
    parse::can_write_file(common.overwrite, &report_path)?;

    // ----------------------------- Load the reference panel.
    info!("Loading reference panel from '{}'", scan.panel.display());
    let files = read::PanelFiles::from_dir(&scan.panel)?;
    let panel = read::read_panel(&files, scan.allow_duplicates)?;

    // ----------------------------- Load the observation table.
    let records = read::read_observations(&scan.obs)?;
    let mut rng = fastrand::Rng::with_seed(common.seed);
    let obs = ObservationTable::from_records(
        records,
        &panel,
        to_collision_policy(scan.collision),
        &mut rng,
    );
    log_allele_concordance(&panel, &obs);

    // ----------------------------- Resolve the ancestry mixture.
    let mixture = AncestryMixture::resolve(&panel, &scan.ancestry, scan.proportions.as_deref())
        .context("While resolving the ancestry mixture")?;

    // ----------------------------- Evaluate every window.
    let pair = (to_ploidy(scan.pair[0]), to_ploidy(scan.pair[1]));
    let params = EngineParams {
        window_size: scan.window_size,
        offset: scan.offset,
        min_reads: scan.min_reads,
        max_reads: scan.max_reads,
        reps: scan.reps,
        min_hf: scan.min_hf,
        min_score: scan.min_score,
        seed: common.seed,
        pair,
        threads: common.threads,
    };
    let outcome = llr_engine::run(&panel, &obs, &mixture, &params)?;

    // ----------------------------- Persist the results.
    write_windows_table(&windows_path, &outcome.windows)?;
    build_report(scan, common.seed, &outcome).write(&report_path, compression)?;
    info!(
        "Results written to '{}' and '{}'",
        windows_path.display(),
        report_path.display()
    );
    Ok(())
}

// Fraction of observed bases matching either declared allele of their SNP; a
// low value usually betrays a reference/panel build mismatch.
fn log_allele_concordance(panel: &ReferencePanel, obs: &ObservationTable) {
    let mut total = 0_usize;
    let mut matched = 0_usize;
    for (position, observed) in obs.iter() {
        let Some(index) = panel.find(position) else { continue };
        let snp = panel.snp(index);
        total += observed.len();
        matched += observed.iter().filter(|base| snp.carries(base.base)).count();
    }
    if total > 0 {
        info!("{:.2}% of the observed bases match known panel alleles", 100.0 * matched as f64 / total as f64);
    }
}

fn write_windows_table(path: &std::path::Path, windows: &[WindowResult]) -> Result<()> {
    let mut writer = haplora_io::write::GenericWriter::new(Some(path), Compression::None)?;
    writer.write_iter(std::iter::once(WindowResult::FILE_HEADER.to_string()).chain(
        windows.iter().map(ToString::to_string),
    ))
}

fn build_report(scan: &parser::Scan, seed: u64, outcome: &ScanOutcome) -> ScanReport {
    let proportions = match &scan.proportions {
        Some(proportions) => proportions.clone(),
        None => vec![1.0 / scan.ancestry.len() as f64; scan.ancestry.len()],
    };
    let metadata = ReportMetadata {
        chromosome: scan.chromosome.clone(),
        scenario_pair: [scan.pair[0].to_string(), scan.pair[1].to_string()],
        ancestries: scan.ancestry.clone(),
        proportions,
        seed,
        window_size: scan.window_size,
        offset: scan.offset,
        min_reads: scan.min_reads,
        max_reads: scan.max_reads,
        reps: scan.reps,
        min_hf: scan.min_hf,
        min_score: scan.min_score,
    };

    let windows = outcome.windows.iter()
        .map(|window| WindowRecord {
            start: window.range.start.into(),
            end: window.range.end.into(),
            informative: window.is_informative(),
            llr: window.llr,
            std_err: window.std_err,
            n_reads: window.n_reads,
            n_snps: window.n_snps,
        })
        .collect();

    let summary = SummaryRecord {
        mean_llr: outcome.summary.mean_llr,
        std_err: outcome.summary.std_err,
        n_windows: outcome.summary.n_windows,
        n_informative: outcome.summary.n_informative,
        n_excluded: outcome.summary.n_excluded,
        fraction_negative: outcome.summary.fraction_negative,
    };

    ScanReport::new(metadata, windows, summary)
}
