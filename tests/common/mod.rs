use std::fmt::Write as _;
use std::path::PathBuf;

use clap::Parser;

/// A self-contained scan fixture: a synthetic reference panel (30 SNPs,
/// 6 individuals over two superpopulations) and a panel-consistent
/// observation stream, written into a temporary directory.
pub struct ScanFixture {
    pub tmpdir: tempfile::TempDir,
    pub panel_dir: PathBuf,
    pub obs_path: PathBuf,
}

pub const N_SNPS: usize = 30;
pub const N_HAPLOTYPES: usize = 12;

fn alt_bit(snp: usize, haplotype: usize) -> bool {
    (snp * 7 + haplotype * 3) % 11 < 4
}

impl ScanFixture {
    pub fn new() -> Self {
        let tmpdir = tempfile::tempdir().expect("temporary directory");
        let panel_dir = tmpdir.path().join("panel");
        std::fs::create_dir(&panel_dir).expect("panel directory");

        let mut legend = String::from("id position ref alt\n");
        for snp in 0..N_SNPS {
            writeln!(legend, "rs{snp} {} A C", (snp + 1) * 1_000).unwrap();
        }
        std::fs::write(panel_dir.join("chr21.legend"), legend).unwrap();

        let mut hap = String::new();
        for snp in 0..N_SNPS {
            let row: Vec<&str> = (0..N_HAPLOTYPES)
                .map(|haplotype| if alt_bit(snp, haplotype) { "1" } else { "0" })
                .collect();
            writeln!(hap, "{}", row.join(" ")).unwrap();
        }
        std::fs::write(panel_dir.join("chr21.hap"), hap).unwrap();

        let mut samples = String::from("sample population group sex\n");
        for individual in 0..N_HAPLOTYPES / 2 {
            let (pop, superpop) = if individual < 3 { ("CEU", "EUR") } else { ("YRI", "AFR") };
            writeln!(samples, "I{individual} {pop} {superpop} {}", individual % 2 + 1).unwrap();
        }
        std::fs::write(panel_dir.join("chr21.samples"), samples).unwrap();

        // 24 reads, two consecutive SNPs each, alleles drawn from the panel.
        let mut obs = String::from("position\tread_id\tbase\n");
        for read in 0..24_usize {
            let first_snp = (read * 5) % (N_SNPS - 1);
            for snp in [first_snp, first_snp + 1] {
                let base = if (read + snp) % 3 == 0 { "C" } else { "A" };
                writeln!(obs, "{}\tread-{read}\t{base}", (snp + 1) * 1_000).unwrap();
            }
        }
        let obs_path = tmpdir.path().join("chr21.obs.tsv");
        std::fs::write(&obs_path, obs).unwrap();

        Self { tmpdir, panel_dir, obs_path }
    }

    /// Assemble a `scan` invocation through the real argument parser.
    pub fn cli(&self, output_dir: &PathBuf, seed: u64, threads: usize) -> parser::Cli {
        parser::Cli::try_parse_from([
            "haplora-rs", "scan",
            "--panel", self.panel_dir.to_str().unwrap(),
            "--obs", self.obs_path.to_str().unwrap(),
            "--chromosome", "chr21",
            "--output-dir", output_dir.to_str().unwrap(),
            "--ancestry", "EUR", "AFR",
            "--window-size", "10000",
            "--min-reads", "3",
            "--max-reads", "6",
            "--reps", "16",
            "--seed", &seed.to_string(),
            "--threads", &threads.to_string(),
        ]).expect("valid scan arguments")
    }
}
