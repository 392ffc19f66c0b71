mod common;
use common::ScanFixture;

#[cfg(test)] use pretty_assertions::assert_eq;

#[test]
fn scan_produces_windows_and_a_report() {
    let fixture = ScanFixture::new();
    let output_dir = fixture.tmpdir.path().join("out");
    haplora_rs::run(fixture.cli(&output_dir, 42, 1)).expect("scan succeeds");

    let windows_tsv = std::fs::read_to_string(output_dir.join("chr21.windows.tsv"))
        .expect("windows table written");
    assert!(windows_tsv.starts_with("start\tend\tstatus"));
    assert!(windows_tsv.lines().count() > 1, "at least one window row");

    let report: haplora_io::write::ScanReport = serde_yaml::from_str(
        &std::fs::read_to_string(output_dir.join("chr21.llr.yaml")).expect("report written"),
    ).expect("well-formed yaml report");

    assert_eq!(report.metadata.chromosome, "chr21");
    assert_eq!(report.metadata.scenario_pair, ["bph".to_string(), "sph".to_string()]);
    assert_eq!(report.windows.len(), report.summary.n_windows);
    assert_eq!(
        report.summary.n_informative + report.summary.n_excluded,
        report.summary.n_windows
    );
    // Informative windows carry a score; excluded ones never do.
    for window in report.windows.values() {
        assert_eq!(window.llr.is_some(), window.informative);
        if let Some(std_err) = window.std_err {
            assert!(std_err >= 0.0);
        }
    }
}

#[test]
fn identical_seeds_are_bit_identical_across_thread_counts() {
    let fixture = ScanFixture::new();
    let single_dir = fixture.tmpdir.path().join("single");
    let pooled_dir = fixture.tmpdir.path().join("pooled");

    haplora_rs::run(fixture.cli(&single_dir, 1234, 1)).expect("single-threaded scan");
    haplora_rs::run(fixture.cli(&pooled_dir, 1234, 4)).expect("multi-threaded scan");

    let single = std::fs::read_to_string(single_dir.join("chr21.windows.tsv")).unwrap();
    let pooled = std::fs::read_to_string(pooled_dir.join("chr21.windows.tsv")).unwrap();
    assert_eq!(single, pooled, "window tables must be byte-identical");

    let single = std::fs::read_to_string(single_dir.join("chr21.llr.yaml")).unwrap();
    let pooled = std::fs::read_to_string(pooled_dir.join("chr21.llr.yaml")).unwrap();
    assert_eq!(single, pooled, "reports must be byte-identical");
}

#[test]
fn existing_outputs_are_protected_without_overwrite() {
    let fixture = ScanFixture::new();
    let output_dir = fixture.tmpdir.path().join("out");

    haplora_rs::run(fixture.cli(&output_dir, 7, 1)).expect("first scan succeeds");
    let err = haplora_rs::run(fixture.cli(&output_dir, 7, 1))
        .expect_err("second scan must refuse to overwrite");
    assert!(format!("{err:#}").contains("already exists"));
}
