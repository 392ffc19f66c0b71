use std::io::BufRead;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use genome::{Allele, Position};
use refpanel::ObsRecord;

use crate::read::open_text;

mod error;
pub use error::ObsReaderError;

pub const OBS_EXT: [&str; 2] = ["obs.tsv", "obs.tsv.gz"];

/// Parse a per-chromosome observation table: one `position  read_id  base`
/// line per quality-filtered base call. `#`-prefixed lines and an optional
/// `position ...` header are skipped. The file may be gzipped.
pub fn read_observations(path: &Path) -> Result<Vec<ObsRecord>> {
    let err_msg = || format!("While parsing observation table '{}'", path.display());
    let mut records = Vec::new();

    for (index, line) in open_text(path)?.lines().enumerate() {
        let line = line.with_context(err_msg)?;
        if line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() || (index == 0 && fields[0] == "position") {
            continue;
        }
        if fields.len() < 3 {
            return Err(ObsReaderError::FieldCount { line: index + 1, found: fields.len() })
                .with_context(err_msg);
        }
        let position = fields[0].parse::<Position>()
            .with_context(|| format!("[line {}] invalid position '{}'", index + 1, fields[0]))
            .with_context(err_msg)?;
        let base = fields[2].parse::<Allele>()
            .with_context(|| format!("[line {}] invalid base '{}'", index + 1, fields[2]))
            .with_context(err_msg)?;
        records.push(ObsRecord { position, read_id: fields[1].to_string(), base });
    }

    info!("Parsed {} observation record(s) from '{}'", records.len(), path.display());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_records_and_skips_comments() {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = tmpdir.path().join("chr21.obs.tsv");
        std::fs::write(&path, "# produced upstream\n\
                               position\tread_id\tbase\n\
                               123\tread-1\tG\n\
                               456\tread-1\tT\n\
                               789\tread-2\tA\n").unwrap();

        let records = read_observations(&path).expect("valid observation table");
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], ObsRecord {
            position: Position(123),
            read_id: "read-1".to_string(),
            base: Allele::G,
        });
        assert_eq!(records[2].read_id, "read-2");
    }

    #[test]
    fn truncated_lines_are_an_error() {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = tmpdir.path().join("chr21.obs.tsv");
        std::fs::write(&path, "123\tread-1\n").unwrap();
        let err = read_observations(&path).unwrap_err();
        assert!(err.to_string().contains("While parsing observation table"));
    }

    #[test]
    fn invalid_bases_are_an_error() {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = tmpdir.path().join("chr21.obs.tsv");
        std::fs::write(&path, "123\tread-1\tX\n").unwrap();
        assert!(read_observations(&path).is_err());
    }
}
