use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;

pub mod panel;
pub use panel::{read_panel, PanelFiles, PanelReaderError};

pub mod obs;
pub use obs::{read_observations, ObsReaderError};

/// Open a text input, transparently decompressing `.gz` files.
pub(crate) fn open_text(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path)
        .with_context(|| format!("While opening '{}'", path.display()))?;
    let reader: Box<dyn BufRead> = match path.extension().is_some_and(|ext| ext == "gz") {
        true => Box::new(BufReader::new(MultiGzDecoder::new(file))),
        false => Box::new(BufReader::new(file)),
    };
    Ok(reader)
}
