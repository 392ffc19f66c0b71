use std::{fs::File, io::{BufWriter, Write}, path::Path};

use anyhow::{Context, Result};
use gzp::{deflate::Gzip, par::compress::ParCompressBuilder};
use lazy_static::lazy_static;
use regex::Regex;

use super::Compression;

pub mod error;
pub use error::WriterError;

/// THE field separator used for this generic writer.
pub const WRITER_SEPARATOR: &str = "\t";

/// A generic file writer.
/// - source: Boxed `BufWriter` (file, gzip-compressed file, or stdout).
pub struct GenericWriter<'a> {
    source: BufWriter<Box<dyn Write + 'a>>,
}

impl<'a> GenericWriter<'a> {
    /// Instantiate a new writer. `None` targets stdout (never compressed);
    /// gzip streams are finished when the writer drops.
    ///
    /// # Errors
    /// If `path` is invalid, or the user lacks write permission there.
    pub fn new(path: Option<impl AsRef<Path>>, compression: Compression) -> Result<GenericWriter<'a>> {
        use WriterError::IOError;
        let source: Box<dyn Write> = match path {
            Some(path) => {
                let file = File::create(path).map_err(IOError).context("While creating file")?;
                match compression {
                    Compression::None => Box::new(file),
                    Compression::Gzip => Box::new(ParCompressBuilder::<Gzip>::new().from_writer(file)),
                }
            }
            None => Box::new(std::io::stdout()),
        };
        Ok(GenericWriter { source: BufWriter::new(source) })
    }

    /// Write the contents of a generic iterator, one item per line.
    ///
    /// # Behavior
    /// For each item, `write_iter` searches for the pretty-print separator
    /// `[ ]+-[ ]+` and replaces matches with a tab, turning Display rows
    /// into machine-readable TSV.
    pub fn write_iter<T, I>(&mut self, iter: T) -> Result<()>
    where
        T: IntoIterator<Item = I>,
        I: std::fmt::Display,
    {
        lazy_static! {
            static ref RE: Regex = Regex::new(r"[ ]+-[ ]+").expect("Failed to parse regex.");
        }
        iter.into_iter()
            .map(|obj| self.source.write(RE.replace_all(&format!("{obj}\n"), WRITER_SEPARATOR).as_bytes()))
            .collect::<Result<Vec<usize>, _>>()
            .map_err(WriterError::IOError)
            .context("While writing contents into file")?;

        self.source.flush().context("While flushing buffer contents of Writer")
    }

    /// Write a raw pre-formatted string, verbatim.
    pub fn write_str(&mut self, contents: &str) -> Result<()> {
        self.source.write_all(contents.as_bytes())
            .map_err(WriterError::IOError)
            .context("While writing contents into file")?;
        self.source.flush().context("While flushing buffer contents of Writer")
    }
}
