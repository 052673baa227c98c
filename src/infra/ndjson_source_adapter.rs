use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::app::ports::{RawLines, RecordSourcePort};

/// Reads an NDJSON file line by line.
///
/// Lines are yielded as raw bytes with the trailing `\n` (and any `\r`
/// before it) removed. A missing final newline still yields the last line.
pub struct NdjsonFileSource {
    path: PathBuf,
}

impl NdjsonFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSourcePort for NdjsonFileSource {
    fn open(&self) -> std::io::Result<RawLines> {
        let file = File::open(&self.path)?;
        info!("Reading comments from {}", self.path.display());

        let lines = BufReader::new(file).split(b'\n').map(|line| {
            line.map(|mut bytes| {
                if bytes.last() == Some(&b'\r') {
                    bytes.pop();
                }
                bytes
            })
        });
        Ok(Box::new(lines))
    }
}

/// Lines held in memory, for embedding the pipeline or feeding it from tests
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    lines: Vec<Vec<u8>>,
}

impl InMemorySource {
    pub fn new<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Vec<u8>>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl RecordSourcePort for InMemorySource {
    fn open(&self) -> std::io::Result<RawLines> {
        Ok(Box::new(self.lines.clone().into_iter().map(Ok)))
    }
}
