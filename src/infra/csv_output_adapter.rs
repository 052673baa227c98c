use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::info;

use crate::app::ports::EnrichOutputPort;
use crate::types::FormattedRow;

/// File-based implementation of EnrichOutputPort.
///
/// The target is only created (and truncated) when the header is written,
/// so a run that fails before producing output leaves an existing file
/// alone. Writes one CSV line per row.
pub struct CsvFileOutputAdapter {
    file_writer: Mutex<Option<BufWriter<File>>>,
    file_path: PathBuf,
}

impl CsvFileOutputAdapter {
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        Self {
            file_writer: Mutex::new(None),
            file_path: file_path.as_ref().to_path_buf(),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn writer(&self) -> MutexGuard<'_, Option<BufWriter<File>>> {
        // A poisoned writer only means another writer panicked mid-line
        self.file_writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn create(&self) -> std::io::Result<BufWriter<File>> {
        let path = &self.file_path;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        info!("Creating enriched output file: {}", path.display());

        Ok(BufWriter::new(
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)?,
        ))
    }
}

fn not_started() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::NotConnected, "output header has not been written")
}

#[async_trait::async_trait]
impl EnrichOutputPort for CsvFileOutputAdapter {
    async fn write_header(&self, header: &str) -> std::io::Result<()> {
        let mut guard = self.writer();
        let writer = match guard.take() {
            Some(writer) => writer,
            None => self.create()?,
        };
        writeln!(guard.insert(writer), "{}", header)
    }

    async fn write_row(&self, row: &FormattedRow) -> std::io::Result<()> {
        let mut guard = self.writer();
        let writer = guard.as_mut().ok_or_else(not_started)?;
        writeln!(writer, "{}", row)
    }

    async fn finish(&self) -> std::io::Result<()> {
        let mut guard = self.writer();
        guard.as_mut().ok_or_else(not_started)?.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CSV_HEADER;

    #[tokio::test]
    async fn writes_header_then_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");

        let adapter = CsvFileOutputAdapter::new(&path);
        adapter.write_header(CSV_HEADER).await.unwrap();
        adapter
            .write_row(&FormattedRow::new("a,\"b\",0.0,0.0,\"\",c".to_string()))
            .await
            .unwrap();
        adapter.finish().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, format!("{}\na,\"b\",0.0,0.0,\"\",c\n", CSV_HEADER));
    }

    #[tokio::test]
    async fn existing_file_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "stale contents\nfrom an old run\n").unwrap();

        let adapter = CsvFileOutputAdapter::new(&path);
        adapter.write_header(CSV_HEADER).await.unwrap();
        adapter.finish().await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), format!("{}\n", CSV_HEADER));
    }

    #[tokio::test]
    async fn existing_file_is_untouched_until_the_header_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "previous,data\n1,2\n").unwrap();

        let adapter = CsvFileOutputAdapter::new(&path);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous,data\n1,2\n");

        let row = FormattedRow::new("x".to_string());
        assert!(adapter.write_row(&row).await.is_err());
        assert!(adapter.finish().await.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous,data\n1,2\n");
    }
}
