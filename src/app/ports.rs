use async_trait::async_trait;

use crate::error::Result;
use crate::pipeline::processing::resources::NlpResources;
use crate::types::FormattedRow;

/// Raw input lines without their terminating newline
pub type RawLines = Box<dyn Iterator<Item = std::io::Result<Vec<u8>>> + Send>;

/// Where raw NDJSON lines come from. Lines are handed out as bytes so a
/// single bad line (invalid UTF-8 included) only costs that record.
pub trait RecordSourcePort: Send {
    fn open(&self) -> std::io::Result<RawLines>;
}

#[async_trait]
pub trait EnrichOutputPort: Send + Sync {
    async fn write_header(&self, header: &str) -> std::io::Result<()>;
    async fn write_row(&self, row: &FormattedRow) -> std::io::Result<()>;
    /// Flush everything written so far
    async fn finish(&self) -> std::io::Result<()>;
}

/// Builds a fresh set of NLP resources for each worker
pub trait ResourceFactory: Send + Sync {
    fn load(&self) -> Result<NlpResources>;
}
