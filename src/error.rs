use thiserror::Error;

/// Per-record failure. The record is logged and dropped; the run continues.
#[derive(Error, Debug)]
pub enum EnrichmentError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("text has {chars} characters, limit is {max}")]
    TextTooLong { chars: usize, max: usize },

    #[error("sentiment produced a non-finite score ({polarity}, {subjectivity})")]
    NonFiniteScore { polarity: f64, subjectivity: f64 },

    #[error("analysis panicked: {0}")]
    Panicked(String),
}

impl EnrichmentError {
    /// Stable category used for log fields and metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            EnrichmentError::InvalidJson(_) | EnrichmentError::NotAnObject(_) => "malformed_input",
            EnrichmentError::TextTooLong { .. }
            | EnrichmentError::NonFiniteScore { .. }
            | EnrichmentError::Panicked(_) => "enrichment",
        }
    }

    pub fn is_malformed_input(&self) -> bool {
        self.kind() == "malformed_input"
    }
}

/// Failure that ends the run (or a worker's part in it)
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to initialize NLP resources: {0}")]
    ResourceInit(String),

    #[error("failed to read input: {0}")]
    Source(#[source] std::io::Error),

    #[error("failed to write output: {0}")]
    Sink(#[source] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("worker {worker} aborted: {message}")]
    Worker { worker: usize, message: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
