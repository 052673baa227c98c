/// Header line of the enriched CSV output, written exactly once per run
pub const CSV_HEADER: &str = "created_at,text,polarity,subjectivity,entities,processing_timestamp";

/// Entity labels treated as uninformative topics (numeric, temporal, monetary)
pub const DEFAULT_UNWANTED_LABELS: [&str; 7] = [
    "CARDINAL", "ORDINAL", "DATE", "TIME", "MONEY", "PERCENT", "QUANTITY",
];

/// Timestamp layout used for `processing_timestamp`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

// Pipeline defaults
pub const DEFAULT_INPUT_FILE: &str = "local_stream.txt";
pub const DEFAULT_OUTPUT_FILE: &str = "enriched_data.csv";
pub const DEFAULT_WORKERS: usize = 1;
/// Upper bound on analyzer workers. Each one holds a blocking-pool thread
/// for the whole run, so this stays well under tokio's default pool size.
pub const MAX_WORKERS: usize = 256;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

// Analyzer defaults
pub const DEFAULT_MAX_TEXT_CHARS: usize = 1_000_000;
pub const DEFAULT_FALLBACK_LABEL: &str = "MISC";
pub const LEXICON_FILE: &str = "lexicon.json";
pub const GAZETTEER_FILE: &str = "gazetteer.json";

pub const DEFAULT_LOG_DIR: &str = "logs";
pub const LOG_FILE_PREFIX: &str = "comment_enricher.log";
