// Per-record processing: sentiment, NER, filtering, and CSV formatting

pub mod analyzer;
pub mod entity_filter;
pub mod formatter;
pub mod ner;
pub mod resources;
pub mod sentiment;
