// Enrichment stages: analysis, entity filtering, and row formatting

pub mod processing;

pub use processing::analyzer::TextAnalyzer;
pub use processing::entity_filter::EntityFilter;
