use chrono::{DateTime, Utc};
use std::panic::{self, AssertUnwindSafe};

use crate::config::Config;
use crate::constants::{DEFAULT_MAX_TEXT_CHARS, TIMESTAMP_FORMAT};
use crate::error::EnrichmentError;
use crate::pipeline::processing::entity_filter::EntityFilter;
use crate::pipeline::processing::resources::NlpResources;
use crate::pipeline::processing::sentiment::SentimentScore;
use crate::types::{EnrichedRecord, Entity, RawRecord};

/// Turns raw comments into enriched records.
///
/// Owns one set of NLP resources, loaded before the first record and
/// reused for every record this analyzer sees.
pub struct TextAnalyzer {
    resources: NlpResources,
    filter: EntityFilter,
    max_text_chars: usize,
}

impl TextAnalyzer {
    pub fn new(resources: NlpResources, filter: EntityFilter) -> Self {
        Self {
            resources,
            filter,
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
        }
    }

    pub fn from_config(resources: NlpResources, config: &Config) -> Self {
        Self::new(
            resources,
            EntityFilter::with_unwanted_labels(&config.entity_filter.unwanted_labels),
        )
        .with_max_text_chars(config.analyzer.max_text_chars)
    }

    pub fn with_max_text_chars(mut self, max_text_chars: usize) -> Self {
        self.max_text_chars = max_text_chars;
        self
    }

    /// Parse one NDJSON line and enrich it
    pub fn analyze_line(&self, line: &[u8]) -> Result<EnrichedRecord, EnrichmentError> {
        let raw = RawRecord::from_json_line(line)?;
        self.analyze(&raw)
    }

    pub fn analyze(&self, raw: &RawRecord) -> Result<EnrichedRecord, EnrichmentError> {
        self.analyze_at(raw, Utc::now())
    }

    /// Enrich `raw`, stamping it with `now` as the processing time
    pub fn analyze_at(&self, raw: &RawRecord, now: DateTime<Utc>) -> Result<EnrichedRecord, EnrichmentError> {
        let chars = raw.text.chars().count();
        if chars > self.max_text_chars {
            return Err(EnrichmentError::TextTooLong {
                chars,
                max: self.max_text_chars,
            });
        }

        let (score, entities) = panic::catch_unwind(AssertUnwindSafe(|| {
            let score = self.resources.sentiment.score(&raw.text);
            let entities = self.resources.recognizer.recognize(&raw.text);
            (score, entities)
        }))
        .map_err(|payload| EnrichmentError::Panicked(panic_message(payload.as_ref())))?;

        let SentimentScore { polarity, subjectivity } = score;
        if !polarity.is_finite() || !subjectivity.is_finite() {
            return Err(EnrichmentError::NonFiniteScore { polarity, subjectivity });
        }

        let recognized = entities.len();
        let entities = self.filter.filter(entities);
        crate::observability::metrics::enrich::entities_recognized(recognized, recognized - entities.len());

        Ok(EnrichedRecord {
            created_at: raw.created_at.clone(),
            text: raw.text.clone(),
            polarity: polarity.clamp(-1.0, 1.0),
            subjectivity: subjectivity.clamp(0.0, 1.0),
            entities,
            processing_timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
        })
    }

    /// All recognized entities next to the ones the filter keeps
    pub fn inspect_entities(&self, text: &str) -> (Vec<Entity>, Vec<Entity>) {
        let all = self.resources.recognizer.recognize(text);
        let kept = self.filter.filter(all.clone());
        (all, kept)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
