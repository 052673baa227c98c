use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::info;

use crate::config::AnalyzerConfig;
use crate::constants;
use crate::error::{PipelineError, Result};
use crate::pipeline::processing::ner::{EntityRecognizer, GazetteerFile, RuleBasedRecognizer};
use crate::pipeline::processing::sentiment::{LexiconFile, LexiconSentiment, SentimentScorer};

/// The heavyweight NLP state one worker owns: a sentiment model and an
/// entity recognizer. Read-only once loaded.
pub struct NlpResources {
    pub sentiment: Box<dyn SentimentScorer>,
    pub recognizer: Box<dyn EntityRecognizer>,
}

impl NlpResources {
    pub fn new(sentiment: Box<dyn SentimentScorer>, recognizer: Box<dyn EntityRecognizer>) -> Self {
        Self { sentiment, recognizer }
    }

    /// Load both models. Uses the built-in models unless `model_dir` is set,
    /// in which case `lexicon.json` and `gazetteer.json` must both be present
    /// and valid.
    pub fn load(config: &AnalyzerConfig) -> Result<Self> {
        let started = Instant::now();

        let (sentiment, recognizer) = match &config.model_dir {
            Some(dir) => {
                let lexicon: LexiconFile = read_model_file(dir, constants::LEXICON_FILE)?;
                let gazetteer: GazetteerFile = read_model_file(dir, constants::GAZETTEER_FILE)?;
                (
                    LexiconSentiment::from_lexicon(lexicon).map_err(PipelineError::ResourceInit)?,
                    RuleBasedRecognizer::new(gazetteer, &config.fallback_label)
                        .map_err(PipelineError::ResourceInit)?,
                )
            }
            None => (
                LexiconSentiment::builtin(),
                RuleBasedRecognizer::builtin(&config.fallback_label).map_err(PipelineError::ResourceInit)?,
            ),
        };

        let secs = started.elapsed().as_secs_f64();
        crate::observability::metrics::resources::loaded(secs);
        info!(
            model_dir = ?config.model_dir,
            load_secs = secs,
            "NLP resources loaded"
        );

        Ok(Self::new(Box::new(sentiment), Box::new(recognizer)))
    }
}

fn read_model_file<T: serde::de::DeserializeOwned>(dir: &Path, name: &str) -> Result<T> {
    let path = dir.join(name);
    let content = fs::read_to_string(&path)
        .map_err(|e| PipelineError::ResourceInit(format!("cannot read {}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| PipelineError::ResourceInit(format!("invalid model file {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn builtin_models_load_without_a_model_dir() {
        let resources = NlpResources::load(&AnalyzerConfig::default()).unwrap();
        assert!(resources.sentiment.score("great").polarity > 0.0);
        assert_eq!(resources.recognizer.recognize("Google").len(), 1);
    }

    #[test]
    fn model_dir_files_replace_builtin_models() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "lexicon.json",
            r#"{"words": {"splendid": {"polarity": 0.9, "subjectivity": 0.8}}}"#,
        );
        write(dir.path(), "gazetteer.json", r#"{"entries": {"Ferris": "PERSON"}}"#);

        let config = AnalyzerConfig {
            model_dir: Some(dir.path().to_path_buf()),
            ..AnalyzerConfig::default()
        };
        let resources = NlpResources::load(&config).unwrap();

        assert!((resources.sentiment.score("splendid").polarity - 0.9).abs() < 1e-9);
        assert_eq!(resources.sentiment.score("great").polarity, 0.0);
        let entities = resources.recognizer.recognize("Say hi to Ferris");
        assert_eq!(entities[0].label, "PERSON");
    }

    #[test]
    fn missing_model_dir_is_a_resource_error() {
        let config = AnalyzerConfig {
            model_dir: Some(PathBuf::from("/nonexistent/models")),
            ..AnalyzerConfig::default()
        };
        assert!(matches!(NlpResources::load(&config), Err(PipelineError::ResourceInit(_))));
    }

    #[test]
    fn invalid_model_file_is_a_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "lexicon.json", "{ not json");
        write(dir.path(), "gazetteer.json", r#"{"entries": {}}"#);

        let config = AnalyzerConfig {
            model_dir: Some(dir.path().to_path_buf()),
            ..AnalyzerConfig::default()
        };
        let err = NlpResources::load(&config).err().unwrap();
        assert!(err.to_string().contains("lexicon.json"));
    }
}
