use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub analyzer: AnalyzerConfig,
    pub entity_filter: EntityFilterConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Number of independent analyzer workers
    pub workers: usize,
    /// Bound on queued lines per worker and on queued output rows
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(constants::DEFAULT_INPUT_FILE),
            output: PathBuf::from(constants::DEFAULT_OUTPUT_FILE),
            workers: constants::DEFAULT_WORKERS,
            channel_capacity: constants::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Directory holding `lexicon.json` and `gazetteer.json`. Built-in
    /// models are used when unset.
    pub model_dir: Option<PathBuf>,
    pub max_text_chars: usize,
    /// Label for capitalized spans the gazetteer does not know
    pub fallback_label: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            model_dir: None,
            max_text_chars: constants::DEFAULT_MAX_TEXT_CHARS,
            fallback_label: constants::DEFAULT_FALLBACK_LABEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EntityFilterConfig {
    pub unwanted_labels: Vec<String>,
}

impl Default for EntityFilterConfig {
    fn default() -> Self {
        Self {
            unwanted_labels: constants::DEFAULT_UNWANTED_LABELS
                .iter()
                .map(|l| l.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(constants::DEFAULT_LOG_DIR),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Where to write the Prometheus text snapshot after a run
    pub snapshot_path: Option<PathBuf>,
}

impl Config {
    /// Load from a TOML file, or start from defaults when no path is given.
    /// Environment overrides are applied afterwards and the result validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(v) = env_var("ENRICH_INPUT") {
            self.pipeline.input = PathBuf::from(v);
        }
        if let Some(v) = env_var("ENRICH_OUTPUT") {
            self.pipeline.output = PathBuf::from(v);
        }
        if let Some(v) = env_var("ENRICH_WORKERS") {
            self.pipeline.workers = v
                .parse()
                .map_err(|_| PipelineError::Config(format!("ENRICH_WORKERS is not a number: {v}")))?;
        }
        if let Some(v) = env_var("ENRICH_MODEL_DIR") {
            self.analyzer.model_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = env_var("ENRICH_LOG_DIR") {
            self.logging.log_dir = PathBuf::from(v);
        }
        if let Some(v) = env_var("ENRICH_METRICS_SNAPSHOT") {
            self.metrics.snapshot_path = Some(PathBuf::from(v));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.workers == 0 {
            return Err(PipelineError::Config("pipeline.workers must be at least 1".into()));
        }
        if self.pipeline.workers > constants::MAX_WORKERS {
            return Err(PipelineError::Config(format!(
                "pipeline.workers must be at most {}",
                constants::MAX_WORKERS
            )));
        }
        if self.pipeline.channel_capacity == 0 {
            return Err(PipelineError::Config("pipeline.channel_capacity must be at least 1".into()));
        }
        if self.analyzer.max_text_chars == 0 {
            return Err(PipelineError::Config("analyzer.max_text_chars must be at least 1".into()));
        }
        if self.analyzer.fallback_label.trim().is_empty() {
            return Err(PipelineError::Config("analyzer.fallback_label must not be empty".into()));
        }
        Ok(())
    }
}

fn env_var(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_policy() {
        let config = Config::default();
        assert_eq!(config.pipeline.workers, 1);
        assert_eq!(config.analyzer.fallback_label, "MISC");
        assert_eq!(
            config.entity_filter.unwanted_labels,
            vec!["CARDINAL", "ORDINAL", "DATE", "TIME", "MONEY", "PERCENT", "QUANTITY"]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults_for_missing_sections() {
        let config = Config::from_toml_str(
            r#"
            [pipeline]
            workers = 4

            [entity_filter]
            unwanted_labels = ["DATE"]
            "#,
        )
        .unwrap();
        assert_eq!(config.pipeline.workers, 4);
        assert_eq!(config.pipeline.output, PathBuf::from("enriched_data.csv"));
        assert_eq!(config.entity_filter.unwanted_labels, vec!["DATE"]);
        assert_eq!(config.analyzer.max_text_chars, 1_000_000);
    }

    #[test]
    fn zero_workers_is_rejected() {
        let config = Config::from_toml_str("[pipeline]\nworkers = 0\n").unwrap();
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn worker_count_above_the_limit_is_rejected() {
        let mut config = Config::default();
        config.pipeline.workers = constants::MAX_WORKERS;
        assert!(config.validate().is_ok());

        config.pipeline.workers = 600;
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(matches!(
            Config::from_toml_str("[pipeline\nworkers = 1"),
            Err(PipelineError::Toml(_))
        ));
    }
}
