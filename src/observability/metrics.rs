//! Pipeline metrics recorded through the `metrics` facade.
//!
//! Recording is a no-op until [`init`] installs the Prometheus recorder,
//! so library users and tests pay nothing for instrumentation.

use std::fmt;
use std::path::Path;
use std::sync::OnceLock;
use tracing::info;

/// All metric names used by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    RecordsRead,
    RecordsEnriched,
    RecordsDropped,
    BlankLinesSkipped,
    EntitiesRecognized,
    EntitiesFilteredOut,
    Polarity,
    Subjectivity,
    ResourceLoadDuration,
    WorkersStarted,
    RunDuration,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::RecordsRead => "enricher_records_read_total",
            MetricName::RecordsEnriched => "enricher_records_enriched_total",
            MetricName::RecordsDropped => "enricher_records_dropped_total",
            MetricName::BlankLinesSkipped => "enricher_blank_lines_skipped_total",
            MetricName::EntitiesRecognized => "enricher_entities_recognized_total",
            MetricName::EntitiesFilteredOut => "enricher_entities_filtered_out_total",
            MetricName::Polarity => "enricher_polarity",
            MetricName::Subjectivity => "enricher_subjectivity",
            MetricName::ResourceLoadDuration => "enricher_resource_load_duration_seconds",
            MetricName::WorkersStarted => "enricher_workers_started_total",
            MetricName::RunDuration => "enricher_run_duration_seconds",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static METRICS_HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Calling it again is a no-op.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }
    let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    METRICS_HANDLE.set(handle).ok();
    info!("Metrics recorder installed");
    Ok(())
}

/// Current metrics in Prometheus text format, if the recorder is installed
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

/// Write the current snapshot to `path`. Returns false when no recorder is
/// installed and nothing was written.
pub fn write_snapshot(path: &Path) -> std::io::Result<bool> {
    match render() {
        Some(text) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)?;
            }
            std::fs::write(path, text)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

// ============================================================================
// Enrichment Metrics
// ============================================================================

pub mod enrich {
    use super::MetricName;

    pub fn record_read() {
        ::metrics::counter!(MetricName::RecordsRead.as_str()).increment(1);
    }

    pub fn blank_line_skipped() {
        ::metrics::counter!(MetricName::BlankLinesSkipped.as_str()).increment(1);
    }

    pub fn record_enriched(polarity: f64, subjectivity: f64) {
        ::metrics::counter!(MetricName::RecordsEnriched.as_str()).increment(1);
        ::metrics::histogram!(MetricName::Polarity.as_str()).record(polarity);
        ::metrics::histogram!(MetricName::Subjectivity.as_str()).record(subjectivity);
    }

    /// `kind` is the error category: `malformed_input` or `enrichment`
    pub fn record_dropped(kind: &'static str) {
        ::metrics::counter!(MetricName::RecordsDropped.as_str(), "kind" => kind).increment(1);
    }

    pub fn entities_recognized(total: usize, filtered_out: usize) {
        ::metrics::counter!(MetricName::EntitiesRecognized.as_str()).increment(total as u64);
        ::metrics::counter!(MetricName::EntitiesFilteredOut.as_str()).increment(filtered_out as u64);
    }
}

// ============================================================================
// Resource and Run Metrics
// ============================================================================

pub mod resources {
    use super::MetricName;

    pub fn loaded(secs: f64) {
        ::metrics::histogram!(MetricName::ResourceLoadDuration.as_str()).record(secs);
    }
}

pub mod run {
    use super::MetricName;

    pub fn worker_started() {
        ::metrics::counter!(MetricName::WorkersStarted.as_str()).increment(1);
    }

    pub fn completed(secs: f64) {
        ::metrics::histogram!(MetricName::RunDuration.as_str()).record(secs);
    }
}
