use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinError;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::ports::{EnrichOutputPort, RawLines, RecordSourcePort, ResourceFactory};
use crate::config::Config;
use crate::constants::{CSV_HEADER, MAX_WORKERS};
use crate::error::{PipelineError, Result};
use crate::pipeline::processing::analyzer::TextAnalyzer;
use crate::pipeline::processing::entity_filter::EntityFilter;
use crate::pipeline::processing::formatter;
use crate::types::FormattedRow;

/// Knobs the dataflow needs, lifted out of [`Config`]
#[derive(Debug, Clone)]
pub struct EnrichSettings {
    pub workers: usize,
    pub channel_capacity: usize,
    pub unwanted_labels: Vec<String>,
    pub max_text_chars: usize,
}

impl EnrichSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            workers: config.pipeline.workers,
            channel_capacity: config.pipeline.channel_capacity,
            unwanted_labels: config.entity_filter.unwanted_labels.clone(),
            max_text_chars: config.analyzer.max_text_chars,
        }
    }
}

impl Default for EnrichSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Counts for one completed run.
///
/// `lines_read == blank_lines + enriched + dropped_malformed + dropped_enrichment`
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub workers: usize,
    pub lines_read: usize,
    pub blank_lines: usize,
    pub enriched: usize,
    pub dropped_malformed: usize,
    pub dropped_enrichment: usize,
}

impl RunSummary {
    pub fn dropped(&self) -> usize {
        self.dropped_malformed + self.dropped_enrichment
    }
}

#[derive(Debug, Default)]
struct DispatchStats {
    lines_read: usize,
    blank_lines: usize,
}

#[derive(Debug, Default)]
struct WorkerStats {
    enriched: usize,
    dropped_malformed: usize,
    dropped_enrichment: usize,
}

/// Runs the whole Source -> Analyzer -> Filter -> Formatter -> Sink flow.
///
/// Lines are dealt round-robin to `workers` blocking workers (at most
/// [`MAX_WORKERS`]), each with
/// its own NLP resources and its own bounded queue. Rows from all workers
/// funnel into one bounded channel drained by the sink, so output order
/// across workers is unspecified while every row stays intact.
pub struct EnrichUseCase {
    resources: Arc<dyn ResourceFactory>,
    settings: EnrichSettings,
}

impl EnrichUseCase {
    pub fn new(resources: Arc<dyn ResourceFactory>, settings: EnrichSettings) -> Self {
        Self { resources, settings }
    }

    pub fn settings(&self) -> &EnrichSettings {
        &self.settings
    }

    pub async fn run(
        &self,
        source: Box<dyn RecordSourcePort>,
        output: Arc<dyn EnrichOutputPort>,
    ) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let workers = self.settings.workers.max(1);
        let capacity = self.settings.channel_capacity.max(1);
        if workers > MAX_WORKERS {
            return Err(PipelineError::Config(format!(
                "pipeline.workers must be at most {}, got {}",
                MAX_WORKERS, workers
            )));
        }

        info!(%run_id, workers, "Starting enrichment run");

        // Nothing reaches the sink until the input is known to be readable
        let lines = source.open().map_err(PipelineError::Source)?;
        output.write_header(CSV_HEADER).await.map_err(PipelineError::Sink)?;

        let (row_tx, mut row_rx) = mpsc::channel::<FormattedRow>(capacity);
        let (line_txs, line_rxs): (Vec<_>, Vec<_>) =
            (0..workers).map(|_| mpsc::channel::<Vec<u8>>(capacity)).unzip();

        // The dispatcher gets its own thread so it never waits behind
        // workers for a blocking-pool slot
        let (dispatch_tx, dispatch_rx) = oneshot::channel();
        std::thread::Builder::new()
            .name("enrich-dispatch".to_string())
            .spawn(move || {
                let _ = dispatch_tx.send(dispatch(lines, line_txs));
            })?;

        let mut handles = Vec::with_capacity(workers);
        for (worker, line_rx) in line_rxs.into_iter().enumerate() {
            let factory = Arc::clone(&self.resources);
            let settings = self.settings.clone();
            let row_tx = row_tx.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                run_worker(worker, factory.as_ref(), &settings, line_rx, row_tx)
            }));
        }
        // Workers hold the only senders now; the drain loop ends when they finish
        drop(row_tx);

        let mut sink_error = None;
        while let Some(row) = row_rx.recv().await {
            if let Err(e) = output.write_row(&row).await {
                error!(%run_id, error = %e, "Failed to write output row");
                sink_error = Some(PipelineError::Sink(e));
                break;
            }
        }
        // Unblocks any worker still waiting to hand over a row
        drop(row_rx);

        let dispatched = dispatch_rx.await.map_err(|_| {
            PipelineError::Source(std::io::Error::new(
                std::io::ErrorKind::Other,
                "dispatcher stopped before reporting",
            ))
        });
        let mut totals = WorkerStats::default();
        let mut worker_error = None;
        for (worker, handle) in handles.into_iter().enumerate() {
            match handle.await.map_err(|e| join_error(worker, e)).and_then(|r| r) {
                Ok(stats) => {
                    totals.enriched += stats.enriched;
                    totals.dropped_malformed += stats.dropped_malformed;
                    totals.dropped_enrichment += stats.dropped_enrichment;
                }
                Err(e) => {
                    if worker_error.is_none() {
                        worker_error = Some(e);
                    }
                }
            }
        }

        if let Some(e) = sink_error {
            return Err(e);
        }
        if let Some(e) = worker_error {
            return Err(e);
        }
        let dispatched = dispatched.and_then(|r| r)?;

        output.finish().await.map_err(PipelineError::Sink)?;

        let summary = RunSummary {
            run_id,
            workers,
            lines_read: dispatched.lines_read,
            blank_lines: dispatched.blank_lines,
            enriched: totals.enriched,
            dropped_malformed: totals.dropped_malformed,
            dropped_enrichment: totals.dropped_enrichment,
        };

        let secs = started.elapsed().as_secs_f64();
        crate::observability::metrics::run::completed(secs);
        info!(
            %run_id,
            lines_read = summary.lines_read,
            enriched = summary.enriched,
            dropped = summary.dropped(),
            duration_secs = secs,
            "Enrichment run completed"
        );

        Ok(summary)
    }
}

/// Deal lines round-robin to the worker queues. Stops early if a worker
/// hangs up, which only happens when the run is already failing.
fn dispatch(lines: RawLines, workers: Vec<mpsc::Sender<Vec<u8>>>) -> Result<DispatchStats> {
    let mut stats = DispatchStats::default();
    let mut next = 0;

    for line in lines {
        let line = line.map_err(PipelineError::Source)?;
        stats.lines_read += 1;
        crate::observability::metrics::enrich::record_read();

        if line.iter().all(|b| b.is_ascii_whitespace()) {
            stats.blank_lines += 1;
            crate::observability::metrics::enrich::blank_line_skipped();
            continue;
        }

        if workers[next].blocking_send(line).is_err() {
            warn!(worker = next, "Worker stopped accepting records, ending dispatch");
            break;
        }
        next = (next + 1) % workers.len();
    }

    debug!(lines_read = stats.lines_read, "Source exhausted");
    Ok(stats)
}

fn run_worker(
    worker: usize,
    factory: &dyn ResourceFactory,
    settings: &EnrichSettings,
    mut lines: mpsc::Receiver<Vec<u8>>,
    rows: mpsc::Sender<FormattedRow>,
) -> Result<WorkerStats> {
    let resources = factory.load().map_err(|e| {
        error!(worker, error = %e, "Worker could not load NLP resources");
        e
    })?;
    crate::observability::metrics::run::worker_started();

    let analyzer = TextAnalyzer::new(
        resources,
        EntityFilter::with_unwanted_labels(&settings.unwanted_labels),
    )
    .with_max_text_chars(settings.max_text_chars);

    let mut stats = WorkerStats::default();
    while let Some(line) = lines.blocking_recv() {
        match analyzer.analyze_line(&line) {
            Ok(record) => {
                crate::observability::metrics::enrich::record_enriched(record.polarity, record.subjectivity);
                if rows.blocking_send(formatter::format(&record)).is_err() {
                    debug!(worker, "Output closed, stopping worker");
                    break;
                }
                stats.enriched += 1;
            }
            Err(e) => {
                crate::observability::metrics::enrich::record_dropped(e.kind());
                warn!(
                    worker,
                    kind = e.kind(),
                    error = %e,
                    raw = %String::from_utf8_lossy(&line),
                    "Dropping record"
                );
                if e.is_malformed_input() {
                    stats.dropped_malformed += 1;
                } else {
                    stats.dropped_enrichment += 1;
                }
            }
        }
    }

    debug!(worker, enriched = stats.enriched, "Worker finished");
    Ok(stats)
}

fn join_error(worker: usize, e: JoinError) -> PipelineError {
    PipelineError::Worker {
        worker,
        message: e.to_string(),
    }
}
