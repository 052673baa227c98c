use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use comment_enricher::app::enrich_use_case::{EnrichSettings, EnrichUseCase};
use comment_enricher::config::Config;
use comment_enricher::infra::{CsvFileOutputAdapter, ModelResourceFactory, NdjsonFileSource};
use comment_enricher::logging;
use comment_enricher::observability;
use comment_enricher::pipeline::processing::resources::NlpResources;
use comment_enricher::pipeline::TextAnalyzer;
use comment_enricher::types::Entity;

const SAMPLE_SENTENCES: [&str; 5] = [
    "Apple is releasing the first iPhone 15 in September for $999.",
    "The top two companies are Google and Microsoft.",
    "One of the best programming languages is Python.",
    "The event is happening today at 4pm.",
    "Khaleel is learning about data pipelines in Germany.",
];

#[derive(Parser)]
#[command(name = "comment_enricher")]
#[command(about = "Enrich a stream of comments with sentiment and named entities")]
#[command(version)]
struct Cli {
    /// Optional TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich an NDJSON comment file into a CSV dataset
    Run {
        /// NDJSON input file
        #[arg(long)]
        input: Option<PathBuf>,
        /// CSV output file (overwritten)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Number of parallel analyzer workers
        #[arg(long)]
        workers: Option<usize>,
        /// Directory holding lexicon.json and gazetteer.json
        #[arg(long)]
        model_dir: Option<PathBuf>,
        /// Write a Prometheus metrics snapshot here after the run
        #[arg(long)]
        metrics_snapshot: Option<PathBuf>,
    },
    /// Show which entities are recognized and which survive filtering
    Entities {
        /// Texts to inspect; a built-in sample set is used when empty
        texts: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            input,
            output,
            workers,
            model_dir,
            metrics_snapshot,
        } => {
            if let Some(input) = input {
                config.pipeline.input = input;
            }
            if let Some(output) = output {
                config.pipeline.output = output;
            }
            if let Some(workers) = workers {
                config.pipeline.workers = workers;
            }
            if let Some(model_dir) = model_dir {
                config.analyzer.model_dir = Some(model_dir);
            }
            if let Some(path) = metrics_snapshot {
                config.metrics.snapshot_path = Some(path);
            }
            config.validate()?;

            let _guard = logging::init_logging(&config.logging)?;
            run(&config).await
        }
        Commands::Entities { texts } => {
            let _guard = logging::init_logging(&config.logging)?;
            inspect_entities(&config, texts)
        }
    }
}

async fn run(config: &Config) -> anyhow::Result<()> {
    if let Err(e) = observability::init() {
        warn!("Metrics disabled: {}", e);
    }

    let source = Box::new(NdjsonFileSource::new(&config.pipeline.input));
    let output = Arc::new(CsvFileOutputAdapter::new(&config.pipeline.output));
    let use_case = EnrichUseCase::new(
        Arc::new(ModelResourceFactory::new(config.analyzer.clone())),
        EnrichSettings::from_config(config),
    );

    let result = use_case.run(source, output).await;

    if let Some(path) = &config.metrics.snapshot_path {
        match observability::write_snapshot(path) {
            Ok(true) => info!("Metrics snapshot written to {}", path.display()),
            Ok(false) => {}
            Err(e) => warn!("Failed to write metrics snapshot: {}", e),
        }
    }

    let summary = result.map_err(|e| {
        error!("Enrichment run failed: {}", e);
        e
    })?;

    println!("Enrichment run {}", summary.run_id);
    println!("   Workers: {}", summary.workers);
    println!("   Lines read: {}", summary.lines_read);
    println!("   Enriched: {}", summary.enriched);
    println!("   Dropped (malformed input): {}", summary.dropped_malformed);
    println!("   Dropped (enrichment error): {}", summary.dropped_enrichment);
    println!("   Blank lines skipped: {}", summary.blank_lines);
    println!("   Output file: {}", config.pipeline.output.display());
    Ok(())
}

fn inspect_entities(config: &Config, texts: Vec<String>) -> anyhow::Result<()> {
    let analyzer = TextAnalyzer::from_config(NlpResources::load(&config.analyzer)?, config);

    let texts = if texts.is_empty() {
        SAMPLE_SENTENCES.iter().map(|s| s.to_string()).collect()
    } else {
        texts
    };

    for (i, text) in texts.iter().enumerate() {
        let (all, kept) = analyzer.inspect_entities(text);
        println!("--- Text {} ---", i + 1);
        println!("\"{}\"", text);
        print_entities("All entities", &all);
        print_entities("Kept after filtering", &kept);
        println!();
    }
    Ok(())
}

fn print_entities(title: &str, entities: &[Entity]) {
    println!("  {}:", title);
    if entities.is_empty() {
        println!("     (none)");
    }
    for entity in entities {
        println!("     - '{}' ({})", entity.text, entity.label);
    }
}
