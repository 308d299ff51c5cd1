//! Run places through the pipeline and write their records.
//!
//! Places are given as `Name,CODE` arguments or one per line in a file:
//!
//! ```text
//! run-places "Austin,TX" "Portland,OR" --output data
//! run-places --places-file places.txt
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use municipal_facts::output::{save_record, RecordCollection};
use municipal_facts::{providers, Pipeline, PipelineConfig, PlaceOutcome, ProviderCredentials};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "run-places")]
#[command(about = "Extract verified bulk waste facts for US places")]
struct Cli {
    /// Places as "Name,CODE"
    places: Vec<String>,

    /// File with one "Name,CODE" per line
    #[arg(long)]
    places_file: Option<PathBuf>,

    /// Directory for per-place JSON and the combined collection
    #[arg(long, default_value = "data")]
    output: PathBuf,

    /// Places run concurrently (overrides BATCH_SIZE)
    #[arg(long)]
    batch_size: Option<usize>,

    /// Skip pacing sleeps between calls and places
    #[arg(long)]
    no_delays: bool,
}

fn parse_place(line: &str) -> Result<(String, String)> {
    let Some((name, code)) = line.rsplit_once(',') else {
        bail!("expected \"Name,CODE\", got {line:?}");
    };
    let (name, code) = (name.trim(), code.trim());
    if name.is_empty() || code.is_empty() {
        bail!("expected \"Name,CODE\", got {line:?}");
    }
    Ok((name.to_string(), code.to_ascii_uppercase()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,municipal_facts=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();
    let credentials = ProviderCredentials::from_env()?;

    let mut lines = cli.places.clone();
    if let Some(path) = &cli.places_file {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        lines.extend(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(String::from),
        );
    }
    let places = lines
        .iter()
        .map(|line| parse_place(line))
        .collect::<Result<Vec<_>>>()?;
    if places.is_empty() {
        bail!("no places given");
    }

    let mut config = PipelineConfig::default()
        .with_batch_size(cli.batch_size.unwrap_or(credentials.batch_size));
    if cli.no_delays {
        config = config.without_delays();
    }

    let collaborators = providers::collaborators(&credentials).context("Failed to build providers")?;
    let pipeline = Pipeline::new(collaborators, config);

    tracing::info!(places = places.len(), "Starting run");
    let outcomes = pipeline
        .run_batch(places.iter().map(|(name, code)| (name.as_str(), code.as_str())))
        .await;

    let records_dir = cli.output.join("places");
    for outcome in &outcomes {
        match outcome {
            PlaceOutcome::Record(record) => {
                let path = save_record(&records_dir, record)?;
                tracing::info!(
                    slug = %record.slug,
                    label = ?record.audit.confidence.label(),
                    path = %path.display(),
                    "Saved record"
                );
            }
            PlaceOutcome::Skipped(skip) => {
                tracing::warn!(slug = %skip.slug, reason = %skip.reason, "Skipped place");
            }
        }
    }

    let collection_path = cli.output.join("all_places.json");
    let mut collection = RecordCollection::load(&collection_path)?;
    let merged = collection.merge_outcomes(&outcomes);
    collection.save(&collection_path)?;

    tracing::info!(
        merged,
        skipped = outcomes.len() - merged,
        total = collection.len(),
        path = %collection_path.display(),
        "Run complete"
    );
    Ok(())
}
