// src/ingest/mod.rs

pub mod raw_table;
pub mod source;

pub use raw_table::{RawRecord, RawTable, SourceFormat};
pub use source::{read_location, Location};

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::time::Instant;
use tracing::{error, info};

use crate::config::{DashboardConfig, SourceConfig};
use crate::model::{Collections, Dataset, EntityMetric};
use crate::normalize::normalize;

/// Normalize every row of `table`, dropping keyless rows.
/// Returns the kept rows and how many were dropped.
pub fn normalize_table(table: &RawTable, dataset: Dataset) -> (Vec<EntityMetric>, usize) {
    let mut dropped = 0;
    let rows = table
        .records()
        .filter_map(|rec| {
            let m = normalize(&rec, dataset);
            if m.is_none() {
                dropped += 1;
            }
            m
        })
        .collect();
    (rows, dropped)
}

/// Fetch, parse and normalize one dataset.
#[tracing::instrument(level = "info", skip(client, base, source), fields(path = %source.path))]
pub async fn load_dataset(
    client: &Client,
    base: &str,
    source: &SourceConfig,
    dataset: Dataset,
) -> Result<Vec<EntityMetric>> {
    let location = Location::resolve(base, &source.path)?;
    let format = source.format(dataset)?;
    let start = Instant::now();

    let bytes = read_location(client, &location).await?;
    let size = bytes.len();

    // parsing is CPU-bound; keep it off the async workers
    let (rows, dropped) = tokio::task::spawn_blocking(move || -> Result<_> {
        let table = RawTable::parse(&bytes, &format)?;
        Ok(normalize_table(&table, dataset))
    })
    .await?
    .with_context(|| format!("parsing {}", location))?;

    info!(
        %dataset,
        %location,
        bytes = size,
        rows = rows.len(),
        dropped,
        elapsed = ?start.elapsed(),
        "dataset loaded"
    );
    Ok(rows)
}

/// Load both datasets concurrently. Either failing fails the whole load; the
/// returned error is deliberately coarse, the cause is logged.
pub async fn load_collections(client: &Client, config: &DashboardConfig) -> Result<Collections> {
    let loaded = tokio::try_join!(
        load_dataset(client, &config.base, &config.publisher, Dataset::Publisher),
        load_dataset(client, &config.base, &config.hosting, Dataset::Hosting),
    );
    match loaded {
        Ok((publisher, hosting)) => Ok(Collections::new(publisher, hosting)),
        Err(e) => {
            error!(error = %format!("{:#}", e), "dataset load failed");
            Err(e.context("failed to load datasets"))
        }
    }
}
