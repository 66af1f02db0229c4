// src/enrich/mod.rs

//! Adds `publisherName` and `publisherUrl` columns to the raw hosting
//! organization statistics, looking names up in the GBIF registry.

pub mod registry;

pub use registry::RegistryClient;

use anyhow::{bail, Context, Result};
use std::{
    collections::{HashMap, HashSet},
    path::Path,
};
use tokio::{fs, time::Instant};
use tracing::info;

use crate::ingest::{RawTable, SourceFormat};
use crate::normalize::fields::publisher_page;

pub const KEY_COLUMN: &str = "hostingorganizationkey";
pub const NAME_COLUMN: &str = "publisherName";
pub const URL_COLUMN: &str = "publisherUrl";

/// Delimiter/quoting of the raw hosting statistics from the SQL download.
pub const RAW_HOSTING_FORMAT: SourceFormat = SourceFormat {
    delimiter: b'\t',
    quoting: true,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichStats {
    pub rows: usize,
    pub keyed_rows: usize,
    pub named_rows: usize,
}

/// Distinct non-empty organization keys, in first-seen order.
pub fn org_keys(table: &RawTable) -> Result<Vec<String>> {
    if table.column(KEY_COLUMN).is_none() {
        bail!("column '{}' not found", KEY_COLUMN);
    }
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for rec in table.records() {
        let key = rec.get(KEY_COLUMN).unwrap_or("").trim();
        if !key.is_empty() && seen.insert(key.to_string()) {
            keys.push(key.to_string());
        }
    }
    Ok(keys)
}

/// Fill the name and URL columns of every row from `titles`. Rows without a
/// key, or whose key has no known title, get empty names.
pub fn enrich_table(
    table: &mut RawTable,
    titles: &HashMap<String, Option<String>>,
) -> Result<EnrichStats> {
    let key_idx = match table.column(KEY_COLUMN) {
        Some(idx) => idx,
        None => bail!("column '{}' not found", KEY_COLUMN),
    };
    let name_idx = table.ensure_column(NAME_COLUMN);
    let url_idx = table.ensure_column(URL_COLUMN);

    let mut stats = EnrichStats {
        rows: table.len(),
        ..Default::default()
    };
    for row in 0..table.len() {
        let key = table.rows[row]
            .get(key_idx)
            .map(|k| k.trim().to_string())
            .unwrap_or_default();
        if key.is_empty() {
            table.set(row, name_idx, "");
            table.set(row, url_idx, "");
            continue;
        }
        stats.keyed_rows += 1;
        let title = titles.get(&key).cloned().flatten().unwrap_or_default();
        if !title.is_empty() {
            stats.named_rows += 1;
        }
        table.set(row, name_idx, title);
        table.set(row, url_idx, publisher_page(&key));
    }
    Ok(stats)
}

/// Read `input`, enrich it via `registry` and write `output` as CSV.
#[tracing::instrument(level = "info", skip(registry, input, output), fields(input = %input.display(), output = %output.display()))]
pub async fn enrich_file(
    input: &Path,
    output: &Path,
    input_format: SourceFormat,
    registry: &RegistryClient,
    concurrency: usize,
) -> Result<EnrichStats> {
    if !input.exists() {
        bail!("input CSV not found: {}", input.display());
    }
    let start = Instant::now();
    let data = fs::read(input)
        .await
        .with_context(|| format!("reading {}", input.display()))?;
    let mut table = RawTable::parse(&data, &input_format)
        .with_context(|| format!("parsing {}", input.display()))?;

    let keys = org_keys(&table)?;
    info!(rows = table.len(), organizations = keys.len(), "looking up organization titles");
    let titles = registry.org_titles(&keys, concurrency).await;

    let stats = enrich_table(&mut table, &titles)?;

    let mut out = Vec::new();
    table.write_csv(&mut out, &SourceFormat::CSV)?;
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    fs::write(output, out)
        .await
        .with_context(|| format!("writing {}", output.display()))?;

    info!(?stats, elapsed = ?start.elapsed(), "enrichment written");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::registry::test_server;
    use super::*;
    use reqwest::Client;
    use tempfile::tempdir;

    const RAW: &str = "hostingorganizationkey\ttotal_records\n\
                       k1\t10\n\
                       \t3\n\
                       k2\t7\n\
                       k1\t1\n";

    #[test]
    fn collects_distinct_keys() -> Result<()> {
        let table = RawTable::parse(RAW.as_bytes(), &RAW_HOSTING_FORMAT)?;
        assert_eq!(org_keys(&table)?, vec!["k1", "k2"]);
        Ok(())
    }

    #[test]
    fn missing_key_column_is_an_error() -> Result<()> {
        let mut table = RawTable::parse(b"a\tb\n1\t2\n", &RAW_HOSTING_FORMAT)?;
        assert!(org_keys(&table).is_err());
        assert!(enrich_table(&mut table, &HashMap::new()).is_err());
        Ok(())
    }

    #[test]
    fn fills_name_and_url_columns() -> Result<()> {
        let mut table = RawTable::parse(RAW.as_bytes(), &RAW_HOSTING_FORMAT)?;
        let titles = HashMap::from([
            ("k1".to_string(), Some("Museum".to_string())),
            ("k2".to_string(), None),
        ]);
        let stats = enrich_table(&mut table, &titles)?;
        assert_eq!(
            stats,
            EnrichStats {
                rows: 4,
                keyed_rows: 3,
                named_rows: 2
            }
        );
        assert_eq!(table.get(0, NAME_COLUMN), Some("Museum"));
        assert_eq!(table.get(0, URL_COLUMN), Some("https://www.gbif.org/publisher/k1"));
        assert_eq!(table.get(1, NAME_COLUMN), Some(""));
        assert_eq!(table.get(1, URL_COLUMN), Some(""));
        assert_eq!(table.get(2, NAME_COLUMN), Some(""));
        assert_eq!(table.get(2, URL_COLUMN), Some("https://www.gbif.org/publisher/k2"));
        Ok(())
    }

    #[test]
    fn existing_columns_are_overwritten_not_duplicated() -> Result<()> {
        let raw = "hostingorganizationkey\tpublisherName\npk\told\n";
        let mut table = RawTable::parse(raw.as_bytes(), &RAW_HOSTING_FORMAT)?;
        let titles = HashMap::from([("pk".to_string(), Some("new".to_string()))]);
        enrich_table(&mut table, &titles)?;
        assert_eq!(table.headers, vec!["hostingorganizationkey", "publisherName", "publisherUrl"]);
        assert_eq!(table.get(0, NAME_COLUMN), Some("new"));
        Ok(())
    }

    #[tokio::test]
    async fn enriches_a_file_end_to_end() -> Result<()> {
        let base = test_server::serve(HashMap::from([(
            "/organization/k1".to_string(),
            (200, r#"{"title":"Museum, Natural History"}"#.to_string()),
        )]))
        .await;
        let registry = RegistryClient::with_client(Client::new(), &base)?;

        let dir = tempdir()?;
        let input = dir.path().join("raw.tsv");
        let output = dir.path().join("out").join("enriched.csv");
        std::fs::write(&input, RAW)?;

        let stats = enrich_file(&input, &output, RAW_HOSTING_FORMAT, &registry, 4).await?;
        assert_eq!(stats.named_rows, 2);

        let written = std::fs::read_to_string(&output)?;
        let mut lines = written.lines();
        assert_eq!(
            lines.next(),
            Some("hostingorganizationkey,total_records,publisherName,publisherUrl")
        );
        assert_eq!(
            lines.next(),
            Some("k1,10,\"Museum, Natural History\",https://www.gbif.org/publisher/k1")
        );
        Ok(())
    }

    #[tokio::test]
    async fn missing_input_is_an_error() -> Result<()> {
        let registry = RegistryClient::with_client(Client::new(), "http://127.0.0.1:9")?;
        let dir = tempdir()?;
        let err = enrich_file(
            &dir.path().join("nope.tsv"),
            &dir.path().join("out.csv"),
            RAW_HOSTING_FORMAT,
            &registry,
            1,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("input CSV not found"));
        Ok(())
    }

    #[tokio::test]
    async fn unwritable_output_dir_names_the_directory() -> Result<()> {
        let base = test_server::serve(HashMap::new()).await;
        let registry = RegistryClient::with_client(Client::new(), &base)?;
        let dir = tempdir()?;
        let input = dir.path().join("raw.tsv");
        std::fs::write(&input, RAW)?;
        let blocker = dir.path().join("out");
        std::fs::write(&blocker, "")?;

        let err = enrich_file(
            &input,
            &blocker.join("sub").join("enriched.csv"),
            RAW_HOSTING_FORMAT,
            &registry,
            2,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().starts_with("creating "));
        Ok(())
    }
}
