// src/nodes/mod.rs

//! Roll publisher statistics up to GBIF participant nodes.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    collections::HashMap,
    io::Write,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::{info, warn};

use crate::ingest::{normalize_table, RawTable, SourceFormat};
use crate::model::{Dataset, EntityMetric, Metric, TOTAL_RECORDS};

/// One organization endorsed by a node, as listed in the node-org map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endorsement {
    pub org_key: String,
    pub node_title: String,
}

/// Node → endorsed organizations, in the order nodes first appear in the map.
#[derive(Debug, Default)]
pub struct NodeOrgMap {
    nodes: Vec<(String, Vec<Endorsement>)>,
    index: HashMap<String, usize>,
}

impl NodeOrgMap {
    /// Build from a `nodeKey,nodeTitle,publishingOrgKey,publisherName` table.
    /// Rows missing the node or organization key are skipped.
    pub fn from_table(table: &RawTable) -> Self {
        let mut map = Self::default();
        for rec in table.records() {
            let node_key = rec.get("nodeKey").unwrap_or("");
            let org_key = rec.get("publishingOrgKey").unwrap_or("");
            if node_key.is_empty() || org_key.is_empty() {
                continue;
            }
            map.push(
                node_key,
                Endorsement {
                    org_key: org_key.to_string(),
                    node_title: rec.get("nodeTitle").unwrap_or("").to_string(),
                },
            );
        }
        map
    }

    pub fn push(&mut self, node_key: &str, endorsement: Endorsement) {
        let idx = match self.index.get(node_key) {
            Some(idx) => *idx,
            None => {
                self.nodes.push((node_key.to_string(), Vec::new()));
                self.index.insert(node_key.to_string(), self.nodes.len() - 1);
                self.nodes.len() - 1
            }
        };
        self.nodes[idx].1.push(endorsement);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct NodeEntry {
    #[serde(rename = "nodeKey")]
    node_key: String,
    #[serde(rename = "nodeTitle", default)]
    node_title: Option<String>,
}

/// `nodeKey → nodeTitle` from a `nodes.json` listing.
pub fn parse_node_titles(json: &str) -> Result<HashMap<String, String>> {
    let entries: Vec<NodeEntry> = serde_json::from_str(json)?;
    Ok(entries
        .into_iter()
        .filter_map(|e| e.node_title.map(|t| (e.node_key, t)))
        .collect())
}

/// Summed statistics of one node's organizations.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeAggregate {
    pub node_key: String,
    pub node_title: String,
    pub total_records: f64,
    /// Summed counts, in [`Metric::ALL`] order.
    pub counts: [f64; 8],
    /// Organizations of the node present in the statistics.
    pub org_count: usize,
}

impl NodeAggregate {
    pub fn count(&self, metric: Metric) -> f64 {
        let idx = Metric::ALL.iter().position(|m| *m == metric).unwrap_or(0);
        self.counts[idx]
    }

    /// `100 × count / total`, zero when the node has no records.
    pub fn pct(&self, metric: Metric) -> f64 {
        if self.total_records > 0.0 {
            100.0 * self.count(metric) / self.total_records
        } else {
            0.0
        }
    }
}

pub fn aggregate(
    map: &NodeOrgMap,
    publishers: &[EntityMetric],
    titles: &HashMap<String, String>,
) -> Vec<NodeAggregate> {
    let by_key: HashMap<&str, &EntityMetric> =
        publishers.iter().map(|p| (p.key.as_str(), p)).collect();

    map.nodes
        .iter()
        .map(|(node_key, orgs)| {
            let mut agg = NodeAggregate {
                node_key: node_key.clone(),
                node_title: titles
                    .get(node_key)
                    .filter(|t| !t.is_empty())
                    .cloned()
                    .or_else(|| {
                        orgs.first()
                            .map(|o| o.node_title.clone())
                            .filter(|t| !t.is_empty())
                    })
                    .unwrap_or_else(|| node_key.clone()),
                total_records: 0.0,
                counts: [0.0; 8],
                org_count: 0,
            };
            for org in orgs {
                let Some(stats) = by_key.get(org.org_key.as_str()) else {
                    continue;
                };
                agg.org_count += 1;
                agg.total_records += stats.total_records;
                for (i, m) in Metric::ALL.iter().enumerate() {
                    agg.counts[i] += stats.pair(*m).count;
                }
            }
            agg
        })
        .collect()
}

pub fn output_headers() -> Vec<String> {
    let mut headers = vec![
        "nodeKey".to_string(),
        "nodeTitle".to_string(),
        TOTAL_RECORDS.to_string(),
    ];
    for m in Metric::ALL {
        headers.push(m.count_column().to_string());
        headers.push(m.pct_column().to_string());
    }
    headers.push("orgCount".to_string());
    headers
}

fn format_pct(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

pub fn write_aggregates<W: Write>(aggregates: &[NodeAggregate], out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(output_headers())?;
    for agg in aggregates {
        let mut row = vec![
            agg.node_key.clone(),
            agg.node_title.clone(),
            (agg.total_records as i64).to_string(),
        ];
        for m in Metric::ALL {
            row.push((agg.count(m) as i64).to_string());
            row.push(format_pct(agg.pct(m)));
        }
        row.push(agg.org_count.to_string());
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Inputs of a node aggregation run.
#[derive(Debug, Clone)]
pub struct NodeInputs {
    pub node_org_map: PathBuf,
    pub publisher_stats: PathBuf,
    pub publisher_format: SourceFormat,
    pub nodes_json: Option<PathBuf>,
}

async fn read_table(path: &Path, format: &SourceFormat) -> Result<RawTable> {
    let data = fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    RawTable::parse(&data, format).with_context(|| format!("parsing {}", path.display()))
}

/// Read the inputs, aggregate and write the CSV to `out_path`.
/// Returns the number of nodes written.
#[tracing::instrument(level = "info", skip(inputs, out_path), fields(out = %out_path.display()))]
pub async fn aggregate_files(inputs: &NodeInputs, out_path: &Path) -> Result<usize> {
    let map_table = read_table(&inputs.node_org_map, &SourceFormat::CSV).await?;
    let map = NodeOrgMap::from_table(&map_table);

    let stats_table = read_table(&inputs.publisher_stats, &inputs.publisher_format).await?;
    let (publishers, dropped) = normalize_table(&stats_table, Dataset::Publisher);
    info!(nodes = map.len(), publishers = publishers.len(), dropped, "inputs read");

    let titles = match &inputs.nodes_json {
        Some(path) if path.exists() => {
            let text = fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            parse_node_titles(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        Some(path) => {
            warn!(path = %path.display(), "nodes listing not found, using map titles");
            HashMap::new()
        }
        None => HashMap::new(),
    };

    let aggregates = aggregate(&map, &publishers, &titles);
    let mut out = Vec::new();
    write_aggregates(&aggregates, &mut out)?;
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    fs::write(out_path, out)
        .await
        .with_context(|| format!("writing {}", out_path.display()))?;
    info!(nodes = aggregates.len(), "node aggregates written");
    Ok(aggregates.len())
}
