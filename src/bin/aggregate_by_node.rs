use anyhow::Result;
use clap::Parser;
use recordedby_dashboard::{
    config::DEFAULT_PUBLISHER_PATH,
    ingest::SourceFormat,
    model::Dataset,
    nodes::{aggregate_files, NodeInputs},
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Aggregate publisher recordedBy statistics by GBIF node.
#[derive(Parser, Debug)]
#[command(name = "aggregate-by-node", version)]
struct Args {
    /// Node → organization mapping CSV
    #[arg(long, default_value = "out-nodes/node-org-map.csv")]
    node_org_map: PathBuf,

    /// Publisher statistics TSV
    #[arg(long, default_value = DEFAULT_PUBLISHER_PATH)]
    publisher_stats_tsv: PathBuf,

    /// Node listing used for canonical node titles
    #[arg(long, default_value = "out-nodes/nodes.json")]
    nodes_json: PathBuf,

    /// Output CSV path
    #[arg(long, default_value = "out-by-node/recordedby_by_node.csv")]
    out_csv: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let inputs = NodeInputs {
        node_org_map: args.node_org_map,
        publisher_stats: args.publisher_stats_tsv,
        publisher_format: SourceFormat::for_dataset(Dataset::Publisher),
        nodes_json: Some(args.nodes_json),
    };

    let nodes = aggregate_files(&inputs, &args.out_csv).await?;
    info!(nodes, out = %args.out_csv.display(), "done");
    Ok(())
}
