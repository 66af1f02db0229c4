use anyhow::{Context, Result};
use clap::Parser;
use recordedby_dashboard::{
    config::{DashboardConfig, RegistryConfig},
    enrich::{enrich_file, RegistryClient, RAW_HOSTING_FORMAT},
    ingest::SourceFormat,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Enrich hosting organization statistics with publisher name and link via the GBIF registry.
#[derive(Parser, Debug)]
#[command(name = "enrich-hosting", version)]
struct Args {
    /// Statistics file produced by the SQL download
    input: PathBuf,

    /// Where to write the enriched CSV
    output: PathBuf,

    /// YAML config file providing registry settings
    #[arg(short, long, env = "DASHBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Concurrent registry requests
    #[arg(long)]
    concurrency: Option<usize>,

    /// Input field delimiter
    #[arg(long, default_value = "\t")]
    delimiter: char,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut registry: RegistryConfig = DashboardConfig::load(args.config.as_deref())?.registry;
    if let Some(t) = args.timeout {
        registry.timeout_secs = t;
    }
    if let Some(c) = args.concurrency {
        registry.concurrency = c.max(1);
    }
    anyhow::ensure!(
        args.delimiter.is_ascii(),
        "delimiter must be a single ASCII character"
    );
    let format = SourceFormat {
        delimiter: args.delimiter as u8,
        ..RAW_HOSTING_FORMAT
    };

    let client = RegistryClient::new(&registry)?;
    let stats = enrich_file(&args.input, &args.output, format, &client, registry.concurrency)
        .await
        .with_context(|| format!("enriching {}", args.input.display()))?;

    info!(
        rows = stats.rows,
        named = stats.named_rows,
        output = %args.output.display(),
        "done"
    );
    Ok(())
}
