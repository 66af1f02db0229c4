use anyhow::Result;
use clap::Parser;
use recordedby_dashboard::{
    config::DashboardConfig,
    current_view, ingest,
    model::{Collections, Dataset},
    render::{print_view, render},
    Event, SortSpec, ViewState,
};
use reqwest::Client;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Browse publisher and hosting-organization recordedBy statistics.
#[derive(Parser, Debug)]
#[command(name = "recordedby-dashboard", version)]
struct Args {
    /// YAML config file (defaults to ./dashboard.yaml when present)
    #[arg(short, long, env = "DASHBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Directory or http(s) URL the dataset paths are relative to
    #[arg(long, env = "DASHBOARD_BASE")]
    base: Option<String>,

    /// Publisher statistics file
    #[arg(long)]
    publisher: Option<String>,

    /// Hosting organization statistics file
    #[arg(long)]
    hosting: Option<String>,

    /// Tab to show: publisher or hosting
    #[arg(short, long)]
    dataset: Option<Dataset>,

    /// Case-insensitive name filter
    #[arg(short, long)]
    search: Option<String>,

    /// Sort as `<column>-<asc|desc>`, e.g. `total_records-desc`
    #[arg(long)]
    sort: Option<SortSpec>,

    /// Key of the entity to show in the detail panel
    #[arg(long)]
    select: Option<String>,

    /// Maximum list rows printed
    #[arg(long, default_value = "25")]
    limit: usize,

    /// Print the rendered view as JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Read commands (`tab`, `search`, `sort`, `select`, `clear`, `quit`) from stdin
    #[arg(short, long)]
    interactive: bool,
}

fn show(state: &ViewState, data: &Collections, args: &Args) -> Result<()> {
    let rendered = render(state, &current_view(state, data));
    if args.json {
        println!("{}", serde_json::to_string_pretty(&rendered)?);
    } else {
        print_view(&rendered, Some(args.limit));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // ─── 2) config + overrides ───────────────────────────────────────
    let mut config = DashboardConfig::load(args.config.as_deref())?;
    if let Some(base) = &args.base {
        config.base = base.clone();
    }
    if let Some(path) = &args.publisher {
        config.source_mut(Dataset::Publisher).path = path.clone();
    }
    if let Some(path) = &args.hosting {
        config.source_mut(Dataset::Hosting).path = path.clone();
    }
    config.validate()?;

    // ─── 3) load both datasets ───────────────────────────────────────
    let client = Client::new();
    // the cause is already logged by the loader; show only the summary
    let data = match ingest::load_collections(&client, &config).await {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        publishers = data.rows(Dataset::Publisher).len(),
        hosting = data.rows(Dataset::Hosting).len(),
        "datasets ready"
    );

    // ─── 4) initial view from flags ──────────────────────────────────
    let mut state = ViewState::new(config.dataset, config.initial_sort());
    let initial = [
        args.dataset.map(Event::SwitchDataset),
        args.search.clone().map(Event::Search),
        args.sort.clone().map(Event::Sort),
        args.select.clone().map(Event::Select),
    ];
    for event in initial.into_iter().flatten() {
        state = state.apply(event);
    }
    show(&state, &data, &args)?;

    if !args.interactive {
        return Ok(());
    }

    // ─── 5) one event per stdin line ─────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "quit" | "exit" | "q") {
            break;
        }
        match line.parse::<Event>() {
            Ok(event) => {
                state = state.apply(event);
                show(&state, &data, &args)?;
            }
            Err(e) => warn!("{}", e),
        }
    }

    Ok(())
}
