use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use reasoning_oracle::{HttpOracle, ReasoningOracle};
use taskbrowser::config::AppConfig;
use taskbrowser::server::{build_router, ServeState};
use taskbrowser::store;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(author, version, about = "Natural-language web research agent driving a real browser")]
struct CliArgs {
    /// Configuration file path (defaults to `config/taskbrowser.toml` if present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the configured bind address, e.g. 127.0.0.1:8080
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliArgs::parse();
    let config = AppConfig::load(cli.config)?;

    init_logging(&config.log_level)?;
    info!("starting taskbrowser v{}", env!("CARGO_PKG_VERSION"));

    let oracle: Option<Arc<dyn ReasoningOracle>> = if config.oracle_configured() {
        let endpoint = config.oracle_endpoint.clone().expect("checked by oracle_configured");
        let api_key = config.oracle_api_key.clone().expect("checked by oracle_configured");
        info!("reasoning oracle configured, planning and fallback choices may use it");
        Some(Arc::new(HttpOracle::new(endpoint, api_key)))
    } else {
        warn!("no reasoning oracle configured, running deterministic paths only");
        None
    };

    let workstream_store = store::shared_store(config.workstream_store_path.clone());

    let bind_addr = cli.bind.unwrap_or_else(|| config.bind_addr.clone());
    let state = ServeState::new(Arc::new(config), oracle, workstream_store);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(%bind_addr, "listening");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_logging(level: &str) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}
