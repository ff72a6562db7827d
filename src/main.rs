use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use todo_api_rust::config::AppConfig;
use todo_api_rust::database::MemoryStore;
use todo_api_rust::{app, AppState};

#[derive(Parser, Debug)]
#[command(name = "todo-api", version, about = "Todo API server")]
struct Args {
    /// Bind address (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides TODO_API_PORT / PORT)
    #[arg(long, short)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up JWT_SECRET, BOOTSTRAP_ADMIN_*, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    tracing::info!("Starting Todo API in {:?} mode", config.environment);
    tracing::debug!("Security settings: {:?}", config.security);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let janitor_every = config.api.rate_limit_window().max(Duration::from_secs(30));

    let state = AppState::new(config, MemoryStore::new())?;
    state.bootstrap_admin().await?;
    let _janitor = state.limiter.spawn_janitor(janitor_every);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Todo API listening on http://{}", bind_addr);

    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
