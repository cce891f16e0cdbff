//! Process entry point for the turnmem worker (spec §1.5, §4.10): parses a
//! handful of convenience overrides, loads the frozen `Config`, wires every
//! component, and serves the HTTP surface until `Ctrl+C`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use turnmem_auth::Config;
use turnmem_compress::HttpLlmClient;
use turnmem_queue::QueueEngine;
use turnmem_server::AppState;
use turnmem_server::QueueProcessor;
use turnmem_server::RateLimiter;
use turnmem_sse::SseBroker;
use turnmem_store::Store;

#[derive(Parser)]
#[command(name = "turnmem-server")]
#[command(about = "Local memory worker: captures, compresses, and re-injects coding-assistant context")]
struct Cli {
    /// Override the data directory (otherwise TURNMEM_DATA_DIR or ~/.turnmem).
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Override the listen port (otherwise TURNMEM_PORT or the settings file).
    #[arg(long)]
    port: Option<u16>,

    /// Override the bind host (otherwise TURNMEM_HOST or the settings file).
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("turnmem=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Some(dir) = &cli.data_dir {
        std::env::set_var("TURNMEM_DATA_DIR", dir);
    }
    if let Some(port) = cli.port {
        std::env::set_var("TURNMEM_PORT", port.to_string());
    }
    if let Some(host) = &cli.host {
        std::env::set_var("TURNMEM_HOST", host);
    }

    let config = Config::load()?;
    tracing::info!(port = config.port, bind_host = %config.bind_host, data_dir = %config.data_dir.display(), "configuration loaded");

    let auth_token = turnmem_auth::ensure_token(&config.token_path())?;
    let hmac_key = turnmem_auth::derive_hmac_key(&config.token_path());

    let store = Arc::new(Store::open(&config.db_dir(), hmac_key)?);
    let sse = SseBroker::new(store.clone());
    let queue = QueueEngine::with_config(
        store.clone(),
        Arc::new(sse.clone()),
        config.max_retries,
        config.stuck_threshold_secs,
    );

    let (llm_base_url, llm_api_key) = (
        std::env::var("TURNMEM_LLM_BASE_URL").ok(),
        std::env::var("TURNMEM_LLM_API_KEY").ok().filter(|k| !k.is_empty()),
    );
    let llm_configured = llm_api_key.is_some();
    if !llm_configured {
        tracing::warn!(
            "no TURNMEM_LLM_API_KEY set; observations will be stored as passthrough instead of compressed"
        );
    }
    let client = Arc::new(HttpLlmClient::new(
        llm_base_url.unwrap_or_else(|| "http://127.0.0.1:11434".to_string()),
        llm_api_key.unwrap_or_default(),
        config.model.clone(),
    ));
    let processor = Arc::new(QueueProcessor::new(store.clone(), sse.clone(), client, llm_configured));
    queue.start(processor).await?;

    let rate_limiter = RateLimiter::spawn();
    let state = AppState {
        store,
        queue: queue.clone(),
        sse: sse.clone(),
        config: Arc::new(config.clone()),
        auth_token: Arc::new(auth_token),
        rate_limiter,
        started_at: std::time::Instant::now(),
    };

    let app = turnmem_server::build_app(state);
    let addr: SocketAddr = format!("{}:{}", config.bind_host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "turnmem listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    queue.stop();
    sse.stop();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to install ctrl-c handler");
    }
    tracing::info!("shutdown signal received");
}
