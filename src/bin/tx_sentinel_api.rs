//! TX Sentinel API Server
//!
//! REST API for pre-signing transaction risk analysis
//!
//! Usage:
//!   cargo run --bin tx_sentinel_api
//!
//! Environment:
//!   PORT / SENTINEL_PORT - Server port (default: 8080)
//!   SENTINEL_HOST        - Server host (default: 0.0.0.0)
//!   SENTINEL_RPC_URL     - Enables the JSON-RPC factor oracle
//!   RUST_LOG             - Log filter (default: info)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use tx_sentinel::api::{create_router, start_cleanup_task, AppState};
use tx_sentinel::{build_collector, EngineConfig, TransactionAnalyzer};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    print_banner();

    let config = EngineConfig::from_env();
    let analyzer = TransactionAnalyzer::new(&config).with_collector(build_collector(&config.oracle));
    let state = Arc::new(AppState::new(analyzer));
    let stats_state = state.clone();

    start_cleanup_task();
    info!("🧹 Background cleanup task started");

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    info!("🚀 TX Sentinel API starting on http://{}", addr);
    info!("");
    info!("Endpoints:");
    info!("  POST /v1/analyze/transaction - Analyze one transaction intent");
    info!("  POST /v1/analyze/batch       - Batch analysis (up to 100 intents)");
    info!("  POST /v1/address/check       - Address reputation lookup");
    info!("  GET  /v1/stats               - Analysis statistics");
    info!("  GET  /health                 - Health check");
    info!("");
    info!("Press Ctrl+C for graceful shutdown");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("⚠️ Failed to listen for Ctrl+C: {}", e);
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("🛑 Shutdown signal received");
    info!("   Total analyzed: {}", stats_state.stats.total());
    info!("   Avg latency: {:.2}ms", stats_state.stats.avg_latency_ms());
    info!("👋 TX Sentinel API shutdown complete");

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ╔══════════════════════════════════════════════════╗
    ║                                                  ║
    ║              T X   S E N T I N E L               ║
    ║                                                  ║
    ║        Pre-Signing Transaction Risk Engine       ║
    ║                   API v{:<8}                  ║
    ║                                                  ║
    ╚══════════════════════════════════════════════════╝
    "#,
        env!("CARGO_PKG_VERSION")
    );
}
