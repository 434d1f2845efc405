use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use broadcast_breaker::BreakerRegistry;
use broadcast_cache::PartnerCache;
use broadcast_client::PartnerHttpClient;
use broadcast_types::InMemoryPartnerRepository;

use ev_broadcast_gateway::config::{Cli, GatewayConfig};
use ev_broadcast_gateway::handler::{self, AppState};
use ev_broadcast_gateway::{Orchestrator, WorkerPool};

const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = GatewayConfig::load(&cli)?;

    let repository = Arc::new(InMemoryPartnerRepository::seeded(config.partners.clone()));
    let cache = Arc::new(PartnerCache::with_capacity(
        repository,
        config.cache_capacity,
        config.cache_ttl,
    ));
    cache.preload().await;
    tracing::info!(partners = config.partners.len(), "partner cache preloaded");

    let breakers = Arc::new(BreakerRegistry::new(
        config.breaker_config,
        config.breaker_eviction_idle,
    ));
    let sweeper = breakers.spawn_sweeper(Duration::from_secs(3600));

    let client = Arc::new(PartnerHttpClient::new(Arc::clone(&breakers)));
    let pool = Arc::new(WorkerPool::new(config.worker_pool_max_concurrency));
    let orchestrator = Arc::new(Orchestrator::new(cache, client, pool));

    let app = axum::Router::new()
        .route("/broadcast", axum::routing::post(handler::broadcast))
        .with_state(AppState { orchestrator });

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "ev-broadcast-gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    tracing::info!(grace_period_secs = SHUTDOWN_GRACE_PERIOD.as_secs(), "shutting down");
    tokio::time::sleep(SHUTDOWN_GRACE_PERIOD).await;

    Ok(())
}

/// Stops accepting new broadcasts on Ctrl-C or SIGTERM; in-flight
/// broadcasts are left to finish within the grace period awaited after
/// `serve` returns.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
