use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tokio::time;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use job_api::config::Config;
use job_api::jobs::registry::JobRegistry;
use job_api::AppState;

#[tokio::main]
async fn main() {
    // Load .env file (silently skip if missing; env vars may be set externally)
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let addr = SocketAddr::new(config.host, config.port);

    tracing::info!(
        poll_interval = ?config.poll_interval,
        job_max_duration = ?config.job_max_duration,
        job_retention = ?config.job_retention,
        "job-api configured"
    );

    let state = AppState::in_memory(config);

    if let Some(retention) = state.config.job_retention {
        tokio::spawn(sweep_completed_jobs(state.registry.clone(), retention));
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(job_api::routes::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!(%addr, "job-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

/// Periodically drop completed jobs older than `retention`.
async fn sweep_completed_jobs(registry: Arc<dyn JobRegistry>, retention: time::Duration) {
    let mut ticker = time::interval(retention.min(time::Duration::from_secs(60)));
    loop {
        ticker.tick().await;
        let removed = registry.sweep_completed(retention);
        if removed > 0 {
            tracing::debug!(removed, remaining = registry.len(), "swept completed jobs");
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(?e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
