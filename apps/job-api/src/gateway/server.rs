//! WebSocket upgrade endpoint for job completion notifications.

use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::AppState;

use super::session::run_session;

pub fn router() -> Router<AppState> {
    Router::new().route("/jobMonitor", get(ws_upgrade))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.clone();
    let poll_interval = state.config.poll_interval;

    ws.on_failed_upgrade(|e| tracing::debug!(?e, "ws upgrade failed"))
        .on_upgrade(move |socket| run_session(socket, registry, poll_interval))
}
