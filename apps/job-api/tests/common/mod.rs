#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use futures_util::{SinkExt, StreamExt};
use jobwatch_common::JobId;
use tokio::net::TcpStream;
use tokio::time;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use job_api::config::Config;
use job_api::jobs::backend::JobBackend;
use job_api::jobs::registry::{JobRegistry, MemoryJobRegistry};
use job_api::AppState;

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Backend that never finishes a job on its own. Tests complete jobs by
/// calling `mark_completed` on the registry directly.
#[derive(Default)]
pub struct ManualBackend {
    pub started: Mutex<Vec<JobId>>,
}

impl JobBackend for ManualBackend {
    fn start(&self, id: JobId) {
        self.started.lock().unwrap().push(id);
    }
}

pub fn test_config(poll_interval: Duration) -> Config {
    Config {
        poll_interval,
        job_max_duration: Duration::from_millis(200),
        ..Config::default()
    }
}

/// State backed by a fresh registry and a backend that never completes jobs.
pub fn manual_state(poll_interval: Duration) -> (AppState, Arc<ManualBackend>) {
    let registry: Arc<dyn JobRegistry> = Arc::new(MemoryJobRegistry::new());
    let backend = Arc::new(ManualBackend::default());
    let state = AppState {
        registry,
        backend: backend.clone(),
        config: Arc::new(test_config(poll_interval)),
    };
    (state, backend)
}

/// Build the full application router wired to `state`.
pub fn test_app(state: AppState) -> Router {
    job_api::routes::router().with_state(state)
}

/// Start an actual TCP server for WebSocket testing. The server runs in the
/// background for the rest of the test.
pub async fn start_server(state: AppState) -> SocketAddr {
    let app = test_app(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

pub async fn connect(addr: SocketAddr) -> WsClient {
    let url = format!("ws://{addr}/jobMonitor");
    let (ws, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("ws connect");
    ws
}

pub async fn watch(ws: &mut WsClient, id: &str) {
    ws.send(tungstenite::Message::Text(id.to_string().into()))
        .await
        .expect("send job id");
}

/// Wait up to `wait` for the next text frame. Returns `None` on timeout or
/// when the server closes the connection.
pub async fn next_text(ws: &mut WsClient, wait: Duration) -> Option<String> {
    let deadline = time::Instant::now() + wait;
    loop {
        let msg = match time::timeout_at(deadline, ws.next()).await {
            Ok(Some(Ok(msg))) => msg,
            Ok(Some(Err(_))) | Ok(None) | Err(_) => return None,
        };
        match msg {
            tungstenite::Message::Text(text) => return Some(text.to_string()),
            tungstenite::Message::Ping(_) | tungstenite::Message::Pong(_) => continue,
            tungstenite::Message::Close(_) => return None,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}
