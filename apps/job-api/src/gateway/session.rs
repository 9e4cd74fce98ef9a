//! Per-connection job monitor session.
//!
//! Each connection runs two actors: the reader (on the connection's own task)
//! and a poller task that owns the watch list. The reader hands new
//! subscriptions to the poller over an unbounded channel and never touches the
//! watch list itself. Both actors write to the client, so every outbound frame
//! goes through [`Outbound`], which holds the socket sink behind an async mutex.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{Sink, SinkExt, StreamExt};
use jobwatch_common::JobId;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::jobs::registry::JobRegistry;

use super::watch::WatchList;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle of a session. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    Open,
    Closing,
    Closed,
}

/// Identity and lifecycle state for a single connection. Owned by the
/// connection's reader.
pub struct GatewaySession {
    /// Process-unique session number, used for log correlation.
    pub session_id: u64,
    state: SessionState,
}

impl GatewaySession {
    pub fn new() -> Self {
        Self {
            session_id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            state: SessionState::Open,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Move to `next`. Returns `false` (and changes nothing) if that would
    /// move the session backwards or leave it where it is.
    pub fn transition(&mut self, next: SessionState) -> bool {
        if next <= self.state {
            tracing::warn!(
                session_id = self.session_id,
                from = ?self.state,
                to = ?next,
                "rejected session state change"
            );
            return false;
        }
        let prev = std::mem::replace(&mut self.state, next);
        tracing::trace!(session_id = self.session_id, from = ?prev, to = ?next, "session state change");
        true
    }
}

impl Default for GatewaySession {
    fn default() -> Self {
        Self::new()
    }
}

/// The single write path to a client.
///
/// The lock is held for the whole frame, so writes from the reader and the
/// poller never interleave.
pub struct Outbound<S> {
    sink: Arc<tokio::sync::Mutex<S>>,
}

impl<S> Clone for Outbound<S> {
    fn clone(&self) -> Self {
        Self {
            sink: self.sink.clone(),
        }
    }
}

impl<S> Outbound<S>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    pub fn new(sink: S) -> Self {
        Self {
            sink: Arc::new(tokio::sync::Mutex::new(sink)),
        }
    }

    /// Tell the client that `id` has completed.
    pub async fn send_job_id(&self, id: &JobId) -> Result<(), axum::Error> {
        let mut sink = self.sink.lock().await;
        sink.send(Message::Text(id.to_string().into())).await
    }

    async fn close(&self) {
        let mut sink = self.sink.lock().await;
        // The peer may already be gone.
        let _ = sink.close().await;
    }
}

/// Drive one connection until the client leaves or the transport fails.
pub async fn run_session(socket: WebSocket, registry: Arc<dyn JobRegistry>, poll_interval: Duration) {
    let mut session = GatewaySession::new();
    let session_id = session.session_id;
    let (ws_tx, mut ws_rx) = socket.split();
    let outbound = Outbound::new(ws_tx);
    let shutdown = CancellationToken::new();
    let (watch_tx, watch_rx) = mpsc::unbounded_channel::<JobId>();

    tracing::info!(session_id, "job monitor session opened");

    let poller = tokio::spawn(run_poller(
        session_id,
        registry.clone(),
        outbound.clone(),
        watch_rx,
        shutdown.clone(),
        poll_interval,
    ));

    loop {
        let msg = tokio::select! {
            // The poller gave up on a dead connection.
            _ = shutdown.cancelled() => break,
            msg = ws_rx.next() => msg,
        };

        let id = match msg {
            Some(Ok(Message::Text(text))) => JobId::from(text.as_str()),
            Some(Ok(Message::Binary(bytes))) => {
                JobId::from(String::from_utf8_lossy(&bytes).into_owned())
            }
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
            Some(Ok(Message::Close(_))) | None => break,
            Some(Err(e)) => {
                tracing::debug!(?e, session_id, "ws read error");
                break;
            }
        };

        if registry.is_completed(id.as_str()) {
            if let Err(e) = outbound.send_job_id(&id).await {
                tracing::debug!(?e, session_id, job_id = %id, "ws write error");
                break;
            }
        } else if watch_tx.send(id).is_err() {
            // Poller already exited.
            break;
        }
    }

    session.transition(SessionState::Closing);
    shutdown.cancel();
    drop(watch_tx);

    if let Err(e) = poller.await {
        tracing::warn!(?e, session_id, "job poller task failed");
    }

    outbound.close().await;
    session.transition(SessionState::Closed);

    tracing::info!(session_id, state = ?session.state(), "job monitor session closed");
}

/// Owns the watch list: collects new subscriptions and, on every tick, pushes
/// a notification for each watched job that has completed since the last scan.
async fn run_poller<S>(
    session_id: u64,
    registry: Arc<dyn JobRegistry>,
    outbound: Outbound<S>,
    mut watch_rx: mpsc::UnboundedReceiver<JobId>,
    shutdown: CancellationToken,
    poll_interval: Duration,
) where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let mut watching = WatchList::new();
    let mut ticker = time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await; // First tick fires immediately; skip it.

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,

            received = watch_rx.recv() => match received {
                Some(id) => {
                    watching.watch(id);
                }
                None => break,
            },

            _ = ticker.tick() => {
                for id in watching.take_completed(registry.as_ref()) {
                    if let Err(e) = outbound.send_job_id(&id).await {
                        tracing::debug!(?e, session_id, job_id = %id, "ws write error");
                        shutdown.cancel();
                        return;
                    }
                }
            }
        }
    }

    tracing::debug!(session_id, watching = watching.len(), "job poller stopped");
}
