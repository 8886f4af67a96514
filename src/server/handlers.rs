//! HTTP handlers for the viewer API.
//!
//! Snapshot endpoints return the full current buffer contents; the event
//! stream carries payload-free change signals that tell clients when to
//! re-fetch. Slow consumers skip intermediate states, never the fact that
//! something changed.

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures_util::stream::StreamExt;
use tokio_stream::wrappers::WatchStream;

use crate::hub::LogChannel;
use crate::store::{ConsoleLogRecord, LogStore, NetworkLogRecord};

use super::api::StatusResponse;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The event store backing every endpoint.
    pub store: Arc<LogStore>,
    /// Count of session log files tracked by the watch service.
    pub watched_files: Arc<AtomicUsize>,
}

/// GET /api/console-logs - full console snapshot, oldest to newest.
pub async fn get_console_logs(State(state): State<AppState>) -> Json<Vec<ConsoleLogRecord>> {
    Json(state.store.console_snapshot().await)
}

/// GET /api/network-logs - full network snapshot, oldest to newest.
pub async fn get_network_logs(State(state): State<AppState>) -> Json<Vec<NetworkLogRecord>> {
    Json(state.store.network_snapshot().await)
}

/// GET /api/status - viewer health summary.
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        watched_files: state.watched_files.load(Ordering::Relaxed),
        console_count: state.store.console_len().await,
        network_count: state.store.network_len().await,
        subscribers: state.store.hub().listeners(LogChannel::Console),
    })
}

/// GET /api/events - SSE stream of change signals.
///
/// Emits `console` and `network` events whose data is the mutation counter,
/// not a delta; clients re-fetch the snapshot they care about.
pub async fn get_events_sse(
    State(state): State<AppState>,
) -> Sse<impl futures_core::Stream<Item = Result<Event, Infallible>>> {
    let hub = state.store.hub();
    let console = WatchStream::from_changes(hub.subscribe(LogChannel::Console))
        .map(|version| Ok(Event::default().event("console").data(version.to_string())));
    let network = WatchStream::from_changes(hub.subscribe(LogChannel::Network))
        .map(|version| Ok(Event::default().event("network").data(version.to_string())));

    let stream = futures_util::stream::select(console, network);
    Sse::new(stream).keep_alive(KeepAlive::default())
}
