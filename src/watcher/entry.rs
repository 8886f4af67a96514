//! JSON-line envelope parsing and event reconstruction.
//!
//! Each line is a self-contained JSON object with a `type` discriminator.
//! Anything that fails to parse is dropped quietly; producers flushing
//! mid-write make malformed fragments routine, not exceptional.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::store::{ConsoleKind, ConsoleLogRecord, NetworkUpdate};

/// A reconstructed event ready for the store.
#[derive(Debug)]
pub enum LogEvent {
    Console(ConsoleLogRecord),
    Network {
        update: NetworkUpdate,
        session_id: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RawLine {
    Console(ConsoleLine),
    Network(NetworkUpdate),
    /// Anything this viewer doesn't understand, kept for forward
    /// compatibility with newer producers.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConsoleLine {
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    kind: ConsoleKind,
    #[serde(default)]
    content: String,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

/// Reconstruct one event from a raw line.
///
/// `fallback_session_id` comes from the filename's session segment and is
/// used when the line carries no `sessionId` of its own. Returns `None`
/// for malformed lines, unknown types, and network lines without an id.
#[must_use]
pub fn reconstruct(line: &str, fallback_session_id: &str) -> Option<LogEvent> {
    let raw: RawLine = match serde_json::from_str(line) {
        Ok(raw) => raw,
        Err(error) => {
            tracing::debug!(%error, "Dropping malformed log line");
            return None;
        }
    };

    match raw {
        RawLine::Console(console) => Some(LogEvent::Console(ConsoleLogRecord {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: console
                .session_id
                .or_else(|| Some(fallback_session_id.to_string())),
            kind: console.kind,
            content: console.content,
            // Fallback to ingestion time: keeps arrival order, but is not
            // authorship time if ingestion lags the producer.
            timestamp: console.timestamp.unwrap_or_else(Utc::now),
        })),
        RawLine::Network(update) => {
            if update.id.is_none() {
                tracing::debug!("Dropping network line without id");
                return None;
            }
            let session_id = update
                .session_id
                .clone()
                .or_else(|| Some(fallback_session_id.to_string()));
            Some(LogEvent::Network { update, session_id })
        }
        RawLine::Unknown => {
            tracing::debug!("Dropping line with unknown type");
            None
        }
    }
}
