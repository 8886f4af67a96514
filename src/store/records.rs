//! Reconstructed console and network log records.
//!
//! Producers describe a single network exchange with several JSON lines over
//! time, all carrying the same `id`. The merge rules here fold those partial
//! updates into one logical record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity tag attached to a console line by the producer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleKind {
    #[default]
    Log,
    Info,
    Warn,
    Error,
    Debug,
}

/// A single console message, immutable once reconstructed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleLogRecord {
    /// Generated identifier, unique per reconstructed message.
    pub id: String,
    /// Session the message belongs to, if known.
    pub session_id: Option<String>,
    pub kind: ConsoleKind,
    pub content: String,
    /// Producer timestamp, or ingestion time when the line carried none.
    /// Ingestion time reflects arrival order, not authorship time.
    pub timestamp: DateTime<Utc>,
}

/// Response half of a network exchange.
///
/// Arrives incrementally; fields set by later updates overlay earlier ones
/// without clearing fields the update does not mention.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkResponse {
    pub status: Option<u16>,
    pub status_text: Option<String>,
    pub headers: Option<serde_json::Map<String, serde_json::Value>>,
    pub body: Option<serde_json::Value>,
    pub duration_ms: Option<u64>,
}

impl NetworkResponse {
    /// Overlay every field present in `incoming` onto this response.
    pub fn merge(&mut self, incoming: NetworkResponse) {
        if let Some(status) = incoming.status {
            self.status = Some(status);
        }
        if let Some(status_text) = incoming.status_text {
            self.status_text = Some(status_text);
        }
        if let Some(headers) = incoming.headers {
            self.headers = Some(headers);
        }
        if let Some(body) = incoming.body {
            self.body = Some(body);
        }
        if let Some(duration_ms) = incoming.duration_ms {
            self.duration_ms = Some(duration_ms);
        }
    }
}

/// Partial description of a network exchange as written by the producer.
///
/// Every field is optional on the wire; lines lacking an `id` cannot be
/// correlated and are dropped before reaching the store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkUpdate {
    pub id: Option<String>,
    pub session_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub method: Option<String>,
    pub url: Option<String>,
    pub headers: Option<serde_json::Map<String, serde_json::Value>>,
    pub body: Option<serde_json::Value>,
    pub pending: Option<bool>,
    pub response: Option<NetworkResponse>,
    pub error: Option<String>,
}

/// One logical network exchange, merged from all updates sharing its id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkLogRecord {
    /// Producer-supplied identifier, stable across all lines of the exchange.
    pub id: String,
    pub session_id: Option<String>,
    /// When the first line for this exchange was seen.
    pub timestamp: DateTime<Utc>,
    pub method: Option<String>,
    pub url: String,
    pub request_headers: Option<serde_json::Map<String, serde_json::Value>>,
    pub request_body: Option<serde_json::Value>,
    /// True until a response or error is merged in.
    pub pending: bool,
    pub response: Option<NetworkResponse>,
    pub error: Option<String>,
}

impl NetworkLogRecord {
    /// Start a new exchange record. The update that triggered the insert is
    /// applied separately via [`NetworkLogRecord::apply`].
    #[must_use]
    pub fn new(id: String, url: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            session_id: None,
            timestamp,
            method: None,
            url,
            request_headers: None,
            request_body: None,
            pending: true,
            response: None,
            error: None,
        }
    }

    /// Merge a partial update into this record.
    ///
    /// Scalar fields present in the update overwrite the current values; the
    /// response is merged field by field rather than replaced; the session id
    /// is filled once by the first update that supplies one and kept after.
    pub fn apply(&mut self, update: NetworkUpdate, fallback_session: Option<&str>) {
        if let Some(method) = update.method {
            self.method = Some(method);
        }
        if let Some(url) = update.url {
            self.url = url;
        }
        if let Some(headers) = update.headers {
            self.request_headers = Some(headers);
        }
        if let Some(body) = update.body {
            self.request_body = Some(body);
        }
        if let Some(pending) = update.pending {
            self.pending = pending;
        }
        if let Some(incoming) = update.response {
            self.pending = false;
            match &mut self.response {
                Some(response) => response.merge(incoming),
                None => self.response = Some(incoming),
            }
        }
        if let Some(error) = update.error {
            self.pending = false;
            self.error = Some(error);
        }
        if self.session_id.is_none() {
            self.session_id = update
                .session_id
                .or_else(|| fallback_session.map(str::to_string));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(json: &str) -> NetworkUpdate {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_response_merge_is_field_by_field() {
        let mut response = NetworkResponse {
            status: Some(200),
            ..NetworkResponse::default()
        };

        response.merge(NetworkResponse {
            duration_ms: Some(12),
            ..NetworkResponse::default()
        });

        assert_eq!(response.status, Some(200));
        assert_eq!(response.duration_ms, Some(12));
    }

    #[test]
    fn test_apply_merges_successive_updates() {
        let mut record = NetworkLogRecord::new(
            "a".to_string(),
            "http://x".to_string(),
            Utc::now(),
        );
        record.apply(
            update(r#"{"id":"a","url":"http://x","pending":true}"#),
            None,
        );
        assert!(record.pending);

        record.apply(update(r#"{"id":"a","response":{"status":200}}"#), None);
        record.apply(update(r#"{"id":"a","response":{"durationMs":12}}"#), None);

        assert_eq!(record.url, "http://x");
        assert!(!record.pending);
        let response = record.response.as_ref().unwrap();
        assert_eq!(response.status, Some(200));
        assert_eq!(response.duration_ms, Some(12));
    }

    #[test]
    fn test_apply_error_clears_pending() {
        let mut record = NetworkLogRecord::new(
            "a".to_string(),
            "http://x".to_string(),
            Utc::now(),
        );
        record.apply(update(r#"{"id":"a","error":"connection reset"}"#), None);

        assert!(!record.pending);
        assert_eq!(record.error.as_deref(), Some("connection reset"));
    }

    #[test]
    fn test_session_id_filled_once_and_preserved() {
        let mut record = NetworkLogRecord::new(
            "a".to_string(),
            "http://x".to_string(),
            Utc::now(),
        );
        record.apply(update(r#"{"id":"a"}"#), Some("from-filename"));
        assert_eq!(record.session_id.as_deref(), Some("from-filename"));

        record.apply(update(r#"{"id":"a","sessionId":"other"}"#), None);
        assert_eq!(record.session_id.as_deref(), Some("from-filename"));
    }

    #[test]
    fn test_update_scalar_overwrite() {
        let mut record = NetworkLogRecord::new(
            "a".to_string(),
            "http://x".to_string(),
            Utc::now(),
        );
        record.apply(update(r#"{"id":"a","method":"GET"}"#), None);
        record.apply(update(r#"{"id":"a","method":"POST","url":"http://y"}"#), None);

        assert_eq!(record.method.as_deref(), Some("POST"));
        assert_eq!(record.url, "http://y");
    }

    #[test]
    fn test_console_kind_parses_lowercase() {
        let kind: ConsoleKind = serde_json::from_str("\"warn\"").unwrap();
        assert_eq!(kind, ConsoleKind::Warn);
        assert_eq!(ConsoleKind::default(), ConsoleKind::Log);
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let mut record = NetworkLogRecord::new(
            "a".to_string(),
            "http://x".to_string(),
            Utc::now(),
        );
        record.apply(
            update(r#"{"id":"a","sessionId":"s1","response":{"durationMs":7}}"#),
            None,
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["sessionId"], "s1");
        assert_eq!(json["response"]["durationMs"], 7);
        assert_eq!(json["pending"], false);
    }
}
