//! API response types for the viewer HTTP endpoints.

use serde::{Deserialize, Serialize};

/// Response for the GET /api/status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Session log files currently tracked.
    pub watched_files: usize,
    /// Console records in the buffer.
    pub console_count: usize,
    /// Network records in the buffer.
    pub network_count: usize,
    /// Live event-stream subscriptions.
    pub subscribers: usize,
}
