//! HTTP query surface for live viewers.

mod api;
mod error;
mod handlers;
mod viewer;

pub use api::StatusResponse;
pub use error::ServerError;
pub use handlers::AppState;
pub use viewer::{BoundServer, ServerConfig, ViewerServer, DEFAULT_PORT, PORT_RETRY_LIMIT};
