//! Discovery, tailing, and reconstruction of session log files.

mod discovery;
mod entry;
mod error;
mod notifier;
mod service;
mod tailer;

pub use discovery::{collect_session_logs, extract_session_id, is_session_log, DiscoveredLog};
pub use entry::{reconstruct, LogEvent};
pub use error::WatcherError;
pub use notifier::{ChangeNotifier, ScanTrigger, WatchStrategy, DEFAULT_POLL_INTERVAL};
pub use service::WatchService;
pub use tailer::FileTailer;
