//! Watcher error types.

/// Errors that can occur while discovering or tailing session logs.
///
/// All of these are transient from the viewer's perspective: callers log
/// them and retry on the next change trigger rather than propagating.
#[derive(thiserror::Error, Debug)]
pub enum WatcherError {
    /// Filesystem notification error.
    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: WatcherError = io_err.into();
        assert!(matches!(err, WatcherError::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_from_notify_error() {
        let notify_err = notify::Error::generic("test error");
        let err: WatcherError = notify_err.into();
        assert!(matches!(err, WatcherError::Notify(_)));
        assert!(err.to_string().contains("File watcher error"));
    }
}
