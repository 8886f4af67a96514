//! Server error types.

/// Errors that can occur while starting or running the HTTP server.
#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    /// Every port in the retry range was already bound.
    #[error("No free port in {start}..={end}")]
    NoFreePort {
        /// First port tried.
        start: u16,
        /// Last port tried.
        end: u16,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_free_port_display() {
        let err = ServerError::NoFreePort {
            start: 4000,
            end: 4063,
        };
        assert_eq!(err.to_string(), "No free port in 4000..=4063");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use");
        let err: ServerError = io_err.into();
        assert!(matches!(err, ServerError::Io(_)));
    }
}
