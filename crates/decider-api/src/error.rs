//! Listener errors for the analyze API.

use std::net::SocketAddr;

use thiserror::Error;

/// Result alias for API server operations.
pub type ApiServerResult<T> = std::result::Result<T, ApiServerError>;

/// Errors raised while binding or serving the API.
#[derive(Debug, Error)]
pub enum ApiServerError {
    /// The listener could not be bound.
    #[error("failed to bind api listener on {addr}")]
    Bind {
        /// Address attempted.
        addr: SocketAddr,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The server loop exited with an IO error.
    #[error("api server terminated unexpectedly")]
    Serve {
        /// Underlying IO error.
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn bind_errors_name_the_address() {
        let bind = ApiServerError::Bind {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            source: io::Error::new(io::ErrorKind::AddrInUse, "busy"),
        };
        assert_eq!(bind.to_string(), "failed to bind api listener on 127.0.0.1:8080");
        assert!(bind.source().is_some());
    }
}
