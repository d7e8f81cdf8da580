//! Error types shared by the server lifecycle and the response writer.

use thiserror::Error;

/// Errors raised by the listener lifecycle and by writes to a connection.
#[derive(Debug, Error)]
pub enum Error {
    /// The port string could not be understood.
    #[error("invalid port specification {0:?}")]
    InvalidPort(String),

    /// A TLS listener was requested (port ending in `s`).
    #[error("TLS listeners are not supported (port {0:?})")]
    TlsUnsupported(String),

    /// The OS refused to bind the address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The engine runtime could not be started.
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[source] std::io::Error),

    /// Writing to the connection failed (peer gone, broken pipe, ...).
    #[error("transport write failed: {0}")]
    Transport(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
