use std::path::PathBuf;

/// Errors that can occur while establishing or managing a bridge transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to connect to a Unix domain socket.
    #[error("failed to connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to connect to a TCP endpoint.
    #[error("failed to connect to {addr}: {source}")]
    ConnectTcp {
        addr: String,
        source: std::io::Error,
    },

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
