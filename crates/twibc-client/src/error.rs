use std::time::Duration;

/// Errors that can occur on a bridge connection or its remote object stubs.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] twibc_transport::TransportError),

    /// Wire codec error.
    #[error("wire error: {0}")]
    Wire(#[from] twibc_wire::WireError),

    /// twibd or a device reported a non-zero result code.
    #[error(transparent)]
    Result(#[from] twibc_wire::ResultError),

    /// A debug event record failed to decode.
    #[error("debug event error: {0}")]
    DebugEvent(#[from] twibc_wire::DebugEventError),

    /// A MessagePack payload failed to decode.
    #[error("messagepack error: {0}")]
    Msgpack(#[from] rmp_serde::decode::Error),

    /// An I/O error occurred on the send path or while spawning threads.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport accepted fewer bytes than were framed. There is no
    /// resend at this layer; the connection must be treated as broken.
    #[error("short write ({written} of {expected} bytes)")]
    ShortWrite { written: usize, expected: usize },

    /// The reader terminated and the connection is unusable.
    #[error("connection broken: {0}")]
    Broken(String),

    /// The connection was closed locally.
    #[error("connection closed")]
    Closed,

    /// A bounded wait expired before the response arrived. The request is
    /// still outstanding on the daemon; only the local wait was abandoned.
    #[error("timed out after {0:?} waiting for response")]
    Timeout(Duration),

    /// The response was expected to carry a new remote object id but none
    /// was present.
    #[error("response did not carry the expected object id")]
    MissingObjectId,

    /// A response payload did not match the shape its command defines.
    #[error("malformed response payload: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
