/// Errors that can occur while encoding/decoding bridge frames.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The stream ended partway through a 32-byte frame header.
    #[error("truncated frame header ({got} of 32 bytes)")]
    TruncatedHeader { got: usize },

    /// The stream ended before delivering the payload and object-id
    /// sections the header declared.
    #[error("truncated frame (declared {expected} bytes, got {got})")]
    TruncatedFrame { expected: usize, got: usize },

    /// The header declares a frame larger than this reader is willing to
    /// buffer. The bytes themselves are well-formed; the peer is just
    /// asking for more than we allow.
    #[error("response too large ({size} bytes, max {max})")]
    ResponseTooLarge { size: usize, max: usize },

    /// An outgoing payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("wire I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream closed cleanly on a frame boundary.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, WireError>;

/// A non-zero result code reported by twibd or a remote device.
///
/// The frame itself was well-formed; the remote end is reporting that the
/// command failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("remote returned result code 0x{code:x}")]
pub struct ResultError {
    pub code: u32,
}

/// Errors that can occur while decoding a debug event record.
#[derive(Debug, thiserror::Error)]
pub enum DebugEventError {
    /// The event type discriminant does not match any known variant.
    #[error("unknown debug event type {event_type}")]
    UnknownEventType { event_type: u32 },

    /// The record ended before the fields its type requires.
    #[error("truncated debug event (needed {needed} more bytes)")]
    Truncated { needed: usize },
}
