//! Stream transports for connecting to a twibd bridge daemon.
//!
//! twibd listens on a Unix domain socket locally and, optionally, on a TCP
//! port for remote control. Both end up as the same thing from the client's
//! point of view: one connected, bidirectional byte stream. [`BridgeStream`]
//! wraps whichever was used so the layers above never care.

pub mod error;
pub mod stream;

pub use error::{Result, TransportError};
pub use stream::{BridgeStream, DEFAULT_SOCKET_PATH, DEFAULT_TCP_PORT};
