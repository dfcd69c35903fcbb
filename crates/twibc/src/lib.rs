//! Client for twibd, the Twili bridge daemon.
//!
//! twibc talks the bridge's binary RPC protocol over a persistent socket:
//! framed requests addressed to `(device, object, command)`, responses
//! correlated back by tag, and typed wrappers for the remote objects twibd
//! and its devices expose.
//!
//! # Crate Structure
//!
//! - [`transport`] — Connected-stream transports (Unix socket, TCP)
//! - [`wire`] — Frame codec and debug event decoding
//! - [`client`] — Connection multiplexing and remote object stubs

/// Re-export transport types.
pub mod transport {
    pub use twibc_transport::*;
}

/// Re-export wire codec types.
pub mod wire {
    pub use twibc_wire::*;
}

/// Re-export client types.
pub mod client {
    pub use twibc_client::*;
}
