//! Wire codec for the twibd bridge protocol.
//!
//! Every message on a bridge connection is one frame: a fixed 32-byte
//! little-endian header, `payload_size` bytes of opaque payload, then
//! `object_id_count` 4-byte object identifiers. Requests and responses share
//! the layout; the third header field is a command id on the way out and a
//! result code on the way back.
//!
//! This crate is pure: encoding and decoding over byte buffers, plus a
//! blocking [`ResponseReader`] for pulling complete frames off any `Read`
//! stream. It also hosts the decoder for the debug event records returned by
//! the remote debugger facility, which is an independent binary grammar
//! carried inside response payloads.

pub mod codec;
pub mod debug;
pub mod error;
pub mod response;

pub use codec::{
    check_payload_size, decode_header, decode_response, encode_request, MessageHeader,
    ResponseReader, DEFAULT_MAX_PAYLOAD, DEFAULT_MAX_RESPONSE, HEADER_SIZE,
};
pub use debug::{DebugEvent, DebugEventKind};
pub use error::{DebugEventError, Result, ResultError, WireError};
pub use response::Response;
