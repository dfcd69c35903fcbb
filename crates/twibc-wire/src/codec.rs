use std::io::{ErrorKind, Read};

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Result, WireError};
use crate::response::Response;

/// Frame header: device id (4) + object id (4) + command/result (4) +
/// tag (4) + payload size (8) + object id count (4) + reserved (4) = 32 bytes.
pub const HEADER_SIZE: usize = 32;

/// Default maximum decoded frame body (payload + object ids): 16 MiB.
///
/// The header itself carries no size limit; this is the bound the *reader*
/// enforces before it agrees to buffer a frame.
pub const DEFAULT_MAX_RESPONSE: usize = 16 * 1024 * 1024;

/// Outgoing payloads share the response ceiling; twibd applies the same
/// bound on its side.
pub const DEFAULT_MAX_PAYLOAD: usize = DEFAULT_MAX_RESPONSE;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// The fixed 32-byte frame header, shared by requests and responses.
///
/// All fields are little-endian on the wire. The third field is a command id
/// on an outgoing request and a result code on an incoming response; which
/// one it means is purely directional. A trailing reserved u32 pads the
/// header to 32 bytes; it is always written as zero and ignored on receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub device_id: u32,
    pub object_id: u32,
    /// Command id (request) or result code (response).
    pub command: u32,
    pub tag: u32,
    pub payload_size: u64,
    pub object_id_count: u32,
}

impl MessageHeader {
    /// Total size of the frame body this header declares, in bytes.
    pub fn body_size(&self) -> usize {
        self.payload_size as usize + self.object_id_count as usize * 4
    }

    /// Total on-wire size of the frame this header declares.
    pub fn frame_size(&self) -> usize {
        HEADER_SIZE + self.body_size()
    }
}

/// Encode a request frame into `dst`.
///
/// Requests never carry object ids, so `object_id_count` is always zero on
/// the way out; only responses use that section.
pub fn encode_request(
    device_id: u32,
    object_id: u32,
    command_id: u32,
    tag: u32,
    payload: &[u8],
    dst: &mut BytesMut,
) {
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u32_le(device_id);
    dst.put_u32_le(object_id);
    dst.put_u32_le(command_id);
    dst.put_u32_le(tag);
    dst.put_u64_le(payload.len() as u64);
    dst.put_u32_le(0); // object id count
    dst.put_u32_le(0); // reserved padding, always zero
    dst.put_slice(payload);
}

/// Validate an outgoing payload length against `max`.
pub fn check_payload_size(size: usize, max: usize) -> Result<()> {
    if size > max {
        return Err(WireError::PayloadTooLarge { size, max });
    }
    Ok(())
}

/// Decode a frame header from the front of `src`.
///
/// Pure field extraction; performs no validation of the declared sizes.
pub fn decode_header(src: &[u8]) -> Result<MessageHeader> {
    if src.len() < HEADER_SIZE {
        return Err(WireError::TruncatedHeader { got: src.len() });
    }
    let mut buf = &src[..HEADER_SIZE];
    let header = MessageHeader {
        device_id: buf.get_u32_le(),
        object_id: buf.get_u32_le(),
        command: buf.get_u32_le(),
        tag: buf.get_u32_le(),
        payload_size: buf.get_u64_le(),
        object_id_count: buf.get_u32_le(),
    };
    // Remaining 4 bytes are reserved padding; present but carrying nothing.
    Ok(header)
}

/// Decode a response frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes exactly one frame from the buffer.
pub fn decode_response(src: &mut BytesMut, max_body: usize) -> Result<Option<Response>> {
    if src.len() < HEADER_SIZE {
        return Ok(None); // Need more data
    }

    let header = decode_header(src)?;
    if header.body_size() > max_body {
        return Err(WireError::ResponseTooLarge {
            size: header.body_size(),
            max: max_body,
        });
    }

    if src.len() < header.frame_size() {
        return Ok(None); // Need more data
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(header.payload_size as usize).freeze();
    let mut id_bytes = src.split_to(header.object_id_count as usize * 4);
    let mut object_ids = Vec::with_capacity(header.object_id_count as usize);
    while id_bytes.has_remaining() {
        object_ids.push(id_bytes.get_u32_le());
    }

    Ok(Some(Response {
        device_id: header.device_id,
        object_id: header.object_id,
        result_code: header.command,
        tag: header.tag,
        payload,
        object_ids,
    }))
}

/// Reads complete response frames from any `Read` stream.
///
/// Handles partial reads internally — callers always get complete frames.
pub struct ResponseReader<T> {
    inner: T,
    buf: BytesMut,
    max_body: usize,
}

impl<T: Read> ResponseReader<T> {
    /// Create a response reader with the default frame size bound.
    pub fn new(inner: T) -> Self {
        Self::with_max_body(inner, DEFAULT_MAX_RESPONSE)
    }

    /// Create a response reader with an explicit frame size bound.
    pub fn with_max_body(inner: T, max_body: usize) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            max_body,
        }
    }

    /// Read the next complete response frame (blocking).
    ///
    /// Returns `Err(WireError::ConnectionClosed)` on EOF at a frame
    /// boundary; EOF inside a frame reports how far the frame got.
    pub fn read_response(&mut self) -> Result<Response> {
        loop {
            if let Some(response) = decode_response(&mut self.buf, self.max_body)? {
                return Ok(response);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(WireError::Io(err)),
            };

            if read == 0 {
                return Err(self.classify_eof());
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    fn classify_eof(&self) -> WireError {
        if self.buf.is_empty() {
            WireError::ConnectionClosed
        } else if self.buf.len() < HEADER_SIZE {
            WireError::TruncatedHeader {
                got: self.buf.len(),
            }
        } else {
            // The header is complete, so the declared length is known.
            match decode_header(&self.buf) {
                Ok(header) => WireError::TruncatedFrame {
                    expected: header.frame_size(),
                    got: self.buf.len(),
                },
                Err(err) => err,
            }
        }
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn encode(device_id: u32, object_id: u32, command: u32, tag: u32, payload: &[u8]) -> BytesMut {
        let mut buf = BytesMut::new();
        encode_request(device_id, object_id, command, tag, payload, &mut buf);
        buf
    }

    #[test]
    fn header_roundtrip() {
        let wire = encode(1, 2, 3, 4, b"abcde");
        let header = decode_header(&wire).unwrap();

        assert_eq!(header.device_id, 1);
        assert_eq!(header.object_id, 2);
        assert_eq!(header.command, 3);
        assert_eq!(header.tag, 4);
        assert_eq!(header.payload_size, 5);
        assert_eq!(header.object_id_count, 0);
    }

    #[test]
    fn request_frame_is_header_plus_payload() {
        let wire = encode(0, 0, 10, 7, b"hello");
        assert_eq!(wire.len(), HEADER_SIZE + 5);
    }

    #[test]
    fn reserved_padding_is_zero() {
        let wire = encode(1, 2, 3, 4, b"");
        assert_eq!(&wire[28..32], &[0, 0, 0, 0]);
    }

    #[test]
    fn exact_wire_layout() {
        let wire = encode(1, 2, 3, 4, b"abcde");
        let mut expected = Vec::new();
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice(&3u32.to_le_bytes());
        expected.extend_from_slice(&4u32.to_le_bytes());
        expected.extend_from_slice(&5u64.to_le_bytes());
        expected.extend_from_slice(&0u32.to_le_bytes());
        expected.extend_from_slice(&0u32.to_le_bytes());
        expected.extend_from_slice(b"abcde");
        assert_eq!(wire.as_ref(), expected.as_slice());
    }

    #[test]
    fn command_field_aliases_result_code() {
        let mut wire = encode(9, 8, 0xf601, 42, b"oops");
        let response = decode_response(&mut wire, DEFAULT_MAX_RESPONSE)
            .unwrap()
            .unwrap();

        assert_eq!(response.result_code, 0xf601);
        assert_eq!(response.tag, 42);
        assert_eq!(response.payload.as_ref(), b"oops");
        assert!(response.object_ids.is_empty());
        assert!(wire.is_empty());
    }

    #[test]
    fn decode_response_with_object_ids() {
        let mut wire = BytesMut::new();
        wire.put_u32_le(1); // device id
        wire.put_u32_le(0); // object id
        wire.put_u32_le(0); // result code
        wire.put_u32_le(5); // tag
        wire.put_u64_le(3); // payload size
        wire.put_u32_le(2); // object id count
        wire.put_u32_le(0); // reserved
        wire.put_slice(b"abc");
        wire.put_u32_le(0x11);
        wire.put_u32_le(0x22);

        let response = decode_response(&mut wire, DEFAULT_MAX_RESPONSE)
            .unwrap()
            .unwrap();

        assert_eq!(response.payload.as_ref(), b"abc");
        assert_eq!(response.object_ids, vec![0x11, 0x22]);
        assert!(wire.is_empty());
    }

    #[test]
    fn short_header_is_framing_error() {
        let err = decode_header(&[0u8; 12]).unwrap_err();
        assert!(matches!(err, WireError::TruncatedHeader { got: 12 }));
    }

    #[test]
    fn incomplete_buffer_needs_more_data() {
        let full = encode(1, 2, 0, 4, b"hello");

        let mut partial_header = BytesMut::from(&full[..16]);
        assert!(decode_response(&mut partial_header, DEFAULT_MAX_RESPONSE)
            .unwrap()
            .is_none());

        let mut partial_payload = BytesMut::from(&full[..HEADER_SIZE + 2]);
        assert!(decode_response(&mut partial_payload, DEFAULT_MAX_RESPONSE)
            .unwrap()
            .is_none());
    }

    #[test]
    fn oversized_payload_is_rejected_before_encode() {
        assert!(check_payload_size(16, 16).is_ok());
        let err = check_payload_size(17, 16).unwrap_err();
        assert!(matches!(
            err,
            WireError::PayloadTooLarge { size: 17, max: 16 }
        ));
    }

    #[test]
    fn oversized_body_is_a_distinct_error() {
        let mut wire = encode(0, 0, 0, 1, &[0xAB; 64]);
        let err = decode_response(&mut wire, 16).unwrap_err();
        assert!(matches!(
            err,
            WireError::ResponseTooLarge { size: 64, max: 16 }
        ));
    }

    #[test]
    fn reader_delivers_multiple_frames() {
        let mut wire = BytesMut::new();
        encode_request(1, 0, 0, 11, b"one", &mut wire);
        encode_request(1, 0, 0, 22, b"two", &mut wire);

        let mut reader = ResponseReader::new(Cursor::new(wire.to_vec()));
        let r1 = reader.read_response().unwrap();
        let r2 = reader.read_response().unwrap();

        assert_eq!((r1.tag, r1.payload.as_ref()), (11, b"one".as_ref()));
        assert_eq!((r2.tag, r2.payload.as_ref()), (22, b"two".as_ref()));
    }

    #[test]
    fn reader_handles_byte_by_byte_delivery() {
        let wire = encode(3, 4, 0, 9, b"slow");
        let mut reader = ResponseReader::new(ByteByByteReader {
            bytes: wire.to_vec(),
            pos: 0,
        });

        let response = reader.read_response().unwrap();
        assert_eq!(response.tag, 9);
        assert_eq!(response.payload.as_ref(), b"slow");
    }

    #[test]
    fn eof_between_frames_is_connection_closed() {
        let mut reader = ResponseReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_response().unwrap_err();
        assert!(matches!(err, WireError::ConnectionClosed));
    }

    #[test]
    fn eof_inside_header_is_truncated_header() {
        let wire = encode(1, 2, 3, 4, b"");
        let mut reader = ResponseReader::new(Cursor::new(wire[..10].to_vec()));
        let err = reader.read_response().unwrap_err();
        assert!(matches!(err, WireError::TruncatedHeader { got: 10 }));
    }

    #[test]
    fn eof_inside_payload_is_truncated_frame() {
        let wire = encode(1, 2, 3, 4, b"hello");
        let mut reader = ResponseReader::new(Cursor::new(wire[..HEADER_SIZE + 2].to_vec()));
        let err = reader.read_response().unwrap_err();
        assert!(matches!(
            err,
            WireError::TruncatedFrame {
                expected: 37,
                got: 34,
            }
        ));
    }

    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }
}
