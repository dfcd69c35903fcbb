//! Decoder for debug event records returned by the remote debugger facility.
//!
//! A record is a tagged union: `event_type:u32, flags:u32, thread_id:u64`,
//! followed by a type-specific body. The grammar is independent of the frame
//! codec — records travel inside response payloads.

use bytes::{Buf, Bytes};

use crate::error::DebugEventError;

const EVENT_ATTACH_PROCESS: u32 = 0;
const EVENT_ATTACH_THREAD: u32 = 1;
const EVENT_EXIT_PROCESS: u32 = 2;
const EVENT_EXIT_THREAD: u32 = 3;
const EVENT_EXCEPTION: u32 = 4;

/// Length of the fixed process name field in an attach-process record.
const PROCESS_NAME_LEN: usize = 12;

/// A debug event from a process under inspection.
///
/// `thread_id` is the common header field present on every record. An
/// attach-thread record carries its own thread id in the body as well; the
/// two are kept distinct rather than one overwriting the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugEvent {
    pub flags: u32,
    pub thread_id: u64,
    pub kind: DebugEventKind,
}

/// The type-specific body of a [`DebugEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugEventKind {
    AttachProcess {
        title_id: u64,
        process_id: u64,
        /// Process name, taken from a fixed 12-byte NUL-padded field.
        process_name: String,
        mmu_flags: u32,
    },
    AttachThread {
        thread_id: u64,
        tls: u64,
        entrypoint: u64,
    },
    ExitProcess {
        reason: u32,
    },
    ExitThread {
        reason: u32,
    },
    Exception {
        subtype: u32,
        fault_register: u64,
        /// Exception-specific trailing bytes, not further decoded.
        specific: Bytes,
    },
}

impl DebugEvent {
    /// Decode one debug event record.
    ///
    /// Truncated input for a known type is a decode error, never a panic;
    /// an unrecognized discriminant fails rather than falling back to some
    /// default variant.
    pub fn decode(mut src: &[u8]) -> Result<Self, DebugEventError> {
        need(src, 16)?;
        let event_type = src.get_u32_le();
        let flags = src.get_u32_le();
        let thread_id = src.get_u64_le();

        let kind = match event_type {
            EVENT_ATTACH_PROCESS => {
                need(src, 8 + 8 + PROCESS_NAME_LEN + 4)?;
                let title_id = src.get_u64_le();
                let process_id = src.get_u64_le();
                let mut name = [0u8; PROCESS_NAME_LEN];
                src.copy_to_slice(&mut name);
                let mmu_flags = src.get_u32_le();
                DebugEventKind::AttachProcess {
                    title_id,
                    process_id,
                    process_name: decode_fixed_name(&name),
                    mmu_flags,
                }
            }
            EVENT_ATTACH_THREAD => {
                need(src, 24)?;
                DebugEventKind::AttachThread {
                    thread_id: src.get_u64_le(),
                    tls: src.get_u64_le(),
                    entrypoint: src.get_u64_le(),
                }
            }
            EVENT_EXIT_PROCESS => {
                need(src, 4)?;
                DebugEventKind::ExitProcess {
                    reason: src.get_u32_le(),
                }
            }
            EVENT_EXIT_THREAD => {
                need(src, 4)?;
                DebugEventKind::ExitThread {
                    reason: src.get_u32_le(),
                }
            }
            EVENT_EXCEPTION => {
                need(src, 12)?;
                let subtype = src.get_u32_le();
                let fault_register = src.get_u64_le();
                DebugEventKind::Exception {
                    subtype,
                    fault_register,
                    specific: Bytes::copy_from_slice(src),
                }
            }
            other => return Err(DebugEventError::UnknownEventType { event_type: other }),
        };

        Ok(DebugEvent {
            flags,
            thread_id,
            kind,
        })
    }
}

fn need(src: &[u8], len: usize) -> Result<(), DebugEventError> {
    if src.len() < len {
        return Err(DebugEventError::Truncated {
            needed: len - src.len(),
        });
    }
    Ok(())
}

/// Decode a fixed-width NUL-padded name field.
fn decode_fixed_name(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use bytes::{BufMut, BytesMut};

    use super::*;

    fn record(event_type: u32, flags: u32, thread_id: u64, body: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        buf.put_u32_le(event_type);
        buf.put_u32_le(flags);
        buf.put_u64_le(thread_id);
        buf.put_slice(body);
        buf.to_vec()
    }

    #[test]
    fn decodes_attach_process() {
        let mut body = BytesMut::new();
        body.put_u64_le(0x1122334455667788);
        body.put_u64_le(42);
        body.put_slice(b"abc\0\0\0\0\0\0\0\0\0");
        body.put_u32_le(7);

        let event = DebugEvent::decode(&record(0, 3, 99, &body)).unwrap();
        assert_eq!(event.flags, 3);
        assert_eq!(event.thread_id, 99);
        assert_eq!(
            event.kind,
            DebugEventKind::AttachProcess {
                title_id: 0x1122334455667788,
                process_id: 42,
                process_name: "abc".to_string(),
                mmu_flags: 7,
            }
        );
    }

    #[test]
    fn attach_thread_keeps_both_thread_ids() {
        let mut body = BytesMut::new();
        body.put_u64_le(0xAAAA); // body thread id
        body.put_u64_le(0x7000_0000);
        body.put_u64_le(0x8000_4000);

        let event = DebugEvent::decode(&record(1, 0, 0xBBBB, &body)).unwrap();
        assert_eq!(event.thread_id, 0xBBBB);
        assert_eq!(
            event.kind,
            DebugEventKind::AttachThread {
                thread_id: 0xAAAA,
                tls: 0x7000_0000,
                entrypoint: 0x8000_4000,
            }
        );
    }

    #[test]
    fn decodes_exit_records() {
        let exit_process = DebugEvent::decode(&record(2, 0, 1, &5u32.to_le_bytes())).unwrap();
        assert_eq!(exit_process.kind, DebugEventKind::ExitProcess { reason: 5 });

        let exit_thread = DebugEvent::decode(&record(3, 0, 1, &6u32.to_le_bytes())).unwrap();
        assert_eq!(exit_thread.kind, DebugEventKind::ExitThread { reason: 6 });
    }

    #[test]
    fn exception_keeps_trailing_bytes_opaque() {
        let mut body = BytesMut::new();
        body.put_u32_le(2);
        body.put_u64_le(0xDEAD_BEEF);
        body.put_slice(&[1, 2, 3, 4]);

        let event = DebugEvent::decode(&record(4, 0, 7, &body)).unwrap();
        assert_eq!(
            event.kind,
            DebugEventKind::Exception {
                subtype: 2,
                fault_register: 0xDEAD_BEEF,
                specific: Bytes::from_static(&[1, 2, 3, 4]),
            }
        );
    }

    #[test]
    fn unknown_event_type_fails() {
        let err = DebugEvent::decode(&record(99, 0, 0, &[])).unwrap_err();
        assert!(matches!(
            err,
            DebugEventError::UnknownEventType { event_type: 99 }
        ));
    }

    #[test]
    fn truncated_common_header_fails() {
        let err = DebugEvent::decode(&[0u8; 8]).unwrap_err();
        assert!(matches!(err, DebugEventError::Truncated { .. }));
    }

    #[test]
    fn truncated_body_fails_without_panic() {
        // Attach-process record cut short in the middle of the name field.
        let err = DebugEvent::decode(&record(0, 0, 0, &[0u8; 20])).unwrap_err();
        assert!(matches!(err, DebugEventError::Truncated { .. }));
    }

    #[test]
    fn name_without_nul_uses_full_field() {
        let mut body = BytesMut::new();
        body.put_u64_le(0);
        body.put_u64_le(0);
        body.put_slice(b"exactly12chr");
        body.put_u32_le(0);

        let event = DebugEvent::decode(&record(0, 0, 0, &body)).unwrap();
        match event.kind {
            DebugEventKind::AttachProcess { process_name, .. } => {
                assert_eq!(process_name, "exactly12chr");
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }
}
