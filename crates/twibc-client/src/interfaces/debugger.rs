use bytes::{Buf, BufMut, Bytes, BytesMut};
use twibc_wire::{DebugEvent, Response};

use crate::connection::Connection;
use crate::error::{ClientError, Result};
use crate::interface::RemoteObject;
use crate::request::ActiveRequest;

/// Command ids understood by a remote debugger object.
pub mod command {
    pub const QUERY_MEMORY: u32 = 10;
    pub const READ_MEMORY: u32 = 11;
    pub const WRITE_MEMORY: u32 = 12;
    pub const LIST_THREADS: u32 = 13;
    pub const GET_DEBUG_EVENT: u32 = 14;
    pub const GET_THREAD_CONTEXT: u32 = 15;
    pub const BREAK_PROCESS: u32 = 16;
    pub const CONTINUE_DEBUG_EVENT: u32 = 17;
    pub const SET_THREAD_CONTEXT: u32 = 18;
    pub const GET_NSO_INFOS: u32 = 19;
    pub const WAIT_EVENT: u32 = 20;
}

/// Result code meaning the debug event queue is empty.
pub const RESULT_NO_DEBUG_EVENTS: u32 = 0x8c01;

/// One memory region report from `query_memory`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    pub base: u64,
    pub size: u64,
    pub memory_type: u32,
    pub memory_attribute: u32,
    pub permission: u32,
    pub device_ref_count: u32,
    pub ipc_ref_count: u32,
}

/// One loaded-module report from `get_nso_infos`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NsoInfo {
    pub base: u64,
    pub size: u64,
    pub build_id: [u8; 32],
}

const NSO_INFO_SIZE: usize = 0x30;

/// Debug interface bound to a specific process on a device.
///
/// Obtained from
/// [`DeviceInterface::open_active_debugger`](crate::DeviceInterface::open_active_debugger).
pub struct DebugInterface<'c> {
    object: RemoteObject<'c>,
}

impl<'c> DebugInterface<'c> {
    pub(crate) fn new(connection: &'c Connection, device_id: u32, object_id: u32) -> Self {
        Self {
            object: RemoteObject::new(connection, device_id, object_id),
        }
    }

    pub fn object_id(&self) -> u32 {
        self.object.object_id()
    }

    /// Queries process memory segment information at the given address.
    pub fn query_memory(&self, addr: u64) -> Result<MemoryRegion> {
        let response = self
            .object
            .send(command::QUERY_MEMORY, &addr.to_le_bytes())?
            .wait_ok()?;
        decode_memory_region(&response.payload)
    }

    /// Reads `size` bytes of process memory starting at `addr`.
    pub fn read_memory(&self, addr: u64, size: u64) -> Result<Bytes> {
        let mut payload = BytesMut::with_capacity(16);
        payload.put_u64_le(addr);
        payload.put_u64_le(size);
        let response = self.object.send(command::READ_MEMORY, &payload)?.wait_ok()?;
        Ok(response.payload)
    }

    /// Writes `data` into process memory at `addr`.
    pub fn write_memory(&self, addr: u64, data: &[u8]) -> Result<()> {
        let mut payload = BytesMut::with_capacity(8 + data.len());
        payload.put_u64_le(addr);
        payload.put_slice(data);
        self.object
            .send(command::WRITE_MEMORY, &payload)?
            .wait_ok()?;
        Ok(())
    }

    /// Pops the next debug event from the target process, or `None` if the
    /// event queue is empty.
    pub fn get_debug_event(&self) -> Result<Option<DebugEvent>> {
        let response = self.object.send(command::GET_DEBUG_EVENT, &[])?.wait()?;
        if response.result_code == RESULT_NO_DEBUG_EVENTS {
            return Ok(None);
        }
        let response = response.assert_ok()?;
        Ok(Some(DebugEvent::decode(&response.payload)?))
    }

    /// Fetches a thread's architectural context, returned raw.
    pub fn get_thread_context(&self, thread_id: u64) -> Result<Bytes> {
        let response = self
            .object
            .send(command::GET_THREAD_CONTEXT, &thread_id.to_le_bytes())?
            .wait_ok()?;
        Ok(response.payload)
    }

    /// Continues the target process after a debug event.
    pub fn continue_debug_event(&self, flags: u32, thread_ids: &[u64]) -> Result<()> {
        let mut payload = BytesMut::with_capacity(4 + thread_ids.len() * 8);
        payload.put_u32_le(flags);
        for thread_id in thread_ids {
            payload.put_u64_le(*thread_id);
        }
        self.object
            .send(command::CONTINUE_DEBUG_EVENT, &payload)?
            .wait_ok()?;
        Ok(())
    }

    /// Queries info about the executable modules loaded in the process.
    pub fn get_nso_infos(&self) -> Result<Vec<NsoInfo>> {
        let response = self.object.send(command::GET_NSO_INFOS, &[])?.wait_ok()?;
        decode_nso_infos(&response.payload)
    }

    /// Blocks until a debug event becomes available.
    pub fn wait_event(&self) -> Result<()> {
        self.object.send(command::WAIT_EVENT, &[])?.wait_ok()?;
        Ok(())
    }

    /// Calls `callback` (on the dispatcher thread) when a debug event
    /// becomes available.
    pub fn wait_event_async(
        &self,
        callback: impl FnOnce(Response) + Send + 'static,
    ) -> Result<ActiveRequest> {
        self.object
            .send_with_callback(command::WAIT_EVENT, &[], callback)
    }
}

fn decode_memory_region(payload: &[u8]) -> Result<MemoryRegion> {
    let mut buf = ensure_len(payload, 36, "memory region")?;
    Ok(MemoryRegion {
        base: buf.get_u64_le(),
        size: buf.get_u64_le(),
        memory_type: buf.get_u32_le(),
        memory_attribute: buf.get_u32_le(),
        permission: buf.get_u32_le(),
        device_ref_count: buf.get_u32_le(),
        ipc_ref_count: buf.get_u32_le(),
    })
}

fn decode_nso_infos(payload: &[u8]) -> Result<Vec<NsoInfo>> {
    let mut buf = ensure_len(payload, 8, "nso info count")?;
    let count = buf.get_u64_le() as usize;
    let needed = count
        .checked_mul(NSO_INFO_SIZE)
        .ok_or_else(|| ClientError::Malformed(format!("nso info count {count} overflows")))?;
    let mut buf = ensure_len(buf, needed, "nso info entries")?;

    let mut infos = Vec::with_capacity(count);
    for _ in 0..count {
        let base = buf.get_u64_le();
        let size = buf.get_u64_le();
        let mut build_id = [0u8; 32];
        buf.copy_to_slice(&mut build_id);
        infos.push(NsoInfo {
            base,
            size,
            build_id,
        });
    }
    Ok(infos)
}

fn ensure_len<'a>(payload: &'a [u8], len: usize, what: &str) -> Result<&'a [u8]> {
    if payload.len() < len {
        return Err(ClientError::Malformed(format!(
            "{what}: needed {len} bytes, got {}",
            payload.len()
        )));
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_memory_region() {
        let mut payload = BytesMut::new();
        payload.put_u64_le(0x8000_0000);
        payload.put_u64_le(0x1000);
        payload.put_u32_le(3); // memory type
        payload.put_u32_le(0); // attribute
        payload.put_u32_le(5); // permission
        payload.put_u32_le(1);
        payload.put_u32_le(2);

        let region = decode_memory_region(&payload).unwrap();
        assert_eq!(region.base, 0x8000_0000);
        assert_eq!(region.size, 0x1000);
        assert_eq!(region.memory_type, 3);
        assert_eq!(region.permission, 5);
        assert_eq!(region.device_ref_count, 1);
        assert_eq!(region.ipc_ref_count, 2);
    }

    #[test]
    fn short_memory_region_is_malformed() {
        let err = decode_memory_region(&[0u8; 12]).unwrap_err();
        assert!(matches!(err, ClientError::Malformed(_)));
    }

    #[test]
    fn decodes_nso_info_entries() {
        let mut payload = BytesMut::new();
        payload.put_u64_le(2);
        for i in 0..2u8 {
            payload.put_u64_le(0x7100_0000 + u64::from(i) * 0x10000);
            payload.put_u64_le(0x4000);
            payload.put_slice(&[i; 32]);
        }

        let infos = decode_nso_infos(&payload).unwrap();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].base, 0x7100_0000);
        assert_eq!(infos[1].base, 0x7101_0000);
        assert_eq!(infos[1].build_id, [1u8; 32]);
    }

    #[test]
    fn nso_info_count_larger_than_payload_is_malformed() {
        let mut payload = BytesMut::new();
        payload.put_u64_le(1000);
        let err = decode_nso_infos(&payload).unwrap_err();
        assert!(matches!(err, ClientError::Malformed(_)));
    }
}
