use twibc_wire::Response;

use crate::connection::Connection;
use crate::error::{ClientError, Result};
use crate::interface::RemoteObject;
use crate::interfaces::debugger::DebugInterface;

/// Command ids understood by a device's root object.
pub mod command {
    pub const RUN: u32 = 10;
    pub const REBOOT: u32 = 11;
    pub const COREDUMP: u32 = 12;
    pub const TERMINATE: u32 = 13;
    pub const LIST_PROCESSES: u32 = 14;
    pub const UPGRADE_TWILI: u32 = 15;
    pub const IDENTIFY: u32 = 16;
    pub const LIST_NAMED_PIPES: u32 = 17;
    pub const OPEN_NAMED_PIPE: u32 = 18;
    pub const OPEN_ACTIVE_DEBUGGER: u32 = 19;
}

/// Main interface exposed by a device, bound to object 0.
pub struct DeviceInterface<'c> {
    object: RemoteObject<'c>,
}

impl<'c> DeviceInterface<'c> {
    pub(crate) fn new(connection: &'c Connection, device_id: u32) -> Self {
        Self {
            object: RemoteObject::new(connection, device_id, 0),
        }
    }

    pub fn device_id(&self) -> u32 {
        self.object.device_id()
    }

    /// Launch an executable on the device. The response payload is the
    /// device's launch report, returned raw.
    pub fn run(&self, executable: &[u8]) -> Result<Response> {
        self.object.send(command::RUN, executable)?.wait_ok()
    }

    /// Reboot the device.
    pub fn reboot(&self) -> Result<()> {
        self.object.send(command::REBOOT, &[])?.wait_ok()?;
        Ok(())
    }

    /// Terminate the process with the given pid.
    pub fn terminate(&self, process_id: u64) -> Result<()> {
        self.object
            .send(command::TERMINATE, &process_id.to_le_bytes())?
            .wait_ok()?;
        Ok(())
    }

    /// Ask the device to identify itself (nickname, firmware, serial, ...).
    pub fn identify(&self) -> Result<rmpv::Value> {
        let response = self.object.send(command::IDENTIFY, &[])?.wait_ok()?;
        Ok(rmp_serde::from_slice(&response.payload)?)
    }

    /// Opens an active debugger for the process with the given pid.
    ///
    /// The response carries the object id of a freshly created remote
    /// debugger, which the returned interface is bound to.
    pub fn open_active_debugger(&self, process_id: u64) -> Result<DebugInterface<'c>> {
        let response = self
            .object
            .send(command::OPEN_ACTIVE_DEBUGGER, &process_id.to_le_bytes())?
            .wait_ok()?;
        let object_id = response
            .object_ids
            .first()
            .copied()
            .ok_or(ClientError::MissingObjectId)?;
        Ok(DebugInterface::new(
            self.object.connection(),
            self.object.device_id(),
            object_id,
        ))
    }
}
