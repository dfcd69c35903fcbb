use serde::Deserialize;

use crate::connection::Connection;
use crate::error::Result;
use crate::interface::RemoteObject;

/// Command ids understood by twibd's meta object.
pub mod command {
    pub const LIST_DEVICES: u32 = 10;
}

/// One entry of twibd's device list.
///
/// `identification` is whatever the device reported about itself
/// (nicknames, firmware versions, serials); its schema belongs to the
/// device, so it is kept as a raw MessagePack value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeviceDescriptor {
    pub device_id: u32,
    pub identification: rmpv::Value,
}

/// Interface exposed by twibd itself, always at device 0 / object 0.
pub struct MetaInterface<'c> {
    object: RemoteObject<'c>,
}

impl<'c> MetaInterface<'c> {
    pub fn new(connection: &'c Connection) -> Self {
        Self {
            object: RemoteObject::new(connection, 0, 0),
        }
    }

    /// Lists devices known to twibd.
    pub fn list_devices(&self) -> Result<Vec<DeviceDescriptor>> {
        let response = self.object.send(command::LIST_DEVICES, &[])?.wait_ok()?;
        decode_device_list(&response.payload)
    }
}

fn decode_device_list(payload: &[u8]) -> Result<Vec<DeviceDescriptor>> {
    Ok(rmp_serde::from_slice(payload)?)
}
