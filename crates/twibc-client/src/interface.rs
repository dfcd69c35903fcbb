use twibc_wire::Response;

use crate::connection::Connection;
use crate::error::Result;
use crate::request::ActiveRequest;

/// A handle to a remote bridge object, addressed by `(device_id, object_id)`.
///
/// Typed interface wrappers hold one of these and translate their methods
/// into numeric command ids plus a payload-encoding convention. Instances
/// are bound to the connection that produced them.
#[derive(Debug, Clone, Copy)]
pub struct RemoteObject<'c> {
    connection: &'c Connection,
    device_id: u32,
    object_id: u32,
}

impl<'c> RemoteObject<'c> {
    pub fn new(connection: &'c Connection, device_id: u32, object_id: u32) -> Self {
        Self {
            connection,
            device_id,
            object_id,
        }
    }

    pub fn connection(&self) -> &'c Connection {
        self.connection
    }

    pub fn device_id(&self) -> u32 {
        self.device_id
    }

    pub fn object_id(&self) -> u32 {
        self.object_id
    }

    /// Send a request to the remote object this handle is bound to.
    pub fn send(&self, command_id: u32, payload: &[u8]) -> Result<ActiveRequest> {
        self.connection
            .send(self.device_id, self.object_id, command_id, payload)
    }

    /// Send a request whose response is also delivered to `callback` on the
    /// dispatcher thread.
    pub fn send_with_callback(
        &self,
        command_id: u32,
        payload: &[u8],
        callback: impl FnOnce(Response) + Send + 'static,
    ) -> Result<ActiveRequest> {
        self.connection.send_with_callback(
            self.device_id,
            self.object_id,
            command_id,
            payload,
            callback,
        )
    }
}
