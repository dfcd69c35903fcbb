//! Client connection layer for the twibd bridge daemon.
//!
//! A [`Connection`] owns one duplex stream to twibd and multiplexes any
//! number of concurrent requests over it. Each request carries a tag; a
//! background reader demultiplexes response frames back to the request that
//! originated them, waking blocking waiters and forwarding asynchronous
//! callbacks to a dedicated dispatcher thread.
//!
//! ```no_run
//! use twibc_client::Connection;
//!
//! # fn main() -> twibc_client::Result<()> {
//! let connection = Connection::connect_unix()?;
//! for device in connection.list_devices()? {
//!     println!("{:#x}: {}", device.device_id, device.identification);
//! }
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod interface;
pub mod interfaces;
pub mod request;

pub use connection::Connection;
pub use error::{ClientError, Result};
pub use interface::RemoteObject;
pub use interfaces::debugger::{DebugInterface, MemoryRegion, NsoInfo, RESULT_NO_DEBUG_EVENTS};
pub use interfaces::device::DeviceInterface;
pub use interfaces::meta::{DeviceDescriptor, MetaInterface};
pub use request::{ActiveRequest, Callback};
