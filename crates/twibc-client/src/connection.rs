use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use bytes::BytesMut;
use tracing::{debug, error, warn};
use twibc_transport::BridgeStream;
use twibc_wire::{encode_request, Response, ResponseReader, WireError};

use crate::error::{ClientError, Result};
use crate::interfaces::device::DeviceInterface;
use crate::interfaces::meta::{DeviceDescriptor, MetaInterface};
use crate::request::{ActiveRequest, Callback, PendingEntry, Slot};

/// A connection to twibd.
///
/// Owns the socket and two background threads: a reader that decodes
/// response frames and resolves the matching pending request, and a
/// dispatcher that invokes asynchronous completion callbacks. Callbacks run
/// on the dispatcher so they may freely issue new requests without
/// deadlocking the reader, which must stay free to consume frames.
pub struct Connection {
    shared: Arc<Shared>,
    reader: Option<JoinHandle<()>>,
    dispatcher: Option<JoinHandle<()>>,
}

struct Shared {
    /// Send-path handle to the socket. One framed write per request; sends
    /// from multiple threads serialize here.
    writer: Mutex<BridgeStream>,
    /// Correlation table: tag of every in-flight request to its entry.
    /// Never holds two live entries with the same tag; every entry is
    /// removed exactly once, by its response, a failed send, or teardown.
    table: Mutex<HashMap<u32, PendingEntry>>,
    status: Mutex<Status>,
    next_tag: AtomicU32,
}

#[derive(Debug, Clone)]
enum Status {
    Active,
    Broken(String),
    Closed,
}

impl Connection {
    /// Wrap an already-open stream to twibd.
    pub fn new(stream: BridgeStream) -> Result<Self> {
        let reader_stream = stream.try_clone()?;
        let shared = Arc::new(Shared {
            writer: Mutex::new(stream),
            table: Mutex::new(HashMap::new()),
            status: Mutex::new(Status::Active),
            next_tag: AtomicU32::new(1),
        });

        let (cb_tx, cb_rx) = mpsc::channel::<(Callback, Response)>();

        let dispatcher = std::thread::Builder::new()
            .name("twibc-dispatch".to_string())
            .spawn(move || {
                while let Ok((callback, response)) = cb_rx.recv() {
                    callback(response);
                }
            })?;

        let reader_shared = Arc::clone(&shared);
        let reader = std::thread::Builder::new()
            .name("twibc-reader".to_string())
            .spawn(move || read_loop(ResponseReader::new(reader_stream), reader_shared, cb_tx))?;

        Ok(Self {
            shared,
            reader: Some(reader),
            dispatcher: Some(dispatcher),
        })
    }

    /// Connect to twibd over its default Unix domain socket.
    #[cfg(unix)]
    pub fn connect_unix() -> Result<Self> {
        Self::connect_unix_at(twibc_transport::DEFAULT_SOCKET_PATH)
    }

    /// Connect to twibd over a Unix domain socket at `path`.
    #[cfg(unix)]
    pub fn connect_unix_at(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(BridgeStream::connect_unix(path)?)
    }

    /// Connect to twibd's TCP frontend.
    pub fn connect_tcp(addr: impl std::net::ToSocketAddrs + std::fmt::Display) -> Result<Self> {
        Self::new(BridgeStream::connect_tcp(addr)?)
    }

    /// Send a request and return a handle to await the response.
    pub fn send(
        &self,
        device_id: u32,
        object_id: u32,
        command_id: u32,
        payload: &[u8],
    ) -> Result<ActiveRequest> {
        self.submit(device_id, object_id, command_id, payload, None)
    }

    /// Send a request whose response is delivered to `callback` on the
    /// dispatcher thread, in addition to being awaitable on the handle.
    pub fn send_with_callback(
        &self,
        device_id: u32,
        object_id: u32,
        command_id: u32,
        payload: &[u8],
        callback: impl FnOnce(Response) + Send + 'static,
    ) -> Result<ActiveRequest> {
        self.submit(
            device_id,
            object_id,
            command_id,
            payload,
            Some(Box::new(callback)),
        )
    }

    fn submit(
        &self,
        device_id: u32,
        object_id: u32,
        command_id: u32,
        payload: &[u8],
        callback: Option<Callback>,
    ) -> Result<ActiveRequest> {
        self.check_active()?;
        twibc_wire::check_payload_size(payload.len(), twibc_wire::DEFAULT_MAX_PAYLOAD)?;

        let tag = self.shared.next_tag.fetch_add(1, Ordering::Relaxed);
        let slot = Slot::new();

        // Registration happens-before the write, so the response can never
        // race past an absent table entry.
        {
            let mut table = lock(&self.shared.table);
            table.insert(
                tag,
                PendingEntry {
                    slot: Arc::clone(&slot),
                    callback,
                },
            );
        }

        let mut frame = BytesMut::new();
        encode_request(device_id, object_id, command_id, tag, payload, &mut frame);

        if let Err(err) = self.write_frame(&frame) {
            // The request never reached the wire; its entry must not linger.
            lock(&self.shared.table).remove(&tag);
            return Err(err);
        }

        debug!(tag, device_id, object_id, command_id, "request sent");
        Ok(ActiveRequest::new(tag, device_id, object_id, command_id, slot))
    }

    fn write_frame(&self, frame: &[u8]) -> Result<()> {
        let mut writer = lock(&self.shared.writer);
        let mut offset = 0usize;
        while offset < frame.len() {
            match writer.write(&frame[offset..]) {
                Ok(0) => {
                    return Err(ClientError::ShortWrite {
                        written: offset,
                        expected: frame.len(),
                    })
                }
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(ClientError::Io(err)),
            }
        }
        writer.flush()?;
        Ok(())
    }

    fn check_active(&self) -> Result<()> {
        match &*lock(&self.shared.status) {
            Status::Active => Ok(()),
            Status::Broken(reason) => Err(ClientError::Broken(reason.clone())),
            Status::Closed => Err(ClientError::Closed),
        }
    }

    /// Returns a list of devices connected to twibd.
    pub fn list_devices(&self) -> Result<Vec<DeviceDescriptor>> {
        MetaInterface::new(self).list_devices()
    }

    /// Opens a device by one of the ids returned from [`list_devices`].
    ///
    /// [`list_devices`]: Connection::list_devices
    pub fn open_device(&self, device_id: u32) -> DeviceInterface<'_> {
        DeviceInterface::new(self, device_id)
    }

    /// Close the connection and stop both background threads.
    ///
    /// Idempotent. Shutting down the socket unblocks the reader, which
    /// fails any still-outstanding requests before it exits; their waiters
    /// wake with a broken-connection error rather than blocking forever.
    pub fn close(&mut self) -> Result<()> {
        {
            let mut status = lock(&self.shared.status);
            if matches!(*status, Status::Closed) {
                return Ok(());
            }
            *status = Status::Closed;
        }

        // The reader may be gone already if the connection broke first.
        let _ = lock(&self.shared.writer).shutdown();

        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        // The reader owned the last callback sender; its exit drains and
        // closes the dispatcher's queue.
        if let Some(dispatcher) = self.dispatcher.take() {
            let _ = dispatcher.join();
        }
        Ok(())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("status", &*lock(&self.shared.status))
            .field("outstanding", &lock(&self.shared.table).len())
            .finish()
    }
}

fn read_loop(
    mut reader: ResponseReader<BridgeStream>,
    shared: Arc<Shared>,
    cb_tx: mpsc::Sender<(Callback, Response)>,
) {
    loop {
        match reader.read_response() {
            Ok(response) => {
                let entry = lock(&shared.table).remove(&response.tag);
                match entry {
                    None => {
                        // Protocol violation from the peer, but not fatal:
                        // drop the frame and keep serving the stream.
                        warn!(tag = response.tag, "response for unknown tag; dropping");
                    }
                    Some(mut entry) => {
                        let callback = entry.callback.take();
                        entry.slot.resolve(response.clone());
                        if let Some(callback) = callback {
                            let _ = cb_tx.send((callback, response));
                        }
                    }
                }
            }
            Err(err) => {
                let reason = {
                    let mut status = lock(&shared.status);
                    match &*status {
                        Status::Closed => "connection closed".to_string(),
                        _ => {
                            let reason = err.to_string();
                            *status = Status::Broken(reason.clone());
                            reason
                        }
                    }
                };
                if matches!(err, WireError::ConnectionClosed) {
                    debug!("reader stopped: {reason}");
                } else {
                    error!(error = %err, "reader terminated");
                }
                fail_outstanding(&shared, &reason);
                return;
            }
        }
    }
}

/// Wake every outstanding waiter with a broken-connection error. Their
/// callbacks are dropped unresolved; a callback only ever observes a real
/// response.
fn fail_outstanding(shared: &Shared, reason: &str) {
    let mut table = lock(&shared.table);
    for (_, entry) in table.drain() {
        entry.slot.fail(reason);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
