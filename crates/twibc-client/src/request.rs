use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use twibc_wire::Response;

use crate::error::{ClientError, Result};

/// Asynchronous completion callback, invoked on the dispatcher thread.
pub type Callback = Box<dyn FnOnce(Response) + Send + 'static>;

/// What has happened to an outstanding request so far.
#[derive(Debug, Clone)]
pub(crate) enum Completion {
    Pending,
    Resolved(Response),
    Broken(String),
}

/// The notification handle shared between an [`ActiveRequest`] and the
/// connection's reader thread.
///
/// A request resolves exactly once; waiters loop on the condition until the
/// slot leaves `Pending`, so a response that arrives before `wait` is called
/// is observed immediately and a wakeup can never be missed.
#[derive(Debug)]
pub(crate) struct Slot {
    state: Mutex<Completion>,
    cond: Condvar,
}

impl Slot {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(Completion::Pending),
            cond: Condvar::new(),
        })
    }

    /// Store the response and wake every waiter.
    pub(crate) fn resolve(&self, response: Response) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = Completion::Resolved(response);
        self.cond.notify_all();
    }

    /// Fail the request if it has not resolved yet.
    pub(crate) fn fail(&self, reason: &str) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, Completion::Pending) {
            *state = Completion::Broken(reason.to_string());
            self.cond.notify_all();
        }
    }
}

/// A correlation-table entry for one in-flight request.
pub(crate) struct PendingEntry {
    pub(crate) slot: Arc<Slot>,
    pub(crate) callback: Option<Callback>,
}

/// A request that has been sent and is awaiting its response.
///
/// Returned by [`Connection::send`](crate::Connection::send); holds the
/// request's addressing so callers can correlate it with logs and traces.
#[derive(Debug)]
pub struct ActiveRequest {
    pub tag: u32,
    pub device_id: u32,
    pub object_id: u32,
    pub command_id: u32,
    slot: Arc<Slot>,
}

impl ActiveRequest {
    pub(crate) fn new(
        tag: u32,
        device_id: u32,
        object_id: u32,
        command_id: u32,
        slot: Arc<Slot>,
    ) -> Self {
        Self {
            tag,
            device_id,
            object_id,
            command_id,
            slot,
        }
    }

    /// Block until the response arrives.
    ///
    /// Returns an error if the connection breaks while the request is
    /// outstanding. There is no protocol-level cancellation; a request
    /// either resolves or the connection dies.
    pub fn wait(&self) -> Result<Response> {
        let mut state = self
            .slot
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loop {
            match &*state {
                Completion::Resolved(response) => return Ok(response.clone()),
                Completion::Broken(reason) => return Err(ClientError::Broken(reason.clone())),
                Completion::Pending => {
                    state = self
                        .slot
                        .cond
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    /// Block until the response arrives, or until `timeout` elapses.
    ///
    /// Timing out only abandons the local wait; the protocol has no cancel
    /// message, so the daemon may still answer later (the response is then
    /// delivered to this same slot and a subsequent `wait` would see it).
    pub fn wait_timeout(&self, timeout: Duration) -> Result<Response> {
        let deadline = Instant::now() + timeout;
        let mut state = self
            .slot
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loop {
            match &*state {
                Completion::Resolved(response) => return Ok(response.clone()),
                Completion::Broken(reason) => return Err(ClientError::Broken(reason.clone())),
                Completion::Pending => {
                    let remaining = deadline
                        .checked_duration_since(Instant::now())
                        .ok_or(ClientError::Timeout(timeout))?;
                    let (guard, _) = self
                        .slot
                        .cond
                        .wait_timeout(state, remaining)
                        .unwrap_or_else(PoisonError::into_inner);
                    state = guard;
                }
            }
        }
    }

    /// Block until the response arrives and assert its result code is OK.
    pub fn wait_ok(&self) -> Result<Response> {
        Ok(self.wait()?.assert_ok()?)
    }
}
