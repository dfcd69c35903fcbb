use bytes::Bytes;

use crate::error::ResultError;

/// A response from twibd or a remote device, decoded from one frame.
///
/// Immutable once constructed; cloning is cheap (the payload is a
/// reference-counted `Bytes`), which is how a blocking waiter and an
/// asynchronous callback can each receive the same response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// ID of the device this response originated from.
    pub device_id: u32,
    /// ID of the bridge object this response originated from.
    pub object_id: u32,
    /// Result code; zero means success.
    pub result_code: u32,
    /// Tag of the request that prompted this response.
    pub tag: u32,
    /// Raw data associated with the response.
    pub payload: Bytes,
    /// Object IDs sent with the response; each designates a newly created
    /// remote object.
    pub object_ids: Vec<u32>,
}

impl Response {
    /// Returns the response unchanged if the result code is OK, otherwise
    /// a [`ResultError`] carrying the code.
    pub fn assert_ok(self) -> Result<Self, ResultError> {
        if self.result_code != 0 {
            return Err(ResultError {
                code: self.result_code,
            });
        }
        Ok(self)
    }
}
