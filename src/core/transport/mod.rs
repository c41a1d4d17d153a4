//! Transport adapter: the call-gate contract and response buffers.
//!
//! A gate takes request bytes and a caller-owned response buffer and
//! returns a status plus a length. On overflow the gate reports the
//! size it needs, the adapter grows the buffer and retries once.

pub mod buffer;
pub mod foreign;

pub use buffer::ResponseBuffer;
pub use foreign::{ForeignGate, NativeEntryPoints};

use crate::core::error::{Result, TransportError};
use crate::core::types::RankingParams;

/// Gate status codes
pub mod status {
    /// Success, `len` bytes of payload written
    pub const OK: i64 = 0;
    /// Engine reported a failure, description in the buffer
    pub const REMOTE_ERROR: i64 = -1;
    /// Buffer too small, `len` holds the required size
    pub const BUFFER_TOO_SMALL: i64 = -2;
    /// `init` has not run
    pub const NOT_INITIALIZED: i64 = -3;
    /// Session id not known to the engine
    pub const UNKNOWN_SESSION: i64 = -4;
}

/// Status and length reported by one gate invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateReply {
    pub status: i64,
    /// Bytes written, or bytes required when the status is `BUFFER_TOO_SMALL`
    pub len: usize,
}

impl GateReply {
    pub fn ok(len: usize) -> Self {
        Self {
            status: status::OK,
            len,
        }
    }
}

/// The single narrow entry point into the engine
pub trait CallGate: Send + Sync {
    /// One-time engine initialization
    ///
    /// Idempotent; returns whether this invocation performed it.
    fn init(&self) -> Result<bool>;

    /// Execute one serialized request, writing the reply into `response`
    fn call(&self, request: &[u8], response: &mut [u8]) -> GateReply;

    /// Free all engine-side state of a session
    fn release(&self, session_id: &str) -> Result<()>;

    /// Adjust the ranking function's constants
    fn set_ranking(&self, params: RankingParams) -> Result<()>;
}

/// Run one request through the gate, growing the buffer once on overflow
///
/// On return the reply's `len` bytes at the front of `buffer` hold the
/// engine's answer.
pub fn exchange(
    gate: &dyn CallGate,
    request: &[u8],
    buffer: &mut ResponseBuffer,
) -> Result<GateReply> {
    let reply = gate.call(request, buffer.as_mut_slice());
    if reply.status != status::BUFFER_TOO_SMALL {
        return checked(reply, buffer);
    }

    tracing::debug!(
        "Response needs {} bytes, buffer holds {}; growing and retrying",
        reply.len,
        buffer.capacity()
    );
    buffer.grow_to(reply.len)?;

    let retry = gate.call(request, buffer.as_mut_slice());
    if retry.status == status::BUFFER_TOO_SMALL {
        return Err(TransportError::BufferTooSmall {
            required: retry.len,
            limit: buffer.capacity(),
        }
        .into());
    }
    checked(retry, buffer)
}

fn checked(reply: GateReply, buffer: &ResponseBuffer) -> Result<GateReply> {
    if reply.len > buffer.capacity() {
        return Err(TransportError::Fault {
            status: reply.status,
        }
        .into());
    }
    Ok(reply)
}
