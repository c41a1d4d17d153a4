//! Call gate over the native engine's C ABI.
//!
//! The caller links the native library and hands over its entry
//! points; this module only owns the calling convention.

use crate::core::error::{GateError, Result, TransportError};
use crate::core::transport::{status, CallGate, GateReply};
use crate::core::types::RankingParams;
use once_cell::sync::Lazy;
use std::ffi::{c_char, CString};
use std::sync::Mutex;

/// `uint8_t init(void)`
pub type InitFn = unsafe extern "C" fn() -> u8;

/// `int64_t tantivy_jpc(const uint8_t *msg, uintptr_t len, uint8_t *ret, uintptr_t *ret_len)`
///
/// `*ret_len` holds the buffer capacity on entry and the written (or,
/// with status -2, required) length on exit.
pub type CallFn = unsafe extern "C" fn(*const u8, usize, *mut u8, *mut usize) -> i64;

/// `int8_t term(const char *session_id)`
pub type TermFn = unsafe extern "C" fn(*const c_char) -> i8;

/// `int8_t set_k_and_b(float k, float b)`
pub type RankingFn = unsafe extern "C" fn(f32, f32) -> i8;

/// Exported functions of a loaded native engine
#[derive(Debug, Clone, Copy)]
pub struct NativeEntryPoints {
    pub init: InitFn,
    pub call: CallFn,
    pub term: TermFn,
    pub set_k_and_b: Option<RankingFn>,
}

/// The native library is process state, so its init guard is too
static NATIVE_INIT: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(false));

/// Gate that forwards to native entry points
#[derive(Debug)]
pub struct ForeignGate {
    entry: NativeEntryPoints,
}

impl ForeignGate {
    /// Wrap native entry points
    ///
    /// # Safety
    ///
    /// Every function pointer must stay valid for the life of the gate
    /// and honor the signatures documented on the type aliases: reads
    /// at most `len` request bytes, writes at most `*ret_len` response
    /// bytes and reads `term`'s argument as a NUL-terminated string.
    pub unsafe fn new(entry: NativeEntryPoints) -> Self {
        Self { entry }
    }
}

impl CallGate for ForeignGate {
    fn init(&self) -> Result<bool> {
        let mut done = NATIVE_INIT
            .lock()
            .map_err(|e| TransportError::Poisoned(format!("native init guard: {e}")))?;
        if *done {
            return Ok(false);
        }
        // SAFETY: guaranteed by the contract of `ForeignGate::new`.
        let code = unsafe { (self.entry.init)() };
        tracing::info!("Native engine initialized (code {})", code);
        *done = true;
        Ok(true)
    }

    fn call(&self, request: &[u8], response: &mut [u8]) -> GateReply {
        let mut len = response.len();
        // SAFETY: both regions are live for the duration of the call and
        // the callee is bound to the lengths passed alongside them.
        let code = unsafe {
            (self.entry.call)(
                request.as_ptr(),
                request.len(),
                response.as_mut_ptr(),
                &mut len,
            )
        };
        GateReply { status: code, len }
    }

    fn release(&self, session_id: &str) -> Result<()> {
        let id = CString::new(session_id).map_err(|_| {
            GateError::Validation(format!("session id contains a NUL byte: {session_id:?}"))
        })?;
        // SAFETY: `id` outlives the call and is NUL-terminated.
        let code = unsafe { (self.entry.term)(id.as_ptr()) };
        if i64::from(code) == status::UNKNOWN_SESSION {
            return Err(TransportError::UnknownSession(session_id.to_string()).into());
        }
        if code < 0 {
            return Err(TransportError::Fault {
                status: i64::from(code),
            }
            .into());
        }
        Ok(())
    }

    fn set_ranking(&self, params: RankingParams) -> Result<()> {
        let Some(set_k_and_b) = self.entry.set_k_and_b else {
            return Err(GateError::Remote {
                object: "engine".to_string(),
                method: "set_k_and_b".to_string(),
                message: "native engine does not export ranking tuning".to_string(),
            });
        };
        // SAFETY: plain scalar arguments, see `ForeignGate::new`.
        let code = unsafe { set_k_and_b(params.k1, params.b) };
        if code < 0 {
            return Err(TransportError::Fault {
                status: i64::from(code),
            }
            .into());
        }
        Ok(())
    }
}
