//! In-process engine behind the call gate, backed by tantivy.
//!
//! `LocalEngine` speaks the same wire protocol as the native engine:
//! it parses each request, routes it to the addressed session's live
//! objects and writes the JSON reply into the caller's buffer.

pub mod error;
mod params;
mod search;
mod session;

pub use error::{EngineError, EngineResult};

use crate::core::error::{GateError, Result, TransportError};
use crate::core::protocol::{Request, PROTOCOL_VERSION};
use crate::core::transport::{status, CallGate, GateReply};
use crate::core::types::RankingParams;
use serde_json::json;
use session::{EngineSession, PendingReply};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Tantivy-backed engine reachable through [`CallGate`]
#[derive(Default)]
pub struct LocalEngine {
    initialized: Mutex<bool>,
    sessions: Mutex<HashMap<String, Arc<Mutex<EngineSession>>>>,
}

impl std::fmt::Debug for LocalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalEngine")
            .field("sessions", &self.session_count())
            .finish()
    }
}

impl LocalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions currently holding engine-side state
    pub fn session_count(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    fn is_initialized(&self) -> bool {
        self.initialized.lock().map(|done| *done).unwrap_or(false)
    }

    /// Look up a session, creating it on first contact
    fn session(&self, id: &str) -> Option<Arc<Mutex<EngineSession>>> {
        let mut sessions = self.sessions.lock().ok()?;
        let session = sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                tracing::debug!("Engine session {} created", id);
                Arc::new(Mutex::new(EngineSession::new(id)))
            });
        Some(Arc::clone(session))
    }
}

fn error_body(id: &str, message: &str) -> Vec<u8> {
    json!({
        "error": message,
        "jpc": PROTOCOL_VERSION,
        "id": id,
    })
    .to_string()
    .into_bytes()
}

/// Copy `body` into `response`, or report the size it needs
fn deliver(response: &mut [u8], code: i64, body: &[u8]) -> GateReply {
    if body.len() > response.len() {
        return GateReply {
            status: status::BUFFER_TOO_SMALL,
            len: body.len(),
        };
    }
    response[..body.len()].copy_from_slice(body);
    GateReply {
        status: code,
        len: body.len(),
    }
}

impl CallGate for LocalEngine {
    fn init(&self) -> Result<bool> {
        let mut done = self
            .initialized
            .lock()
            .map_err(|e| TransportError::Poisoned(format!("engine init guard: {e}")))?;
        if *done {
            return Ok(false);
        }
        *done = true;
        tracing::info!("Embedded engine ready (tantivy)");
        Ok(true)
    }

    fn call(&self, request: &[u8], response: &mut [u8]) -> GateReply {
        if !self.is_initialized() {
            return GateReply {
                status: status::NOT_INITIALIZED,
                len: 0,
            };
        }

        let parsed: Request = match serde_json::from_slice(request) {
            Ok(parsed) => parsed,
            Err(e) => {
                let body = error_body("", &format!("malformed request: {e}"));
                return deliver(response, status::REMOTE_ERROR, &body);
            }
        };
        let Some(session) = self.session(&parsed.id) else {
            let body = error_body(&parsed.id, "engine session table poisoned");
            return deliver(response, status::REMOTE_ERROR, &body);
        };
        let mut session = match session.lock() {
            Ok(session) => session,
            Err(_) => {
                let body = error_body(&parsed.id, "engine session poisoned");
                return deliver(response, status::REMOTE_ERROR, &body);
            }
        };

        let (code, body) = match session.take_pending(request) {
            Some(pending) => {
                tracing::debug!(
                    "Replaying {}.{} for session {}",
                    parsed.obj,
                    parsed.method,
                    parsed.id
                );
                (pending.status, pending.body)
            }
            None => {
                tracing::debug!(
                    "Engine {}.{} for session {}",
                    parsed.obj,
                    parsed.method,
                    parsed.id
                );
                match session.dispatch(&parsed) {
                    Ok(payload) => (status::OK, payload.to_string().into_bytes()),
                    Err(e) => {
                        tracing::debug!("{}.{} failed: {}", parsed.obj, parsed.method, e);
                        (status::REMOTE_ERROR, error_body(&parsed.id, &e.to_string()))
                    }
                }
            }
        };

        let reply = deliver(response, code, &body);
        if reply.status == status::BUFFER_TOO_SMALL {
            session.stash(PendingReply {
                request: request.to_vec(),
                status: code,
                body,
            });
        }
        reply
    }

    fn release(&self, session_id: &str) -> Result<()> {
        let removed = self
            .sessions
            .lock()
            .map_err(|e| TransportError::Poisoned(format!("engine session table: {e}")))?
            .remove(session_id);
        match removed {
            Some(_) => {
                tracing::debug!("Engine session {} released", session_id);
                Ok(())
            }
            None => Err(TransportError::UnknownSession(session_id.to_string()).into()),
        }
    }

    fn set_ranking(&self, _params: RankingParams) -> Result<()> {
        Err(GateError::Remote {
            object: "engine".to_string(),
            method: "set_k_and_b".to_string(),
            message: "ranking constants are fixed in the embedded engine".to_string(),
        })
    }
}
