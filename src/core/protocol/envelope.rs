//! Request/response envelope codec.

use crate::core::error::{GateError, Result, TransportError};
use crate::core::protocol::{Call, ObjectKind, PROTOCOL_VERSION};
use crate::core::transport::status;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One addressed, session-scoped remote call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    pub jpc: String,
    pub obj: ObjectKind,
    pub method: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl Request {
    pub fn new(session_id: &str, call: &Call<'_>) -> Self {
        Self {
            id: session_id.to_string(),
            jpc: PROTOCOL_VERSION.to_string(),
            obj: call.object(),
            method: call.method().to_string(),
            params: call.params(session_id),
        }
    }
}

/// Validate and serialize a call
pub fn encode(session_id: &str, call: &Call<'_>) -> Result<Vec<u8>> {
    call.validate()?;
    let request = Request::new(session_id, call);
    Ok(serde_json::to_vec(&request)?)
}

/// Interpret a gate reply as a success payload or a typed error
///
/// `bytes` holds exactly the bytes the gate reported as written.
pub fn decode(gate_status: i64, bytes: &[u8], session_id: &str, call: &Call<'_>) -> Result<Value> {
    match gate_status {
        s if s >= status::OK => {
            let payload = parse_payload(bytes, call)?;
            match error_description(&payload) {
                Some(message) => Err(remote(call, message)),
                None => Ok(payload),
            }
        }
        status::BUFFER_TOO_SMALL => Err(TransportError::BufferTooSmall {
            required: bytes.len(),
            limit: bytes.len(),
        }
        .into()),
        status::NOT_INITIALIZED => Err(TransportError::NotInitialized.into()),
        status::UNKNOWN_SESSION => Err(TransportError::UnknownSession(session_id.to_string()).into()),
        other => match describe(bytes) {
            Some(message) => Err(remote(call, message)),
            None => Err(TransportError::Fault { status: other }.into()),
        },
    }
}

fn parse_payload(bytes: &[u8], call: &Call<'_>) -> Result<Value> {
    let trimmed = trim_nul(bytes);
    if trimmed.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(trimmed)
        .map_err(|e| GateError::decode(call.method(), "payload", format!("invalid JSON: {e}")))
}

/// Engines reporting errors with a success status still send `{"error": ...}`
fn error_description(payload: &Value) -> Option<String> {
    payload
        .as_object()
        .and_then(|m| m.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn describe(bytes: &[u8]) -> Option<String> {
    let trimmed = trim_nul(bytes);
    if trimmed.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice::<Value>(trimmed) {
        Ok(payload) => error_description(&payload).or_else(|| Some(payload.to_string())),
        Err(_) => Some(String::from_utf8_lossy(trimmed).trim().to_string()),
    }
}

fn trim_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    &bytes[..end]
}

fn remote(call: &Call<'_>, message: String) -> GateError {
    GateError::Remote {
        object: call.object().to_string(),
        method: call.method().to_string(),
        message,
    }
}
