// Test helper functions

use searchgate::core::transport::status;
use searchgate::{CallGate, Client, Config, GateReply, RankingParams, Result};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Client over a fresh embedded engine with default settings
#[cfg(feature = "embedded-engine")]
#[allow(dead_code)] // Used in integration tests
pub fn embedded_client() -> Client {
    Client::embedded(Config::default()).expect("Failed to start embedded engine")
}

/// Client over a fresh embedded engine whose sessions start with a
/// response buffer of `initial` bytes
#[cfg(feature = "embedded-engine")]
#[allow(dead_code)] // Used in integration tests
pub fn client_with_buffer(initial: usize, max: usize) -> Client {
    let mut config = Config::default();
    config.transport.initial_buffer_bytes = initial;
    config.transport.max_buffer_bytes = max;
    Client::embedded(config).expect("Failed to start embedded engine")
}

/// Gate answering every call from a fixed script of (status, body) pairs
///
/// A body longer than the caller's buffer is reported as an overflow
/// without consuming the script entry, so the retry sees the same reply.
#[derive(Default)]
#[allow(dead_code)] // Used in integration tests
pub struct ScriptedGate {
    replies: Mutex<VecDeque<(i64, Vec<u8>)>>,
    requests: Mutex<Vec<Value>>,
}

#[allow(dead_code)] // Used in integration tests
impl ScriptedGate {
    pub fn new(replies: Vec<(i64, &str)>) -> Self {
        Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|(code, body)| (code, body.as_bytes().to_vec()))
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests seen so far, parsed as JSON
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

impl CallGate for ScriptedGate {
    fn init(&self) -> Result<bool> {
        Ok(true)
    }

    fn call(&self, request: &[u8], response: &mut [u8]) -> GateReply {
        self.requests
            .lock()
            .unwrap()
            .push(serde_json::from_slice(request).unwrap_or(Value::Null));

        let mut replies = self.replies.lock().unwrap();
        let Some((code, body)) = replies.front().cloned() else {
            return GateReply {
                status: status::REMOTE_ERROR,
                len: 0,
            };
        };
        if body.len() > response.len() {
            return GateReply {
                status: status::BUFFER_TOO_SMALL,
                len: body.len(),
            };
        }
        replies.pop_front();
        response[..body.len()].copy_from_slice(&body);
        GateReply {
            status: code,
            len: body.len(),
        }
    }

    fn release(&self, _session_id: &str) -> Result<()> {
        Ok(())
    }

    fn set_ranking(&self, _params: RankingParams) -> Result<()> {
        Ok(())
    }
}

/// Client driving a [`ScriptedGate`]
#[allow(dead_code)] // Used in integration tests
pub fn scripted_client(gate: Arc<ScriptedGate>, config: Config) -> Client {
    Client::new(gate, config).expect("Failed to create scripted client")
}

/// Gate that forwards to another gate and records released session ids
#[allow(dead_code)] // Used in integration tests
pub struct RecordingGate<G> {
    pub inner: G,
    pub released: Mutex<Vec<String>>,
    pub ranking: Mutex<Vec<RankingParams>>,
}

#[allow(dead_code)] // Used in integration tests
impl<G: CallGate> RecordingGate<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            released: Mutex::new(Vec::new()),
            ranking: Mutex::new(Vec::new()),
        }
    }

    pub fn released(&self) -> Vec<String> {
        self.released.lock().unwrap().clone()
    }
}

impl<G: CallGate> CallGate for RecordingGate<G> {
    fn init(&self) -> Result<bool> {
        self.inner.init()
    }

    fn call(&self, request: &[u8], response: &mut [u8]) -> GateReply {
        self.inner.call(request, response)
    }

    fn release(&self, session_id: &str) -> Result<()> {
        self.released.lock().unwrap().push(session_id.to_string());
        self.inner.release(session_id)
    }

    fn set_ranking(&self, params: RankingParams) -> Result<()> {
        self.ranking.lock().unwrap().push(params);
        Ok(())
    }
}
