//! Session: the opaque id that scopes every remote object.
//!
//! A session owns its response buffer and serializes its own calls.
//! Capabilities share it through `Arc<Session>`.

use crate::core::config::TransportConfig;
use crate::core::error::{GateError, Result, TransportError};
use crate::core::protocol::{self, Call};
use crate::core::transport::{self, CallGate, ResponseBuffer};
use crate::core::types::DocHandle;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Where a session's index lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexLocation {
    Ram,
    Directory(PathBuf),
}

impl IndexLocation {
    pub fn directory(&self) -> Option<&Path> {
        match self {
            IndexLocation::Ram => None,
            IndexLocation::Directory(path) => Some(path),
        }
    }
}

/// Engine-side objects of which a session keeps only the newest
///
/// Creating a new object of a slot replaces the previous one, so
/// handles issued against the old one can no longer be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Reader = 0,
    /// Searcher leased from the reader, together with its query parser
    Lease = 1,
    Query = 2,
    FuzzyQuery = 3,
}

impl Slot {
    const COUNT: usize = 4;

    fn name(self) -> &'static str {
        match self {
            Slot::Reader => "reader",
            Slot::Lease => "searcher lease",
            Slot::Query => "query",
            Slot::FuzzyQuery => "fuzzy query",
        }
    }
}

/// Generation of every slot when a handle was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Stamp([u64; Slot::COUNT]);

impl Stamp {
    fn get(&self, slot: Slot) -> u64 {
        self.0[slot as usize]
    }

    fn advance(&mut self, slot: Slot) {
        self.0[slot as usize] += 1;
    }
}

/// Everything a call touches, guarded together
#[derive(Debug)]
struct CallState {
    buffer: ResponseBuffer,
    stamp: Stamp,
}

/// Client-side handle of one engine session
pub struct Session {
    id: String,
    storage_path: Option<PathBuf>,
    gate: Arc<dyn CallGate>,
    state: Mutex<CallState>,
    released: AtomicBool,
    /// Calls that reached the gate; zero means no engine-side state
    calls: AtomicU64,
    /// Highest document handle issued so far
    documents: AtomicU64,
    bound_index: Mutex<Option<IndexLocation>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("storage_path", &self.storage_path)
            .field("released", &self.released.load(Ordering::SeqCst))
            .finish()
    }
}

impl Session {
    /// Open a session with a fresh random id
    pub fn open(
        gate: Arc<dyn CallGate>,
        storage_path: Option<PathBuf>,
        transport: &TransportConfig,
    ) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        tracing::info!("Opened session {}", id);
        Self {
            id,
            storage_path,
            gate,
            state: Mutex::new(CallState {
                buffer: ResponseBuffer::new(
                    transport.initial_buffer_bytes,
                    transport.max_buffer_bytes,
                ),
                stamp: Stamp::default(),
            }),
            released: AtomicBool::new(false),
            calls: AtomicU64::new(0),
            documents: AtomicU64::new(0),
            bound_index: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn storage_path(&self) -> Option<&Path> {
        self.storage_path.as_deref()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Send one call and return its decoded success payload
    pub fn call(&self, call: &Call<'_>) -> Result<Value> {
        self.call_bound(call, Stamp::default(), &[], &[])
            .map(|(payload, _)| payload)
    }

    /// Send a call on behalf of a handle issued at `held`
    ///
    /// Fails with `IllegalTransition` when any slot in `requires` was
    /// replaced after `held`. On success every slot in `supersedes`
    /// moves to a new generation and the resulting stamp is returned.
    pub(crate) fn call_bound(
        &self,
        call: &Call<'_>,
        held: Stamp,
        requires: &[Slot],
        supersedes: &[Slot],
    ) -> Result<(Value, Stamp)> {
        let request = protocol::encode(&self.id, call)?;
        let mut state = self.lock_state()?;
        if self.is_released() {
            return Err(TransportError::SessionReleased(self.id.clone()).into());
        }
        if let Some(slot) = requires
            .iter()
            .find(|slot| held.get(**slot) != state.stamp.get(**slot))
        {
            return Err(GateError::IllegalTransition(format!(
                "{}.{} through a superseded {}: session {} has created a newer one",
                call.object(),
                call.method(),
                slot.name(),
                self.id
            )));
        }

        tracing::debug!(
            "Session {} calling {}.{}",
            self.id,
            call.object(),
            call.method()
        );
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = transport::exchange(self.gate.as_ref(), &request, &mut state.buffer)?;
        let bytes = state.buffer.filled(reply.len);
        let payload = protocol::decode(reply.status, bytes, &self.id, call)?;
        for slot in supersedes {
            state.stamp.advance(*slot);
        }
        Ok((payload, state.stamp))
    }

    /// Free the engine-side state of this session
    ///
    /// Idempotent. Waits for an in-flight call to finish first.
    pub fn release(&self) -> Result<()> {
        let _state = self.lock_state()?;
        if self.released.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if self.calls.load(Ordering::SeqCst) == 0 {
            tracing::debug!("Session {} released before any call", self.id);
            return Ok(());
        }
        self.gate.release(&self.id)?;
        tracing::info!("Released session {}", self.id);
        Ok(())
    }

    /// Record a document handle returned by `document.create`
    pub(crate) fn record_document(&self, doc: DocHandle) {
        self.documents.fetch_max(doc.0, Ordering::SeqCst);
    }

    /// Fail unless `doc` was issued in this session
    pub(crate) fn check_document(&self, doc: DocHandle) -> Result<()> {
        let issued = self.documents.load(Ordering::SeqCst);
        if doc.0 == 0 || doc.0 > issued {
            return Err(GateError::Validation(format!(
                "document handle {doc} was not issued by session {} ({issued} issued)",
                self.id
            )));
        }
        Ok(())
    }

    /// Bind the session to an index location
    ///
    /// Returns `true` when the session is already bound to `location`.
    pub(crate) fn bind_index(&self, location: &IndexLocation) -> Result<bool> {
        let mut bound = self
            .bound_index
            .lock()
            .map_err(|e| TransportError::Poisoned(e.to_string()))?;
        match bound.as_ref() {
            Some(existing) if existing == location => Ok(true),
            Some(existing) => Err(GateError::IllegalTransition(format!(
                "session {} already has an index at {existing:?}, cannot create one at {location:?}",
                self.id
            ))),
            None => {
                *bound = Some(location.clone());
                Ok(false)
            }
        }
    }

    /// Undo a binding whose remote creation failed
    pub(crate) fn unbind_index(&self) {
        if let Ok(mut bound) = self.bound_index.lock() {
            *bound = None;
        }
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, CallState>> {
        self.state
            .lock()
            .map_err(|e| TransportError::Poisoned(format!("session {}: {e}", self.id)).into())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.is_released() {
            return;
        }
        tracing::warn!("Session {} dropped without release; releasing", self.id);
        if let Err(e) = self.release() {
            tracing::debug!("Implicit release of session {} failed: {}", self.id, e);
        }
    }
}
