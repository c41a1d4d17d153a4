//! Growable response buffer owned by a session.

use crate::core::error::{Result, TransportError};

/// Byte region the gate writes replies into
///
/// Starts at a configured capacity and grows on demand up to a ceiling.
/// The allocation is owned here, so it is freed exactly once whatever
/// path a call takes.
#[derive(Debug)]
pub struct ResponseBuffer {
    bytes: Vec<u8>,
    max_capacity: usize,
}

impl ResponseBuffer {
    pub fn new(initial_capacity: usize, max_capacity: usize) -> Self {
        let initial = initial_capacity.clamp(1, max_capacity.max(1));
        Self {
            bytes: vec![0; initial],
            max_capacity: max_capacity.max(initial),
        }
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// The first `len` bytes, clamped to the capacity
    pub fn filled(&self, len: usize) -> &[u8] {
        &self.bytes[..len.min(self.bytes.len())]
    }

    /// Grow to hold at least `required` bytes
    ///
    /// Doubles where possible to amortize repeated growth, never past the
    /// ceiling.
    pub fn grow_to(&mut self, required: usize) -> Result<()> {
        if required <= self.bytes.len() {
            return Ok(());
        }
        if required > self.max_capacity {
            return Err(TransportError::BufferTooSmall {
                required,
                limit: self.max_capacity,
            }
            .into());
        }
        let target = required
            .max(self.bytes.len().saturating_mul(2))
            .min(self.max_capacity);
        self.bytes.resize(target, 0);
        Ok(())
    }
}
