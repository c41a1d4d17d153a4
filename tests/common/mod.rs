// Common test utilities and fixtures

pub mod fixtures;
pub mod helpers;

// Re-export commonly used items
// Note: These may appear unused in some test binaries
#[allow(unused_imports)]
pub use fixtures::{Library, BOOKS};
#[allow(unused_imports)]
pub use helpers::{scripted_client, RecordingGate, ScriptedGate};
#[cfg(feature = "embedded-engine")]
#[allow(unused_imports)]
pub use helpers::{client_with_buffer, embedded_client};
