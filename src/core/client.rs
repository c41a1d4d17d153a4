//! Client: the entry point that owns the gate and the configuration.

use crate::core::chain::SchemaBuilder;
use crate::core::config::Config;
use crate::core::error::{GateError, Result};
use crate::core::session::Session;
use crate::core::transport::CallGate;
use crate::core::types::RankingParams;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared access to one engine
///
/// Cheap to clone. Every session opened from a client talks to the
/// same gate.
#[derive(Clone)]
pub struct Client {
    gate: Arc<dyn CallGate>,
    config: Arc<Config>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("gate", &"<call gate>")
            .field("config", &self.config)
            .finish()
    }
}

impl Client {
    /// Validate the configuration and initialize the engine
    pub fn new(gate: Arc<dyn CallGate>, config: Config) -> Result<Self> {
        config.validate()?;
        let client = Self {
            gate,
            config: Arc::new(config),
        };
        client.init()?;
        Ok(client)
    }

    /// Client backed by an in-process tantivy engine
    #[cfg(feature = "embedded-engine")]
    pub fn embedded(config: Config) -> Result<Self> {
        Self::new(Arc::new(crate::engine::LocalEngine::new()), config)
    }

    /// Run the engine's one-time initialization
    ///
    /// Returns whether this invocation performed it.
    pub fn init(&self) -> Result<bool> {
        let performed = self.gate.init()?;
        if performed {
            tracing::info!("Engine initialized");
        }
        Ok(performed)
    }

    /// Open a session without a storage path; `open_index` builds in RAM
    pub fn new_session(&self) -> SchemaBuilder {
        self.open(None)
    }

    /// Open a session whose index lives under `storage_path`
    pub fn new_session_at(&self, storage_path: impl Into<PathBuf>) -> SchemaBuilder {
        self.open(Some(storage_path.into()))
    }

    fn open(&self, storage_path: Option<PathBuf>) -> SchemaBuilder {
        let session = Session::open(
            Arc::clone(&self.gate),
            storage_path,
            &self.config.transport,
        );
        SchemaBuilder::new(Arc::new(session), Arc::clone(&self.config))
    }

    /// Tune the ranking constants of the engine
    pub fn set_ranking(&self, params: RankingParams) -> Result<()> {
        if !params.k1.is_finite() || params.k1 < 0.0 {
            return Err(GateError::Validation(format!(
                "k1 must be a non-negative number, got {}",
                params.k1
            )));
        }
        if !(0.0..=1.0).contains(&params.b) {
            return Err(GateError::Validation(format!(
                "b must lie in [0, 1], got {}",
                params.b
            )));
        }
        self.gate.set_ranking(params)?;
        tracing::info!("Ranking set to k1={} b={}", params.k1, params.b);
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn gate(&self) -> &Arc<dyn CallGate> {
        &self.gate
    }
}
