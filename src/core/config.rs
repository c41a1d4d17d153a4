//! Configuration management for the searchgate client.
//!
//! This module handles loading configuration from TOML files and
//! environment variables, with sensible defaults for all settings.

use crate::core::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Response buffer sizing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportConfig {
    /// Capacity of a fresh session's response buffer
    #[serde(default = "default_initial_buffer_bytes")]
    pub initial_buffer_bytes: usize,

    /// Ceiling the buffer may grow to on overflow
    #[serde(default = "default_max_buffer_bytes")]
    pub max_buffer_bytes: usize,
}

/// Index creation settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexConfig {
    /// Writer heap budget sent with `index.create`
    #[serde(default = "default_writer_memory_bytes")]
    pub writer_memory_bytes: usize,
}

/// Query settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Edit distance used by fuzzy queries
    #[serde(default = "default_fuzzy_distance")]
    pub fuzzy_distance: u8,
}

// Default value functions
fn default_initial_buffer_bytes() -> usize {
    64 * 1024
}

fn default_max_buffer_bytes() -> usize {
    64 * 1024 * 1024
}

fn default_writer_memory_bytes() -> usize {
    50_000_000
}

fn default_fuzzy_distance() -> u8 {
    1
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            initial_buffer_bytes: default_initial_buffer_bytes(),
            max_buffer_bytes: default_max_buffer_bytes(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            writer_memory_bytes: default_writer_memory_bytes(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fuzzy_distance: default_fuzzy_distance(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| GateError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load config with priority: env vars > TOML > defaults
    ///
    /// The TOML file is taken from `SEARCHGATE_CONFIG` when set,
    /// otherwise from `./searchgate.toml` when present.
    pub fn load() -> Result<Self> {
        let mut config = if let Ok(config_path) = env::var("SEARCHGATE_CONFIG") {
            Self::from_file(config_path)?
        } else if Path::new("searchgate.toml").exists() {
            Self::from_file("searchgate.toml")?
        } else {
            Self::default()
        };

        config.merge_env();
        config.validate()?;

        Ok(config)
    }

    /// Merge configuration with environment variables
    pub fn merge_env(&mut self) {
        if let Ok(initial) = env::var("SEARCHGATE_INITIAL_BUFFER_BYTES") {
            if let Ok(bytes) = initial.parse() {
                self.transport.initial_buffer_bytes = bytes;
            }
        }
        if let Ok(max) = env::var("SEARCHGATE_MAX_BUFFER_BYTES") {
            if let Ok(bytes) = max.parse() {
                self.transport.max_buffer_bytes = bytes;
            }
        }
        if let Ok(memory) = env::var("SEARCHGATE_WRITER_MEMORY_BYTES") {
            if let Ok(bytes) = memory.parse() {
                self.index.writer_memory_bytes = bytes;
            }
        }
        if let Ok(distance) = env::var("SEARCHGATE_FUZZY_DISTANCE") {
            if let Ok(d) = distance.parse() {
                self.search.fuzzy_distance = d;
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.transport.initial_buffer_bytes == 0 {
            return Err(GateError::ConfigError(
                "Initial buffer size must be non-zero".to_string(),
            ));
        }

        if self.transport.initial_buffer_bytes > self.transport.max_buffer_bytes {
            return Err(GateError::ConfigError(
                "Initial buffer size cannot exceed max buffer size".to_string(),
            ));
        }

        if self.index.writer_memory_bytes == 0 {
            return Err(GateError::ConfigError(
                "Writer memory budget must be non-zero".to_string(),
            ));
        }

        if self.search.fuzzy_distance > 2 {
            return Err(GateError::ConfigError(
                "Fuzzy distance must be at most 2".to_string(),
            ));
        }

        Ok(())
    }

    /// Log configuration
    pub fn log_config(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!(
            "  Initial buffer: {} bytes",
            self.transport.initial_buffer_bytes
        );
        tracing::info!("  Max buffer: {} bytes", self.transport.max_buffer_bytes);
        tracing::info!(
            "  Writer memory: {} bytes",
            self.index.writer_memory_bytes
        );
        tracing::info!("  Fuzzy distance: {}", self.search.fuzzy_distance);
    }
}
