//! Configuration management for the graph cleaner.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`CLEANER__` prefix, `__` separator)
//! 2. Config file (`cleaner.toml` by default)
//! 3. Defaults

use std::fmt;
use std::net::SocketAddr;
use std::num::NonZeroUsize;

use serde::Deserialize;

use crate::error::CleanerError;
use crate::types::WipeMode;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CleanerConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub wipe: WipeSettings,

    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub neo4j: Neo4jSettings,
}

/// `[server]` section.
#[derive(Clone, Deserialize)]
pub struct ServerSettings {
    /// Socket address the HTTP listener binds to.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Shared secret expected in `DELETE /test/{key}`. Empty disables the wipe.
    #[serde(default)]
    pub delete_key: String,

    /// Upper bound on a single wipe, in seconds.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

/// `[wipe]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WipeSettings {
    #[serde(default)]
    pub mode: ModeSetting,

    /// Entities per committed sub-transaction in batched mode.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Entities fetched per page while enumerating the graph.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModeSetting {
    #[default]
    Single,
    Batched,
}

/// `[store]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: Backend,

    /// Whether the embedded store starts with a reference node.
    #[serde(default = "default_true")]
    pub reference_node: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Memory,
    Neo4j,
}

/// `[neo4j]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct Neo4jSettings {
    #[serde(default = "default_uri")]
    pub uri: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default = "default_password")]
    pub password: String,

    /// Label identifying the node the wipe retains, if any.
    #[serde(default)]
    pub reference_label: Option<String>,
}

impl CleanerConfig {
    /// Load configuration from `{file_prefix}.toml` (optional) and the environment.
    pub fn load(file_prefix: &str) -> Result<Self, CleanerError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("CLEANER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: CleanerConfig = cfg.try_deserialize()?;
        loaded.validate()?;
        tracing::debug!(
            file_prefix,
            backend = ?loaded.store.backend,
            mode = ?loaded.wipe.mode,
            "Configuration loaded"
        );
        Ok(loaded)
    }

    /// Reject settings that cannot produce a working server.
    pub fn validate(&self) -> Result<(), CleanerError> {
        self.server.bind_addr()?;
        self.wipe.wipe_mode()?;
        self.wipe.page_size()?;
        Ok(())
    }
}

impl ServerSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, CleanerError> {
        self.bind.parse().map_err(|e: std::net::AddrParseError| CleanerError::Bind {
            addr: self.bind.clone(),
            reason: e.to_string(),
        })
    }
}

impl WipeSettings {
    /// Resolve the configured strategy, rejecting a zero batch size.
    pub fn wipe_mode(&self) -> Result<WipeMode, CleanerError> {
        match self.mode {
            ModeSetting::Single => Ok(WipeMode::Single),
            ModeSetting::Batched => NonZeroUsize::new(self.batch_size)
                .map(|batch_size| WipeMode::Batched { batch_size })
                .ok_or_else(|| CleanerError::Config("wipe.batch_size must be at least 1".into())),
        }
    }

    pub fn page_size(&self) -> Result<NonZeroUsize, CleanerError> {
        NonZeroUsize::new(self.page_size)
            .ok_or_else(|| CleanerError::Config("wipe.page_size must be at least 1".into()))
    }
}

impl fmt::Debug for ServerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerSettings")
            .field("bind", &self.bind)
            .field("delete_key", &"<redacted>")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn default_bind() -> String {
    "127.0.0.1:7473".to_string()
}

fn default_batch_size() -> usize {
    1000
}

fn default_page_size() -> usize {
    500
}

fn default_true() -> bool {
    true
}

fn default_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_password() -> String {
    "cleaner-dev".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            delete_key: String::new(),
            request_timeout_secs: None,
        }
    }
}

impl Default for WipeSettings {
    fn default() -> Self {
        Self {
            mode: ModeSetting::default(),
            batch_size: default_batch_size(),
            page_size: default_page_size(),
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            reference_node: default_true(),
        }
    }
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            user: default_user(),
            password: default_password(),
            reference_label: None,
        }
    }
}
