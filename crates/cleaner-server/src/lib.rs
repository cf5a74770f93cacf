//! cleaner-server: HTTP front for the graph wipe.
//!
//! Exposes `DELETE /test/{key}`, which checks the key against the configured
//! secret and, if it matches, empties the graph through a
//! [`WipeEngine`](cleaner_engine::WipeEngine). `DELETE /test` and
//! `DELETE /test/` carry no key and are always refused with `401`.
//! `GET /health` answers `OK`.

pub mod error;
pub mod handler;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get};
use axum::Router;

use cleaner_core::{CleanerConfig, KeyValidator};
use cleaner_engine::WipeEngine;
use cleaner_graph::GraphStore;

/// Shared per-router state. Cloned into every request.
pub struct AppState<S> {
    pub engine: Arc<WipeEngine<S>>,
    pub validator: KeyValidator,
    pub timeout: Option<Duration>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            validator: self.validator.clone(),
            timeout: self.timeout,
        }
    }
}

impl<S: GraphStore> AppState<S> {
    pub fn new(engine: WipeEngine<S>, validator: KeyValidator) -> Self {
        Self {
            engine: Arc::new(engine),
            validator,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Wire a store to the wipe and auth settings from `config`.
    pub fn from_config(store: S, config: &CleanerConfig) -> error::Result<Self> {
        let engine = WipeEngine::new(store)
            .with_mode(config.wipe.wipe_mode()?)
            .with_page_size(config.wipe.page_size()?);
        let mut state = Self::new(engine, KeyValidator::new(config.server.delete_key.clone()));
        if let Some(secs) = config.server.request_timeout_secs {
            state = state.with_timeout(Duration::from_secs(secs));
        }
        Ok(state)
    }
}

/// Build the HTTP router.
pub fn router<S: GraphStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/test/{key}", delete(handler::wipe_graph::<S>))
        .route("/test", delete(handler::wipe_graph_without_key::<S>))
        .route("/test/", delete(handler::wipe_graph_without_key::<S>))
        .route("/health", get(handler::health))
        .with_state(state)
}
