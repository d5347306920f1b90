//! Shared application state for the API and dashboard servers.
//!
//! Both servers hold the same [`AppState`] behind an [`Arc`], so the
//! dashboard reads exactly the events the API writes.

use std::sync::Arc;

use base_server_core::{AppConfig, FunctionRegistry, FunctionRequest};
use base_server_events::EventStore;

use crate::error::WebError;
use crate::templates::PageRenderer;

/// Shared state for the Axum applications.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug)]
pub struct AppState {
    /// The loaded configuration.
    pub config: Arc<AppConfig>,
    /// Event log written by configured routes.
    pub events: Arc<EventStore>,
    /// Handler functions addressable from the configuration.
    pub functions: FunctionRegistry,
    /// Compiled dashboard templates.
    pub pages: PageRenderer,
}

impl AppState {
    /// Create state over `config` and `events` with the built-in handler
    /// functions.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::Template`] if the dashboard templates do not
    /// compile.
    pub fn new(config: Arc<AppConfig>, events: Arc<EventStore>) -> Result<Self, WebError> {
        Self::with_functions(config, events, FunctionRegistry::builtin())
    }

    /// Create state with an explicit function registry.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::Template`] if the dashboard templates do not
    /// compile.
    pub fn with_functions(
        config: Arc<AppConfig>,
        events: Arc<EventStore>,
        functions: FunctionRegistry,
    ) -> Result<Self, WebError> {
        Ok(Self {
            config,
            events,
            functions,
            pages: PageRenderer::new()?,
        })
    }

    /// A function request rooted at the configured documentation directory.
    pub fn function_request(&self) -> FunctionRequest {
        FunctionRequest::new(self.config.storage.documentation_dir.clone())
    }
}
