//! API and dashboard HTTP servers for the base server.
//!
//! This crate provides two Axum routers over one shared [`AppState`]:
//!
//! - **API server** -- the routes declared in `config.json`, dispatched to
//!   registered handler functions with every call recorded in the event
//!   log, plus built-in health, events, and documentation routes.
//! - **Dashboard server** -- HTML pages rendered with `minijinja` and the
//!   JSON endpoints those pages call.
//!
//! # Architecture
//!
//! ```text
//!   config.json ──► dispatch ──► FunctionRegistry ──► handler (blocking pool)
//!                      │                                   │
//!                      └──────────── EventStore ◄──────────┘
//!                                       │
//!   dashboard pages / JSON ◄────────────┘
//! ```

pub mod api;
pub mod dashboard;
pub mod dispatch;
pub mod documentation;
pub mod error;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod templates;

// Re-export primary types for convenience.
pub use error::WebError;
pub use router::{build_api_router, build_dashboard_router};
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::{StartupError, spawn_api_server};
pub use state::AppState;
