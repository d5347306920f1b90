//! Configuration, route table, and handler functions for the base server.
//!
//! This crate holds everything the servers need that is not HTTP plumbing:
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `config.json` into
//!   strongly-typed structs, with environment overrides.
//! - [`routes`] -- HTTP methods and the table of built-in API routes.
//! - [`resolve`] -- Which configured routes are served, and why the rest
//!   are not.
//! - [`functions`] -- The [`FunctionRegistry`] that maps configured
//!   function names to handlers, and the handlers themselves.
//!
//! [`FunctionRegistry`]: functions::FunctionRegistry

pub mod config;
pub mod functions;
pub mod resolve;
pub mod routes;

pub use config::{AppConfig, ConfigError, RouteConfig, ServerPorts};
pub use functions::{FunctionError, FunctionRegistry, FunctionRequest, FunctionResponse};
pub use resolve::{ResolvedRoute, RouteRejection, resolve_routes};
pub use routes::{BUILTIN_API_ROUTES, BuiltinRoute, HttpMethod};
