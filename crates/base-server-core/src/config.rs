//! Configuration loading and typed config structures for the base server.
//!
//! The canonical configuration lives in `config.json` at the project root.
//! This module defines strongly-typed structs that mirror the JSON
//! structure and a loader that reads the file and applies environment
//! overrides. Every section has defaults, so a minimal file such as
//! `{"api_details": {"routes": {}}}` is a valid configuration.
//!
//! Keys this crate does not know about are kept in [`AppConfig::extra`]
//! so the dashboard can echo the whole document back.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::routes::HttpMethod;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("config file not found: {}", path.display())]
    NotFound {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse JSON content.
    #[error("failed to parse config JSON: {source}")]
    Json {
        /// The underlying JSON parse error.
        #[from]
        source: serde_json::Error,
    },
}

/// Top-level server configuration.
///
/// Mirrors the structure of `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ports and bind address.
    #[serde(default)]
    pub run_details: RunDetails,

    /// Configured API routes.
    #[serde(default)]
    pub api_details: ApiDetails,

    /// External services checked by the self test.
    #[serde(default)]
    pub external_dependencies: BTreeMap<String, ExternalDependency>,

    /// On-disk locations for events, results, and documentation.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Self-test configuration.
    #[serde(default)]
    pub bist: BistConfig,

    /// Any other top-level keys, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppConfig {
    /// Load configuration from a JSON file at the given path.
    ///
    /// Environment variables override file values afterwards; see
    /// [`AppConfig::apply_env_overrides`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if the file does not exist,
    /// [`ConfigError::Io`] if it cannot be read, or [`ConfigError::Json`]
    /// if the content is not valid configuration JSON.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a JSON string. No environment overrides
    /// are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the string is not valid JSON or
    /// does not match the expected shape.
    pub fn parse(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Override file values with environment variables when set:
    ///
    /// - `BASE_SERVER_HOST` overrides `run_details.host`
    /// - `BASE_SERVER_ROOT_PORT` overrides `run_details.root_port`
    /// - `BASE_SERVER_EVENTS_DIR` overrides `storage.events_dir`
    /// - `BASE_SERVER_RESULTS_DIR` overrides `storage.results_dir`
    /// - `BASE_SERVER_DOCS_DIR` overrides `storage.documentation_dir`
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// An unparseable `BASE_SERVER_ROOT_PORT` is ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("BASE_SERVER_HOST") {
            self.run_details.host = host;
        }
        if let Some(port) = lookup("BASE_SERVER_ROOT_PORT").and_then(|p| p.parse().ok()) {
            self.run_details.root_port = port;
        }
        if let Some(dir) = lookup("BASE_SERVER_EVENTS_DIR") {
            self.storage.events_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("BASE_SERVER_RESULTS_DIR") {
            self.storage.results_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("BASE_SERVER_DOCS_DIR") {
            self.storage.documentation_dir = PathBuf::from(dir);
        }
    }

    /// Port the dashboard server listens on.
    pub const fn dashboard_port(&self) -> u16 {
        self.run_details.dashboard_port()
    }

    /// Port the API server listens on.
    pub const fn api_port(&self) -> u16 {
        self.run_details.api_port()
    }

    /// Derived port summary.
    pub const fn ports(&self) -> ServerPorts {
        ServerPorts {
            root_port: self.run_details.root_port,
            dashboard_port: self.dashboard_port(),
            api_port: self.api_port(),
            dashboard_offset: self.run_details.port_offsets.dashboard,
            api_offset: self.run_details.port_offsets.api,
        }
    }
}

/// Bind address and port layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunDetails {
    /// Address both servers bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Base port; each server adds its offset.
    #[serde(default = "default_root_port")]
    pub root_port: u16,

    /// Per-server offsets from `root_port`.
    #[serde(default)]
    pub port_offsets: PortOffsets,
}

impl RunDetails {
    /// `root_port + port_offsets.dashboard`, saturating at `u16::MAX`.
    pub const fn dashboard_port(&self) -> u16 {
        self.root_port.saturating_add(self.port_offsets.dashboard)
    }

    /// `root_port + port_offsets.api`, saturating at `u16::MAX`.
    pub const fn api_port(&self) -> u16 {
        self.root_port.saturating_add(self.port_offsets.api)
    }
}

impl Default for RunDetails {
    fn default() -> Self {
        Self {
            host: default_host(),
            root_port: default_root_port(),
            port_offsets: PortOffsets::default(),
        }
    }
}

/// Offsets added to the root port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortOffsets {
    /// Dashboard server offset.
    #[serde(default)]
    pub dashboard: u16,

    /// API server offset.
    #[serde(default = "default_api_offset")]
    pub api: u16,
}

impl Default for PortOffsets {
    fn default() -> Self {
        Self {
            dashboard: 0,
            api: default_api_offset(),
        }
    }
}

/// Ports derived from [`RunDetails`], as printed by the `ports` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerPorts {
    /// Configured base port.
    pub root_port: u16,
    /// Dashboard server port.
    pub dashboard_port: u16,
    /// API server port.
    pub api_port: u16,
    /// Dashboard offset from the base port.
    pub dashboard_offset: u16,
    /// API offset from the base port.
    pub api_offset: u16,
}

/// The `api_details` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiDetails {
    /// Route name to route definition.
    #[serde(default)]
    pub routes: BTreeMap<String, RouteConfig>,
}

/// One configured API route.
///
/// Every field is optional in the file; incomplete entries are reported
/// and skipped at registration time rather than failing the whole load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// URL path, e.g. `/api/health`.
    #[serde(default)]
    pub route: Option<String>,

    /// HTTP verb; `POST` when absent.
    #[serde(default)]
    pub method: Option<String>,

    /// Name of the registered handler function.
    #[serde(default)]
    pub function: Option<String>,

    /// Source file the handler lives in, shown in the documentation.
    #[serde(default)]
    pub function_file_relative_path: Option<String>,

    /// Free-text description for the documentation.
    #[serde(default)]
    pub description: Option<String>,

    /// Documented input parameters.
    #[serde(default = "empty_array")]
    pub input: Value,

    /// Documented response shape.
    #[serde(default = "empty_array")]
    pub expected_output: Value,
}

impl RouteConfig {
    /// The raw method string, upper-cased, defaulting to `POST`.
    pub fn method_name(&self) -> String {
        self.method
            .as_deref()
            .unwrap_or(HttpMethod::Post.as_str())
            .to_ascii_uppercase()
    }

    /// The parsed method, or `None` when the verb is unsupported.
    pub fn http_method(&self) -> Option<HttpMethod> {
        self.method_name().parse().ok()
    }

    /// Whether route, function, and file path are all present and non-empty.
    pub fn is_complete(&self) -> bool {
        [&self.route, &self.function, &self.function_file_relative_path]
            .iter()
            .all(|field| field.as_deref().is_some_and(|v| !v.is_empty()))
    }
}

/// An external service checked by the self test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalDependency {
    /// Whether the dependency is checked at all.
    #[serde(default)]
    pub enabled: bool,

    /// URL to send a `HEAD` request to.
    #[serde(default)]
    pub url: Option<String>,
}

/// On-disk locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one JSON file per API event.
    #[serde(default = "default_events_dir")]
    pub events_dir: PathBuf,

    /// Directory the self-test report is written to.
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    /// Root of the documentation and agent files.
    #[serde(default = "default_documentation_dir")]
    pub documentation_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            events_dir: default_events_dir(),
            results_dir: default_results_dir(),
            documentation_dir: default_documentation_dir(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Self-test configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BistConfig {
    /// Run the self test in the background after `serve` starts.
    #[serde(default = "default_true")]
    pub run_on_startup: bool,

    /// Delay before the startup run, giving both servers time to bind.
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,

    /// Per-request timeout for every self-test request.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for BistConfig {
    fn default() -> Self {
        Self {
            run_on_startup: true,
            startup_delay_ms: default_startup_delay_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_root_port() -> u16 {
    8000
}

const fn default_api_offset() -> u16 {
    1
}

const fn empty_array() -> Value {
    Value::Array(Vec::new())
}

fn default_events_dir() -> PathBuf {
    PathBuf::from("storage/events")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_documentation_dir() -> PathBuf {
    PathBuf::from("documentation")
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}

const fn default_startup_delay_ms() -> u64 {
    1_500
}

const fn default_request_timeout_ms() -> u64 {
    5_000
}
