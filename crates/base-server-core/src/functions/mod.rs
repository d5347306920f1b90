//! Handler functions addressable from `config.json`.
//!
//! A configured route names its handler by string (`"function":
//! "health_check"`). The [`FunctionRegistry`] resolves that name to a plain
//! function pointer at startup, so an unknown name is caught before the
//! server accepts traffic.
//!
//! Handlers are synchronous and may touch the file system. They receive a
//! [`FunctionRequest`] describing the call and return a
//! [`FunctionResponse`] carrying the status code and the JSON body.
//! Expected failures (bad parameters, missing files) are responses with a
//! non-2xx status; only unexpected failures are a [`FunctionError`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

pub mod agents;
pub mod documents;
pub mod health;

/// Signature every handler function has.
pub type HandlerFn = fn(&FunctionRequest) -> Result<FunctionResponse, FunctionError>;

/// Unexpected failures inside a handler.
#[derive(Debug, thiserror::Error)]
pub enum FunctionError {
    /// A file or directory could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The path being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A response body could not be encoded.
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

impl FunctionError {
    /// Wrap an I/O error with the path that caused it.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// The inputs of one handler call.
#[derive(Debug, Clone, Default)]
pub struct FunctionRequest {
    /// Query-string parameters.
    pub query: BTreeMap<String, String>,
    /// Parsed JSON body, if the request carried one.
    pub body: Option<Value>,
    /// Root of the documentation tree handlers read from.
    pub docs_root: PathBuf,
}

impl FunctionRequest {
    /// A request with no parameters against `docs_root`.
    pub fn new(docs_root: impl Into<PathBuf>) -> Self {
        Self {
            docs_root: docs_root.into(),
            ..Self::default()
        }
    }

    /// Builder-style query parameter.
    #[must_use]
    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.insert(key.to_owned(), value.to_owned());
        self
    }

    /// Look up a parameter: the query string first, then a string field of
    /// a JSON object body.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str).or_else(|| {
            self.body
                .as_ref()
                .and_then(|body| body.get(key))
                .and_then(Value::as_str)
        })
    }
}

/// Status code and JSON object body produced by a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Map<String, Value>,
}

impl FunctionResponse {
    /// A response with an explicit status.
    pub const fn new(status: u16, body: Map<String, Value>) -> Self {
        Self { status, body }
    }

    /// A 200 response with `"success": true` prepended to `fields`.
    pub fn ok(fields: Map<String, Value>) -> Self {
        let mut body = Map::new();
        body.insert("success".to_owned(), Value::Bool(true));
        body.extend(fields);
        Self::new(200, body)
    }

    /// A `{"success": false, "error": message}` response.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        let mut body = Map::new();
        body.insert("success".to_owned(), Value::Bool(false));
        body.insert("error".to_owned(), Value::String(message.into()));
        Self::new(status, body)
    }

    /// Whether the status is 2xx.
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Name-to-handler lookup table.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    handlers: BTreeMap<String, HandlerFn>,
}

impl FunctionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every handler shipped with the server.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("health_check", health::health_check);
        registry.register(
            "get_documentation_folders",
            documents::get_documentation_folders,
        );
        registry.register("get_documents", documents::get_documents);
        registry.register("get_document_content", documents::get_document_content);
        registry.register("get_agents_file_names", agents::get_agents_file_names);
        registry.register("get_agent_file", agents::get_agent_file);
        registry.register("get_all_agents_and_skills", agents::get_all_agents_and_skills);
        registry
    }

    /// Add or replace a handler.
    pub fn register(&mut self, name: &str, handler: HandlerFn) {
        self.handlers.insert(name.to_owned(), handler);
    }

    /// Resolve a handler by name.
    pub fn get(&self, name: &str) -> Option<HandlerFn> {
        self.handlers.get(name).copied()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Helpers shared by the handler modules
// ---------------------------------------------------------------------------

/// Title case: the first letter of every alphabetic run is
/// upper-cased and the rest lower-cased.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// `snake_case_name` to `Snake Case Name`.
pub fn display_name(name: &str) -> String {
    title_case(&name.replace('_', " "))
}

/// Validate a value used as a single path segment under the documentation
/// root. Returns a 400 response naming `field` when the value is empty,
/// `.` or `..`, or contains a path separator.
pub(crate) fn checked_segment<'a>(field: &str, value: &'a str) -> Result<&'a str, FunctionResponse> {
    let bad = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\'])
        || value.contains('\0');
    if bad {
        Err(FunctionResponse::error(400, format!("Invalid {field}: {value}")))
    } else {
        Ok(value)
    }
}

/// Sorted subdirectories of `dir`.
pub(crate) fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>, FunctionError> {
    let entries = std::fs::read_dir(dir).map_err(|e| FunctionError::io(dir, e))?;
    let mut dirs = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| FunctionError::io(dir, e))?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Size of a file in bytes.
pub(crate) fn file_size(path: &Path) -> Result<u64, FunctionError> {
    std::fs::metadata(path)
        .map(|meta| meta.len())
        .map_err(|e| FunctionError::io(path, e))
}

/// Last path component as a string.
pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
