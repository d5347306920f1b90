//! HTTP methods and the built-in API route table.
//!
//! Built-in routes are served by the API server regardless of what
//! `config.json` declares. The table here is the single source for their
//! paths; configured routes that collide with it are not served, the
//! documentation endpoint describes them, and the self test requests them.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

/// An HTTP verb a configured route may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
    /// `PATCH`
    Patch,
}

impl HttpMethod {
    /// Every supported method.
    pub const ALL: [Self; 5] = [Self::Get, Self::Post, Self::Put, Self::Delete, Self::Patch];

    /// The upper-case verb.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a method string is not one of [`HttpMethod::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported HTTP method: {0}")]
pub struct UnsupportedMethod(pub String);

impl FromStr for HttpMethod {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnsupportedMethod(s.to_owned()))
    }
}

/// A route the API server always serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinRoute {
    /// Key under which the route appears in the documentation.
    pub name: &'static str,
    /// URL path.
    pub path: &'static str,
    /// Name shown as the implementing function.
    pub function: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Response fields and their documented types.
    pub output: &'static [(&'static str, &'static str)],
}

impl BuiltinRoute {
    /// Built-in routes are read-only.
    pub const fn method(&self) -> HttpMethod {
        HttpMethod::Get
    }

    /// The documented output shape: a one-element list of
    /// `{field: {"type": ty}}`.
    pub fn output_schema(&self) -> Value {
        let fields: Map<String, Value> = self
            .output
            .iter()
            .map(|(field, ty)| {
                let mut spec = Map::new();
                spec.insert("type".to_owned(), Value::from(*ty));
                ((*field).to_owned(), Value::Object(spec))
            })
            .collect();
        Value::Array(vec![Value::Object(fields)])
    }
}

const EVENTS_OUTPUT: &[(&str, &str)] = &[("success", "bool"), ("events", "list"), ("count", "int")];
const DOCS_OUTPUT: &[(&str, &str)] = &[("success", "bool"), ("routes", "dict")];

/// Every built-in API route, in documentation order.
pub const BUILTIN_API_ROUTES: &[BuiltinRoute] = &[
    BuiltinRoute {
        name: "events",
        path: "/events",
        function: "get_events_json",
        description: "Get the last 100 API events with full request/response details",
        output: EVENTS_OUTPUT,
    },
    BuiltinRoute {
        name: "get_last_100_api_calls",
        path: "/api/get_last_100_api_calls",
        function: "get_last_100_api_calls",
        description: "Get the last 100 API calls (alternate endpoint)",
        output: EVENTS_OUTPUT,
    },
    BuiltinRoute {
        name: "health",
        path: "/health",
        function: "health_check",
        description: "Health check endpoint - verify server is running",
        output: &[("success", "bool"), ("status", "str"), ("message", "str")],
    },
    BuiltinRoute {
        name: "documentation",
        path: "/api/documentation",
        function: "get_api_documentation",
        description: "Get complete API documentation",
        output: DOCS_OUTPUT,
    },
    BuiltinRoute {
        name: "get_all_routes",
        path: "/get_all_routes",
        function: "get_all_routes",
        description: "Get documentation of all API endpoints",
        output: DOCS_OUTPUT,
    },
];

/// Whether `path` is served by a built-in route.
pub fn is_builtin_path(path: &str) -> bool {
    BUILTIN_API_ROUTES.iter().any(|route| route.path == path)
}
