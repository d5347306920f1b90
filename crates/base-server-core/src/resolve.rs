//! Which configured routes the API server serves.
//!
//! The dispatcher and the self test both plan from [`resolve_routes`], so
//! the self test only exercises routes that are actually served. An entry
//! is rejected when:
//!
//! - `route`, `function`, or `function_file_relative_path` is missing
//! - the method is not GET, POST, PUT, DELETE, or PATCH
//! - the `function` is not in the registry
//! - the path is not a static path (see [`is_static_path`])
//! - the path is served by a built-in route
//! - the `(path, method)` pair was taken by an earlier entry

use std::collections::BTreeSet;

use crate::config::{AppConfig, RouteConfig};
use crate::functions::{FunctionRegistry, HandlerFn};
use crate::routes::{HttpMethod, is_builtin_path};

/// A configured route accepted for serving.
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    /// Route name from the configuration.
    pub name: String,
    /// URL path.
    pub path: String,
    /// HTTP verb.
    pub method: HttpMethod,
    /// Handler function name.
    pub function: String,
    /// The resolved handler.
    pub handler: HandlerFn,
}

/// Why a configured route was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteRejection {
    /// A required field is missing.
    #[error("incomplete route config")]
    Incomplete,

    /// The method is not one the server supports.
    #[error("unsupported HTTP method {0}")]
    UnsupportedMethod(String),

    /// The handler function is not registered.
    #[error("unknown handler function {0}")]
    UnknownFunction(String),

    /// The path has captures, wildcards, braces, or no leading `/`.
    #[error("path {0} is not a static path")]
    NotStatic(String),

    /// The path belongs to a built-in route.
    #[error("path {0} is served by a built-in route")]
    ShadowsBuiltin(String),

    /// An earlier entry already registered this path and method.
    #[error("{method} {path} is already registered")]
    Duplicate {
        /// URL path.
        path: String,
        /// HTTP verb.
        method: HttpMethod,
    },
}

/// The outcome of resolving every configured route.
#[derive(Debug, Clone, Default)]
pub struct RoutePlan {
    /// Accepted routes, in configuration order.
    pub accepted: Vec<ResolvedRoute>,
    /// Rejected route names and the reason for each.
    pub rejected: Vec<(String, RouteRejection)>,
}

/// Resolve every configured route against `functions`.
pub fn resolve_routes(config: &AppConfig, functions: &FunctionRegistry) -> RoutePlan {
    let mut plan = RoutePlan::default();
    let mut seen: BTreeSet<(String, HttpMethod)> = BTreeSet::new();

    for (name, route) in &config.api_details.routes {
        match resolve_one(name, route, functions, &mut seen) {
            Ok(route) => plan.accepted.push(route),
            Err(reason) => plan.rejected.push((name.clone(), reason)),
        }
    }

    plan
}

fn resolve_one(
    name: &str,
    route: &RouteConfig,
    functions: &FunctionRegistry,
    seen: &mut BTreeSet<(String, HttpMethod)>,
) -> Result<ResolvedRoute, RouteRejection> {
    if !route.is_complete() {
        return Err(RouteRejection::Incomplete);
    }
    let (Some(path), Some(function)) = (route.route.clone(), route.function.clone()) else {
        return Err(RouteRejection::Incomplete);
    };
    let method = route
        .http_method()
        .ok_or_else(|| RouteRejection::UnsupportedMethod(route.method_name()))?;
    let handler = functions
        .get(&function)
        .ok_or_else(|| RouteRejection::UnknownFunction(function.clone()))?;
    if !is_static_path(&path) {
        return Err(RouteRejection::NotStatic(path));
    }
    if is_builtin_path(&path) {
        return Err(RouteRejection::ShadowsBuiltin(path));
    }
    if !seen.insert((path.clone(), method)) {
        return Err(RouteRejection::Duplicate { path, method });
    }

    Ok(ResolvedRoute {
        name: name.to_owned(),
        path,
        method,
        function,
        handler,
    })
}

/// Whether `path` names exactly one URL: it starts with `/`, contains no
/// `{` or `}`, and no segment starts with `:` or `*`.
pub fn is_static_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.contains(['{', '}'])
        && !path
            .split('/')
            .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
}
