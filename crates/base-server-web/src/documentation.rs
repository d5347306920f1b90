//! The API documentation document served by `/api/documentation` and
//! `/get_all_routes`.

use base_server_core::AppConfig;
use base_server_core::routes::BUILTIN_API_ROUTES;
use serde_json::{Map, Value, json};

/// Name reported in `server_info`.
pub const SERVER_NAME: &str = "Base Server API";

/// Description reported in `server_info`.
pub const SERVER_DESCRIPTION: &str = "REST API server with event logging and monitoring";

/// Build the documentation document for `config`.
///
/// Configured routes are listed under their configured names, followed by
/// the built-in routes. A built-in whose name is already taken by a
/// configured route is listed as `builtin_<name>`.
pub fn build_documentation(config: &AppConfig) -> Value {
    let api_port = config.api_port();
    let mut routes = Map::new();

    for (name, route) in &config.api_details.routes {
        let path = route.route.clone().unwrap_or_default();
        let method = route.method_name();
        let description = route
            .description
            .clone()
            .unwrap_or_else(|| format!("Route: {path}"));
        routes.insert(
            name.clone(),
            json!({
                "route": path,
                "method": method,
                "function": route.function,
                "description": description,
                "file": route.function_file_relative_path,
                "input": route.input,
                "output": route.expected_output,
                "example_curl": format!("curl -X {method} http://localhost:{api_port}{path}"),
            }),
        );
    }

    for builtin in BUILTIN_API_ROUTES {
        let key = if routes.contains_key(builtin.name) {
            format!("builtin_{}", builtin.name)
        } else {
            builtin.name.to_owned()
        };
        routes.insert(
            key,
            json!({
                "route": builtin.path,
                "method": builtin.method().as_str(),
                "function": builtin.function,
                "description": builtin.description,
                "input": [],
                "output": builtin.output_schema(),
                "example_curl": format!("curl http://localhost:{api_port}{}", builtin.path),
            }),
        );
    }

    json!({
        "success": true,
        "server_info": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "description": SERVER_DESCRIPTION,
        },
        "routes": routes,
    })
}
