//! Liveness handler.

use serde_json::{Map, Value};

use super::{FunctionError, FunctionRequest, FunctionResponse};

/// Report that the server is up.
///
/// # Errors
///
/// Never fails.
pub fn health_check(_request: &FunctionRequest) -> Result<FunctionResponse, FunctionError> {
    let mut fields = Map::new();
    fields.insert("status".to_owned(), Value::from("healthy"));
    fields.insert("message".to_owned(), Value::from("Server is running"));
    Ok(FunctionResponse::ok(fields))
}
