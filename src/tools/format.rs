//! Rendering of tool outcomes as tool-message text.

use serde_json::Value;

/// Text sent back to the model for a successful tool result.
pub fn result_to_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(v) => v.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Text sent back to the model for a failed tool call.
pub fn error_to_text(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}
