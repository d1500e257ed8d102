use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Decoded payload of one guarded request.
///
/// A successful request carries the response body exactly as the server
/// sent it. A failed request inside a batch degrades to the uniform
/// shape `{"data": {}, "message": "Error: <reason>", "meta": {}}` for
/// its index alone, so a batch result never needs per-index exception
/// handling. Degraded entries are indistinguishable in shape from
/// successful ones; downstream code checks the embedded `message` field
/// (via [`ResponseResult::is_degraded`]) rather than relying on errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseResult(Value);

impl ResponseResult {
    /// The uniform error shape for a single failed request in a batch
    pub(crate) fn degraded(reason: impl Display) -> Self {
        Self(json!({
            "data": {},
            "message": format!("Error: {reason}"),
            "meta": {},
        }))
    }

    /// The embedded `message` field, if the payload carries one
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.0.get("message").and_then(Value::as_str)
    }

    /// Whether this entry is the degraded error shape rather than a
    /// decoded server payload
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.message().is_some_and(|m| m.starts_with("Error: "))
    }

    /// Borrow the underlying JSON value
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Unwrap into the underlying JSON value
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for ResponseResult {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl Display for ResponseResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degraded_shape() {
        let result = ResponseResult::degraded("Not Found");
        assert_eq!(
            result.into_value(),
            json!({"data": {}, "message": "Error: Not Found", "meta": {}})
        );
    }

    #[test]
    fn test_degraded_is_flagged() {
        assert!(ResponseResult::degraded("boom").is_degraded());
        assert!(!ResponseResult::from(json!({"data": {"id": 1}})).is_degraded());
    }

    #[test]
    fn test_server_message_is_not_mistaken_for_degradation() {
        // a successful payload may carry its own message field
        let result = ResponseResult::from(json!({"data": {}, "message": "created", "meta": {}}));
        assert_eq!(result.message(), Some("created"));
        assert!(!result.is_degraded());
    }
}
