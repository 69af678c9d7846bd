//! Job handler implementations for the thumbnail and email queues.

pub mod email;
pub mod thumbnail;

pub use email::EmailJobHandler;
pub use thumbnail::ThumbnailJobHandler;

use crate::executor::HandlerError;

/// Extract a required string field from a job payload.
///
/// Identifiers in payloads are opaque; the only check performed here is
/// "present and non-empty". Whether the value matches a stored record is
/// the store's business.
pub(crate) fn require_field<'a>(
    payload: &'a serde_json::Value,
    field: &'static str,
) -> Result<&'a str, HandlerError> {
    payload
        .get(field)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(HandlerError::MissingField(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_require_field_present() {
        let payload = json!({ "user_id": "abc-123" });
        assert_eq!(require_field(&payload, "user_id").unwrap(), "abc-123");
    }

    #[test]
    fn test_require_field_missing_or_empty() {
        for payload in [json!({}), json!({ "user_id": "" }), json!({ "user_id": "  " })] {
            let err = require_field(&payload, "user_id").unwrap_err();
            assert!(matches!(err, HandlerError::MissingField("user_id")));
        }
    }

    #[test]
    fn test_require_field_non_string_value() {
        let payload = json!({ "user_id": 42 });
        assert!(require_field(&payload, "user_id").is_err());
    }
}
