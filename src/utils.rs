use crate::error::{McpError, McpResult};
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Parse JSON value into a typed parameter struct
pub fn parse_params<T: DeserializeOwned>(params: Value) -> McpResult<T> {
    // Tools without arguments may be called with `null` or no arguments at all
    let params = if params.is_null() {
        Value::Object(Default::default())
    } else {
        params
    };

    serde_json::from_value(params)
        .map_err(|e| McpError::InvalidParameter(format!("Invalid parameters: {}", e)))
}

/// Accept a JSON number, a numeric string, or null for an optional numeric argument.
pub fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected a number, got '{}'", s))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a number, got {}",
            other
        ))),
    }
}

/// Value of an optional numeric argument, with zero, negative or missing meaning "use the default".
pub fn positive_or(value: Option<f64>, default: f64) -> f64 {
    value.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(default)
}

/// Like [`positive_or`] for whole-number arguments; fractions are floored.
pub fn positive_count_or(value: Option<f64>, default: u32) -> u32 {
    let floored = positive_or(value, default as f64).floor();
    if floored < 1.0 {
        default
    } else {
        floored.min(u32::MAX as f64) as u32
    }
}

/// Optional string argument, with an empty string treated as absent.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Required string argument that must not be blank.
pub fn require_non_empty(value: String, field: &str) -> McpResult<String> {
    if value.trim().is_empty() {
        return Err(McpError::InvalidParameter(format!(
            "'{}' must not be empty",
            field
        )));
    }
    Ok(value.trim().to_string())
}
