//! Lenient access to tool call arguments.
//!
//! Models are sloppy about types: ids arrive as `"12"` or `12.0`, optional
//! fields arrive as `""` or `null`, and the whole argument string is sometimes
//! empty or JSON-encoded twice. Everything is normalized here so the tool
//! bodies only ever see clean values.

use crate::error::{DocmateError, Result};
use serde_json::{Map, Value};

/// Default row count for `list`/`search` style tools.
pub const DEFAULT_LIMIT: usize = 5;

/// Resolve a requested row count: missing or non-positive values give
/// [`DEFAULT_LIMIT`], anything else is capped at `max`.
pub fn resolve_limit(requested: Option<i64>, max: usize) -> usize {
    match requested {
        Some(n) if n >= 1 => usize::try_from(n).unwrap_or(usize::MAX).min(max),
        _ => DEFAULT_LIMIT.min(max),
    }
}

/// Parsed tool call arguments.
#[derive(Debug, Clone, Default)]
pub struct ToolArgs {
    map: Map<String, Value>,
}

impl ToolArgs {
    /// Parse the raw argument string emitted by the model.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(Self::default());
        }

        let value: Value = serde_json::from_str(trimmed)
            .map_err(|e| DocmateError::InvalidArguments(format!("not valid JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Build from an already-decoded JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self { map }),
            Value::Null => Ok(Self::default()),
            // Double-encoded: "{\"document_id\": 3}"
            Value::String(inner) => Self::parse(&inner),
            other => Err(DocmateError::InvalidArguments(format!(
                "expected a JSON object, got {}",
                other
            ))),
        }
    }

    fn present(&self, key: &str) -> Option<&Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    /// A required, non-blank string. Numbers and booleans are stringified.
    pub fn required_str(&self, key: &str) -> Result<String> {
        let value = self
            .present(key)
            .ok_or_else(|| DocmateError::InvalidArguments(format!("Missing '{}' argument", key)))?;

        let text = value_to_string(value).ok_or_else(|| {
            DocmateError::InvalidArguments(format!("'{}' must be a string", key))
        })?;

        if text.trim().is_empty() {
            return Err(DocmateError::InvalidArguments(format!(
                "'{}' must not be empty",
                key
            )));
        }
        Ok(text)
    }

    /// An optional string; missing, null and blank all mean "not supplied".
    pub fn optional_str(&self, key: &str) -> Option<String> {
        self.present(key)
            .and_then(value_to_string)
            .filter(|s| !s.trim().is_empty())
    }

    /// A required integer, accepting `3`, `3.0` and `"3"`.
    pub fn required_i64(&self, key: &str) -> Result<i64> {
        let value = self
            .present(key)
            .ok_or_else(|| DocmateError::InvalidArguments(format!("Missing '{}' argument", key)))?;

        value_to_i64(value).ok_or_else(|| {
            DocmateError::InvalidArguments(format!("'{}' must be an integer, got {}", key, value))
        })
    }

    /// A row limit: defaults to [`DEFAULT_LIMIT`], capped at `max`.
    ///
    /// Unparseable and non-positive values fall back to the default.
    pub fn limit(&self, key: &str, max: usize) -> usize {
        resolve_limit(self.present(key).and_then(value_to_i64), max)
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0 && f.is_finite())
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_null_arguments() {
        for raw in ["", "   ", "null", "{}"] {
            let args = ToolArgs::parse(raw).unwrap();
            assert_eq!(args.limit("limit", 25), DEFAULT_LIMIT);
        }
    }

    #[test]
    fn test_double_encoded_arguments() {
        let args = ToolArgs::parse(r#""{\"document_id\": 7}""#).unwrap();
        assert_eq!(args.required_i64("document_id").unwrap(), 7);
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(ToolArgs::parse("[1, 2]").is_err());
        assert!(ToolArgs::parse("{not json").is_err());
    }

    #[test]
    fn test_integer_normalization() {
        let args = ToolArgs::parse(
            r#"{"a": 3, "b": 4.0, "c": " 5 ", "d": "6.0", "e": 1.5, "f": "six", "g": null}"#,
        )
        .unwrap();
        assert_eq!(args.required_i64("a").unwrap(), 3);
        assert_eq!(args.required_i64("b").unwrap(), 4);
        assert_eq!(args.required_i64("c").unwrap(), 5);
        assert_eq!(args.required_i64("d").unwrap(), 6);
        assert!(args.required_i64("e").is_err());
        assert!(args.required_i64("f").is_err());

        let err = args.required_i64("g").unwrap_err().to_string();
        assert!(err.contains("Missing 'g' argument"));
    }

    #[test]
    fn test_limit_normalization() {
        let limit = |raw: &str| ToolArgs::parse(raw).unwrap().limit("limit", 25);
        assert_eq!(limit(r#"{"limit": 10}"#), 10);
        assert_eq!(limit(r#"{"limit": "12"}"#), 12);
        assert_eq!(limit(r#"{"limit": 100}"#), 25);
        assert_eq!(limit(r#"{"limit": 0}"#), DEFAULT_LIMIT);
        assert_eq!(limit(r#"{"limit": -3}"#), DEFAULT_LIMIT);
        assert_eq!(limit(r#"{"limit": "all"}"#), DEFAULT_LIMIT);
    }

    #[test]
    fn test_resolve_limit() {
        assert_eq!(resolve_limit(None, 25), DEFAULT_LIMIT);
        assert_eq!(resolve_limit(Some(0), 25), DEFAULT_LIMIT);
        assert_eq!(resolve_limit(Some(-1), 25), DEFAULT_LIMIT);
        assert_eq!(resolve_limit(Some(7), 25), 7);
        assert_eq!(resolve_limit(Some(i64::MAX), 25), 25);
        assert_eq!(resolve_limit(None, 3), 3);
    }

    #[test]
    fn test_string_normalization() {
        let args = ToolArgs::parse(
            r#"{"title": "  ", "content": "", "query": "notes", "year": 1999, "nothing": null}"#,
        )
        .unwrap();

        assert_eq!(args.optional_str("title"), None);
        assert_eq!(args.optional_str("content"), None);
        assert_eq!(args.optional_str("nothing"), None);
        assert_eq!(args.optional_str("missing"), None);
        assert_eq!(args.required_str("query").unwrap(), "notes");
        assert_eq!(args.required_str("year").unwrap(), "1999");
        assert!(args.required_str("title").is_err());
        assert!(args.required_str("missing").is_err());
    }
}
