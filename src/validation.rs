//! Validation of declared state against a [`Schema`].
//!
//! # Example
//!
//! ```
//! use hemmer_provider_github::schema::{Schema, Attribute};
//! use hemmer_provider_github::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::required_string())
//!     .with_attribute("timeout_secs", Attribute::optional_int64());
//!
//! let diagnostics = validate(&schema, &json!({"name": "demo", "timeout_secs": 30}));
//! assert!(diagnostics.is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"name": "demo", "timeout_secs": "soon"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("timeout_secs".to_string()));
//! ```

use crate::schema::{Attribute, AttributeType, Diagnostic, Schema};
use serde_json::Value;

/// Longest repository name GitHub accepts.
pub const MAX_REPOSITORY_NAME_LEN: usize = 100;

/// Validate a JSON value against a schema.
///
/// Returns a list of diagnostics; an empty list means the value is valid.
///
/// - Required attributes must be present and non-null
/// - Optional attributes may be absent or null
/// - Computed-only attributes are skipped (the provider sets these)
/// - Attribute types must match the schema
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let obj = match value {
        Value::Object(map) => map,
        other => {
            return vec![Diagnostic::error("Expected object")
                .with_detail(format!("Got {}", value_type_name(other)))];
        },
    };

    let mut diagnostics = Vec::new();
    for (name, attr) in &schema.attributes {
        validate_attribute(attr, obj.get(name), name, &mut diagnostics);
    }
    diagnostics
}

/// Check a repository name against GitHub's naming rules.
///
/// Names are non-empty, at most [`MAX_REPOSITORY_NAME_LEN`] characters, made of
/// ASCII letters, digits, `-`, `_` and `.`, and are not `.` or `..`.
pub fn validate_repository_name(name: &str) -> Option<Diagnostic> {
    let invalid = |detail: String| {
        Some(
            Diagnostic::error("Invalid repository name")
                .with_detail(detail)
                .with_attribute("name"),
        )
    };

    if name.is_empty() {
        return invalid("Repository name must not be empty".to_string());
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return invalid(format!("Character '{}' is not allowed", c));
    }
    // ASCII only from here on, so bytes and characters coincide.
    if name.len() > MAX_REPOSITORY_NAME_LEN {
        return invalid(format!(
            "Repository name is {} characters long, the limit is {}",
            name.len(),
            MAX_REPOSITORY_NAME_LEN
        ));
    }
    if name == "." || name == ".." {
        return invalid(format!("'{}' is reserved", name));
    }
    None
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if attr.flags.computed && !attr.flags.optional && !attr.flags.required {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
        },
        Some(v) => {
            let ok = match attr.attr_type {
                AttributeType::String => v.is_string(),
                AttributeType::Int64 => v.is_i64() || v.is_u64(),
                AttributeType::Bool => v.is_boolean(),
            };
            if !ok {
                diagnostics.push(type_error(path, attr.attr_type, v));
            }
        },
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_error(path: &str, expected: AttributeType, got: &Value) -> Diagnostic {
    let expected = match expected {
        AttributeType::String => "string",
        AttributeType::Int64 => "int64",
        AttributeType::Bool => "bool",
    };
    Diagnostic::error(format!("Invalid type for attribute '{}'", path))
        .with_detail(format!("Expected {}, got {}", expected, value_type_name(got)))
        .with_attribute(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, Schema};
    use serde_json::json;

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute("name", Attribute::required_string())
            .with_attribute("private", Attribute::defaulted_bool(false))
            .with_attribute("id", Attribute::computed_string())
    }

    #[test]
    fn test_validate_required_string() {
        assert!(validate(&schema(), &json!({"name": "demo"})).is_empty());

        let diagnostics = validate(&schema(), &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Missing required"));

        let diagnostics = validate(&schema(), &json!({"name": null}));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_validate_wrong_type() {
        let diagnostics = validate(&schema(), &json!({"name": "demo", "private": "yes"}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("private".to_string()));
        assert_eq!(
            diagnostics[0].detail,
            Some("Expected bool, got string".to_string())
        );
    }

    #[test]
    fn test_computed_attributes_skipped() {
        let diagnostics = validate(&schema(), &json!({"name": "demo", "id": 42}));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_non_object_rejected() {
        let diagnostics = validate(&schema(), &json!(["demo"]));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].detail, Some("Got array".to_string()));
    }

    #[test]
    fn test_repository_name_rules() {
        assert!(validate_repository_name("demo").is_none());
        assert!(validate_repository_name("my-repo_v2.rs").is_none());
        assert!(validate_repository_name("").is_some());
        assert!(validate_repository_name("..").is_some());
        assert!(validate_repository_name("has space").is_some());
        assert!(validate_repository_name("owner/name").is_some());
        assert!(validate_repository_name(&"a".repeat(101)).is_some());
        assert!(validate_repository_name(&"a".repeat(100)).is_none());
    }

    #[test]
    fn test_repository_name_rejects_non_ascii_before_length() {
        // 60 characters, 120 bytes
        let diag = validate_repository_name(&"é".repeat(60)).unwrap();
        assert_eq!(diag.detail.as_deref(), Some("Character 'é' is not allowed"));

        let diag = validate_repository_name(&"a".repeat(101)).unwrap();
        assert_eq!(
            diag.detail.as_deref(),
            Some("Repository name is 101 characters long, the limit is 100")
        );
    }
}
