//! Generic schema validator.
//!
//! Evaluates a [`Schema`] against a raw JSON object. For every declared
//! field:
//!
//! 1. if present, the value is type-checked and passed through even when the
//!    check fails;
//! 2. otherwise its default is applied;
//! 3. otherwise, if required (statically or by predicate over the fields
//!    processed so far), a missing-field error is recorded.
//!
//! Validation never stops at the first problem.

use crate::error::ValidationError;
use crate::schema::{FieldSpec, FieldType, Schema, SchemaGroup, json_type_name};
use serde_json::{Map, Value};

/// Validate a raw object against a schema.
///
/// Returns the processed fields (supplied values and defaults) together with
/// every validation error found. Fields not declared in the schema are
/// dropped.
///
/// # Examples
///
/// ```
/// use fathom_inputs::{Mode, Schema, validate_fields};
/// use serde_json::json;
///
/// let raw = json!({ "wacc": "ten percent" });
/// let (processed, errors) =
///     validate_fields(raw.as_object(), &Schema::valuation(Mode::Founder));
///
/// assert_eq!(errors.len(), 1);
/// assert_eq!(processed["wacc"], "ten percent");
/// assert_eq!(processed["exitMultiple"], 8.0);
/// ```
pub fn validate_fields(
    raw: Option<&Map<String, Value>>,
    schema: &Schema,
) -> (Map<String, Value>, Vec<ValidationError>) {
    let mut processed = Map::new();
    let mut errors = Vec::new();

    for spec in schema.fields() {
        match raw.and_then(|r| r.get(spec.name)) {
            Some(value) => {
                check_value(spec, value, schema.group(), &mut errors);
                processed.insert(spec.name.to_string(), value.clone());
            }
            None => {
                if let Some(default) = &spec.default {
                    processed.insert(spec.name.to_string(), default.clone());
                } else if spec.requirement.is_required(&processed) {
                    errors.push(ValidationError::MissingField {
                        group: schema.group(),
                        field: spec.name.to_string(),
                    });
                }
            }
        }
    }

    (processed, errors)
}

fn check_value(
    spec: &FieldSpec,
    value: &Value,
    group: SchemaGroup,
    errors: &mut Vec<ValidationError>,
) {
    if !spec.field_type.matches(value) {
        errors.push(ValidationError::TypeMismatch {
            group,
            field: spec.name.to_string(),
            expected: spec.field_type,
            actual: json_type_name(value).to_string(),
        });
        return;
    }

    match (spec.field_type, value) {
        (FieldType::NumberSeries, Value::Array(items)) => {
            for (index, item) in items.iter().enumerate() {
                if !item.is_number() {
                    errors.push(ValidationError::InvalidElement {
                        field: spec.name.to_string(),
                        index,
                        actual: json_type_name(item).to_string(),
                    });
                }
            }
        }
        (FieldType::Text, Value::String(text)) if !spec.allowed.is_empty() => {
            let text_trimmed = text.trim();
            if !spec
                .allowed
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(text_trimmed))
            {
                errors.push(ValidationError::NotAllowed {
                    field: spec.name.to_string(),
                    value: text.clone(),
                    allowed: spec.allowed.join(", "),
                });
            }
        }
        _ => {}
    }
}

/// Force a projection series to exactly `horizon` elements.
///
/// Short series are extended by repeating their last element, long series
/// are truncated. Returns `false` when the series is empty and a non-zero
/// horizon was requested, since there is nothing to repeat.
///
/// # Examples
///
/// ```
/// use fathom_inputs::normalize_horizon;
///
/// let mut growth = vec![0.10, 0.08];
/// assert!(normalize_horizon(&mut growth, 5));
/// assert_eq!(growth, vec![0.10, 0.08, 0.08, 0.08, 0.08]);
///
/// let mut long = vec![0.1; 7];
/// assert!(normalize_horizon(&mut long, 5));
/// assert_eq!(long.len(), 5);
/// ```
pub fn normalize_horizon(values: &mut Vec<f64>, horizon: usize) -> bool {
    match values.last() {
        Some(&last) => {
            values.resize(horizon, last);
            true
        }
        None => horizon == 0,
    }
}
