//! Field-error collection and typed access to untrusted JSON records.
//!
//! Every accessor is total: a missing or mistyped field is recorded as a
//! [`FieldError`] and the accessor yields `None`, so a schema can keep going
//! and report all violations in one pass.

use serde_json::{Map, Value};

use crate::types::{FieldError, FieldRule, ValidationError};

/// Accumulates violations for one entity
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, rule: FieldRule, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, rule, message));
    }

    /// Keep the value on success, record the error otherwise
    pub fn check<T>(&mut self, result: Result<T, FieldError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.errors.push(error);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Resolve the assembled entity, or every collected violation
    pub fn finish<T>(self, entity: &str, value: Option<T>) -> Result<T, ValidationError> {
        match value {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(ValidationError::new(entity, self.errors)),
        }
    }
}

/// Join a parent path and a key
pub fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A JSON object being read as an entity (or nested part of one)
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    prefix: &'a str,
    fields: &'a Map<String, Value>,
}

impl<'a> Record<'a> {
    /// Open the root record; non-objects are a single violation at `$`
    pub fn root(value: &'a Value, errors: &mut FieldErrors) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { prefix: "", fields }),
            other => {
                errors.push(
                    "$",
                    FieldRule::InvalidType,
                    format!("Expected object, received {}", type_name(other)),
                );
                None
            }
        }
    }

    /// Open an object value located at `path`
    pub fn at(path: &'a str, value: &'a Value, errors: &mut FieldErrors) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { prefix: path, fields }),
            other => {
                errors.push(
                    path,
                    FieldRule::InvalidType,
                    format!("Expected object, received {}", type_name(other)),
                );
                None
            }
        }
    }

    pub fn path(&self, key: &str) -> String {
        join_path(self.prefix, key)
    }

    pub fn fields(&self) -> &'a Map<String, Value> {
        self.fields
    }

    /// The raw value; JSON `null` reads as absent
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.fields.get(key).filter(|value| !value.is_null())
    }

    fn mistyped(&self, key: &str, expected: &str, actual: &Value, errors: &mut FieldErrors) {
        errors.push(
            self.path(key),
            FieldRule::InvalidType,
            format!("Expected {expected}, received {}", type_name(actual)),
        );
    }

    fn missing(&self, key: &str, label: &str, errors: &mut FieldErrors) {
        errors.push(self.path(key), FieldRule::Required, format!("{label} is required"));
    }

    pub fn required_str(&self, key: &str, label: &str, errors: &mut FieldErrors) -> Option<&'a str> {
        match self.get(key) {
            None => {
                self.missing(key, label, errors);
                None
            }
            Some(Value::String(value)) => Some(value.as_str()),
            Some(other) => {
                self.mistyped(key, "string", other, errors);
                None
            }
        }
    }

    /// `Ok(None)` when absent, `Err(())` when present but not a string
    pub fn optional_str(&self, key: &str, errors: &mut FieldErrors) -> Result<Option<&'a str>, ()> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.as_str())),
            Some(other) => {
                self.mistyped(key, "string", other, errors);
                Err(())
            }
        }
    }

    pub fn optional_bool(&self, key: &str, errors: &mut FieldErrors) -> Result<Option<bool>, ()> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bool(value)) => Ok(Some(*value)),
            Some(other) => {
                self.mistyped(key, "boolean", other, errors);
                Err(())
            }
        }
    }

    /// Non-negative integer field
    pub fn optional_u64(&self, key: &str, errors: &mut FieldErrors) -> Result<Option<u64>, ()> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Number(number)) => match number.as_u64() {
                Some(value) => Ok(Some(value)),
                None => {
                    errors.push(
                        self.path(key),
                        FieldRule::InvalidType,
                        "Expected a non-negative integer",
                    );
                    Err(())
                }
            },
            Some(other) => {
                self.mistyped(key, "number", other, errors);
                Err(())
            }
        }
    }

    pub fn optional_f64(&self, key: &str, errors: &mut FieldErrors) -> Result<Option<f64>, ()> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Number(number)) => match number.as_f64() {
                Some(value) => Ok(Some(value)),
                None => {
                    self.mistyped(key, "number", &Value::Null, errors);
                    Err(())
                }
            },
            Some(other) => {
                self.mistyped(key, "number", other, errors);
                Err(())
            }
        }
    }

    pub fn required_u64(&self, key: &str, label: &str, errors: &mut FieldErrors) -> Option<u64> {
        if self.get(key).is_none() {
            self.missing(key, label, errors);
            return None;
        }
        self.optional_u64(key, errors).ok().flatten()
    }

    pub fn optional_array(&self, key: &str, errors: &mut FieldErrors) -> Result<Option<&'a [Value]>, ()> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items.as_slice())),
            Some(other) => {
                self.mistyped(key, "array", other, errors);
                Err(())
            }
        }
    }

    pub fn optional_object(
        &self,
        key: &str,
        errors: &mut FieldErrors,
    ) -> Result<Option<&'a Map<String, Value>>, ()> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Object(fields)) => Ok(Some(fields)),
            Some(other) => {
                self.mistyped(key, "object", other, errors);
                Err(())
            }
        }
    }

    /// Keys that are not in `known`, in document order
    pub fn unknown_keys<'k>(&self, known: &'k [&'k str]) -> impl Iterator<Item = &'a String> + 'k
    where
        'a: 'k,
    {
        self.fields.keys().filter(move |key| !known.contains(&key.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_root_rejects_non_objects() {
        let mut errors = FieldErrors::new();
        assert!(Record::root(&json!("text"), &mut errors).is_none());
        assert_eq!(errors.len(), 1);

        let result: Result<(), _> = errors.finish("login", None);
        let error = result.unwrap_err();
        assert_eq!(error.errors[0].field, "$");
        assert_eq!(error.errors[0].rule, FieldRule::InvalidType);
    }

    #[test]
    fn test_accessors_record_type_errors() {
        let value = json!({ "name": 5, "count": -1, "flag": "yes", "note": null });
        let mut errors = FieldErrors::new();
        let record = Record::root(&value, &mut errors).unwrap();

        assert!(record.required_str("name", "Name", &mut errors).is_none());
        assert!(record.optional_u64("count", &mut errors).is_err());
        assert!(record.optional_bool("flag", &mut errors).is_err());
        assert_eq!(record.optional_str("note", &mut errors), Ok(None));
        assert!(record.required_str("missing", "Missing", &mut errors).is_none());

        let error = errors.finish::<()>("sample", None).unwrap_err();
        let fields: Vec<_> = error.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "count", "flag", "missing"]);
        assert_eq!(error.errors[3].rule, FieldRule::Required);
    }

    #[test]
    fn test_nested_paths() {
        let value = json!({ "metadata": { "profile_id": 1 } });
        let mut errors = FieldErrors::new();
        let root = Record::root(&value, &mut errors).unwrap();
        let path = root.path("metadata");
        let nested = Record::at(&path, &value["metadata"], &mut errors).unwrap();
        assert_eq!(nested.path("profile_id"), "metadata.profile_id");
    }
}
