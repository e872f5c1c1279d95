//! List query schema. Query strings arrive as text, so numbers may be strings.

use serde_json::Value;

use crate::types::{FieldRule, PaginationRequest, SortOrder, ValidationError, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::utils::fields::{FieldErrors, Record};

/// Integer from a JSON number or a numeric string
fn coerce_u64(record: &Record<'_>, key: &str, errors: &mut FieldErrors) -> Result<Option<u64>, ()> {
    let parsed = match record.get(key) {
        None => return Ok(None),
        Some(Value::Number(number)) => number.as_u64(),
        Some(Value::String(text)) => text.trim().parse::<u64>().ok(),
        Some(_) => None,
    };
    match parsed {
        Some(value) => Ok(Some(value)),
        None => {
            errors.push(record.path(key), FieldRule::InvalidType, "Expected a whole number");
            Err(())
        }
    }
}

fn bounded(
    record: &Record<'_>,
    key: &str,
    min: u64,
    max: u64,
    default: u64,
    errors: &mut FieldErrors,
) -> Option<u64> {
    let value = coerce_u64(record, key, errors).ok()?.unwrap_or(default);
    if !(min..=max).contains(&value) {
        let message = if max == u64::MAX {
            format!("Must be at least {min}")
        } else {
            format!("Must be between {min} and {max}")
        };
        errors.push(record.path(key), FieldRule::OutOfRange, message);
        return None;
    }
    Some(value)
}

pub fn parse_pagination(input: &Value) -> Result<PaginationRequest, ValidationError> {
    let mut errors = FieldErrors::new();
    let Some(record) = Record::root(input, &mut errors) else {
        return errors.finish("pagination", None);
    };

    let page = bounded(&record, "page", 1, u64::MAX, 1, &mut errors);
    let limit = bounded(&record, "limit", 1, MAX_PAGE_LIMIT, DEFAULT_PAGE_LIMIT, &mut errors);
    let sort_by = record.optional_str("sort_by", &mut errors);
    let sort_order = match record.optional_str("sort_order", &mut errors) {
        Err(()) => None,
        Ok(None) => Some(SortOrder::default()),
        Ok(Some(raw)) => {
            let parsed = SortOrder::parse(raw);
            if parsed.is_none() {
                errors.push(record.path("sort_order"), FieldRule::InvalidChoice, "Sort order must be asc or desc");
            }
            parsed
        }
    };

    let request = match (page, limit, sort_by, sort_order) {
        (Some(page), Some(limit), Ok(sort_by), Some(sort_order)) => Some(PaginationRequest {
            page,
            limit,
            sort_by: sort_by.map(str::to_string),
            sort_order,
        }),
        _ => None,
    };
    errors.finish("pagination", request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let request = parse_pagination(&json!({})).unwrap();
        assert_eq!(request, PaginationRequest::default());
        assert_eq!(request.sort_order, SortOrder::Desc);
    }

    #[test]
    fn test_string_numbers_are_coerced() {
        let request = parse_pagination(&json!({ "page": "3", "limit": 50, "sort_by": "created_at", "sort_order": "asc" })).unwrap();
        assert_eq!(request.page, 3);
        assert_eq!(request.limit, 50);
        assert_eq!(request.sort_order, SortOrder::Asc);
    }

    #[test]
    fn test_bounds() {
        let error = parse_pagination(&json!({ "page": 0, "limit": "101", "sort_order": "up" })).unwrap_err();
        assert!(error.has_field("page"));
        assert!(error.has_field("limit"));
        assert!(error.has_field("sort_order"));

        assert!(parse_pagination(&json!({ "limit": 1.5 })).is_err());
        assert!(parse_pagination(&json!({ "limit": 100 })).is_ok());
    }
}
