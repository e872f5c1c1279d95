//! Format-specific content scanning.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::entities::ContentFormat;
use crate::types::{HtmlPattern, SecurityRule, SecurityViolation};

pub const MAX_JSON_DEPTH: usize = 10;
pub const MAX_JSON_LENGTH: usize = 10_000;

// Checked in this order; the first hit names the rule. A pattern that fails
// to compile matches everything.
static DANGEROUS_HTML: Lazy<Vec<(HtmlPattern, Option<Regex>)>> = Lazy::new(|| {
    [
        (HtmlPattern::ScriptBlock, r"(?i)<script\b"),
        (HtmlPattern::Iframe, r"(?i)<iframe\b"),
        (HtmlPattern::Object, r"(?i)<object\b"),
        (HtmlPattern::Embed, r"(?i)<embed\b"),
        (HtmlPattern::Link, r"(?i)<link\b"),
        (HtmlPattern::JavascriptScheme, r"(?i)javascript:"),
        (HtmlPattern::EventHandler, r"(?i)\bon\w+\s*="),
    ]
    .into_iter()
    .map(|(pattern, source)| (pattern, Regex::new(source).ok()))
    .collect()
});

/// First dangerous construct found in `content`, if any
pub fn find_dangerous_html(content: &str) -> Option<HtmlPattern> {
    DANGEROUS_HTML
        .iter()
        .find(|(_, regex)| regex.as_ref().map_or(true, |regex| regex.is_match(content)))
        .map(|(pattern, _)| *pattern)
}

pub fn scan_html(content: &str) -> Result<(), SecurityViolation> {
    match find_dangerous_html(content) {
        Some(pattern) => Err(SecurityViolation::new(
            SecurityRule::DangerousHtml(pattern),
            "HTML content contains potentially dangerous elements",
        )),
        None => Ok(()),
    }
}

fn children(value: &Value) -> Option<Box<dyn Iterator<Item = &Value> + '_>> {
    match value {
        Value::Array(items) => Some(Box::new(items.iter())),
        Value::Object(fields) => Some(Box::new(fields.values())),
        _ => None,
    }
}

/// Nesting depth: scalars are 0, containers are one more than their deepest child
pub fn json_depth(value: &Value) -> usize {
    let mut deepest = 0;
    let mut stack = vec![(value, 1)];
    while let Some((value, level)) = stack.pop() {
        if let Some(items) = children(value) {
            deepest = deepest.max(level);
            stack.extend(items.map(|child| (child, level + 1)));
        }
    }
    deepest
}

/// Like `json_depth(value) > max_depth`, but stops at the first container past the ceiling
pub fn exceeds_json_depth(value: &Value, max_depth: usize) -> bool {
    let mut stack = vec![(value, 1)];
    while let Some((value, level)) = stack.pop() {
        if let Some(items) = children(value) {
            if level > max_depth {
                return true;
            }
            stack.extend(items.map(|child| (child, level + 1)));
        }
    }
    false
}

pub fn check_json_content(content: &str) -> Result<(), SecurityViolation> {
    let invalid = || SecurityViolation::new(SecurityRule::InvalidJson, "Invalid JSON content");

    let parsed: Value = serde_json::from_str(content).map_err(|_| invalid())?;
    if exceeds_json_depth(&parsed, MAX_JSON_DEPTH) {
        return Err(SecurityViolation::new(
            SecurityRule::JsonTooDeep,
            "JSON content is too deeply nested",
        ));
    }

    let serialized = serde_json::to_string(&parsed).map_err(|_| invalid())?;
    if serialized.chars().count() > MAX_JSON_LENGTH {
        return Err(SecurityViolation::new(SecurityRule::JsonTooLarge, "JSON content is too large"));
    }
    Ok(())
}

/// Run the scanner that applies to `format`; text and markdown pass through
pub fn check_content(format: ContentFormat, content: &str) -> Result<(), SecurityViolation> {
    match format {
        ContentFormat::Html => scan_html(content),
        ContentFormat::Json => check_json_content(content),
        ContentFormat::Text | ContentFormat::Markdown => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nested(depth: usize) -> String {
        format!("{}{}", "[".repeat(depth), "]".repeat(depth))
    }

    #[test]
    fn test_html_patterns() {
        assert_eq!(find_dangerous_html("<img src=x onerror=alert(1)>"), Some(HtmlPattern::EventHandler));
        assert_eq!(find_dangerous_html("<SCRIPT>alert(1)</SCRIPT>"), Some(HtmlPattern::ScriptBlock));
        assert_eq!(find_dangerous_html("<iframe src='//evil'>"), Some(HtmlPattern::Iframe));
        assert_eq!(find_dangerous_html("<a href=\"JavaScript:void(0)\">x</a>"), Some(HtmlPattern::JavascriptScheme));
        assert_eq!(find_dangerous_html("<link rel=stylesheet href=x>"), Some(HtmlPattern::Link));
        assert_eq!(find_dangerous_html("<embed src=x>"), Some(HtmlPattern::Embed));
        assert_eq!(find_dangerous_html("<object data=x>"), Some(HtmlPattern::Object));

        assert_eq!(find_dangerous_html("<p>Hello <strong>world</strong></p>"), None);
        assert_eq!(find_dangerous_html("<p>condition=true</p>"), None);
        assert_eq!(find_dangerous_html("<linkedin>"), None);
    }

    #[test]
    fn test_script_wins_over_later_patterns() {
        let err = scan_html("<script>document.body.onload = x</script>").unwrap_err();
        assert_eq!(err.rule, SecurityRule::DangerousHtml(HtmlPattern::ScriptBlock));
    }

    #[test]
    fn test_json_depth() {
        assert_eq!(json_depth(&json!(1)), 0);
        assert_eq!(json_depth(&json!({})), 1);
        assert_eq!(json_depth(&json!({ "a": [1, { "b": [] }] })), 4);
        assert!(!exceeds_json_depth(&json!({ "a": [1, { "b": [] }] }), 4));
        assert!(exceeds_json_depth(&json!({ "a": [1, { "b": [] }] }), 3));
    }

    #[test]
    fn test_json_depth_ceiling() {
        assert!(check_json_content(&nested(10)).is_ok());
        assert_eq!(
            check_json_content(&nested(11)).unwrap_err().rule,
            SecurityRule::JsonTooDeep
        );
    }

    #[test]
    fn test_json_size_and_syntax() {
        let big = serde_json::to_string(&vec!["x".repeat(100); 100]).unwrap();
        assert_eq!(check_json_content(&big).unwrap_err().rule, SecurityRule::JsonTooLarge);

        assert_eq!(check_json_content("{not json").unwrap_err().rule, SecurityRule::InvalidJson);

        // Whitespace does not count toward the size limit.
        let padded = format!("{{\"a\":{}1}}", " ".repeat(20_000));
        assert!(check_json_content(&padded).is_ok());
    }

    #[test]
    fn test_plain_formats_pass() {
        assert!(check_content(ContentFormat::Text, "<script>").is_ok());
        assert!(check_content(ContentFormat::Markdown, "{").is_ok());
        assert!(check_content(ContentFormat::Html, "<b>hi</b>").is_ok());
    }
}
