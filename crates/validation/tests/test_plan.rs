//! Test plan for the `necta-validation` crate.
//!
//! These tests pin down the engine's observable properties: password and
//! email policy, JSON bounding, webhook URL policy, rate limiting and the
//! registration and HTML scenarios.

use chrono::{Duration, Utc};
use serde_json::{json, Value};

use necta_validation::types::HtmlPattern;
use necta_validation::utils::{validate_password, COMMON_PASSWORDS};
use necta_validation::{
    is_rate_limited, validate_message_creation, validate_profile_creation, validate_registration, FieldRule,
    Rejection, SecurityRule,
};

const PROFILE_ID: &str = "550e8400-e29b-41d4-a716-446655440000";

fn registration(password: &str, confirm: &str) -> Value {
    json!({
        "username": "alice",
        "email": "alice@example.com",
        "password": password,
        "confirm_password": confirm,
    })
}

fn profile(dev: &str, prod: &str) -> Value {
    json!({
        "name": "Support Bot",
        "dev_webhook_url": dev,
        "prod_webhook_url": prod,
        "webhook_auth_type": "none",
        "webhook_auth_config": { "type": "none" },
    })
}

fn json_message(content: &str) -> Value {
    json!({
        "profile_id": PROFILE_ID,
        "content_format": "json",
        "content": content,
    })
}

fn security_rule(result: Result<impl std::fmt::Debug, Rejection>) -> SecurityRule {
    match result {
        Err(Rejection::Security(violation)) => violation.rule,
        other => panic!("expected a security violation, got {other:?}"),
    }
}

#[test]
fn short_or_incomplete_passwords_are_rejected() {
    for password in [
        "Sh0rt!",
        "Abcdefgh1!x",
        "alllowercase123!",
        "ALLUPPERCASE123!",
        "NoDigitsAtAll!!",
        "NoSymbols123456",
    ] {
        assert!(validate_password(password, "password").is_err(), "{password} should be rejected");
    }
}

#[test]
fn complete_passwords_are_accepted() {
    for password in ["Sup3r$ecure!2024", "Correct-Horse-9-Battery", "zZ9#zZ9#zZ9#", "A1!aaaaaaaaa"] {
        assert!(validate_password(password, "password").is_ok(), "{password} should be accepted");
    }
}

#[test]
fn blocklisted_passwords_fail_with_policy_violation() {
    let error = validate_password("P@ssw0rd1234", "password").unwrap_err();
    assert_eq!(error.rule, FieldRule::PolicyViolation);
}

#[test]
fn composition_valid_blocklist_entries_reach_the_blocklist() {
    let mut checked = 0;
    for entry in COMMON_PASSWORDS {
        let mut chars = entry.chars();
        let capitalized: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => continue,
        };
        let composition_ok = capitalized.chars().any(|c| c.is_ascii_lowercase())
            && capitalized.chars().any(|c| c.is_ascii_uppercase())
            && capitalized.chars().any(|c| c.is_ascii_digit())
            && capitalized.chars().any(|c| !c.is_ascii_alphanumeric());
        if !composition_ok {
            continue;
        }

        let error = validate_password(&capitalized, "password").unwrap_err();
        assert_eq!(error.rule, FieldRule::PolicyViolation, "{capitalized}");
        checked += 1;
    }
    assert!(checked >= 5, "only {checked} blocklist entries were composition-valid");
}

#[test]
fn disposable_domains_are_rejected_for_any_local_part() {
    for email in ["a@mailinator.com", "first.last+tag@YOPMAIL.com", "x@inbox.guerrillamail.com"] {
        let mut input = registration("Sup3r$ecure!2024", "Sup3r$ecure!2024");
        input["email"] = json!(email);

        let rejection = validate_registration(&input).unwrap_err();
        let errors = rejection.field_errors();
        assert_eq!(errors.len(), 1, "{email}");
        assert_eq!(errors[0].field, "email");
        assert_eq!(errors[0].rule, FieldRule::PolicyViolation);
    }
}

#[test]
fn email_is_case_normalized() {
    let mut upper = registration("Sup3r$ecure!2024", "Sup3r$ecure!2024");
    upper["email"] = json!("USER@Example.com");
    let mut lower = upper.clone();
    lower["email"] = json!("user@example.com");

    assert_eq!(
        validate_registration(&upper).unwrap().email,
        validate_registration(&lower).unwrap().email
    );
}

#[test]
fn json_depth_ten_passes_and_eleven_is_rejected() {
    // A scalar at depth ten versus one more empty level; sizes differ by one byte.
    let ten = format!("{}0{}", "[".repeat(10), "]".repeat(10));
    let eleven = format!("{}{}", "[".repeat(11), "]".repeat(11));
    assert_eq!(ten.len(), eleven.len() - 1);

    assert!(validate_message_creation(&json_message(&ten)).is_ok());
    assert_eq!(
        security_rule(validate_message_creation(&json_message(&eleven))),
        SecurityRule::JsonTooDeep
    );
}

#[test]
fn oversized_json_is_rejected() {
    let big = serde_json::to_string(&json!({ "blob": "x".repeat(10_000) })).unwrap();
    assert_eq!(
        security_rule(validate_message_creation(&json_message(&big))),
        SecurityRule::JsonTooLarge
    );
}

#[test]
fn identical_webhook_urls_are_rejected() {
    let url = "https://n8n.example.com/webhook/support";
    assert_eq!(
        security_rule(validate_profile_creation(&profile(url, url))),
        SecurityRule::WebhookUrlConflict
    );
}

#[test]
fn private_prod_hosts_are_rejected_with_ssrf_rule() {
    for host in ["127.0.0.1", "10.0.0.5", "192.168.1.1", "localhost"] {
        let input = profile("https://dev.example.com/hook", &format!("https://{host}/hook"));
        let rule = security_rule(validate_profile_creation(&input));
        assert_eq!(rule, SecurityRule::PrivateWebhookHost, "{host}");
        assert_eq!(rule.code(), "ssrf_private_host");
    }
}

#[test]
fn private_hosts_are_accepted_for_dev() {
    for host in ["127.0.0.1", "10.0.0.5", "192.168.1.1", "localhost"] {
        let input = profile(&format!("https://{host}/hook"), "https://n8n.example.com/hook");
        assert!(validate_profile_creation(&input).is_ok(), "{host}");
    }
}

#[test]
fn rate_limit_window() {
    let now = Utc::now();
    let window = Duration::milliseconds(60_000);

    assert!(is_rate_limited(5, 5, window, now - Duration::seconds(30), now));
    assert!(!is_rate_limited(5, 5, window, now - Duration::seconds(90), now));
}

#[test]
fn registration_scenario() {
    let rejection = validate_registration(&registration("Sh0rt!", "Sh0rt!")).unwrap_err();
    assert!(rejection.is_recoverable());
    assert_eq!(rejection.field_errors()[0].field, "password");
    assert_eq!(rejection.field_errors()[0].rule, FieldRule::TooShort);

    let mut input = registration("Sup3r$ecure!2024", "Sup3r$ecure!2024");
    input["email"] = json!("Alice@Example.COM");
    let credential = validate_registration(&input).unwrap();
    assert_eq!(credential.username, "alice");
    assert_eq!(credential.email, "alice@example.com");
    assert_eq!(credential.password.expose(), "Sup3r$ecure!2024");
}

#[test]
fn html_event_handler_scenario() {
    let input = json!({
        "profile_id": PROFILE_ID,
        "content_format": "html",
        "content": "<img src=x onerror=alert(1)>",
    });

    let rule = security_rule(validate_message_creation(&input));
    assert_eq!(rule, SecurityRule::DangerousHtml(HtmlPattern::EventHandler));
    assert_eq!(rule.code(), "html_event_handler");
}
