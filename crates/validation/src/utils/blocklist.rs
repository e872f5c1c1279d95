//! Static blocklists for credentials, identities and webhook hosts.
//!
//! All tables are built once on first use and never written afterwards.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::RegexSet;

/// Passwords rejected even when they satisfy the composition rules
pub const COMMON_PASSWORDS: &[&str] = &[
    "password123",
    "123456789012",
    "qwertyuiop12",
    "administrator",
    "passwordpassword",
    "welcome123456",
    "letmein12345",
    "admin1234567",
    "password123!",
    "p@ssw0rd1234",
    "passw0rd!234",
    "welcome123!!",
    "qwerty123456!",
    "admin@123456",
    "letmein123!!",
    "changeme123!",
    "iloveyou123!",
];

/// Throwaway mailbox providers
pub const DISPOSABLE_EMAIL_DOMAINS: &[&str] = &[
    "10minutemail.com",
    "tempmail.org",
    "guerrillamail.com",
    "mailinator.com",
    "yopmail.com",
    "throwaway.email",
    "sharklasers.com",
    "trashmail.com",
    "getnada.com",
    "dispostable.com",
    "temp-mail.org",
    "maildrop.cc",
    "fakeinbox.com",
];

/// Usernames held back for the platform itself
pub const RESERVED_USERNAMES: &[&str] = &[
    "admin",
    "administrator",
    "root",
    "system",
    "api",
    "www",
    "ftp",
    "mail",
    "support",
    "help",
    "info",
    "test",
    "demo",
    "guest",
    "necta",
    "n8n",
];

static COMMON_PASSWORD_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| COMMON_PASSWORDS.iter().copied().collect());

static DISPOSABLE_DOMAIN_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| DISPOSABLE_EMAIL_DOMAINS.iter().copied().collect());

static RESERVED_USERNAME_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| RESERVED_USERNAMES.iter().copied().collect());

// Literal range patterns, not CIDR arithmetic.
static PRIVATE_HOST_PATTERNS: Lazy<Option<RegexSet>> = Lazy::new(|| {
    RegexSet::new([
        r"(^|\.)localhost$",
        r"^127\.",
        r"^10\.",
        r"^172\.(1[6-9]|2[0-9]|3[01])\.",
        r"^192\.168\.",
        r"^::1$",
        r"^fe80:",
    ])
    .ok()
});

pub fn is_common_password(password: &str) -> bool {
    COMMON_PASSWORD_SET.contains(password.to_lowercase().as_str())
}

/// Matches the domain itself or any parent domain in the list
pub fn is_disposable_domain(domain: &str) -> bool {
    let domain = domain.trim_end_matches('.').to_lowercase();
    let mut candidate = domain.as_str();
    loop {
        if DISPOSABLE_DOMAIN_SET.contains(candidate) {
            return true;
        }
        match candidate.split_once('.') {
            Some((_, parent)) if parent.contains('.') => candidate = parent,
            _ => return false,
        }
    }
}

pub fn is_disposable_email(email: &str) -> bool {
    email
        .rsplit_once('@')
        .map(|(_, domain)| is_disposable_domain(domain))
        .unwrap_or(false)
}

pub fn is_reserved_username(username: &str) -> bool {
    RESERVED_USERNAME_SET.contains(username.to_lowercase().as_str())
}

/// Private, loopback or link-local hostname.
///
/// Accepts a bare host or a bracketed IPv6 literal as produced by URL parsing.
/// A single trailing root dot is ignored and `*.localhost` counts as loopback.
pub fn is_private_host(host: &str) -> bool {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let host = host.strip_suffix('.').unwrap_or(host).to_lowercase();
    // Without the compiled set every host is treated as private.
    PRIVATE_HOST_PATTERNS
        .as_ref()
        .map_or(true, |patterns| patterns.is_match(&host))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_passwords_case_insensitive() {
        assert!(is_common_password("Password123"));
        assert!(is_common_password("P@SSW0RD1234"));
        assert!(!is_common_password("Sup3r$ecure!2024"));
    }

    #[test]
    fn test_disposable_domains() {
        assert!(is_disposable_email("someone@mailinator.com"));
        assert!(is_disposable_email("someone@MAILINATOR.COM"));
        assert!(is_disposable_email("someone@inbox.mailinator.com"));
        assert!(!is_disposable_email("someone@example.com"));
        assert!(!is_disposable_email("no-at-sign"));
        assert!(!is_disposable_domain("com"));
    }

    #[test]
    fn test_reserved_usernames() {
        assert!(is_reserved_username("admin"));
        assert!(is_reserved_username("N8N"));
        assert!(!is_reserved_username("admin_2"));
    }

    #[test]
    fn test_private_hosts() {
        for host in [
            "localhost",
            "LOCALHOST",
            "127.0.0.1",
            "127.8.9.10",
            "10.0.0.5",
            "172.16.0.1",
            "172.31.255.255",
            "192.168.1.1",
            "::1",
            "[::1]",
            "fe80::1",
            "[FE80::abcd]",
            "localhost.",
            "LocalHost.",
            "api.localhost",
            "relay.dev.localhost.",
        ] {
            assert!(is_private_host(host), "{host} should be private");
        }

        for host in [
            "example.com",
            "172.15.0.1",
            "172.32.0.1",
            "8.8.8.8",
            "192.169.0.1",
            "[2001:db8::1]",
            "mylocalhost",
            "localhost.example.com",
        ] {
            assert!(!is_private_host(host), "{host} should be public");
        }
    }
}
