//! Security refinement layer.
//!
//! Runs only on structurally valid drafts. Every check is fail-fast and
//! returns the single violated rule as a [`SecurityViolation`].
//!
//! [`SecurityViolation`]: crate::types::SecurityViolation

pub mod attachments;
pub mod content;
pub mod credentials;
pub mod webhook;

pub use attachments::check_attachments;
pub use content::{check_content, check_json_content, exceeds_json_depth, find_dangerous_html, json_depth, scan_html};
pub use credentials::{check_identifier_length, check_password_confirmation, check_password_reuse};
pub use webhook::{check_dev_webhook, check_distinct_targets, check_prod_webhook, check_webhook_urls};
