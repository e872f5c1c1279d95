//! # NECTA Validation Crate
//!
//! Validation and security-policy engine for the NECTA chat relay. Every
//! piece of untrusted input (credentials, messages, attachments, webhook
//! profiles, agent callbacks and the boot environment) passes through one
//! of the entry points in [`validators`] before it reaches the rest of the
//! system.
//!
//! ## Architecture
//!
//! - **Utils**: primitive field validators, static blocklists, rate-limit decisions
//! - **Schema**: structural layer, reports every field error at once
//! - **Security**: cross-field and content rules, first violation wins
//! - **Entities**: validated values returned by the entry points
//! - **Types**: errors, the secret wrapper and API envelopes
//!
//! ## Usage
//!
//! ```rust
//! use necta_validation::{validate_registration, Rejection};
//! use serde_json::json;
//!
//! let credential = validate_registration(&json!({
//!     "username": "alice",
//!     "email": "Alice@Example.com",
//!     "password": "Sup3r$ecure!2024",
//!     "confirm_password": "Sup3r$ecure!2024",
//! }))?;
//! assert_eq!(credential.email, "alice@example.com");
//! # Ok::<(), Rejection>(())
//! ```

pub mod entities;
pub mod schema;
pub mod security;
pub mod types;
pub mod utils;
pub mod validators;

// Re-export main types for convenience
pub use entities::{
    ContentFormat, Credential, EnvironmentConfig, FileAttachment, Login, Message, MessageMetadata, MessageType,
    NewMessage, NewProfile, Profile, ProfileResponse, ProfileUpdate, WebhookAuthConfig, WebhookAuthType,
    WebhookPayload,
};
pub use types::{
    ApiError, ApiSuccess, FieldError, FieldRule, PaginatedResponse, PaginationRequest, Rejection, Secret,
    SecurityRule, SecurityViolation, ValidationError, ValidationResult,
};
pub use utils::{is_rate_limited, rate_limit_key, RateLimitDecision, RateLimitError, RateLimitPolicy};
pub use validators::*;
