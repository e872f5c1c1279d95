//! Internal utilities shared by the schema and security layers.
//!
//! Primitive validators, static blocklists, password hashing, rate-limit
//! decisions and the field-error plumbing used by every schema.

pub mod blocklist;
pub mod fields;
pub mod password;
pub mod rate_limit;
pub mod validation;

// Re-export utilities
pub use blocklist::*;
pub use password::*;
pub use rate_limit::*;
pub use validation::*;
