//! Shared types: errors, secrets and the API envelope.

pub mod api;
pub mod errors;
pub mod secret;

pub use api::*;
pub use errors::*;
pub use secret::*;
