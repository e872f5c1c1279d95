//! Validated domain entities.
//!
//! Values in this module are only produced by the entry-point validators;
//! none of them is ever constructed from partially valid input.

pub mod attachment;
pub mod credential;
pub mod environment;
pub mod message;
pub mod profile;

// Re-export all entity types
pub use attachment::{is_allowed_mime_type, FileAttachment, ALLOWED_MIME_TYPES, MAX_ATTACHMENTS, MAX_ATTACHMENT_BYTES};
pub use credential::{
    Credential, Login, MfaSetup, MfaVerification, PasswordChange, PasswordReset, PasswordResetRequest,
    UserProfileUpdate,
};
pub use environment::{EnvironmentConfig, FeatureFlags, NodeEnv, WebhookSettings, SECRET_KEY_MIN_LENGTH};
pub use message::{
    ContentFormat, Message, MessageMetadata, MessageType, NewMessage, WebhookMetadata, WebhookPayload,
    MAX_CONTENT_LENGTH,
};
pub use profile::{
    Environment, NewProfile, Profile, ProfileResponse, ProfileUpdate, WebhookAuthConfig, WebhookAuthType,
};
