use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Upper bound for a single file and for a message's whole attachment set
pub const MAX_ATTACHMENT_BYTES: u64 = 16 * 1024 * 1024;

/// Maximum number of files on one message
pub const MAX_ATTACHMENTS: usize = 10;

pub const MAX_FILENAME_LENGTH: usize = 255;

/// MIME types the relay forwards to agents
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "text/plain",
    "text/csv",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// Check a MIME type against [`ALLOWED_MIME_TYPES`], ignoring case
pub fn is_allowed_mime_type(mime_type: &str) -> bool {
    let mime_type = mime_type.to_ascii_lowercase();
    ALLOWED_MIME_TYPES.contains(&mime_type.as_str())
}

/// A file attached to a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileAttachment {
    pub id: Uuid,
    pub filename: String,
    /// Size in bytes
    pub size: u64,
    pub mime_type: String,
    pub url: Url,
    pub uploaded_at: DateTime<Utc>,
}

impl FileAttachment {
    pub fn is_allowed_type(&self) -> bool {
        is_allowed_mime_type(&self.mime_type)
    }
}
