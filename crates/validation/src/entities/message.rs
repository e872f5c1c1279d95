use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::attachment::FileAttachment;
use super::profile::Environment;

/// Maximum message content length in characters
pub const MAX_CONTENT_LENGTH: usize = 32_000;

/// How message content is to be interpreted
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    Text,
    #[default]
    Markdown,
    Html,
    Json,
}

impl ContentFormat {
    pub const ALL: [ContentFormat; 4] = [
        ContentFormat::Text,
        ContentFormat::Markdown,
        ContentFormat::Html,
        ContentFormat::Json,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(ContentFormat::Text),
            "markdown" => Some(ContentFormat::Markdown),
            "html" => Some(ContentFormat::Html),
            "json" => Some(ContentFormat::Json),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentFormat::Text => "text",
            ContentFormat::Markdown => "markdown",
            ContentFormat::Html => "html",
            ContentFormat::Json => "json",
        }
    }
}

impl fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who produced a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    User,
    Agent,
    System,
}

impl MessageType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(MessageType::User),
            "agent" => Some(MessageType::Agent),
            "system" => Some(MessageType::System),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::User => "user",
            MessageType::Agent => "agent",
            MessageType::System => "system",
        }
    }
}

/// Known metadata fields plus whatever else the agent attached.
///
/// Numeric fields take any JSON number, fractional values included.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MessageMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_count: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_estimate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub langsmith_trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_attempts: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
    /// Preserved verbatim, never interpreted
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// User-submitted message, as accepted by `validate_message_creation`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewMessage {
    pub profile_id: Uuid,
    pub content: String,
    pub content_format: ContentFormat,
    pub file_attachments: Vec<FileAttachment>,
}

/// Fully materialised message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub message_type: MessageType,
    pub content: String,
    pub content_format: ContentFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
    pub file_attachments: Vec<FileAttachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    pub fn is_from_agent(&self) -> bool {
        matches!(self.message_type, MessageType::Agent)
    }

    pub fn total_attachment_size(&self) -> u64 {
        self.file_attachments.iter().map(|file| file.size).sum()
    }
}

/// Routing metadata on an inbound agent callback
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookMetadata {
    pub profile_id: Uuid,
    pub environment: Environment,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Agent callback delivered by the n8n workflow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookPayload {
    pub message_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub content: String,
    pub format: ContentFormat,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<String>>,
    pub metadata: WebhookMetadata,
}
