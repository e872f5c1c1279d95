//! Policy over a message's whole attachment set.

use crate::entities::{FileAttachment, MAX_ATTACHMENTS, MAX_ATTACHMENT_BYTES};
use crate::types::{SecurityRule, SecurityViolation};

pub fn check_attachments(attachments: &[FileAttachment]) -> Result<(), SecurityViolation> {
    if attachments.len() > MAX_ATTACHMENTS {
        return Err(SecurityViolation::new(
            SecurityRule::TooManyAttachments,
            format!("Too many file attachments (maximum {MAX_ATTACHMENTS})"),
        ));
    }

    let total = attachments
        .iter()
        .fold(0u64, |total, file| total.saturating_add(file.size));
    if total > MAX_ATTACHMENT_BYTES {
        return Err(SecurityViolation::new(
            SecurityRule::AttachmentsTooLarge,
            "Total file size exceeds 16MB limit",
        ));
    }

    if let Some(file) = attachments.iter().find(|file| !file.is_allowed_type()) {
        return Err(SecurityViolation::new(
            SecurityRule::DisallowedMimeType,
            format!("File type not allowed: {}", file.mime_type),
        ));
    }

    Ok(())
}
