//! Cross-field credential rules.

use crate::types::{Secret, SecurityRule, SecurityViolation};

/// Identifiers past this length are refused before any lookup work
pub const MAX_IDENTIFIER_LENGTH: usize = 100;

pub fn check_password_confirmation(password: &Secret, confirm_password: &Secret) -> Result<(), SecurityViolation> {
    if password != confirm_password {
        return Err(SecurityViolation::new(SecurityRule::PasswordMismatch, "Passwords don't match"));
    }
    Ok(())
}

pub fn check_password_reuse(current_password: &Secret, new_password: &Secret) -> Result<(), SecurityViolation> {
    if current_password == new_password {
        return Err(SecurityViolation::new(
            SecurityRule::PasswordReuse,
            "New password must be different from current password",
        ));
    }
    Ok(())
}

pub fn check_identifier_length(identifier: &str) -> Result<(), SecurityViolation> {
    if identifier.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(SecurityViolation::new(SecurityRule::IdentifierTooLong, "Identifier too long"));
    }
    Ok(())
}
