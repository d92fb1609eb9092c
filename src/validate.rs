//! Form input validation for the draft workflow
//!
//! Purely syntactic checks: no DNS lookup, no mailbox verification.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field was empty after trimming.
    #[error("please fill in the {0} field")]
    MissingField(&'static str),
    /// The recipient is not a plausible email address.
    #[error("the recipient email address is invalid")]
    MalformedEmail,
}

/// Validate the three draft inputs.
///
/// Presence is checked first (recipient, subject, purpose, in that order),
/// then the recipient address shape.
pub fn validate(recipient: &str, subject: &str, purpose: &str) -> Result<(), ValidationError> {
    if recipient.trim().is_empty() {
        return Err(ValidationError::MissingField("recipient"));
    }
    if subject.trim().is_empty() {
        return Err(ValidationError::MissingField("subject"));
    }
    if purpose.trim().is_empty() {
        return Err(ValidationError::MissingField("purpose"));
    }
    if !is_valid_email(recipient) {
        return Err(ValidationError::MalformedEmail);
    }
    Ok(())
}

/// Check `local-part@domain.tld`: ASCII letters/digits/`._%+-` in the local
/// part, a domain of letters/digits/dots/hyphens containing at least one dot,
/// and a final label of two or more ASCII letters.
pub fn is_valid_email(address: &str) -> bool {
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    if local.is_empty()
        || !local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c))
    {
        return false;
    }
    if !domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return false;
    }
    let Some((name, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !name.is_empty() && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}
