//! Prompt construction for draft generation

use super::DraftRequest;

/// Fixed suffix appended to every successfully generated draft.
pub const ATTRIBUTION: &str =
    "\n\n---\nThis email was generated using Meta's Llama 3.1 model.";

/// Build the model instruction for a draft request.
///
/// Deterministic: identical inputs produce a byte-identical instruction.
/// The instruction embeds all three fields verbatim and constrains the model
/// to emit body text only, with no header lines.
pub fn build_instruction(request: &DraftRequest) -> String {
    format!(
        "Write a professional email to {} with the subject '{}'. \
         The purpose of the email is: {}. Please write the email body only, \
         without including 'Subject:', 'To:', or 'From:' lines.",
        request.recipient, request.subject, request.purpose
    )
}
