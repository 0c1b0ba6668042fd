//! # Presentation Verifier
//!
//! Checks every attachment of a received presentation before the Verifier
//! acknowledges it.
//!
//! Only base64 attachment data is understood. Attachments that carry
//! their payload as `links` or inline `json` are refused with
//! [`PresentProofError::UnsupportedAttachment`] rather than fetched or
//! interpreted.
//!
//! Verification fails fast: the first bad attachment rejects the whole
//! presentation.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tracing::debug;

use super::error::PresentProofError;
use super::models::Attachment;
use crate::credential::presentation::VerifiablePresentation;
use crate::identity::resolver::KeyResolver;

/// Decode and verify each attachment in order, returning the parsed
/// presentations. An empty list verifies to an empty result.
pub async fn verify_presentation(
    resolver: &dyn KeyResolver,
    attachments: &[Attachment],
) -> Result<Vec<VerifiablePresentation>, PresentProofError> {
    let mut verified = Vec::with_capacity(attachments.len());
    for attachment in attachments {
        let encoded = attachment
            .data
            .base64
            .as_deref()
            .ok_or_else(|| PresentProofError::UnsupportedAttachment(attachment.id.clone()))?;

        let raw = BASE64
            .decode(encoded)
            .map_err(|e| PresentProofError::Decode(format!("attachment {}: {e}", attachment.id)))?;

        let vp = VerifiablePresentation::parse_and_verify(&raw, resolver).await?;
        debug!(attachment = %attachment.id, holder = ?vp.holder, "Attachment verified");
        verified.push(vp);
    }

    Ok(verified)
}
