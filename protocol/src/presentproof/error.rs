//! Error types for the present-proof engine.
//!
//! Every executor, the driver and the service fail with a
//! [`PresentProofError`]. Lower layers keep their own error enums and are
//! folded in here at the boundary.

use thiserror::Error;

use crate::credential::presentation::PresentationError;
use crate::didcomm::message::EnvelopeError;
use crate::didcomm::messenger::TransportError;
use crate::identity::did::DidError;

/// Errors that can occur while running a present-proof conversation.
#[derive(Debug, Error)]
pub enum PresentProofError {
    /// A message or attachment payload could not be decoded.
    #[error("decode: {0}")]
    Decode(String),

    /// A presentation failed cryptographic verification.
    #[error("verification failed: {0}")]
    Verification(String),

    /// The attachment carries its payload in an encoding other than
    /// base64 (`links`, inline `json`), which is not supported.
    #[error("attachment {0}: only base64 data is supported")]
    UnsupportedAttachment(String),

    /// A payload the current state needs was not supplied by the caller.
    #[error("{0} was not provided")]
    MissingPayload(&'static str),

    /// The thread of the current message could not be determined.
    #[error("thread ID: {0}")]
    ThreadId(String),

    /// The caller stopped the conversation.
    #[error("cancelled: {0}")]
    Cancelled(String),

    #[error("{0}: is not implemented yet")]
    Unimplemented(&'static str),

    #[error("cannot execute no-op")]
    NoOp,

    /// A state tried to move somewhere the transition table forbids.
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition {
        /// The state the conversation was in.
        from: &'static str,
        /// The state it tried to enter.
        to: &'static str,
    },

    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    /// The signer of a presentation could not be resolved to a key.
    #[error("key resolution: {0}")]
    Resolver(#[from] DidError),

    #[error("unsupported message type: {0}")]
    UnsupportedMessage(String),

    #[error("unknown conversation: {0}")]
    UnknownConversation(String),
}

impl PresentProofError {
    /// Whether the caller asked for the conversation to stop. The abandon
    /// path reports such conversations as `rejected`.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, PresentProofError::Cancelled(_))
    }

    pub fn cancelled(reason: impl Into<String>) -> Self {
        PresentProofError::Cancelled(reason.into())
    }
}

impl From<EnvelopeError> for PresentProofError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Decode(msg) => PresentProofError::Decode(msg),
            EnvelopeError::ThreadIdNotFound => PresentProofError::ThreadId(err.to_string()),
        }
    }
}

impl From<PresentationError> for PresentProofError {
    fn from(err: PresentationError) -> Self {
        match err {
            PresentationError::Resolution(did) => PresentProofError::Resolver(did),
            other if other.is_malformed() => PresentProofError::Decode(other.to_string()),
            other => PresentProofError::Verification(other.to_string()),
        }
    }
}
