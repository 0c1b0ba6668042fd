//! Per-conversation context handed to every executor step.

use std::sync::Arc;

use super::error::PresentProofError;
use super::models::{Presentation, ProposePresentation, RequestPresentation};
use crate::didcomm::message::DidCommMsg;
use crate::identity::resolver::KeyResolver;

/// Everything a state needs to decide its successor.
///
/// One instance belongs to exactly one conversation trigger. The resolver
/// is the only shared piece.
pub struct ConversationMetadata {
    /// The message that triggered this step: inbound from the peer, or the
    /// locally originated first message.
    pub msg: DidCommMsg,
    pub my_did: String,
    pub their_did: String,
    pub request: Option<RequestPresentation>,
    pub propose_presentation: Option<ProposePresentation>,
    pub presentation: Option<Presentation>,
    pub resolver: Arc<dyn KeyResolver>,
    /// Why the conversation is being abandoned, once it is.
    pub err: Option<PresentProofError>,
}

impl ConversationMetadata {
    pub fn new(
        msg: DidCommMsg,
        my_did: impl Into<String>,
        their_did: impl Into<String>,
        resolver: Arc<dyn KeyResolver>,
    ) -> Self {
        Self {
            msg,
            my_did: my_did.into(),
            their_did: their_did.into(),
            request: None,
            propose_presentation: None,
            presentation: None,
            resolver,
            err: None,
        }
    }

    pub fn with_request(mut self, request: RequestPresentation) -> Self {
        self.request = Some(request);
        self
    }

    pub fn with_propose_presentation(mut self, propose: ProposePresentation) -> Self {
        self.propose_presentation = Some(propose);
        self
    }

    pub fn with_presentation(mut self, presentation: Presentation) -> Self {
        self.presentation = Some(presentation);
        self
    }

    pub fn with_error(mut self, err: PresentProofError) -> Self {
        self.err = Some(err);
        self
    }
}

impl std::fmt::Debug for ConversationMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationMetadata")
            .field("msg_id", &self.msg.id())
            .field("msg_type", &self.msg.msg_type())
            .field("my_did", &self.my_did)
            .field("their_did", &self.their_did)
            .field("err", &self.err)
            .finish_non_exhaustive()
    }
}
