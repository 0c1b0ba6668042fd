//! # Present-Proof Service
//!
//! Routes messages into conversations. The service remembers, per thread,
//! the state each conversation rests in, derives the state an inbound
//! message moves it to, and hands the pair to the [`Conversation`] driver.
//!
//! ## Routing
//!
//! | Message                 | Direction | State                   |
//! |-------------------------|-----------|-------------------------|
//! | `request-presentation`  | outbound  | `request-sent`          |
//! | `propose-presentation`  | outbound  | `proposal-sent`         |
//! | `request-presentation`  | inbound   | `request-received`      |
//! | `propose-presentation`  | inbound   | `proposal-received`     |
//! | `presentation`          | inbound   | `presentation-received` |
//! | `problem-report`        | inbound   | `abandoning` (silent)   |
//! | `ack`                   | inbound   | `done`                  |
//!
//! Problem reports arrive on a child thread; they are matched to their
//! conversation through the parent thread id.
//!
//! ## Concurrency
//!
//! Every thread has its own async mutex, so triggers for one conversation
//! are applied one at a time while different conversations run in
//! parallel.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use super::driver::Conversation;
use super::error::PresentProofError;
use super::metadata::ConversationMetadata;
use super::models::{Presentation, ProposePresentation, RequestPresentation};
use super::state::ProtocolState;
use crate::config::{
    ACK_MSG_TYPE, PRESENTATION_MSG_TYPE, PROBLEM_REPORT_MSG_TYPE, PROPOSE_PRESENTATION_MSG_TYPE,
    REQUEST_PRESENTATION_MSG_TYPE,
};
use crate::didcomm::message::DidCommMsg;
use crate::didcomm::messenger::Messenger;
use crate::identity::resolver::KeyResolver;

/// What the local party contributes to the next step of a conversation.
///
/// A Prover answering a request sets `presentation` to fulfil it or
/// `propose_presentation` to negotiate. A Verifier answering a proposal
/// sets `request`. Setting `stop` abandons the conversation instead.
#[derive(Debug, Default)]
pub struct Continuation {
    pub request: Option<RequestPresentation>,
    pub propose_presentation: Option<ProposePresentation>,
    pub presentation: Option<Presentation>,
    pub stop: Option<PresentProofError>,
}

impl Continuation {
    pub fn request(request: RequestPresentation) -> Self {
        Self {
            request: Some(request),
            ..Default::default()
        }
    }

    pub fn propose(propose: ProposePresentation) -> Self {
        Self {
            propose_presentation: Some(propose),
            ..Default::default()
        }
    }

    pub fn present(presentation: Presentation) -> Self {
        Self {
            presentation: Some(presentation),
            ..Default::default()
        }
    }

    /// Decline: the peer receives a `rejected` problem report.
    pub fn stop(reason: impl Into<String>) -> Self {
        Self {
            stop: Some(PresentProofError::cancelled(reason)),
            ..Default::default()
        }
    }
}

type Slot = Arc<Mutex<ProtocolState>>;

/// Present-proof protocol service for one agent.
pub struct Service {
    messenger: Arc<dyn Messenger>,
    resolver: Arc<dyn KeyResolver>,
    conversations: DashMap<String, Slot>,
}

impl Service {
    pub fn new(messenger: Arc<dyn Messenger>, resolver: Arc<dyn KeyResolver>) -> Self {
        Self {
            messenger,
            resolver,
            conversations: DashMap::new(),
        }
    }

    /// Start a conversation with a locally originated request or proposal.
    /// Returns the thread id that identifies it.
    #[instrument(skip_all, fields(msg_type = msg.msg_type().unwrap_or_default()))]
    pub async fn handle_outbound(
        &self,
        msg: DidCommMsg,
        my_did: &str,
        their_did: &str,
    ) -> Result<String, PresentProofError> {
        let next = match msg.msg_type() {
            Some(REQUEST_PRESENTATION_MSG_TYPE) => ProtocolState::RequestSent,
            Some(PROPOSE_PRESENTATION_MSG_TYPE) => ProtocolState::ProposalSent,
            other => {
                return Err(PresentProofError::UnsupportedMessage(
                    other.unwrap_or_default().to_string(),
                ))
            }
        };

        let thread_id = msg.thread_id()?;
        let metadata =
            ConversationMetadata::new(msg, my_did, their_did, Arc::clone(&self.resolver));
        self.run(&thread_id, next, metadata, None).await?;

        Ok(thread_id)
    }

    /// Apply a message received from `their_did` to its conversation.
    /// Returns the state the conversation rests in afterwards.
    #[instrument(skip_all, fields(msg_type = msg.msg_type().unwrap_or_default()))]
    pub async fn handle_inbound(
        &self,
        mut msg: DidCommMsg,
        my_did: &str,
        their_did: &str,
        continuation: Continuation,
    ) -> Result<ProtocolState, PresentProofError> {
        let next = inbound_state(&msg)?;

        // The opening message of a thread does not carry `~thread`; bind
        // it to its own id so later steps reply instead of re-sending.
        msg.ensure_thread()?;
        let key = match msg.parent_thread_id() {
            Some(parent) => parent.to_string(),
            None => msg.thread_id()?,
        };

        let Continuation {
            request,
            propose_presentation,
            presentation,
            stop,
        } = continuation;

        let mut metadata =
            ConversationMetadata::new(msg, my_did, their_did, Arc::clone(&self.resolver));
        metadata.request = request;
        metadata.propose_presentation = propose_presentation;
        metadata.presentation = presentation;

        self.run(&key, next, metadata, stop).await
    }

    /// The state a conversation currently rests in.
    pub async fn state(&self, thread_id: &str) -> Result<ProtocolState, PresentProofError> {
        let slot = self
            .slot(thread_id)
            .ok_or_else(|| PresentProofError::UnknownConversation(thread_id.to_string()))?;
        let state = slot.lock().await.clone();
        Ok(state)
    }

    /// Thread ids of every conversation this service has seen.
    pub fn conversations(&self) -> Vec<String> {
        self.conversations.iter().map(|e| e.key().clone()).collect()
    }

    async fn run(
        &self,
        key: &str,
        next: ProtocolState,
        metadata: ConversationMetadata,
        stop: Option<PresentProofError>,
    ) -> Result<ProtocolState, PresentProofError> {
        let slot = match self.slot(key) {
            Some(slot) => slot,
            None => {
                // Only a legal opening trigger gets a record.
                if !ProtocolState::Start.can_transition_to(&next) {
                    debug!(thread_id = key, to = %next, "Trigger for unknown conversation refused");
                    return Err(PresentProofError::InvalidTransition {
                        from: ProtocolState::Start.name(),
                        to: next.name(),
                    });
                }
                self.slot_or_insert(key)
            }
        };
        let mut recorded = slot.lock().await;

        debug!(thread_id = key, from = %*recorded, to = %next, "Applying trigger");
        let mut conversation = Conversation::new(recorded.clone(), metadata);
        let outcome = match stop {
            Some(err) => {
                conversation
                    .decline(next, err, self.messenger.as_ref())
                    .await
            }
            None => conversation.advance(next, self.messenger.as_ref()).await,
        };
        // An illegal trigger leaves the conversation where it was.
        *recorded = conversation.state().clone();

        info!(thread_id = key, state = %*recorded, ok = outcome.is_ok(), "Trigger applied");
        outcome
    }

    fn slot(&self, key: &str) -> Option<Slot> {
        self.conversations.get(key).map(|s| Arc::clone(s.value()))
    }

    fn slot_or_insert(&self, key: &str) -> Slot {
        // Clone the Arc out so no map guard is held across an await.
        Arc::clone(
            self.conversations
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(ProtocolState::Start)))
                .value(),
        )
    }
}

fn inbound_state(msg: &DidCommMsg) -> Result<ProtocolState, PresentProofError> {
    match msg.msg_type() {
        Some(REQUEST_PRESENTATION_MSG_TYPE) => Ok(ProtocolState::RequestReceived),
        Some(PROPOSE_PRESENTATION_MSG_TYPE) => Ok(ProtocolState::ProposalReceived),
        Some(PRESENTATION_MSG_TYPE) => Ok(ProtocolState::PresentationReceived),
        Some(PROBLEM_REPORT_MSG_TYPE) => Ok(ProtocolState::Abandoning { code: None }),
        Some(ACK_MSG_TYPE) => Ok(ProtocolState::Done),
        other => Err(PresentProofError::UnsupportedMessage(
            other.unwrap_or_default().to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CODE_REJECTED_ERROR, PROBLEM_REPORT_MSG_TYPE};
    use crate::presentproof::models::{Ack, ProblemReport};
    use crate::presentproof::testing::{
        threaded, Holder, Outbound, RecordingMessenger, PROVER_DID, VERIFIER_DID,
    };

    fn service(holder: &Holder) -> (Service, Arc<RecordingMessenger>) {
        let messenger = Arc::new(RecordingMessenger::default());
        let service = Service::new(messenger.clone(), holder.resolver.clone());
        (service, messenger)
    }

    fn request_msg() -> DidCommMsg {
        DidCommMsg::from_payload(&RequestPresentation::new(vec![])).unwrap()
    }

    #[tokio::test]
    async fn outbound_request_opens_conversation() {
        let holder = Holder::new();
        let (service, messenger) = service(&holder);
        let msg = request_msg();
        let id = msg.id().unwrap().to_string();

        let thread_id = service
            .handle_outbound(msg, VERIFIER_DID, PROVER_DID)
            .await
            .unwrap();

        assert_eq!(thread_id, id);
        assert_eq!(
            service.state(&thread_id).await.unwrap(),
            ProtocolState::RequestSent
        );
        assert_eq!(service.conversations(), vec![thread_id]);
        match &messenger.sent()[0] {
            Outbound::Send { from, to, .. } => {
                assert_eq!(from, VERIFIER_DID);
                assert_eq!(to, PROVER_DID);
            }
            other => panic!("expected send, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn outbound_rejects_other_types() {
        let holder = Holder::new();
        let (service, messenger) = service(&holder);
        let msg = DidCommMsg::from_payload(&Ack::new()).unwrap();

        let err = service
            .handle_outbound(msg, VERIFIER_DID, PROVER_DID)
            .await
            .unwrap_err();
        assert!(matches!(err, PresentProofError::UnsupportedMessage(_)));
        assert!(service.conversations().is_empty());
        assert!(messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn verifier_accepts_presentation() {
        let holder = Holder::new();
        let (service, messenger) = service(&holder);
        let thread_id = service
            .handle_outbound(request_msg(), VERIFIER_DID, PROVER_DID)
            .await
            .unwrap();

        let rest = service
            .handle_inbound(
                threaded(&holder.presentation(), &thread_id),
                VERIFIER_DID,
                PROVER_DID,
                Continuation::default(),
            )
            .await
            .unwrap();

        assert_eq!(rest, ProtocolState::Done);
        let sent = messenger.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].msg().msg_type(), Some(ACK_MSG_TYPE));
    }

    #[tokio::test]
    async fn prover_presents_on_request() {
        let holder = Holder::new();
        let (service, messenger) = service(&holder);
        let request = request_msg();
        let request_id = request.id().unwrap().to_string();

        let rest = service
            .handle_inbound(
                request,
                PROVER_DID,
                VERIFIER_DID,
                Continuation::present(holder.presentation()),
            )
            .await
            .unwrap();

        assert_eq!(rest, ProtocolState::PresentationSent);
        assert_eq!(
            service.state(&request_id).await.unwrap(),
            ProtocolState::PresentationSent
        );
        match &messenger.sent()[0] {
            Outbound::ReplyTo { msg_id, msg } => {
                assert_eq!(msg_id, &request_id);
                assert_eq!(msg.msg_type(), Some(PRESENTATION_MSG_TYPE));
            }
            other => panic!("expected reply, got {other:?}"),
        }

        let rest = service
            .handle_inbound(
                threaded(&Ack::new(), &request_id),
                PROVER_DID,
                VERIFIER_DID,
                Continuation::default(),
            )
            .await
            .unwrap();
        assert_eq!(rest, ProtocolState::Done);
    }

    #[tokio::test]
    async fn illegal_inbound_runs_no_action() {
        let holder = Holder::new();
        let (service, messenger) = service(&holder);
        let thread_id = service
            .handle_outbound(request_msg(), VERIFIER_DID, PROVER_DID)
            .await
            .unwrap();

        // A Verifier never receives a request in its own thread.
        let err = service
            .handle_inbound(
                threaded(&RequestPresentation::new(vec![]), &thread_id),
                VERIFIER_DID,
                PROVER_DID,
                Continuation::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, PresentProofError::InvalidTransition { .. }));
        assert_eq!(messenger.sent().len(), 1);
        assert_eq!(
            service.state(&thread_id).await.unwrap(),
            ProtocolState::RequestSent
        );
    }

    #[tokio::test]
    async fn stop_rejects_request() {
        let holder = Holder::new();
        let (service, messenger) = service(&holder);
        let request = request_msg();
        let request_id = request.id().unwrap().to_string();

        let rest = service
            .handle_inbound(
                request,
                PROVER_DID,
                VERIFIER_DID,
                Continuation::stop("not sharing that"),
            )
            .await
            .unwrap();

        assert_eq!(rest, ProtocolState::Done);
        match &messenger.sent()[0] {
            Outbound::ReplyToNested {
                thread_id,
                msg,
                from,
                to,
            } => {
                assert_eq!(thread_id, &request_id);
                assert_eq!(from, PROVER_DID);
                assert_eq!(to, VERIFIER_DID);
                assert_eq!(msg.msg_type(), Some(PROBLEM_REPORT_MSG_TYPE));
                let report: ProblemReport = msg.decode().unwrap();
                assert_eq!(report.description.code, CODE_REJECTED_ERROR);
            }
            other => panic!("expected problem report, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn problem_report_found_by_parent_thread() {
        let holder = Holder::new();
        let (service, messenger) = service(&holder);
        let thread_id = service
            .handle_outbound(request_msg(), VERIFIER_DID, PROVER_DID)
            .await
            .unwrap();

        let mut report = DidCommMsg::from_payload(&ProblemReport::new("rejected")).unwrap();
        report.set_parent_thread(&thread_id);

        let rest = service
            .handle_inbound(report, VERIFIER_DID, PROVER_DID, Continuation::default())
            .await
            .unwrap();

        assert_eq!(rest, ProtocolState::Done);
        assert_eq!(service.state(&thread_id).await.unwrap(), ProtocolState::Done);
        assert_eq!(messenger.sent().len(), 1);
    }

    #[tokio::test]
    async fn unknown_types_and_threads() {
        let holder = Holder::new();
        let (service, _) = service(&holder);

        let msg = DidCommMsg::from_json(r#"{"@id": "x", "@type": "https://example.org/other"}"#)
            .unwrap();
        let err = service
            .handle_inbound(msg, VERIFIER_DID, PROVER_DID, Continuation::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PresentProofError::UnsupportedMessage(_)));

        assert!(matches!(
            service.state("nope").await,
            Err(PresentProofError::UnknownConversation(_))
        ));
    }

    #[tokio::test]
    async fn stray_messages_leave_no_record() {
        let holder = Holder::new();
        let (service, messenger) = service(&holder);

        for i in 0..3 {
            let err = service
                .handle_inbound(
                    threaded(&Ack::new(), &format!("stray-{i}")),
                    VERIFIER_DID,
                    PROVER_DID,
                    Continuation::default(),
                )
                .await
                .unwrap_err();
            assert!(matches!(err, PresentProofError::InvalidTransition { .. }));
        }

        assert!(service.conversations().is_empty());
        assert!(matches!(
            service.state("stray-0").await,
            Err(PresentProofError::UnknownConversation(_))
        ));
        assert!(messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn empty_presentation_is_acknowledged() {
        let holder = Holder::new();
        let (service, messenger) = service(&holder);
        let thread_id = service
            .handle_outbound(request_msg(), VERIFIER_DID, PROVER_DID)
            .await
            .unwrap();

        let rest = service
            .handle_inbound(
                threaded(&Presentation::new(vec![]), &thread_id),
                VERIFIER_DID,
                PROVER_DID,
                Continuation::default(),
            )
            .await
            .unwrap();

        assert_eq!(rest, ProtocolState::Done);
        let types: Vec<_> = messenger
            .sent()
            .iter()
            .map(|o| o.msg().msg_type().unwrap_or_default().to_string())
            .collect();
        assert_eq!(types, vec![REQUEST_PRESENTATION_MSG_TYPE, ACK_MSG_TYPE]);
    }

    #[tokio::test]
    async fn conversations_run_independently() {
        let holder = Holder::new();
        let (service, messenger) = service(&holder);
        let service = Arc::new(service);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    service
                        .handle_outbound(request_msg(), VERIFIER_DID, PROVER_DID)
                        .await
                })
            })
            .collect();

        for handle in handles {
            let thread_id = handle.await.unwrap().unwrap();
            assert_eq!(
                service.state(&thread_id).await.unwrap(),
                ProtocolState::RequestSent
            );
        }
        assert_eq!(service.conversations().len(), 8);
        assert_eq!(messenger.sent().len(), 8);
    }
}
