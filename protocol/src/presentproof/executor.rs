//! # State Executors
//!
//! What each state does when the conversation is in it. Executing a state
//! is a pure decision: it looks at the [`ConversationMetadata`], picks the
//! successor and describes the side effect as an [`Action`]. The driver
//! commits the action only after the transition passes the table check.
//!
//! | State                   | Next                                   | Action                     |
//! |-------------------------|----------------------------------------|----------------------------|
//! | `start`                 | error                                  |                            |
//! | `request-sent`          | `noop`                                 | send / reply request       |
//! | `proposal-sent`         | `noop`                                 | send / reply proposal      |
//! | `request-received`      | `presentation-sent` or `proposal-sent` |                            |
//! | `proposal-received`     | `request-sent`                         |                            |
//! | `presentation-sent`     | `noop`                                 | reply presentation         |
//! | `presentation-received` | `done`                                 | reply ack (after verify)   |
//! | `abandoning`            | `done`                                 | problem report, if coded   |
//! | `done`                  | `noop`                                 |                            |
//! | `noop`                  | error                                  |                            |

use serde::Serialize;
use tracing::debug;

use super::action::Action;
use super::error::PresentProofError;
use super::metadata::ConversationMetadata;
use super::models::{Ack, Presentation, ProblemReport};
use super::state::ProtocolState;
use super::verifier::verify_presentation;
use crate::config::{
    CODE_REJECTED_ERROR, PRESENTATION_MSG_TYPE, PROPOSE_PRESENTATION_MSG_TYPE,
    REQUEST_PRESENTATION_MSG_TYPE, STATE_NAME_START,
};
use crate::didcomm::message::DidCommMsg;

/// The outcome of executing one state.
#[derive(Debug)]
pub struct Transition {
    pub next: ProtocolState,
    pub action: Action,
}

impl Transition {
    fn to(next: ProtocolState) -> Self {
        Self {
            next,
            action: Action::None,
        }
    }

    fn with(next: ProtocolState, action: Action) -> Self {
        Self { next, action }
    }
}

impl ProtocolState {
    /// Decide the successor of this state and the side effect that goes
    /// with it.
    pub async fn execute(
        &self,
        md: &ConversationMetadata,
    ) -> Result<Transition, PresentProofError> {
        match self {
            ProtocolState::Start => Err(PresentProofError::Unimplemented(STATE_NAME_START)),

            ProtocolState::RequestSent => {
                if !md.msg.has_thread() {
                    return Ok(Transition::with(ProtocolState::NoOp, forward_initial(md)));
                }
                let mut request = md
                    .request
                    .clone()
                    .ok_or(PresentProofError::MissingPayload("request"))?;
                request.msg_type = REQUEST_PRESENTATION_MSG_TYPE.to_string();

                Ok(Transition::with(ProtocolState::NoOp, reply(md, &request)?))
            }

            ProtocolState::ProposalSent => {
                if !md.msg.has_thread() {
                    return Ok(Transition::with(ProtocolState::NoOp, forward_initial(md)));
                }
                let mut propose = md
                    .propose_presentation
                    .clone()
                    .ok_or(PresentProofError::MissingPayload("propose-presentation"))?;
                propose.msg_type = PROPOSE_PRESENTATION_MSG_TYPE.to_string();

                Ok(Transition::with(ProtocolState::NoOp, reply(md, &propose)?))
            }

            ProtocolState::RequestReceived => {
                if md.presentation.is_some() {
                    Ok(Transition::to(ProtocolState::PresentationSent))
                } else {
                    Ok(Transition::to(ProtocolState::ProposalSent))
                }
            }

            ProtocolState::ProposalReceived => Ok(Transition::to(ProtocolState::RequestSent)),

            ProtocolState::PresentationSent => {
                let mut presentation = md
                    .presentation
                    .clone()
                    .ok_or(PresentProofError::MissingPayload("presentation"))?;
                presentation.msg_type = PRESENTATION_MSG_TYPE.to_string();

                Ok(Transition::with(ProtocolState::NoOp, reply(md, &presentation)?))
            }

            ProtocolState::PresentationReceived => {
                let presentation: Presentation = md.msg.decode()?;
                let verified =
                    verify_presentation(md.resolver.as_ref(), &presentation.presentations_attach)
                        .await?;
                debug!(
                    attachments = verified.len(),
                    their_did = %md.their_did,
                    "Presentation accepted"
                );

                Ok(Transition::with(ProtocolState::Done, reply(md, &Ack::new())?))
            }

            ProtocolState::Abandoning { code } => {
                let code = match code.as_deref() {
                    None | Some("") => return Ok(Transition::to(ProtocolState::Done)),
                    Some(code) => code,
                };
                let code = match &md.err {
                    Some(err) if err.is_cancellation() => CODE_REJECTED_ERROR,
                    _ => code,
                };

                let thread_id = md.msg.thread_id()?;
                let report = DidCommMsg::from_payload(&ProblemReport::new(code))?;

                Ok(Transition::with(
                    ProtocolState::Done,
                    Action::ReplyToNested {
                        thread_id,
                        msg: report,
                        from: md.my_did.clone(),
                        to: md.their_did.clone(),
                    },
                ))
            }

            ProtocolState::Done => Ok(Transition::to(ProtocolState::NoOp)),

            ProtocolState::NoOp => Err(PresentProofError::NoOp),
        }
    }
}

/// First message of a new thread: send it as is.
fn forward_initial(md: &ConversationMetadata) -> Action {
    Action::Send {
        msg: md.msg.clone(),
        from: md.my_did.clone(),
        to: md.their_did.clone(),
    }
}

/// Answer the current message with `payload`.
fn reply<T: Serialize>(md: &ConversationMetadata, payload: &T) -> Result<Action, PresentProofError> {
    let msg_id = md
        .msg
        .id()
        .ok_or_else(|| PresentProofError::Decode("message has no @id".into()))?
        .to_string();

    Ok(Action::ReplyTo {
        msg_id,
        msg: DidCommMsg::from_payload(payload)?,
    })
}
