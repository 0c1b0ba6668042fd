//! # Conversation Driver
//!
//! Runs one conversation from a trigger until there is nothing left to do.
//!
//! ```text
//!   ┌──────────────► execute(current) ──── error ─────┐
//!   │                      │                           │
//!   │                  (next, action)                  ▼
//!   │                      │               abandoning{internal|rejected}
//!   │          current.can_transition_to(next)?        │
//!   │                 │            │ no                │
//!   │                 │ yes        └──── error ────────┤
//!   │                 ▼                                │
//!   │           action.run(messenger) ── error ────────┤
//!   │                 │                                │
//!   └── current = next (stop at noop) ◄────────────────┘
//! ```
//!
//! Every failure inside the loop is turned into a forced move to
//! `abandoning`, which notifies the peer and ends in `done`. A failure while
//! already abandoning cannot be handled that way and is returned to the
//! caller. Nothing is retried.
//!
//! The conversation rests at the last state before `noop`, which is what
//! the next trigger starts from.

use tracing::{debug, error, info, warn};

use super::error::PresentProofError;
use super::executor::Transition;
use super::metadata::ConversationMetadata;
use super::state::ProtocolState;
use crate::config::{CODE_INTERNAL_ERROR, CODE_REJECTED_ERROR};
use crate::didcomm::messenger::Messenger;

/// A single conversation instance: its current state and the context of
/// the trigger being processed.
pub struct Conversation {
    state: ProtocolState,
    metadata: ConversationMetadata,
}

impl Conversation {
    pub fn new(state: ProtocolState, metadata: ConversationMetadata) -> Self {
        Self { state, metadata }
    }

    pub fn state(&self) -> &ProtocolState {
        &self.state
    }

    pub fn metadata(&self) -> &ConversationMetadata {
        &self.metadata
    }

    /// Fail with `InvalidTransition` unless `next` may follow the current
    /// state.
    pub fn check_transition(&self, next: &ProtocolState) -> Result<(), PresentProofError> {
        if self.state.can_transition_to(next) {
            Ok(())
        } else {
            Err(PresentProofError::InvalidTransition {
                from: self.state.name(),
                to: next.name(),
            })
        }
    }

    /// Move to `next` and keep executing until the conversation settles.
    /// Returns the state it rests in.
    pub async fn advance(
        &mut self,
        next: ProtocolState,
        messenger: &dyn Messenger,
    ) -> Result<ProtocolState, PresentProofError> {
        self.check_transition(&next)?;
        debug!(from = %self.state, to = %next, "Conversation triggered");
        self.drive(next, messenger).await
    }

    /// Abandon the conversation because of `err`, notifying the peer.
    pub async fn abandon(
        &mut self,
        err: PresentProofError,
        messenger: &dyn Messenger,
    ) -> Result<ProtocolState, PresentProofError> {
        let next = abandon_state(&err);
        info!(from = %self.state, reason = %err, "Abandoning conversation");
        self.metadata.err = Some(err);
        self.drive(next, messenger).await
    }

    /// Accept the trigger into `next`, then abandon because of `err`
    /// instead of executing it.
    pub async fn decline(
        &mut self,
        next: ProtocolState,
        err: PresentProofError,
        messenger: &dyn Messenger,
    ) -> Result<ProtocolState, PresentProofError> {
        self.check_transition(&next)?;
        self.state = next;
        self.abandon(err, messenger).await
    }

    async fn drive(
        &mut self,
        mut current: ProtocolState,
        messenger: &dyn Messenger,
    ) -> Result<ProtocolState, PresentProofError> {
        loop {
            self.state = current.clone();

            match self.step(&current, messenger).await {
                Ok(next) if next.is_noop() => break,
                Ok(next) => {
                    debug!(from = %current, to = %next, "State transition");
                    current = next;
                }
                Err(err) if matches!(current, ProtocolState::Abandoning { .. }) => {
                    error!(state = %current, error = %err, "Failed to abandon conversation");
                    return Err(err);
                }
                Err(err) => {
                    warn!(state = %current, error = %err, "Step failed");
                    current = abandon_state(&err);
                    self.metadata.err = Some(err);
                }
            }
        }

        info!(state = %self.state, "Conversation at rest");
        Ok(self.state.clone())
    }

    /// Execute `current`, validate its successor and commit the action.
    async fn step(
        &self,
        current: &ProtocolState,
        messenger: &dyn Messenger,
    ) -> Result<ProtocolState, PresentProofError> {
        let transition = current.execute(&self.metadata).await?;
        commit(current, transition, messenger).await
    }
}

/// Run the action of `transition` if its successor may follow `current`.
async fn commit(
    current: &ProtocolState,
    transition: Transition,
    messenger: &dyn Messenger,
) -> Result<ProtocolState, PresentProofError> {
    // noop only stops the loop, it is never entered.
    if !transition.next.is_noop() && !current.can_transition_to(&transition.next) {
        return Err(PresentProofError::InvalidTransition {
            from: current.name(),
            to: transition.next.name(),
        });
    }

    transition.action.run(messenger).await?;
    Ok(transition.next)
}

fn abandon_state(err: &PresentProofError) -> ProtocolState {
    if err.is_cancellation() {
        ProtocolState::abandoning(CODE_REJECTED_ERROR)
    } else {
        ProtocolState::abandoning(CODE_INTERNAL_ERROR)
    }
}
