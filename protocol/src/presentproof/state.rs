//! # Protocol States
//!
//! The closed set of states a present-proof conversation can be in, and
//! the static table of which state may follow which.
//!
//! ```text
//!   Verifier                                  Prover
//!
//!   start ─► request-sent                     start ─► proposal-sent
//!   start ─► proposal-received                start ─► request-received
//!   request-sent ─► proposal-received         proposal-sent ─► request-received
//!   proposal-received ─► request-sent         request-received ─► proposal-sent
//!   request-sent ─► presentation-received     request-received ─► presentation-sent
//!   presentation-received ─► done             presentation-sent ─► done
//! ```
//!
//! Any non-terminal state except `start` may also fall into `abandoning`,
//! which only ever leads to `done`. `done` and `noop` lead nowhere.
//!
//! The behavior attached to each state lives in `executor.rs`.

use std::fmt;

use crate::config::{
    STATE_NAME_ABANDONING, STATE_NAME_DONE, STATE_NAME_NOOP, STATE_NAME_PRESENTATION_RECEIVED,
    STATE_NAME_PRESENTATION_SENT, STATE_NAME_PROPOSAL_RECEIVED, STATE_NAME_PROPOSAL_SENT,
    STATE_NAME_REQUEST_RECEIVED, STATE_NAME_REQUEST_SENT, STATE_NAME_START,
};

/// A present-proof protocol state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProtocolState {
    Start,
    RequestSent,
    RequestReceived,
    ProposalSent,
    ProposalReceived,
    PresentationSent,
    PresentationReceived,
    /// Leaving the protocol early. With a non-empty `code` the peer is
    /// sent a problem report carrying it; without one the conversation
    /// ends silently.
    Abandoning { code: Option<String> },
    Done,
    /// Stop sentinel for the driver. Never executed.
    NoOp,
}

impl ProtocolState {
    pub fn abandoning(code: impl Into<String>) -> Self {
        ProtocolState::Abandoning {
            code: Some(code.into()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProtocolState::Start => STATE_NAME_START,
            ProtocolState::RequestSent => STATE_NAME_REQUEST_SENT,
            ProtocolState::RequestReceived => STATE_NAME_REQUEST_RECEIVED,
            ProtocolState::ProposalSent => STATE_NAME_PROPOSAL_SENT,
            ProtocolState::ProposalReceived => STATE_NAME_PROPOSAL_RECEIVED,
            ProtocolState::PresentationSent => STATE_NAME_PRESENTATION_SENT,
            ProtocolState::PresentationReceived => STATE_NAME_PRESENTATION_RECEIVED,
            ProtocolState::Abandoning { .. } => STATE_NAME_ABANDONING,
            ProtocolState::Done => STATE_NAME_DONE,
            ProtocolState::NoOp => STATE_NAME_NOOP,
        }
    }

    /// Whether `next` may directly follow `self`.
    pub fn can_transition_to(&self, next: &ProtocolState) -> bool {
        use ProtocolState::*;

        match self {
            Start => matches!(
                next,
                // Verifier
                RequestSent | ProposalReceived
                // Prover
                | ProposalSent | RequestReceived
            ),
            RequestSent => matches!(
                next,
                PresentationReceived | ProposalReceived | Abandoning { .. }
            ),
            ProposalReceived => matches!(next, RequestSent | Abandoning { .. }),
            PresentationReceived => matches!(next, Abandoning { .. } | Done),
            RequestReceived => matches!(
                next,
                PresentationSent | ProposalSent | Abandoning { .. }
            ),
            ProposalSent => matches!(next, RequestReceived | Abandoning { .. }),
            PresentationSent => matches!(next, Abandoning { .. } | Done),
            Abandoning { .. } => matches!(next, Done),
            Done | NoOp => false,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, ProtocolState::NoOp)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProtocolState::Done | ProtocolState::NoOp)
    }
}

impl fmt::Display for ProtocolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_states() -> Vec<ProtocolState> {
        vec![
            ProtocolState::Start,
            ProtocolState::RequestSent,
            ProtocolState::RequestReceived,
            ProtocolState::ProposalSent,
            ProtocolState::ProposalReceived,
            ProtocolState::PresentationSent,
            ProtocolState::PresentationReceived,
            ProtocolState::Abandoning { code: None },
            ProtocolState::Done,
            ProtocolState::NoOp,
        ]
    }

    fn allowed(from: &ProtocolState) -> Vec<&'static str> {
        match from {
            ProtocolState::Start => vec![
                "request-sent",
                "proposal-received",
                "proposal-sent",
                "request-received",
            ],
            ProtocolState::RequestSent => {
                vec!["presentation-received", "proposal-received", "abandoning"]
            }
            ProtocolState::ProposalReceived => vec!["request-sent", "abandoning"],
            ProtocolState::PresentationReceived => vec!["abandoning", "done"],
            ProtocolState::RequestReceived => {
                vec!["presentation-sent", "proposal-sent", "abandoning"]
            }
            ProtocolState::ProposalSent => vec!["request-received", "abandoning"],
            ProtocolState::PresentationSent => vec!["abandoning", "done"],
            ProtocolState::Abandoning { .. } => vec!["done"],
            ProtocolState::Done | ProtocolState::NoOp => vec![],
        }
    }

    #[test]
    fn transition_table_is_exact() {
        for from in all_states() {
            let expected = allowed(&from);
            for to in all_states() {
                assert_eq!(
                    from.can_transition_to(&to),
                    expected.contains(&to.name()),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn terminal_states_have_no_successor() {
        for to in all_states() {
            assert!(!ProtocolState::Done.can_transition_to(&to));
            assert!(!ProtocolState::NoOp.can_transition_to(&to));
        }
    }

    #[test]
    fn abandoning_code_does_not_affect_legality() {
        let with_code = ProtocolState::abandoning("internal");
        assert!(ProtocolState::RequestSent.can_transition_to(&with_code));
        assert!(with_code.can_transition_to(&ProtocolState::Done));
        assert!(!with_code.can_transition_to(&ProtocolState::Start));
    }

    #[test]
    fn every_state_can_reach_done() {
        fn reaches_done(state: &ProtocolState, depth: usize) -> bool {
            if depth > 16 {
                return false;
            }
            if *state == ProtocolState::Done {
                return true;
            }
            all_states()
                .iter()
                .filter(|next| state.can_transition_to(next))
                .any(|next| reaches_done(next, depth + 1))
        }

        for state in all_states() {
            if matches!(state, ProtocolState::NoOp) {
                continue;
            }
            assert!(reaches_done(&state, 0), "{state} cannot reach done");
        }
    }

    #[test]
    fn names_are_wire_identifiers() {
        let names: Vec<_> = all_states().iter().map(ProtocolState::name).collect();
        assert_eq!(
            names,
            vec![
                "start",
                "request-sent",
                "request-received",
                "proposal-sent",
                "proposal-received",
                "presentation-sent",
                "presentation-received",
                "abandoning",
                "done",
                "noop",
            ]
        );
        assert_eq!(ProtocolState::abandoning("x").to_string(), "abandoning");
    }
}
