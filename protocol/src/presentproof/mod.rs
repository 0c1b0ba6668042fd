//! # Present-Proof Protocol
//!
//! A two-party exchange in which a Verifier asks for a verifiable
//! presentation and a Prover supplies it, possibly after negotiating what
//! to present.
//!
//! ```text
//!   ┌──────────┐                                     ┌──────────┐
//!   │ Verifier │                                     │  Prover  │
//!   └────┬─────┘                                     └────┬─────┘
//!        │  request-presentation                          │
//!        ├───────────────────────────────────────────────►│
//!        │                                                │
//!        │  propose-presentation            (optional)    │
//!        │◄───────────────────────────────────────────────┤
//!        │  request-presentation            (re-issued)   │
//!        ├───────────────────────────────────────────────►│
//!        │                                                │
//!        │  presentation                                  │
//!        │◄───────────────────────────────────────────────┤
//!        │                                                │
//!        │  ack, or problem-report if verification fails  │
//!        ├───────────────────────────────────────────────►│
//! ```
//!
//! Either side may abandon at any point after the first message by sending
//! a `problem-report`; the receiver ends the conversation without replying.
//!
//! ## Layers
//!
//! - `state.rs`: the states and the transition table.
//! - `executor.rs`: what each state decides, as a deferred [`Action`].
//! - `verifier.rs`: attachment decoding and presentation verification.
//! - `driver.rs`: runs one conversation until it settles, abandoning on
//!   failure.
//! - `service.rs`: per-thread routing and bookkeeping for an agent.

pub mod action;
pub mod driver;
pub mod error;
pub mod executor;
pub mod metadata;
pub mod models;
pub mod service;
pub mod state;
pub mod verifier;

#[cfg(test)]
pub(crate) mod testing;

pub use action::Action;
pub use driver::Conversation;
pub use error::PresentProofError;
pub use executor::Transition;
pub use metadata::ConversationMetadata;
pub use models::{
    Ack, Attachment, AttachmentData, Code, Presentation, ProblemReport, ProposePresentation,
    RequestPresentation,
};
pub use service::{Continuation, Service};
pub use state::ProtocolState;
pub use verifier::verify_presentation;
