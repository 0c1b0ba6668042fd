// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Present-Proof Protocol Engine
//!
//! The protocol engine behind a DIDComm "present-proof" exchange: a
//! Verifier asks for a verifiable presentation, a Prover supplies one, and
//! the Verifier checks every signature before saying thank you.
//!
//! The engine is a finite-state machine. It decides which messages are
//! legal at each point of a conversation, emits the messages that go with
//! each transition, and falls back to a problem report whenever something
//! goes wrong.
//!
//! ## Architecture
//!
//! - **presentproof**: States, executors, the conversation driver and the
//!   per-agent service. This is where the protocol lives.
//! - **credential**: Verifiable presentations with Ed25519 data-integrity
//!   proofs.
//! - **identity**: DIDs, DID documents and key resolution.
//! - **didcomm**: The JSON message envelope and the transport contract.
//! - **crypto**: Ed25519 keys and hashing.
//! - **config**: Protocol constants: message types, codes, state names.
//!
//! ## Design Philosophy
//!
//! 1. Decide, then commit. Executors describe side effects; the driver runs
//!    them only after the transition checks out.
//! 2. Every failure ends somewhere well defined: `abandoning`, then `done`.
//! 3. Conversations share nothing but the key resolver.

pub mod config;
pub mod credential;
pub mod crypto;
pub mod didcomm;
pub mod identity;
pub mod presentproof;
