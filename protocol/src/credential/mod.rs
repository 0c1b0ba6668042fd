//! # Credentials
//!
//! The verifiable-presentation envelope that rides inside present-proof
//! attachments, with its embedded Ed25519 proofs.

pub mod presentation;

pub use presentation::{PresentationError, Proof, ProofSet, VerifiablePresentation};
