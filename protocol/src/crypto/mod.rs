//! # Cryptographic Primitives
//!
//! Thin wrappers over audited implementations: Ed25519 (`ed25519-dalek`)
//! for presentation proofs and SHA-256 (`sha2`) for the proof signing
//! input. Nothing in here is clever, and it should stay that way.

pub mod hash;
pub mod keys;

pub use hash::sha256;
pub use keys::{KeyError, Keypair, PublicKey, Signature};
