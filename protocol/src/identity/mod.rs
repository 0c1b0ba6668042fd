//! # Identity Module
//!
//! Who signed a presentation, and with which key.
//!
//! 1. **DID**: `did:<method>:<id>` identifiers, `did:…#key` URLs and the
//!    DID Document subset that carries Ed25519 verification methods.
//! 2. **Resolver**: the [`KeyResolver`] capability that turns a DID into
//!    its current document. The engine only consumes it; where documents
//!    come from is the embedding application's business.

pub mod did;
pub mod resolver;

pub use did::{Did, DidDocument, DidError, DidUrl, VerificationMethod};
pub use resolver::{resolve_public_key, InMemoryResolver, KeyResolver};
