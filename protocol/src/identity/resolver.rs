//! # Key Resolution
//!
//! The verifier never trusts a key that arrives inside a presentation. Each
//! proof names its signer by DID URL, and the key behind that URL is looked
//! up through a [`KeyResolver`]: a DID registry, a ledger, a web lookup, or
//! the [`InMemoryResolver`] used by tests and the node.
//!
//! One resolver is shared by every conversation of a service, so
//! implementations must be safe for many concurrent readers.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use super::did::{Did, DidDocument, DidError, DidUrl};
use crate::crypto::keys::PublicKey;

/// Capability that maps a DID to its current document.
#[async_trait]
pub trait KeyResolver: Send + Sync {
    async fn resolve(&self, did: &Did) -> Result<DidDocument, DidError>;
}

/// Resolve the public key behind a proof's `verificationMethod`.
pub async fn resolve_public_key(
    resolver: &dyn KeyResolver,
    verification_method: &str,
) -> Result<PublicKey, DidError> {
    let url: DidUrl = verification_method.parse()?;
    let document = resolver.resolve(url.did()).await?;
    document.public_key(&url)
}

// ---------------------------------------------------------------------------
// In-memory registry
// ---------------------------------------------------------------------------

/// A read-mostly DID registry held in memory.
#[derive(Debug, Default)]
pub struct InMemoryResolver {
    documents: RwLock<HashMap<Did, DidDocument>>,
}

impl InMemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the document for its DID. The document must
    /// pass [`DidDocument::validate`].
    pub fn register(&self, document: DidDocument) -> Result<(), DidError> {
        document.validate()?;
        let did: Did = document.id.parse()?;
        self.documents.write().insert(did, document);
        Ok(())
    }

    /// Drop a DID from the registry, e.g. after key revocation. Returns
    /// whether it was present.
    pub fn remove(&self, did: &Did) -> bool {
        self.documents.write().remove(did).is_some()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

#[async_trait]
impl KeyResolver for InMemoryResolver {
    async fn resolve(&self, did: &Did) -> Result<DidDocument, DidError> {
        self.documents
            .read()
            .get(did)
            .cloned()
            .ok_or_else(|| DidError::NotFound(did.to_string()))
    }
}
