//! # Decentralized Identifiers
//!
//! Parsing for `did:<method>:<id>` identifiers and `did:…#fragment` URLs,
//! plus the subset of a W3C DID Document the present-proof engine needs:
//! the Ed25519 verification methods a holder signs presentations with.
//!
//! The engine is method-agnostic. Whatever method a DID uses, the
//! [`KeyResolver`](super::resolver::KeyResolver) is responsible for turning
//! it into a [`DidDocument`].
//!
//! ## Standards References
//!
//! - [DID Core v1.0](https://www.w3.org/TR/did-core/)
//! - [Ed25519VerificationKey2020](https://w3c-ccg.github.io/di-eddsa-2020/)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{DID_CONTEXT, ED25519_CONTEXT, VERIFICATION_KEY_TYPE};
use crate::crypto::keys::{KeyError, PublicKey};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while parsing or resolving DIDs.
#[derive(Debug, Error)]
pub enum DidError {
    /// The DID string does not match `did:<method>:<id>`.
    #[error("invalid DID format: {0}")]
    InvalidFormat(String),

    /// No document is known for this DID.
    #[error("DID not found: {0}")]
    NotFound(String),

    /// The document exists but has no verification method with this id.
    #[error("verification method not found: {0}")]
    MethodNotFound(String),

    /// The document is structurally invalid.
    #[error("invalid DID document: {0}")]
    InvalidDocument(String),

    /// The verification method's key material could not be decoded.
    #[error("invalid key material: {0}")]
    Key(#[from] KeyError),
}

// ---------------------------------------------------------------------------
// Did
// ---------------------------------------------------------------------------

/// A parsed `did:<method>:<method-specific-id>`.
///
/// # Examples
///
/// ```
/// use presentproof_protocol::identity::Did;
///
/// let did: Did = "did:example:alice".parse().unwrap();
/// assert_eq!(did.method(), "example");
/// assert_eq!(did.id(), "alice");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did {
    method: String,
    id: String,
}

impl Did {
    pub fn new(method: &str, id: &str) -> Result<Self, DidError> {
        format!("did:{method}:{id}").parse()
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl FromStr for Did {
    type Err = DidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let (Some(scheme), Some(method), Some(id)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(DidError::InvalidFormat(format!(
                "'{s}' is not of the form 'did:<method>:<identifier>'"
            )));
        };

        if scheme != "did" {
            return Err(DidError::InvalidFormat(format!(
                "expected 'did' scheme, got '{scheme}'"
            )));
        }
        if method.is_empty() || !method.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(DidError::InvalidFormat(format!("invalid method '{method}'")));
        }
        if id.is_empty() || id.contains('#') || id.contains('?') {
            return Err(DidError::InvalidFormat(format!(
                "invalid method-specific id '{id}'"
            )));
        }

        Ok(Self {
            method: method.to_string(),
            id: id.to_string(),
        })
    }
}

impl TryFrom<String> for Did {
    type Error = DidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.to_string()
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "did:{}:{}", self.method, self.id)
    }
}

// ---------------------------------------------------------------------------
// DidUrl
// ---------------------------------------------------------------------------

/// A DID URL pointing at a verification method: `did:…#fragment`.
///
/// This is what a proof's `verificationMethod` contains.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DidUrl {
    did: Did,
    fragment: String,
}

impl DidUrl {
    pub fn did(&self) -> &Did {
        &self.did
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }
}

impl FromStr for DidUrl {
    type Err = DidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (did, fragment) = s.split_once('#').ok_or_else(|| {
            DidError::InvalidFormat(format!("'{s}' has no '#fragment' naming a key"))
        })?;
        if fragment.is_empty() {
            return Err(DidError::InvalidFormat(format!("'{s}' has an empty fragment")));
        }
        Ok(Self {
            did: did.parse()?,
            fragment: fragment.to_string(),
        })
    }
}

impl fmt::Display for DidUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.did, self.fragment)
    }
}

// ---------------------------------------------------------------------------
// DID Document
// ---------------------------------------------------------------------------

/// The parts of a W3C DID Document used for presentation verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DidDocument {
    /// JSON-LD context URIs.
    #[serde(rename = "@context")]
    pub context: Vec<String>,

    /// The DID this document describes.
    pub id: String,

    #[serde(rename = "verificationMethod")]
    pub verification_method: Vec<VerificationMethod>,

    /// References to verification methods usable for authentication.
    #[serde(default)]
    pub authentication: Vec<String>,

    #[serde(rename = "assertionMethod", default)]
    pub assertion_method: Vec<String>,

    pub created: DateTime<Utc>,
}

/// A single key entry in a [`DidDocument`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationMethod {
    /// Full DID URL of this method (`did:…#key-1`).
    pub id: String,

    #[serde(rename = "type")]
    pub type_: String,

    pub controller: String,

    #[serde(rename = "publicKeyMultibase")]
    pub public_key_multibase: String,
}

impl DidDocument {
    /// A single-key document for `did`, with `#key-1` referenced from both
    /// `authentication` and `assertionMethod`.
    pub fn for_key(did: &Did, public_key: &PublicKey) -> Self {
        let did_string = did.to_string();
        let key_id = format!("{did_string}#key-1");

        Self {
            context: vec![DID_CONTEXT.to_string(), ED25519_CONTEXT.to_string()],
            id: did_string.clone(),
            verification_method: vec![VerificationMethod {
                id: key_id.clone(),
                type_: VERIFICATION_KEY_TYPE.to_string(),
                controller: did_string,
                public_key_multibase: public_key.to_multibase(),
            }],
            authentication: vec![key_id.clone()],
            assertion_method: vec![key_id],
            created: Utc::now(),
        }
    }

    /// Structural checks: parsable id, DID Core context, at least one
    /// verification method, every method owned by this DID.
    pub fn validate(&self) -> Result<(), DidError> {
        let _: Did = self.id.parse()?;

        if !self.context.iter().any(|c| c == DID_CONTEXT) {
            return Err(DidError::InvalidDocument(
                "document must include DID Core context".into(),
            ));
        }

        if self.verification_method.is_empty() {
            return Err(DidError::InvalidDocument(
                "document must have at least one verification method".into(),
            ));
        }

        for vm in &self.verification_method {
            if !vm.id.starts_with(&format!("{}#", self.id)) {
                return Err(DidError::InvalidDocument(format!(
                    "verification method {} does not belong to {}",
                    vm.id, self.id
                )));
            }
        }

        Ok(())
    }

    /// Find the verification method named by `url` and decode its key.
    ///
    /// Only `Ed25519VerificationKey2020` methods are usable.
    pub fn public_key(&self, url: &DidUrl) -> Result<PublicKey, DidError> {
        let wanted = url.to_string();
        let vm = self
            .verification_method
            .iter()
            .find(|vm| vm.id == wanted)
            .ok_or_else(|| DidError::MethodNotFound(wanted.clone()))?;

        if vm.type_ != VERIFICATION_KEY_TYPE {
            return Err(DidError::InvalidDocument(format!(
                "unsupported verification method type '{}'",
                vm.type_
            )));
        }

        Ok(PublicKey::from_multibase(&vm.public_key_multibase)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
