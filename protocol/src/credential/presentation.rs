//! # Verifiable Presentations
//!
//! A holder bundles credentials into a W3C Verifiable Presentation and
//! signs it with an embedded `Ed25519Signature2020` proof. The verifier
//! parses the JSON, resolves every proof's `verificationMethod` through a
//! [`KeyResolver`] and checks the signature.
//!
//! ## Signing Input
//!
//! ```text
//! sha256(canonical(proof options without proofValue))
//!   || sha256(canonical(presentation without proof))
//! ```
//!
//! "Canonical" is `serde_json` serialization of a `Value`, whose object
//! keys are kept sorted (`serde_json::Map` is a `BTreeMap` as long as the
//! `preserve_order` feature stays off). Both sides hash the JSON they
//! actually hold, so fields this struct does not model are still covered
//! by the signature.
//!
//! An unsigned presentation is never accepted.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::{PRESENTATION_TYPE, PROOF_PURPOSE_AUTHENTICATION, PROOF_TYPE, VC_CONTEXT};
use crate::crypto::hash::sha256;
use crate::crypto::keys::{Keypair, Signature};
use crate::identity::did::DidError;
use crate::identity::resolver::{resolve_public_key, KeyResolver};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PresentationError {
    /// Not JSON, or JSON of the wrong shape.
    #[error("malformed presentation: {0}")]
    Malformed(String),

    #[error("presentation carries no proof")]
    MissingProof,

    #[error("unsupported proof type '{0}'")]
    UnsupportedProofType(String),

    #[error("cannot resolve signer key: {0}")]
    Resolution(#[from] DidError),

    #[error("invalid proof signature: {0}")]
    InvalidSignature(String),
}

impl PresentationError {
    /// Structural failures, as opposed to cryptographic ones.
    pub fn is_malformed(&self) -> bool {
        matches!(self, PresentationError::Malformed(_))
    }
}

// ---------------------------------------------------------------------------
// Data Model
// ---------------------------------------------------------------------------

/// An embedded data-integrity proof.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub created: DateTime<Utc>,
    /// DID URL of the signing key.
    pub verification_method: String,
    pub proof_purpose: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_value: Option<String>,
}

/// `proof` may be a single object or an array of them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProofSet {
    Single(Box<Proof>),
    Set(Vec<Proof>),
}

impl ProofSet {
    pub fn iter(&self) -> std::slice::Iter<'_, Proof> {
        match self {
            ProofSet::Single(p) => std::slice::from_ref(p.as_ref()).iter(),
            ProofSet::Set(ps) => ps.iter(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerifiablePresentation {
    #[serde(rename = "@context")]
    pub context: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub types: Vec<String>,

    /// DID of the presenting party.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,

    /// Credentials are carried opaquely; this layer only checks the
    /// holder's proof over the whole bundle.
    #[serde(
        rename = "verifiableCredential",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub verifiable_credential: Vec<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<ProofSet>,
}

impl VerifiablePresentation {
    /// An unsigned presentation of `credentials` by `holder`.
    pub fn new(holder: &str, credentials: Vec<Value>) -> Self {
        Self {
            context: vec![VC_CONTEXT.to_string()],
            id: Some(format!("urn:uuid:{}", uuid::Uuid::new_v4())),
            types: vec![PRESENTATION_TYPE.to_string()],
            holder: Some(holder.to_string()),
            verifiable_credential: credentials,
            proof: None,
        }
    }

    pub fn proofs(&self) -> impl Iterator<Item = &Proof> {
        self.proof.iter().flat_map(ProofSet::iter)
    }

    /// Attach an `Ed25519Signature2020` proof made with `keypair`, which
    /// must be the key published at `verification_method`.
    pub fn sign(
        &mut self,
        keypair: &Keypair,
        verification_method: &str,
        challenge: Option<String>,
    ) -> Result<(), PresentationError> {
        let options = Proof {
            proof_type: PROOF_TYPE.to_string(),
            created: Utc::now().trunc_subsecs(0),
            verification_method: verification_method.to_string(),
            proof_purpose: PROOF_PURPOSE_AUTHENTICATION.to_string(),
            challenge,
            proof_value: None,
        };

        let document = serde_json::to_value(&*self)
            .map_err(|e| PresentationError::Malformed(e.to_string()))?;
        let options_value = serde_json::to_value(&options)
            .map_err(|e| PresentationError::Malformed(e.to_string()))?;

        let input = signing_input(&options_value, &document)?;
        let signed = Proof {
            proof_value: Some(keypair.sign(&input).to_multibase()),
            ..options
        };

        self.proof = Some(match self.proof.take() {
            None => ProofSet::Single(Box::new(signed)),
            Some(ProofSet::Single(first)) => ProofSet::Set(vec![*first, signed]),
            Some(ProofSet::Set(mut all)) => {
                all.push(signed);
                ProofSet::Set(all)
            }
        });
        Ok(())
    }

    /// Parse `raw` as a presentation and verify every embedded proof,
    /// resolving each signer's key through `resolver`.
    pub async fn parse_and_verify(
        raw: &[u8],
        resolver: &dyn KeyResolver,
    ) -> Result<Self, PresentationError> {
        let mut document: Value =
            serde_json::from_slice(raw).map_err(|e| PresentationError::Malformed(e.to_string()))?;

        let presentation: Self = serde_json::from_value(document.clone())
            .map_err(|e| PresentationError::Malformed(e.to_string()))?;
        if !presentation.types.iter().any(|t| t == PRESENTATION_TYPE) {
            return Err(PresentationError::Malformed(format!(
                "type does not include {PRESENTATION_TYPE}"
            )));
        }

        let proof_values = match document.as_object_mut().and_then(|o| o.remove("proof")) {
            Some(Value::Array(items)) if !items.is_empty() => items,
            Some(single @ Value::Object(_)) => vec![single],
            _ => return Err(PresentationError::MissingProof),
        };

        for mut proof_json in proof_values {
            let proof: Proof = serde_json::from_value(proof_json.clone())
                .map_err(|e| PresentationError::Malformed(e.to_string()))?;
            if proof.proof_type != PROOF_TYPE {
                return Err(PresentationError::UnsupportedProofType(proof.proof_type));
            }

            let encoded = proof.proof_value.as_deref().ok_or_else(|| {
                PresentationError::InvalidSignature("proof has no proofValue".into())
            })?;
            let signature = Signature::from_multibase(encoded)
                .map_err(|e| PresentationError::InvalidSignature(e.to_string()))?;

            if let Some(options) = proof_json.as_object_mut() {
                options.remove("proofValue");
            }
            let input = signing_input(&proof_json, &document)?;

            let key = resolve_public_key(resolver, &proof.verification_method).await?;
            if !key.verify(&input, &signature) {
                return Err(PresentationError::InvalidSignature(format!(
                    "signature by {} does not verify",
                    proof.verification_method
                )));
            }
        }

        Ok(presentation)
    }
}

/// `sha256(options) || sha256(document)` over canonical JSON, with any
/// `proof` member stripped from the document.
fn signing_input(options: &Value, document: &Value) -> Result<Vec<u8>, PresentationError> {
    let mut document = document.clone();
    if let Some(object) = document.as_object_mut() {
        object.remove("proof");
    }

    let options_bytes =
        serde_json::to_vec(options).map_err(|e| PresentationError::Malformed(e.to_string()))?;
    let document_bytes =
        serde_json::to_vec(&document).map_err(|e| PresentationError::Malformed(e.to_string()))?;

    let mut input = Vec::with_capacity(64);
    input.extend_from_slice(&sha256(&options_bytes));
    input.extend_from_slice(&sha256(&document_bytes));
    Ok(input)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Did, DidDocument, InMemoryResolver};
    use serde_json::json;

    const HOLDER: &str = "did:example:holder";
    const HOLDER_KEY: &str = "did:example:holder#key-1";

    fn setup() -> (InMemoryResolver, Keypair) {
        let kp = Keypair::from_seed(&[42u8; 32]);
        let resolver = InMemoryResolver::new();
        let did: Did = HOLDER.parse().unwrap();
        resolver
            .register(DidDocument::for_key(&did, &kp.public_key()))
            .unwrap();
        (resolver, kp)
    }

    fn signed(kp: &Keypair) -> VerifiablePresentation {
        let mut vp = VerifiablePresentation::new(
            HOLDER,
            vec![json!({"type": ["VerifiableCredential"], "credentialSubject": {"age": 30}})],
        );
        vp.sign(kp, HOLDER_KEY, Some("nonce-1".into())).unwrap();
        vp
    }

    #[tokio::test]
    async fn signed_presentation_verifies() {
        let (resolver, kp) = setup();
        let vp = signed(&kp);
        let raw = serde_json::to_vec(&vp).unwrap();

        let parsed = VerifiablePresentation::parse_and_verify(&raw, &resolver)
            .await
            .unwrap();
        assert_eq!(parsed.holder.as_deref(), Some(HOLDER));
        assert_eq!(parsed.proofs().count(), 1);
    }

    #[tokio::test]
    async fn tampered_credential_fails() {
        let (resolver, kp) = setup();
        let mut value = serde_json::to_value(signed(&kp)).unwrap();
        value["verifiableCredential"][0]["credentialSubject"]["age"] = json!(17);
        let raw = serde_json::to_vec(&value).unwrap();

        let err = VerifiablePresentation::parse_and_verify(&raw, &resolver)
            .await
            .unwrap_err();
        assert!(matches!(err, PresentationError::InvalidSignature(_)));
    }

    #[tokio::test]
    async fn unmodelled_fields_are_covered() {
        let (resolver, kp) = setup();
        let mut value = serde_json::to_value(signed(&kp)).unwrap();
        value["extra"] = json!("smuggled");
        let raw = serde_json::to_vec(&value).unwrap();

        assert!(VerifiablePresentation::parse_and_verify(&raw, &resolver)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn key_mismatch_fails() {
        let (resolver, _) = setup();
        let impostor = Keypair::from_seed(&[1u8; 32]);
        let raw = serde_json::to_vec(&signed(&impostor)).unwrap();

        let err = VerifiablePresentation::parse_and_verify(&raw, &resolver)
            .await
            .unwrap_err();
        assert!(matches!(err, PresentationError::InvalidSignature(_)));
    }

    #[tokio::test]
    async fn unsigned_presentation_rejected() {
        let (resolver, _) = setup();
        let vp = VerifiablePresentation::new(HOLDER, vec![]);
        let raw = serde_json::to_vec(&vp).unwrap();

        let err = VerifiablePresentation::parse_and_verify(&raw, &resolver)
            .await
            .unwrap_err();
        assert!(matches!(err, PresentationError::MissingProof));
    }

    #[tokio::test]
    async fn unknown_signer_is_resolution_error() {
        let resolver = InMemoryResolver::new();
        let kp = Keypair::generate();
        let raw = serde_json::to_vec(&signed(&kp)).unwrap();

        let err = VerifiablePresentation::parse_and_verify(&raw, &resolver)
            .await
            .unwrap_err();
        assert!(matches!(err, PresentationError::Resolution(DidError::NotFound(_))));
    }

    #[tokio::test]
    async fn garbage_is_malformed() {
        let (resolver, _) = setup();
        let err = VerifiablePresentation::parse_and_verify(b"not json", &resolver)
            .await
            .unwrap_err();
        assert!(err.is_malformed());

        let wrong_type = serde_json::to_vec(&json!({
            "@context": [VC_CONTEXT],
            "type": ["VerifiableCredential"],
        }))
        .unwrap();
        let err = VerifiablePresentation::parse_and_verify(&wrong_type, &resolver)
            .await
            .unwrap_err();
        assert!(err.is_malformed());
    }

    #[tokio::test]
    async fn every_proof_must_verify() {
        let (resolver, kp) = setup();
        let mut vp = signed(&kp);
        let impostor = Keypair::from_seed(&[2u8; 32]);
        vp.sign(&impostor, HOLDER_KEY, None).unwrap();
        assert_eq!(vp.proofs().count(), 2);

        let raw = serde_json::to_vec(&vp).unwrap();
        assert!(VerifiablePresentation::parse_and_verify(&raw, &resolver)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn two_valid_proofs_verify() {
        let (resolver, kp) = setup();
        let mut vp = signed(&kp);
        vp.sign(&kp, HOLDER_KEY, None).unwrap();

        let raw = serde_json::to_vec(&vp).unwrap();
        VerifiablePresentation::parse_and_verify(&raw, &resolver)
            .await
            .unwrap();
    }
}
