//! # Key Management
//!
//! Ed25519 key material for the parties of a present-proof exchange.
//!
//! Holders sign presentations with a [`Keypair`]; verifiers only ever see
//! the [`PublicKey`] half, delivered through a DID document as a multibase
//! string (`z` + base58btc over the `0xed 0x01` multicodec prefix and the
//! 32 raw key bytes).
//!
//! Key bytes are never logged. `Debug` prints the public half only.

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::{ED25519_MULTICODEC, MULTIBASE_BASE58BTC};

/// Errors that can occur while handling key material.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes: expected 32 bytes")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,

    #[error("invalid multibase key: {0}")]
    InvalidMultibase(String),

    #[error("invalid signature bytes: expected 64 bytes")]
    InvalidSignature,
}

/// An Ed25519 signing keypair.
///
/// Intentionally not `Serialize`: exporting the secret is an explicit
/// [`secret_key_bytes`](Self::secret_key_bytes) call, never a side effect of
/// dumping a struct to JSON.
pub struct Keypair {
    signing_key: SigningKey,
}

/// The public half of a [`Keypair`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    bytes: [u8; 32],
}

/// A 64-byte Ed25519 signature.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
    bytes: [u8; 64],
}

impl Keypair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Deterministic keypair from a 32-byte seed. Test fixtures and the node
    /// CLI use this so runs are reproducible.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Parse a hex-encoded 32-byte seed.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidSecretKey)?;
        let seed: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_seed(&seed))
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Sign arbitrary bytes. Deterministic for a given (key, message) pair.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature {
            bytes: self.signing_key.sign(message).to_bytes(),
        }
    }

    /// Raw secret key bytes. Handle with care.
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl Clone for Keypair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair(pub={})", self.public_key().to_hex())
    }
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

impl PublicKey {
    /// Build from a slice, rejecting anything that is not a valid point.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; 32] = slice.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Verify `signature` over `message`. A plain yes/no: callers never
    /// get to learn *why* a signature was rejected.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let sig = DalekSignature::from_bytes(&signature.bytes);
        verifying_key.verify(message, &sig).is_ok()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Multibase form used in `publicKeyMultibase`: `z` + base58btc of
    /// the multicodec-prefixed key.
    pub fn to_multibase(&self) -> String {
        let mut prefixed = Vec::with_capacity(34);
        prefixed.extend_from_slice(&ED25519_MULTICODEC);
        prefixed.extend_from_slice(&self.bytes);
        format!(
            "{}{}",
            MULTIBASE_BASE58BTC,
            bs58::encode(prefixed).into_string()
        )
    }

    /// Inverse of [`to_multibase`](Self::to_multibase).
    pub fn from_multibase(encoded: &str) -> Result<Self, KeyError> {
        let body = encoded
            .strip_prefix(MULTIBASE_BASE58BTC)
            .ok_or_else(|| KeyError::InvalidMultibase("expected base58btc ('z') prefix".into()))?;
        let decoded = bs58::decode(body)
            .into_vec()
            .map_err(|e| KeyError::InvalidMultibase(e.to_string()))?;
        let key = decoded
            .strip_prefix(&ED25519_MULTICODEC[..])
            .ok_or_else(|| KeyError::InvalidMultibase("not an Ed25519 multicodec key".into()))?;
        Self::try_from_slice(key)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

impl Signature {
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; 64] = slice.try_into().map_err(|_| KeyError::InvalidSignature)?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.bytes
    }

    /// Multibase (`z` + base58btc) form used as a proof's `proofValue`.
    pub fn to_multibase(&self) -> String {
        format!(
            "{}{}",
            MULTIBASE_BASE58BTC,
            bs58::encode(self.bytes).into_string()
        )
    }

    pub fn from_multibase(encoded: &str) -> Result<Self, KeyError> {
        let body = encoded
            .strip_prefix(MULTIBASE_BASE58BTC)
            .ok_or_else(|| KeyError::InvalidMultibase("expected base58btc ('z') prefix".into()))?;
        let decoded = bs58::decode(body)
            .into_vec()
            .map_err(|e| KeyError::InvalidMultibase(e.to_string()))?;
        Self::try_from_slice(&decoded)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", &hex::encode(self.bytes)[..16])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
