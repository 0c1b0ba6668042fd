//! # Protocol Configuration & Constants
//!
//! Every identifier that appears on the wire or in the logs lives here:
//! message type URIs, problem-report codes, state names, decorator keys and
//! the proof suite parameters. If two agents disagree about one of these
//! strings, they are not speaking the same protocol.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Protocol family name as it appears in message type URIs.
pub const PROTOCOL_NAME: &str = "present-proof";

/// Protocol family version. Only 2.0 message types are produced or accepted.
pub const PROTOCOL_VERSION: &str = "2.0";

/// Common prefix of every message type in this protocol family.
pub const MESSAGE_TYPE_PREFIX: &str = "https://didcomm.org/present-proof/2.0/";

// ---------------------------------------------------------------------------
// Message Types
// ---------------------------------------------------------------------------

/// Prover → Verifier: counter-proposal describing what the Prover is
/// willing to present.
pub const PROPOSE_PRESENTATION_MSG_TYPE: &str =
    "https://didcomm.org/present-proof/2.0/propose-presentation";

/// Verifier → Prover: request for a presentation.
pub const REQUEST_PRESENTATION_MSG_TYPE: &str =
    "https://didcomm.org/present-proof/2.0/request-presentation";

/// Prover → Verifier: the presentation itself, as attachments.
pub const PRESENTATION_MSG_TYPE: &str = "https://didcomm.org/present-proof/2.0/presentation";

/// Verifier → Prover: acknowledgment of an accepted presentation.
pub const ACK_MSG_TYPE: &str = "https://didcomm.org/present-proof/2.0/ack";

/// Either direction: the sender abandoned the conversation.
pub const PROBLEM_REPORT_MSG_TYPE: &str = "https://didcomm.org/present-proof/2.0/problem-report";

// ---------------------------------------------------------------------------
// Problem-Report Codes
// ---------------------------------------------------------------------------

/// Reported when the conversation failed on our side (decode, verification,
/// missing payload, illegal transition, transport).
pub const CODE_INTERNAL_ERROR: &str = "internal";

/// Reported when the local user explicitly stopped the conversation.
pub const CODE_REJECTED_ERROR: &str = "rejected";

// ---------------------------------------------------------------------------
// State Names
// ---------------------------------------------------------------------------

pub const STATE_NAME_START: &str = "start";
pub const STATE_NAME_ABANDONING: &str = "abandoning";
pub const STATE_NAME_DONE: &str = "done";
pub const STATE_NAME_NOOP: &str = "noop";

// Verifier
pub const STATE_NAME_REQUEST_SENT: &str = "request-sent";
pub const STATE_NAME_PRESENTATION_RECEIVED: &str = "presentation-received";
pub const STATE_NAME_PROPOSAL_RECEIVED: &str = "proposal-received";

// Prover
pub const STATE_NAME_REQUEST_RECEIVED: &str = "request-received";
pub const STATE_NAME_PRESENTATION_SENT: &str = "presentation-sent";
pub const STATE_NAME_PROPOSAL_SENT: &str = "proposal-sent";

// ---------------------------------------------------------------------------
// Envelope Keys
// ---------------------------------------------------------------------------

/// Message identifier field.
pub const JSON_ID: &str = "@id";

/// Message type discriminator field.
pub const JSON_TYPE: &str = "@type";

/// Thread decorator. Its presence marks a message as part of an existing
/// conversation rather than the opening move of a new one.
pub const JSON_THREAD: &str = "~thread";

/// Thread id inside the thread decorator.
pub const JSON_THREAD_ID: &str = "thid";

/// Parent thread id inside the thread decorator (nested replies).
pub const JSON_PARENT_THREAD_ID: &str = "pthid";

// ---------------------------------------------------------------------------
// Presentation Proofs
// ---------------------------------------------------------------------------

/// W3C Verifiable Credentials context, required on every presentation.
pub const VC_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";

/// Type tag every verifiable presentation must carry.
pub const PRESENTATION_TYPE: &str = "VerifiablePresentation";

/// Mime type for presentation attachments.
pub const PRESENTATION_MIME_TYPE: &str = "application/ld+json";

/// Embedded proof suite. Ed25519 over SHA-256 digests of the canonical
/// proof options and document.
pub const PROOF_TYPE: &str = "Ed25519Signature2020";

/// Proof purpose used by holders signing a presentation.
pub const PROOF_PURPOSE_AUTHENTICATION: &str = "authentication";

// ---------------------------------------------------------------------------
// DID Documents
// ---------------------------------------------------------------------------

/// Context URI for the W3C DID Core specification.
pub const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

/// Context URI for the Ed25519 verification key suite.
pub const ED25519_CONTEXT: &str = "https://w3id.org/security/suites/ed25519-2020/v1";

/// Verification method type for Ed25519 public keys.
pub const VERIFICATION_KEY_TYPE: &str = "Ed25519VerificationKey2020";

/// Multicodec prefix for an Ed25519 public key (`0xed` varint-encoded).
pub const ED25519_MULTICODEC: [u8; 2] = [0xed, 0x01];

/// Multibase prefix for base58btc.
pub const MULTIBASE_BASE58BTC: char = 'z';
