//! Shared fixtures for the engine's unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

use super::models::{Attachment, Presentation};
use crate::credential::presentation::VerifiablePresentation;
use crate::crypto::keys::Keypair;
use crate::didcomm::message::DidCommMsg;
use crate::didcomm::messenger::{Messenger, TransportError};
use crate::identity::did::{Did, DidDocument};
use crate::identity::resolver::InMemoryResolver;

pub const VERIFIER_DID: &str = "did:example:verifier";
pub const PROVER_DID: &str = "did:example:prover";

#[derive(Clone, Debug)]
pub enum Outbound {
    Send {
        msg: DidCommMsg,
        from: String,
        to: String,
    },
    ReplyTo {
        msg_id: String,
        msg: DidCommMsg,
    },
    ReplyToNested {
        thread_id: String,
        msg: DidCommMsg,
        from: String,
        to: String,
    },
}

impl Outbound {
    pub fn msg(&self) -> &DidCommMsg {
        match self {
            Outbound::Send { msg, .. }
            | Outbound::ReplyTo { msg, .. }
            | Outbound::ReplyToNested { msg, .. } => msg,
        }
    }
}

/// Records every call instead of delivering it.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Outbound>>,
    fail: bool,
}

impl RecordingMessenger {
    /// A messenger whose every call fails.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::default(),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<Outbound> {
        self.sent.lock().clone()
    }

    fn record(&self, out: Outbound) -> Result<(), TransportError> {
        if self.fail {
            return Err(TransportError::Unreachable("recording messenger".into()));
        }
        self.sent.lock().push(out);
        Ok(())
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, msg: DidCommMsg, my_did: &str, their_did: &str) -> Result<(), TransportError> {
        self.record(Outbound::Send {
            msg,
            from: my_did.into(),
            to: their_did.into(),
        })
    }

    async fn reply_to(&self, msg_id: &str, msg: DidCommMsg) -> Result<(), TransportError> {
        self.record(Outbound::ReplyTo {
            msg_id: msg_id.into(),
            msg,
        })
    }

    async fn reply_to_nested(
        &self,
        thread_id: &str,
        msg: DidCommMsg,
        my_did: &str,
        their_did: &str,
    ) -> Result<(), TransportError> {
        self.record(Outbound::ReplyToNested {
            thread_id: thread_id.into(),
            msg,
            from: my_did.into(),
            to: their_did.into(),
        })
    }
}

/// A holder with its DID registered in a fresh resolver.
pub struct Holder {
    pub keypair: Keypair,
    pub did: Did,
    pub resolver: Arc<InMemoryResolver>,
}

impl Holder {
    pub fn new() -> Self {
        let keypair = Keypair::from_seed(&[42u8; 32]);
        let did: Did = PROVER_DID.parse().unwrap();
        let resolver = Arc::new(InMemoryResolver::new());
        resolver
            .register(DidDocument::for_key(&did, &keypair.public_key()))
            .unwrap();
        Self {
            keypair,
            did,
            resolver,
        }
    }

    pub fn verification_method(&self) -> String {
        format!("{}#key-1", self.did)
    }

    pub fn signed(&self) -> VerifiablePresentation {
        let mut vp = VerifiablePresentation::new(
            &self.did.to_string(),
            vec![json!({"type": ["VerifiableCredential"], "credentialSubject": {"age": 30}})],
        );
        vp.sign(&self.keypair, &self.verification_method(), None)
            .unwrap();
        vp
    }

    pub fn presentation(&self) -> Presentation {
        Presentation::new(vec![Attachment::from_presentation(&self.signed()).unwrap()])
    }
}

/// `payload` wrapped as an inbound message already bound to `thread`.
pub fn threaded<T: serde::Serialize>(payload: &T, thread: &str) -> DidCommMsg {
    let mut msg = DidCommMsg::from_payload(payload).unwrap();
    msg.set_thread(thread);
    msg
}
