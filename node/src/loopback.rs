//! # Loopback Transport
//!
//! An in-process DIDComm transport. Each agent registers its DID and gets
//! an inbox; [`LoopbackMessenger`] delivers into the recipient's inbox.
//!
//! Replies are addressed by message id, so the hub remembers the route
//! (thread, sender, recipient) of every message it has carried.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use presentproof_protocol::didcomm::{DidCommMsg, Messenger, TransportError};

/// A message in flight.
#[derive(Debug)]
pub struct Envelope {
    pub msg: DidCommMsg,
    pub from: String,
    pub to: String,
}

#[derive(Clone, Debug)]
struct Route {
    thread_id: String,
    from: String,
    to: String,
}

/// Shared switchboard between the agents of one process.
#[derive(Default)]
pub struct LoopbackHub {
    inboxes: DashMap<String, mpsc::UnboundedSender<Envelope>>,
    routes: DashMap<String, Route>,
    delivered: DashMap<String, usize>,
}

impl LoopbackHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Open an inbox for `did`. Replaces any previous one.
    pub fn register(&self, did: &str) -> mpsc::UnboundedReceiver<Envelope> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inboxes.insert(did.to_string(), tx);
        rx
    }

    /// How many messages of `msg_type` have been delivered so far.
    pub fn delivered(&self, msg_type: &str) -> usize {
        self.delivered.get(msg_type).map(|n| *n).unwrap_or(0)
    }

    fn deliver(&self, msg: DidCommMsg, from: &str, to: &str) -> Result<(), TransportError> {
        let id = msg
            .id()
            .ok_or_else(|| TransportError::UnknownMessage("message without @id".into()))?
            .to_string();
        let thread_id = msg
            .thread_id()
            .map_err(|_| TransportError::UnknownMessage(id.clone()))?;
        let msg_type = msg.msg_type().unwrap_or_default().to_string();

        // Clone the sender out so no map guard is held while sending.
        let inbox = self
            .inboxes
            .get(to)
            .map(|tx| tx.clone())
            .ok_or_else(|| TransportError::Unreachable(to.to_string()))?;

        self.routes.insert(
            id,
            Route {
                thread_id,
                from: from.to_string(),
                to: to.to_string(),
            },
        );

        inbox
            .send(Envelope {
                msg,
                from: from.to_string(),
                to: to.to_string(),
            })
            .map_err(|_| TransportError::Closed)?;

        *self.delivered.entry(msg_type).or_insert(0) += 1;
        Ok(())
    }
}

/// [`Messenger`] backed by a [`LoopbackHub`].
#[derive(Clone)]
pub struct LoopbackMessenger {
    hub: Arc<LoopbackHub>,
}

impl LoopbackMessenger {
    pub fn new(hub: Arc<LoopbackHub>) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl Messenger for LoopbackMessenger {
    async fn send(&self, msg: DidCommMsg, my_did: &str, their_did: &str) -> Result<(), TransportError> {
        self.hub.deliver(msg, my_did, their_did)
    }

    async fn reply_to(&self, msg_id: &str, mut msg: DidCommMsg) -> Result<(), TransportError> {
        let route = self
            .hub
            .routes
            .get(msg_id)
            .map(|r| r.clone())
            .ok_or_else(|| TransportError::UnknownMessage(msg_id.to_string()))?;

        msg.set_thread(route.thread_id);
        self.hub.deliver(msg, &route.to, &route.from)
    }

    async fn reply_to_nested(
        &self,
        thread_id: &str,
        mut msg: DidCommMsg,
        my_did: &str,
        their_did: &str,
    ) -> Result<(), TransportError> {
        msg.set_parent_thread(thread_id);
        self.hub.deliver(msg, my_did, their_did)
    }
}
