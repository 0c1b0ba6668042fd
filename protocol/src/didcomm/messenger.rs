//! # Transport Contract
//!
//! The engine never touches the wire. Executors produce an [`Action`]
//! describing what to send, and the driver runs it against whatever
//! [`Messenger`] the host supplies: an HTTP outbound, a mediator, or an
//! in-process loopback.
//!
//! [`Action`]: crate::presentproof::Action

use async_trait::async_trait;
use thiserror::Error;

use super::message::DidCommMsg;

/// Failure reported by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no route to {0}")]
    Unreachable(String),

    /// `reply_to` named a message the transport has never seen.
    #[error("unknown message: {0}")]
    UnknownMessage(String),

    #[error("transport closed")]
    Closed,
}

/// Outbound half of a DIDComm transport.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a message that opens a new thread.
    async fn send(&self, msg: DidCommMsg, my_did: &str, their_did: &str)
        -> Result<(), TransportError>;

    /// Reply to a previously received message, keeping its thread.
    async fn reply_to(&self, msg_id: &str, msg: DidCommMsg) -> Result<(), TransportError>;

    /// Send into an existing thread when there is no concrete message to
    /// reply to (problem reports raised while abandoning).
    async fn reply_to_nested(
        &self,
        thread_id: &str,
        msg: DidCommMsg,
        my_did: &str,
        their_did: &str,
    ) -> Result<(), TransportError>;
}
