//! Deferred side effects.
//!
//! An executor decides what should go out on the wire and returns it as an
//! [`Action`]. Nothing touches the transport until the driver has checked
//! the transition that produced it, so an illegal transition never leaks a
//! message to the peer.

use crate::didcomm::message::DidCommMsg;
use crate::didcomm::messenger::{Messenger, TransportError};

/// A pending transport call.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    None,

    /// Open a new thread with `msg`.
    Send {
        msg: DidCommMsg,
        from: String,
        to: String,
    },

    /// Answer the message with id `msg_id`.
    ReplyTo { msg_id: String, msg: DidCommMsg },

    /// Post `msg` into `thread_id` without a message to answer.
    ReplyToNested {
        thread_id: String,
        msg: DidCommMsg,
        from: String,
        to: String,
    },
}

impl Action {
    pub fn is_none(&self) -> bool {
        matches!(self, Action::None)
    }

    /// The message this action would emit, if any.
    pub fn message(&self) -> Option<&DidCommMsg> {
        match self {
            Action::None => None,
            Action::Send { msg, .. }
            | Action::ReplyTo { msg, .. }
            | Action::ReplyToNested { msg, .. } => Some(msg),
        }
    }

    pub async fn run(self, messenger: &dyn Messenger) -> Result<(), TransportError> {
        match self {
            Action::None => Ok(()),
            Action::Send { msg, from, to } => messenger.send(msg, &from, &to).await,
            Action::ReplyTo { msg_id, msg } => messenger.reply_to(&msg_id, msg).await,
            Action::ReplyToNested {
                thread_id,
                msg,
                from,
                to,
            } => messenger.reply_to_nested(&thread_id, msg, &from, &to).await,
        }
    }
}
