//! DIDComm plumbing: the JSON message envelope and the outbound transport
//! contract.

pub mod message;
pub mod messenger;

pub use message::{DidCommMsg, EnvelopeError};
pub use messenger::{Messenger, TransportError};
