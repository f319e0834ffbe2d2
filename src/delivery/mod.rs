//! Response delivery back to the front-end.
//!
//! # Responsibilities
//! - Hand a finished response to whoever owns the client connection
//! - Report stale handles and vanished clients as errors
//!
//! # Design Decisions
//! - Delivery is synchronous and never blocks the gateway loop
//! - Failures are reported, never retried; the loop logs and moves on

pub mod channel;
pub mod pending;

use std::sync::Arc;

use thiserror::Error;

use crate::message::{Handle, ResponseMessage};

pub use channel::ChannelDelivery;
pub use pending::PendingResponses;

/// Errors raised while handing a response to the front-end.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// No client is waiting on this handle (never registered or expired).
    #[error("unknown or expired handle: {0}")]
    UnknownHandle(Handle),

    /// The client was registered but stopped waiting.
    #[error("client for handle {0} is gone")]
    ClientGone(Handle),

    /// Status outside the HTTP range.
    #[error("invalid response status {status} for handle {handle}")]
    InvalidStatus { handle: Handle, status: u16 },

    /// The delivery transport is shut down.
    #[error("response transport is closed")]
    Closed,
}

/// Collaborator that transmits a response to the original HTTP client.
pub trait ResponseDelivery: Send + Sync {
    fn deliver(&self, response: ResponseMessage) -> Result<(), DeliveryError>;
}

impl<T: ResponseDelivery + ?Sized> ResponseDelivery for Arc<T> {
    fn deliver(&self, response: ResponseMessage) -> Result<(), DeliveryError> {
        (**self).deliver(response)
    }
}
