//! Inbound request queue.
//!
//! # Data Flow
//! ```text
//! front-end
//!     → RequestSender::offer / send (bounded, backpressure)
//!     → channel of Option<RequestMessage>
//!     → RequestSource::receive (one consumer per loop, or SharedReceiver)
//!     → gateway loop
//! ```
//!
//! # Design Decisions
//! - `Ok(None)` from `receive` is the shutdown sentinel, never a payload
//! - Receiving has no timeout; an idle loop parks on it
//! - Losing every producer without a sentinel is a queue failure

pub mod channel;

use async_trait::async_trait;
use thiserror::Error;

use crate::message::RequestMessage;

pub use channel::{request_queue, RequestReceiver, RequestSender, SharedReceiver};

/// Errors raised by the inbound queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// Non-blocking offer found no free slot.
    #[error("request queue is full")]
    Full,

    /// The consuming side is gone.
    #[error("request queue is closed")]
    Closed,

    /// Every producer went away without sending the shutdown sentinel.
    #[error("all request producers disconnected without a shutdown message")]
    Disconnected,
}

/// Source of request messages for a gateway loop.
#[async_trait]
pub trait RequestSource: Send {
    /// Wait for the next message. `Ok(None)` means shut down.
    async fn receive(&mut self) -> Result<Option<RequestMessage>, QueueError>;
}
