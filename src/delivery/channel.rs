//! Delivery into an unbounded channel, for embedding and tests.

use tokio::sync::mpsc;

use crate::delivery::{DeliveryError, ResponseDelivery};
use crate::message::ResponseMessage;

/// Forwards every response into a channel drained by the front-end.
#[derive(Debug, Clone)]
pub struct ChannelDelivery {
    tx: mpsc::UnboundedSender<ResponseMessage>,
}

impl ChannelDelivery {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ResponseMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ResponseDelivery for ChannelDelivery {
    fn deliver(&self, response: ResponseMessage) -> Result<(), DeliveryError> {
        self.tx.send(response).map_err(|_| DeliveryError::Closed)
    }
}
