//! Registry of clients waiting for a response.
//!
//! The front-end registers each accepted request and gets a `Handle` plus a
//! oneshot receiver. The gateway delivers by handle; each handle can be
//! answered once.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::oneshot;

use crate::delivery::{DeliveryError, ResponseDelivery};
use crate::message::{Handle, ResponseMessage};

/// Thread-safe map of handle -> waiting client.
#[derive(Debug, Clone, Default)]
pub struct PendingResponses {
    inner: Arc<DashMap<Handle, oneshot::Sender<ResponseMessage>>>,
    next: Arc<AtomicI64>,
}

impl PendingResponses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a waiting client under a fresh handle.
    pub fn register(&self) -> (Handle, oneshot::Receiver<ResponseMessage>) {
        let handle = Handle(self.next.fetch_add(1, Ordering::Relaxed) + 1);
        let (tx, rx) = oneshot::channel();
        self.inner.insert(handle, tx);
        (handle, rx)
    }

    /// Forget a handle, e.g. after the client timed out.
    pub fn expire(&self, handle: Handle) -> bool {
        self.inner.remove(&handle).is_some()
    }

    /// Number of clients still waiting.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl ResponseDelivery for PendingResponses {
    fn deliver(&self, response: ResponseMessage) -> Result<(), DeliveryError> {
        let handle = response.handle;
        if !(100..=599).contains(&response.status) {
            return Err(DeliveryError::InvalidStatus {
                handle,
                status: response.status,
            });
        }
        let (_, tx) = self
            .inner
            .remove(&handle)
            .ok_or(DeliveryError::UnknownHandle(handle))?;
        tx.send(response)
            .map_err(|_| DeliveryError::ClientGone(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deliver_to_registered_client() {
        let pending = PendingResponses::new();
        let (handle, rx) = pending.register();
        assert_eq!(pending.len(), 1);

        pending.deliver(ResponseMessage::new(handle, 200)).unwrap();
        let resp = rx.await.unwrap();
        assert_eq!(resp.handle, handle);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_handles_are_unique() {
        let pending = PendingResponses::new();
        let (a, _ra) = pending.register();
        let (b, _rb) = pending.register();
        assert_ne!(a, b);
    }

    #[test]
    fn test_second_delivery_is_unknown_handle() {
        let pending = PendingResponses::new();
        let (handle, _rx) = pending.register();
        pending.deliver(ResponseMessage::new(handle, 200)).unwrap();

        let err = pending.deliver(ResponseMessage::new(handle, 200)).unwrap_err();
        assert_eq!(err, DeliveryError::UnknownHandle(handle));
    }

    #[test]
    fn test_expired_handle() {
        let pending = PendingResponses::new();
        let (handle, _rx) = pending.register();
        assert!(pending.expire(handle));
        assert!(!pending.expire(handle));

        let err = pending.deliver(ResponseMessage::new(handle, 200)).unwrap_err();
        assert_eq!(err, DeliveryError::UnknownHandle(handle));
    }

    #[test]
    fn test_dropped_client() {
        let pending = PendingResponses::new();
        let (handle, rx) = pending.register();
        drop(rx);
        let err = pending.deliver(ResponseMessage::new(handle, 200)).unwrap_err();
        assert_eq!(err, DeliveryError::ClientGone(handle));
    }

    #[test]
    fn test_invalid_status_keeps_client_waiting() {
        let pending = PendingResponses::new();
        let (handle, _rx) = pending.register();
        let err = pending.deliver(ResponseMessage::new(handle, 0)).unwrap_err();
        assert_eq!(err, DeliveryError::InvalidStatus { handle, status: 0 });
        assert_eq!(pending.len(), 1);
    }
}
