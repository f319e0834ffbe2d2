//! In-process request queue backed by a bounded tokio channel.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::message::RequestMessage;
use crate::queue::{QueueError, RequestSource};

type Slot = Option<RequestMessage>;

/// Create a queue holding at most `capacity` pending messages.
pub fn request_queue(capacity: usize) -> (RequestSender, RequestReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (RequestSender { tx }, RequestReceiver { rx })
}

/// Producer side of the queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RequestSender {
    tx: mpsc::Sender<Slot>,
}

impl RequestSender {
    /// Enqueue without waiting; fails when the queue is full.
    pub fn offer(&self, request: RequestMessage) -> Result<(), QueueError> {
        self.tx.try_send(Some(request)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full,
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })
    }

    /// Enqueue, waiting for a free slot.
    pub async fn send(&self, request: RequestMessage) -> Result<(), QueueError> {
        self.tx
            .send(Some(request))
            .await
            .map_err(|_| QueueError::Closed)
    }

    /// Enqueue the shutdown sentinel. Stops exactly one consuming loop.
    pub async fn close(&self) -> Result<(), QueueError> {
        self.tx.send(None).await.map_err(|_| QueueError::Closed)
    }

    /// Number of free slots.
    pub fn capacity(&self) -> usize {
        self.tx.capacity()
    }
}

/// Consumer side of the queue, owned by a single loop.
#[derive(Debug)]
pub struct RequestReceiver {
    rx: mpsc::Receiver<Slot>,
}

impl RequestReceiver {
    /// Share this receiver between several loops.
    pub fn shared(self) -> SharedReceiver {
        SharedReceiver {
            inner: Arc::new(Mutex::new(self)),
        }
    }
}

#[async_trait]
impl RequestSource for RequestReceiver {
    async fn receive(&mut self) -> Result<Option<RequestMessage>, QueueError> {
        match self.rx.recv().await {
            Some(slot) => Ok(slot),
            None => Err(QueueError::Disconnected),
        }
    }
}

/// A receiver several loops pull from; each message goes to one of them.
#[derive(Debug, Clone)]
pub struct SharedReceiver {
    inner: Arc<Mutex<RequestReceiver>>,
}

#[async_trait]
impl RequestSource for SharedReceiver {
    async fn receive(&mut self) -> Result<Option<RequestMessage>, QueueError> {
        let mut rx = self.inner.lock().await;
        rx.receive().await
    }
}
