//! Running a pool of gateway loops on one queue.
//!
//! # Responsibilities
//! - Prepare the response body temp directory
//! - Create the inbound queue and spawn `worker.workers` loops on it
//! - Stop them, either by sentinel (drains what is already queued) or by
//!   cancellation (stops at the next receive)

use std::io;
use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::{GatewayConfig, WorkerConfig};
use crate::delivery::ResponseDelivery;
use crate::gateway::error::GatewayError;
use crate::gateway::worker::{GatewayLoop, LoopOutcome};
use crate::lifecycle::Shutdown;
use crate::message::RequestMessage;
use crate::queue::{request_queue, QueueError, RequestSender};

/// Owner of a set of running gateway loops.
pub struct GatewayHandle {
    sender: RequestSender,
    shutdown: Shutdown,
    workers: Vec<JoinHandle<Result<LoopOutcome, GatewayError>>>,
}

impl GatewayHandle {
    /// Spawn the configured number of loops sharing one queue and `delivery`.
    pub async fn start<D>(config: Arc<GatewayConfig>, delivery: D) -> Result<Self, GatewayError>
    where
        D: ResponseDelivery + Clone + 'static,
    {
        prepare_temp_dir(&config.worker).await?;

        let (sender, receiver) = request_queue(config.worker.requests_queue_size);
        let receiver = receiver.shared();
        let shutdown = Shutdown::new();

        let workers = (0..config.worker.workers)
            .map(|id| {
                let gateway = GatewayLoop::new(receiver.clone(), delivery.clone(), config.clone())
                    .with_id(id)
                    .with_shutdown(shutdown.subscribe());
                tokio::spawn(gateway.run())
            })
            .collect::<Vec<_>>();

        tracing::info!(
            workers = workers.len(),
            queue_size = config.worker.requests_queue_size,
            temp_dir = %config.worker.response_body_temp_dir.display(),
            "Gateway started"
        );

        Ok(Self {
            sender,
            shutdown,
            workers,
        })
    }

    /// A producer handle for the front-end.
    pub fn sender(&self) -> RequestSender {
        self.sender.clone()
    }

    /// Enqueue without waiting.
    pub fn offer(&self, request: RequestMessage) -> Result<(), QueueError> {
        let handle = request.handle;
        self.sender.offer(request).map_err(|e| {
            tracing::error!(handle = %handle, error = %e, "Error enqueuing request");
            e
        })
    }

    /// Enqueue, waiting for queue capacity.
    pub async fn send(&self, request: RequestMessage) -> Result<(), QueueError> {
        self.sender.send(request).await
    }

    /// Coordinator that cancels these loops; usable after the handle moves.
    pub fn canceller(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Ask every loop to stop at its next receive, leaving queued requests unhandled.
    pub fn cancel(&self) {
        tracing::info!("Gateway cancellation requested");
        self.shutdown.trigger();
    }

    /// Queue one sentinel per loop and wait for all of them to stop.
    ///
    /// Requests queued before this call are still answered.
    pub async fn shutdown(self) -> Result<Vec<LoopOutcome>, GatewayError> {
        for _ in 0..self.workers.len() {
            if self.sender.close().await.is_err() {
                break;
            }
        }
        self.join().await
    }

    /// Wait for every loop to stop, returning the first error if any failed.
    pub async fn join(self) -> Result<Vec<LoopOutcome>, GatewayError> {
        let mut outcomes = Vec::with_capacity(self.workers.len());
        let mut first_error = None;

        for worker in self.workers {
            let result = worker
                .await
                .map_err(|e| GatewayError::Join(e.to_string()))
                .and_then(|r| r);
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::error!(error = %e, "Gateway loop failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                tracing::info!("App shut down");
                Ok(outcomes)
            }
        }
    }
}

async fn prepare_temp_dir(config: &WorkerConfig) -> Result<(), GatewayError> {
    let dir = &config.response_body_temp_dir;
    let result = if config.create_temp_dir {
        tokio::fs::create_dir_all(dir).await
    } else {
        ensure_dir(dir).await
    };
    result.map_err(|error| GatewayError::TempDir {
        path: dir.clone(),
        error,
    })
}

async fn ensure_dir(dir: &Path) -> io::Result<()> {
    let meta = tokio::fs::metadata(dir).await?;
    if meta.is_dir() {
        Ok(())
    } else {
        Err(io::Error::new(io::ErrorKind::Other, "not a directory"))
    }
}
