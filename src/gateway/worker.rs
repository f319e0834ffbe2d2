//! The gateway loop.
//!
//! # Responsibilities
//! - Pull one request at a time from the inbound queue
//! - Dispatch it and map the outcome (or error) to a response
//! - Hand the response to the delivery collaborator
//! - Stop on the queue sentinel or on a shutdown broadcast
//!
//! # Design Decisions
//! - Strictly sequential: a request, including its file copy, is fully
//!   handled before the next one is received
//! - Dispatch errors, panics included, become 500 responses and never end the loop
//! - Delivery errors are logged and the request is dropped (no retry)
//! - Only a queue failure ends the loop with an error

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::config::{GatewayConfig, HeaderConfig};
use crate::delivery::ResponseDelivery;
use crate::gateway::dispatch::{dispatch, MirrorResult};
use crate::gateway::error::{DispatchError, GatewayError};
use crate::message::response::{STATUS_INTERNAL_ERROR, STATUS_OK};
use crate::message::{Handle, RequestMessage, ResponseMessage};
use crate::observability::metrics;
use crate::queue::RequestSource;

/// Why a loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The sentinel message was received.
    Sentinel,
    /// The shutdown broadcast fired.
    Cancelled,
}

/// Summary returned by a loop that stopped cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopOutcome {
    pub reason: StopReason,
    /// Requests taken off the queue.
    pub processed: u64,
    /// Responses the delivery collaborator rejected.
    pub failed_deliveries: u64,
}

/// One gateway loop instance.
pub struct GatewayLoop<S, D> {
    id: usize,
    source: S,
    delivery: D,
    config: Arc<GatewayConfig>,
    shutdown: Option<broadcast::Receiver<()>>,
    processed: u64,
    failed_deliveries: u64,
}

impl<S: RequestSource, D: ResponseDelivery> GatewayLoop<S, D> {
    pub fn new(source: S, delivery: D, config: Arc<GatewayConfig>) -> Self {
        Self {
            id: 0,
            source,
            delivery,
            config,
            shutdown: None,
            processed: 0,
            failed_deliveries: 0,
        }
    }

    /// Identifier used in log lines.
    pub fn with_id(mut self, id: usize) -> Self {
        self.id = id;
        self
    }

    /// Stop the loop when `shutdown` fires, in addition to the sentinel.
    pub fn with_shutdown(mut self, shutdown: broadcast::Receiver<()>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Run until the sentinel arrives, shutdown fires, or the queue fails.
    pub async fn run(mut self) -> Result<LoopOutcome, GatewayError> {
        tracing::info!(worker = self.id, "Gateway loop started");

        loop {
            // Shutdown is checked first so a queued request is not taken
            // after cancellation has fired.
            let received = tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut self.shutdown) => None,
                received = self.source.receive() => Some(received),
            };
            let Some(received) = received else {
                tracing::info!(worker = self.id, processed = self.processed, "Gateway loop cancelled");
                return Ok(self.outcome(StopReason::Cancelled));
            };

            let request = match received {
                Ok(Some(request)) => request,
                Ok(None) => {
                    tracing::info!(worker = self.id, processed = self.processed, "Gateway loop shut down");
                    return Ok(self.outcome(StopReason::Sentinel));
                }
                Err(e) => {
                    tracing::error!(worker = self.id, error = %e, "Inbound queue failed");
                    metrics::record_queue_error();
                    return Err(e.into());
                }
            };

            self.processed += 1;
            self.handle(request).await;
        }
    }

    async fn handle(&mut self, request: RequestMessage) {
        let start = Instant::now();
        tracing::info!(
            worker = self.id,
            handle = %request.handle,
            uri = %request.meta.uri,
            args = %request.meta.args,
            format = %request.data.format,
            "Request received"
        );
        tracing::debug!(handle = %request.handle, request = ?request, "Request contents");

        let outcome = AssertUnwindSafe(dispatch(&self.config.worker, &request))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(DispatchError::Panicked(panic_message(panic.as_ref()))));
        if let Err(e) = &outcome {
            tracing::warn!(handle = %request.handle, error = %e, "Dispatch failed");
        }
        let response = build_response(&self.config.headers, request.handle, outcome);

        tracing::info!(
            worker = self.id,
            handle = %response.handle,
            status = response.status,
            headers = ?response.headers,
            "Sending response"
        );
        metrics::record_request(&request.data.format, response.status, start);

        let staged = response
            .file_path(&self.config.headers.data_file)
            .map(|p| p.to_path_buf());
        if let Err(e) = self.delivery.deliver(response) {
            self.failed_deliveries += 1;
            metrics::record_delivery_failure();
            tracing::error!(worker = self.id, handle = %request.handle, error = %e, "Response delivery failed");
            if let Some(path) = staged {
                // Nobody took ownership of the staged body.
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove undelivered body file");
                }
            }
        }
    }

    fn outcome(&self, reason: StopReason) -> LoopOutcome {
        LoopOutcome {
            reason,
            processed: self.processed,
            failed_deliveries: self.failed_deliveries,
        }
    }
}

/// Map a dispatch outcome to the response sent back for `handle`.
pub fn build_response(
    headers: &HeaderConfig,
    handle: Handle,
    outcome: Result<MirrorResult, DispatchError>,
) -> ResponseMessage {
    let response = ResponseMessage::new(handle, STATUS_OK)
        .with_header(headers.marker.name.clone(), headers.marker.value.clone());

    match outcome {
        Ok(MirrorResult::NoBody) => response,
        Ok(MirrorResult::InlineValue(value)) => response.with_data(value),
        Ok(MirrorResult::FileBacked(path)) => {
            response.with_header(headers.data_file.clone(), path.to_string_lossy())
        }
        Err(e) => ResponseMessage {
            status: STATUS_INTERNAL_ERROR,
            ..response.with_data(Value::String(e.to_string()))
        },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "dispatch panicked".to_string()
    }
}

async fn wait_for_shutdown(rx: &mut Option<broadcast::Receiver<()>>) {
    let closed = match rx.as_mut() {
        Some(inner) => matches!(
            inner.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ),
        None => true,
    };
    if closed {
        // Coordinator is gone; only the sentinel can stop us now.
        *rx = None;
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::{ChannelDelivery, DeliveryError};
    use crate::message::{RequestData, RequestMeta};
    use crate::queue::request_queue;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Mutex;

    fn config(dir: &std::path::Path) -> Arc<GatewayConfig> {
        let mut config = GatewayConfig::default();
        config.worker.response_body_temp_dir = dir.to_path_buf();
        Arc::new(config)
    }

    fn mirror_request(handle: i64, data: RequestData) -> RequestMessage {
        RequestMessage::new(Handle(handle), RequestMeta::new("/gateway", "mirror"), data)
    }

    /// Rejects every response, remembering what it was given.
    #[derive(Default)]
    struct RejectingDelivery {
        seen: Mutex<Vec<ResponseMessage>>,
    }

    impl ResponseDelivery for RejectingDelivery {
        fn deliver(&self, response: ResponseMessage) -> Result<(), DeliveryError> {
            let handle = response.handle;
            self.seen.lock().unwrap().push(response);
            Err(DeliveryError::UnknownHandle(handle))
        }
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "dispatch panicked");
    }

    #[test]
    fn test_build_response_mapping() {
        let headers = HeaderConfig::default();
        let handle = Handle(5);

        let resp = build_response(&headers, handle, Ok(MirrorResult::NoBody));
        assert_eq!(resp.status, 200);
        assert_eq!(resp.data, None);
        assert_eq!(resp.headers.get("X-Foo-Bar").map(String::as_str), Some("Baz"));
        assert_eq!(resp.headers.len(), 1);

        let resp = build_response(&headers, handle, Ok(MirrorResult::InlineValue(json!([1, 2]))));
        assert_eq!(resp.data, Some(json!([1, 2])));

        let resp = build_response(
            &headers,
            handle,
            Ok(MirrorResult::FileBacked(PathBuf::from("/tmp/x"))),
        );
        assert_eq!(resp.status, 200);
        assert_eq!(resp.data, None);
        assert_eq!(resp.file_path(&headers.data_file), Some(std::path::Path::new("/tmp/x")));

        let resp = build_response(&headers, handle, Err(DispatchError::UnknownFormat("xml".into())));
        assert_eq!(resp.status, 500);
        assert_eq!(resp.handle, handle);
        assert!(resp.data.unwrap().as_str().unwrap().contains("xml"));
        assert!(resp.headers.contains_key("X-Foo-Bar"));
    }

    #[tokio::test]
    async fn test_loop_processes_in_order_and_stops_on_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = request_queue(16);
        let (delivery, mut responses) = ChannelDelivery::new();

        tx.send(mirror_request(1, RequestData::json(json!({ "foo": 42 })))).await.unwrap();
        tx.send(mirror_request(2, RequestData::string("foobar"))).await.unwrap();
        tx.send(mirror_request(3, RequestData::tagged("xml"))).await.unwrap();
        tx.send(mirror_request(4, RequestData::none())).await.unwrap();
        tx.close().await.unwrap();

        let outcome = GatewayLoop::new(rx, delivery, config(dir.path())).run().await.unwrap();
        assert_eq!(outcome.reason, StopReason::Sentinel);
        assert_eq!(outcome.processed, 4);
        assert_eq!(outcome.failed_deliveries, 0);

        let first = responses.recv().await.unwrap();
        assert_eq!((first.handle, first.status), (Handle(1), 200));
        assert_eq!(first.data, Some(json!({ "foo": 42 })));

        let second = responses.recv().await.unwrap();
        assert_eq!(second.data, Some(json!("foobar")));

        let third = responses.recv().await.unwrap();
        assert_eq!(third.status, 500);

        let fourth = responses.recv().await.unwrap();
        assert_eq!((fourth.status, fourth.data.clone()), (200, None));

        // No response for the sentinel.
        assert!(responses.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_stop_loop() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src.bin");
        std::fs::write(&source, b"payload").unwrap();
        let tmp = dir.path().join("bodies");
        std::fs::create_dir(&tmp).unwrap();

        let (tx, rx) = request_queue(4);
        tx.send(mirror_request(1, RequestData::file(&source))).await.unwrap();
        tx.send(mirror_request(2, RequestData::string("x"))).await.unwrap();
        tx.close().await.unwrap();

        let delivery = Arc::new(RejectingDelivery::default());
        let outcome = GatewayLoop::new(rx, delivery.clone(), config(&tmp)).run().await.unwrap();

        assert_eq!(outcome.processed, 2);
        assert_eq!(outcome.failed_deliveries, 2);
        assert_eq!(delivery.seen.lock().unwrap().len(), 2);
        // The undelivered staged body was cleaned up.
        assert_eq!(std::fs::read_dir(&tmp).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_queue_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = request_queue(4);
        let (delivery, _responses) = ChannelDelivery::new();
        drop(tx);

        let err = GatewayLoop::new(rx, delivery, config(dir.path())).run().await.unwrap_err();
        assert!(matches!(err, GatewayError::Queue(_)));
    }

    #[tokio::test]
    async fn test_shutdown_broadcast_cancels_idle_loop() {
        let dir = tempfile::tempdir().unwrap();
        let (_tx, rx) = request_queue(4);
        let (delivery, _responses) = ChannelDelivery::new();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = tokio::spawn(
            GatewayLoop::new(rx, delivery, config(dir.path()))
                .with_shutdown(shutdown_rx)
                .run(),
        );
        shutdown_tx.send(()).unwrap();

        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome.reason, StopReason::Cancelled);
        assert_eq!(outcome.processed, 0);
    }

    #[tokio::test]
    async fn test_shutdown_wins_over_queued_request() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = request_queue(4);
        let (delivery, mut responses) = ChannelDelivery::new();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        tx.send(mirror_request(1, RequestData::string("late"))).await.unwrap();
        tx.send(mirror_request(2, RequestData::string("later"))).await.unwrap();
        shutdown_tx.send(()).unwrap();

        let outcome = GatewayLoop::new(rx, delivery, config(dir.path()))
            .with_shutdown(shutdown_rx)
            .run()
            .await
            .unwrap();

        assert_eq!(outcome.reason, StopReason::Cancelled);
        assert_eq!(outcome.processed, 0);
        assert!(responses.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dropped_coordinator_does_not_stop_loop() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = request_queue(4);
        let (delivery, mut responses) = ChannelDelivery::new();
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        drop(shutdown_tx);

        let task = tokio::spawn(
            GatewayLoop::new(rx, delivery, config(dir.path()))
                .with_shutdown(shutdown_rx)
                .run(),
        );
        tx.send(mirror_request(1, RequestData::none())).await.unwrap();
        assert_eq!(responses.recv().await.unwrap().handle, Handle(1));
        tx.close().await.unwrap();

        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome.reason, StopReason::Sentinel);
    }
}
