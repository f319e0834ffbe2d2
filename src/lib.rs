//! Queue-mediated request mirroring gateway.
//!
//! A front-end turns HTTP requests into [`message::RequestMessage`]s and
//! queues them; gateway loops take them one at a time, mirror the payload
//! according to its declared format and hand a [`message::ResponseMessage`]
//! back through a [`delivery::ResponseDelivery`] collaborator.

pub mod config;
pub mod delivery;
pub mod gateway;
pub mod lifecycle;
pub mod message;
pub mod observability;
pub mod queue;

pub use config::GatewayConfig;
pub use gateway::{GatewayHandle, GatewayLoop};
pub use lifecycle::Shutdown;
