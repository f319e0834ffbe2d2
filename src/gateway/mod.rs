//! Request-mirroring gateway core.
//!
//! # Data Flow
//! ```text
//! inbound queue
//!     → worker.rs (GatewayLoop: receive, one request at a time)
//!     → dispatch.rs (select operation, mirror by data format)
//!     → temp_path.rs (fresh path for file-backed bodies)
//!     → worker.rs (build ResponseMessage)
//!     → ResponseDelivery
//! ```

pub mod dispatch;
pub mod error;
pub mod handle;
pub mod temp_path;
pub mod worker;

pub use dispatch::{dispatch, mirror, MirrorResult, Operation};
pub use error::{DispatchError, GatewayError};
pub use handle::GatewayHandle;
pub use temp_path::TempPathAllocator;
pub use worker::{build_response, GatewayLoop, LoopOutcome, StopReason};
