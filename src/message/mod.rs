//! Messages exchanged between the front-end and the gateway.
//!
//! # Data Flow
//! ```text
//! front-end (HTTP parts)
//!     → ingress.rs (classify body into a DataFormat)
//!     → RequestMessage (queued)
//!     → gateway loop
//!     → ResponseMessage (delivered back, keyed by Handle)
//! ```

pub mod format;
pub mod ingress;
pub mod request;
pub mod response;

pub use format::DataFormat;
pub use request::{Handle, RequestData, RequestMessage, RequestMeta};
pub use response::ResponseMessage;
