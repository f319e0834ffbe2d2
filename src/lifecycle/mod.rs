//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() → every subscribed gateway loop stops at its next receive
//!
//! Signals (signals.rs):
//!     SIGINT/Ctrl-C → trigger cancellation
//! ```
//!
//! # Design Decisions
//! - Graceful stop is the queue sentinel; this layer only cancels
//! - Cancellation never interrupts a request mid-flight

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
