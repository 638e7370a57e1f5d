//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Bind listener → Serve → Initialize client
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown (once)
//!
//! Shutdown (shutdown.rs):
//!     Stop accepting → destroy() raced against deadline → Exit 0
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{teardown_session, Shutdown, TeardownOutcome};
pub use startup::{run_until, serve_until, StartupError};
