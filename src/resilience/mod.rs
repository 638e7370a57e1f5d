//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Batch verification:
//!     → lookup via collaborator
//!     → pacing.rs (pause before the next lookup)
//!
//! Shutdown / bridge calls:
//!     → timeouts.rs (race the call against a deadline)
//! ```
//!
//! # Design Decisions
//! - Pacing protects the external account, not this process
//! - A deadline abandons the call; nothing is forcibly cancelled remotely

pub mod pacing;
pub mod timeouts;

pub use pacing::{pacer_from_config, FixedDelay, NoDelay, Pacer, TokenBucket};
pub use timeouts::race_deadline;
