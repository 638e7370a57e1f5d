//! Timeout enforcement.
//!
//! # Responsibilities
//! - Race an operation against a deadline
//! - Report expiry as `None` instead of an error type
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - On expiry the operation is dropped, not awaited; work it already handed
//!   to another task keeps running

use std::future::Future;
use std::time::Duration;

/// Run `fut` until it completes or `deadline` elapses, whichever is first.
pub async fn race_deadline<F>(fut: F, deadline: Duration) -> Option<F::Output>
where
    F: Future,
{
    tokio::time::timeout(deadline, fut).await.ok()
}
