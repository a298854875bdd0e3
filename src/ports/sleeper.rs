//! Sleeper port for rate-limit pacing and retry backoff delays.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Boxed future type alias used by [`Sleeper`] to keep the trait dyn-compatible.
pub type SleepFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Suspends execution for a given duration.
///
/// All inter-batch pacing and retry backoff goes through this port so
/// that replayed runs complete instantly instead of sleeping for real.
pub trait Sleeper: Send + Sync {
    /// Sleeps for the given duration.
    fn sleep(&self, duration: Duration) -> SleepFuture<'_>;
}
