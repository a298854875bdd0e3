//! Replaying adapter for the `Sleeper` port.

use std::time::Duration;

use crate::ports::sleeper::{SleepFuture, Sleeper};

/// Returns immediately instead of sleeping.
///
/// Sleeps carry no output, so replay does not consult the cassette:
/// the same cassette replays correctly whether or not delays were
/// recorded, and replayed runs finish without waiting out retry or
/// batch delays.
pub struct ReplayingSleeper;

impl Sleeper for ReplayingSleeper {
    fn sleep(&self, _duration: Duration) -> SleepFuture<'_> {
        Box::pin(std::future::ready(()))
    }
}
