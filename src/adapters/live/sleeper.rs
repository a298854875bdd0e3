//! Live sleeper adapter using `tokio::time::sleep`.

use std::time::Duration;

use crate::ports::sleeper::{SleepFuture, Sleeper};

/// Live sleeper that actually suspends the task.
pub struct LiveSleeper;

impl Sleeper for LiveSleeper {
    fn sleep(&self, duration: Duration) -> SleepFuture<'_> {
        Box::pin(tokio::time::sleep(duration))
    }
}
