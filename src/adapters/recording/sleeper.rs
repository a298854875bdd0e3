//! Recording adapter for the `Sleeper` port.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use super::record_interaction;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::sleeper::{SleepFuture, Sleeper};

/// Records sleep requests while delegating to an inner implementation.
///
/// Sleeps have no output, so the interaction is recorded with a null
/// output. Replay skips sleeps entirely rather than consuming entries.
pub struct RecordingSleeper {
    inner: Box<dyn Sleeper>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingSleeper {
    /// Creates a new recording sleeper wrapping the given implementation.
    pub fn new(inner: Box<dyn Sleeper>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) -> SleepFuture<'_> {
        record_interaction(
            &self.recorder,
            "sleeper",
            "sleep",
            &json!({ "duration_ms": u64::try_from(duration.as_millis()).unwrap_or(u64::MAX) }),
            &serde_json::Value::Null,
        );
        self.inner.sleep(duration)
    }
}
