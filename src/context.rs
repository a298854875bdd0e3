//! Service context wiring ports to concrete adapters.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::adapters::live::clock::LiveClock;
use crate::adapters::live::filesystem::LiveFileSystem;
use crate::adapters::live::llm::LiveLlmClient;
use crate::adapters::live::sleeper::LiveSleeper;
use crate::adapters::recording::{
    RecordingClock, RecordingFileSystem, RecordingLlmClient, RecordingSleeper,
};
use crate::adapters::replaying::{
    ReplayingClock, ReplayingFileSystem, ReplayingLlmClient, ReplayingSleeper,
};
use crate::cassette::config::CassetteConfig;
use crate::cassette::format::Cassette;
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::session::RecordingSession;
use crate::ports::{
    Clock, FileSystem, GenerationFuture, GenerationRequest, LlmClient, SleepFuture, Sleeper,
};

/// Holds one adapter per port. Commands and pipeline stages reach the
/// outside world only through this context, so swapping live adapters
/// for recorded or in-memory ones changes nothing downstream.
pub struct ServiceContext {
    /// Clock port adapter.
    pub clock: Box<dyn Clock>,
    /// Filesystem port adapter.
    pub fs: Box<dyn FileSystem>,
    /// Model client port adapter.
    pub llm: Box<dyn LlmClient>,
    /// Sleeper port adapter.
    pub sleeper: Box<dyn Sleeper>,
}

impl ServiceContext {
    /// Context backed by live adapters: real clock, real filesystem,
    /// real model API, real delays.
    #[must_use]
    pub fn live() -> Self {
        Self {
            clock: Box::new(LiveClock),
            fs: Box::new(LiveFileSystem),
            llm: Box::new(LiveLlmClient::new()),
            sleeper: Box::new(LiveSleeper),
        }
    }

    /// Context that runs live adapters while recording every interaction
    /// into per-port cassette files under `base`.
    ///
    /// The returned session must be finished (after dropping the context)
    /// to flush cassettes to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the recording directory cannot be created.
    pub fn recording_at(base: PathBuf) -> Result<(Self, RecordingSession), String> {
        let session = RecordingSession::new(base)?;

        let ctx = Self {
            clock: Box::new(RecordingClock::new(
                Box::new(LiveClock),
                Arc::clone(&session.clock),
            )),
            fs: Box::new(RecordingFileSystem::new(
                Box::new(LiveFileSystem),
                Arc::clone(&session.fs),
            )),
            llm: Box::new(RecordingLlmClient::new(
                Box::new(LiveLlmClient::new()),
                Arc::clone(&session.llm),
            )),
            sleeper: Box::new(RecordingSleeper::new(
                Box::new(LiveSleeper),
                Arc::clone(&session.sleeper),
            )),
        };

        Ok((ctx, session))
    }

    /// Context replaying a single monolithic cassette file. Every port
    /// reads from the same recorded interaction stream; sleeps complete
    /// instantly.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        let cassette: Cassette = serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))?;

        Ok(Self {
            clock: Box::new(ReplayingClock::new(CassetteReplayer::new(&cassette))),
            fs: Box::new(ReplayingFileSystem::new(CassetteReplayer::new(&cassette))),
            llm: Box::new(ReplayingLlmClient::new(CassetteReplayer::new(&cassette))),
            sleeper: Box::new(ReplayingSleeper),
        })
    }

    /// Context replaying per-port cassette files. Ports without a
    /// configured cassette get a panicking stub, so a test that touches
    /// an unexpected port fails loudly instead of silently.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette file cannot be read
    /// or parsed.
    pub fn replaying_from(config: &CassetteConfig) -> Result<Self, String> {
        let replayers = config.load_all()?;

        let clock: Box<dyn Clock> = match replayers.clock {
            Some(r) => Box::new(ReplayingClock::new(r)),
            None => Box::new(PanickingClock),
        };
        let fs: Box<dyn FileSystem> = match replayers.fs {
            Some(r) => Box::new(ReplayingFileSystem::new(r)),
            None => Box::new(PanickingFileSystem),
        };
        let llm: Box<dyn LlmClient> = match replayers.llm {
            Some(r) => Box::new(ReplayingLlmClient::new(r)),
            None => Box::new(PanickingLlmClient),
        };

        Ok(Self { clock, fs, llm, sleeper: Box::new(ReplayingSleeper) })
    }
}

/// Stub for the clock port when no cassette is configured.
struct PanickingClock;

impl Clock for PanickingClock {
    fn now(&self) -> DateTime<Utc> {
        panic!("Clock port not configured in CassetteConfig - no cassette loaded for clock")
    }
}

/// Stub for the filesystem port when no cassette is configured.
struct PanickingFileSystem;

impl FileSystem for PanickingFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, Box<dyn Error + Send + Sync>> {
        panic!(
            "FileSystem port not configured in CassetteConfig - no cassette loaded for fs \
             (read_to_string {})",
            path.display()
        )
    }

    fn write(&self, path: &Path, _contents: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        panic!(
            "FileSystem port not configured in CassetteConfig - no cassette loaded for fs \
             (write {})",
            path.display()
        )
    }

    fn exists(&self, path: &Path) -> bool {
        panic!(
            "FileSystem port not configured in CassetteConfig - no cassette loaded for fs \
             (exists {})",
            path.display()
        )
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<String>, Box<dyn Error + Send + Sync>> {
        panic!(
            "FileSystem port not configured in CassetteConfig - no cassette loaded for fs \
             (list_dir {})",
            path.display()
        )
    }
}

/// Stub for the model client port when no cassette is configured.
struct PanickingLlmClient;

impl LlmClient for PanickingLlmClient {
    fn generate(&self, _request: &GenerationRequest) -> GenerationFuture<'_> {
        panic!("LLM port not configured in CassetteConfig - no cassette loaded for llm")
    }
}

/// Sleeper stub used where a test configures its own context by hand
/// and should never hit a delay.
pub struct PanickingSleeper;

impl Sleeper for PanickingSleeper {
    fn sleep(&self, _duration: std::time::Duration) -> SleepFuture<'_> {
        panic!("Sleeper port called but this context was built without delays")
    }
}
