//! Replaying adapter for the `FileSystem` port.

use std::error::Error;
use std::path::Path;
use std::sync::Mutex;

use super::extract_result;
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::filesystem::FileSystem;

/// Serves recorded filesystem interactions from a cassette.
pub struct ReplayingFileSystem {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingFileSystem {
    /// Creates a new replaying filesystem from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl FileSystem for ReplayingFileSystem {
    fn read_to_string(&self, _path: &Path) -> Result<String, Box<dyn Error + Send + Sync>> {
        let mut replayer = self.replayer.lock().expect("replayer lock poisoned");
        let interaction = replayer.next_interaction("fs", "read_to_string");
        match extract_result(&interaction.output, "fs", "read_to_string") {
            Ok(value) => Ok(value
                .as_str()
                .expect("recorded read_to_string output is not a string")
                .to_string()),
            Err(message) => Err(message.into()),
        }
    }

    fn write(&self, _path: &Path, _contents: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut replayer = self.replayer.lock().expect("replayer lock poisoned");
        let interaction = replayer.next_interaction("fs", "write");
        match extract_result(&interaction.output, "fs", "write") {
            Ok(_) => Ok(()),
            Err(message) => Err(message.into()),
        }
    }

    fn exists(&self, _path: &Path) -> bool {
        let mut replayer = self.replayer.lock().expect("replayer lock poisoned");
        let interaction = replayer.next_interaction("fs", "exists");
        interaction.output.as_bool().expect("recorded exists output is not a boolean")
    }

    fn list_dir(&self, _path: &Path) -> Result<Vec<String>, Box<dyn Error + Send + Sync>> {
        let mut replayer = self.replayer.lock().expect("replayer lock poisoned");
        let interaction = replayer.next_interaction("fs", "list_dir");
        match extract_result(&interaction.output, "fs", "list_dir") {
            Ok(value) => {
                let entries: Vec<String> = serde_json::from_value(value)
                    .expect("recorded list_dir output is not a string array");
                Ok(entries)
            }
            Err(message) => Err(message.into()),
        }
    }
}
