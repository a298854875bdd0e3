//! Recording adapter for the `FileSystem` port.

use std::error::Error;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde_json::json;

use super::{record_interaction, record_result};
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::filesystem::FileSystem;

/// Records filesystem interactions while delegating to an inner implementation.
pub struct RecordingFileSystem {
    inner: Box<dyn FileSystem>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingFileSystem {
    /// Creates a new recording filesystem wrapping the given implementation.
    pub fn new(inner: Box<dyn FileSystem>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl FileSystem for RecordingFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, Box<dyn Error + Send + Sync>> {
        let result = self.inner.read_to_string(path);
        record_result(
            &self.recorder,
            "fs",
            "read_to_string",
            &json!({ "path": path.display().to_string() }),
            &result,
        );
        result
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        let result = self.inner.write(path, contents);
        record_result(
            &self.recorder,
            "fs",
            "write",
            &json!({ "path": path.display().to_string(), "contents": contents }),
            &result,
        );
        result
    }

    fn exists(&self, path: &Path) -> bool {
        let exists = self.inner.exists(path);
        record_interaction(
            &self.recorder,
            "fs",
            "exists",
            &json!({ "path": path.display().to_string() }),
            &exists,
        );
        exists
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<String>, Box<dyn Error + Send + Sync>> {
        let result = self.inner.list_dir(path);
        record_result(
            &self.recorder,
            "fs",
            "list_dir",
            &json!({ "path": path.display().to_string() }),
            &result,
        );
        result
    }
}
