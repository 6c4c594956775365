//! File-backed credential storage.
//!
//! Credentials live in `<auth_dir>/creds.json`. Writes go to a temporary
//! file in the same directory and are renamed into place, so a crash never
//! leaves a half-written file behind.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::port::CredentialStore;

const CREDS_FILE: &str = "creds.json";

/// Stores session credentials as pretty-printed JSON on disk.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(CREDS_FILE)
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Value>> {
        let content = match fs::read_to_string(self.path()) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn persist(&self, creds: &Value) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path();
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(creds)?)?;
        fs::rename(&tmp, &path)?;

        debug!(path = %path.display(), "Persisted session credentials");
        Ok(())
    }

    fn location(&self) -> String {
        self.path().display().to_string()
    }
}
