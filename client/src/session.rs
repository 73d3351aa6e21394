//! Durable storage for the operator's bearer token.
//!
//! The token is the only client state that survives a restart. It is
//! written after a successful login or registration and cleared on logout
//! or on any 401 from the Registry.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::ApiError;

/// Where the opaque session token lives.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, ApiError>;
    fn save(&self, token: &str) -> Result<(), ApiError>;
    fn clear(&self) -> Result<(), ApiError>;
}

/// On-disk layout of the session file.
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    token: String,
}

/// Token persisted as a small JSON file.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, ApiError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ApiError::Storage(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };

        // A corrupt session file is treated as logged out rather than fatal.
        match serde_json::from_str::<SessionFile>(&contents) {
            Ok(file) if !file.token.is_empty() => Ok(Some(file.token)),
            Ok(_) => Ok(None),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "ignoring unreadable session file: {e}");
                Ok(None)
            }
        }
    }

    fn save(&self, token: &str) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ApiError::Storage(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        let body = serde_json::to_string(&SessionFile {
            token: token.to_string(),
        })
        .map_err(|e| ApiError::Storage(e.to_string()))?;
        std::fs::write(&self.path, body).map_err(|e| {
            ApiError::Storage(format!("failed to write {}: {e}", self.path.display()))
        })
    }

    fn clear(&self) -> Result<(), ApiError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ApiError::Storage(format!(
                "failed to remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}

/// Process-local token, for tests and one-shot runs.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, ApiError> {
        self.token
            .lock()
            .map_err(|_| ApiError::Storage("token lock poisoned".into()))
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, ApiError> {
        Ok(self.lock()?.clone())
    }

    fn save(&self, token: &str) -> Result<(), ApiError> {
        *self.lock()? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), ApiError> {
        *self.lock()? = None;
        Ok(())
    }
}
