//! Persisted authentication state.
//!
//! The store treats the state as an opaque blob: it moves JSON between disk
//! and [`AuthState`] and nothing more. Mapping the contents onto a live
//! browsing context is the session layer's business.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use {
    serde::{Deserialize, Serialize},
    thiserror::Error,
};

/// Captured identity for the target site: cookies plus the app origin's
/// localStorage. Replaced wholesale on re-login, never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthState {
    #[serde(default)]
    pub cookies: Vec<Cookie>,
    #[serde(default)]
    pub local_storage: HashMap<String, String>,
}

impl AuthState {
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty() && self.local_storage.is_empty()
    }
}

/// One captured cookie.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub path: String,
    /// Unix timestamp; `None` for session cookies.
    #[serde(default)]
    pub expires: Option<f64>,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub same_site: Option<String>,
}

#[derive(Debug, Error)]
pub enum AuthStoreError {
    #[error("auth state read failed: {0}")]
    Read(std::io::Error),

    #[error("auth state is not valid JSON: {0}")]
    Parse(serde_json::Error),

    #[error("auth state encode failed: {0}")]
    Encode(serde_json::Error),

    #[error("auth state write failed: {0}")]
    Write(std::io::Error),
}

/// File-backed credential store with atomic writes.
pub struct AuthStore {
    path: PathBuf,
}

impl AuthStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved state. A missing file is not an error (it signals
    /// first run), but a present, unparseable file is.
    pub fn load(&self) -> Result<Option<AuthState>, AuthStoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AuthStoreError::Read(err)),
        };
        let state = serde_json::from_str(&raw).map_err(AuthStoreError::Parse)?;
        Ok(Some(state))
    }

    /// Save the state atomically via temp file + rename, so a crash mid-write
    /// never leaves a truncated file that `load` would choke on.
    pub fn save(&self, state: &AuthState) -> Result<(), AuthStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(AuthStoreError::Write)?;
        }
        let data = serde_json::to_string_pretty(state).map_err(AuthStoreError::Encode)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, data).map_err(AuthStoreError::Write)?;
        std::fs::rename(&tmp, &self.path).map_err(AuthStoreError::Write)?;
        Ok(())
    }
}
