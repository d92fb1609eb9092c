//! File-backed persistence for the session tokens
//!
//! The token file is the only durable session state: created on
//! authentication, rewritten on refresh, deleted on logout.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

use crate::constants::TOKEN_EXPIRY_LEEWAY_SECS;

/// Durable form of an authenticated session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// When the access token stops being accepted. None means unknown and is
    /// treated as already expired.
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredTokens {
    /// Whether the access token is still usable, with leeway so it does not
    /// expire mid-request.
    pub fn is_valid(&self) -> bool {
        match self.expires_at {
            Some(at) => at - Duration::seconds(TOKEN_EXPIRY_LEEWAY_SECS) > Utc::now(),
            None => false,
        }
    }
}

pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<StoredTokens> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read token file: {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid token file: {}", self.path.display()))
    }

    /// Write the token file with owner-only permissions.
    pub fn persist(&self, tokens: &StoredTokens) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(tokens)?;

        #[cfg(unix)]
        {
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)?;
            file.write_all(json.as_bytes())?;
        }

        #[cfg(not(unix))]
        fs::write(&self.path, json)?;

        Ok(())
    }

    /// Delete the token file. Returns whether a file was actually removed.
    pub fn invalidate(&self) -> Result<bool> {
        if self.path.exists() {
            fs::remove_file(&self.path).with_context(|| {
                format!("Failed to delete token file: {}", self.path.display())
            })?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
