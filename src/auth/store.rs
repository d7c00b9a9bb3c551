//! Bearer token persistence
//!
//! Exactly one value is persisted: the token string, under [`TOKEN_KEY`].

use parking_lot::RwLock;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Storage key for the bearer token
pub const TOKEN_KEY: &str = "jwt_token";

/// Shared get/set/clear access to the persisted token
pub trait TokenStore: Send + Sync {
    /// Current token, if any
    fn get(&self) -> Option<String>;

    /// Replace the stored token
    fn set(&self, token: &str) -> Result<()>;

    /// Remove the stored token. Clearing an empty store succeeds.
    fn clear(&self) -> Result<()>;
}

/// In-memory token store
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `token`
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn set(&self, token: &str) -> Result<()> {
        *self.token.write() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.token.write() = None;
        Ok(())
    }
}

/// Token stored in `<data_dir>/jwt_token` with owner-only permissions
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store the token under `data_dir`
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(TOKEN_KEY),
        }
    }

    /// Location of the token file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                (!token.is_empty()).then(|| token.to_string())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("Failed to read token from {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn set(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)?;
            // mode() only applies on create; tighten a pre-existing file too
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
            file.write_all(token.as_bytes())?;
        }

        #[cfg(not(unix))]
        {
            let mut file = fs::File::create(&self.path)?;
            file.write_all(token.as_bytes())?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
