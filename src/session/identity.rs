// src/session/identity.rs
//! Durable player identifier
//!
//! The id lives in a single UTF-8 file. A missing or empty file yields a
//! fresh `player_<unix-seconds>_<4 digits>` id which is written back; if
//! that write fails the id still serves the current process. A file that
//! exists but cannot be read is left untouched.

use crate::utils::errors::{Result, TokebiError};
use rand::Rng;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What the id file held
enum Stored {
    Found(String),
    /// Missing or blank
    Absent,
    Unreadable(io::Error),
}

/// File-backed player id store
#[derive(Debug, Clone)]
pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the persisted id, creating and persisting one if needed
    pub fn get_or_create_player_id(&self) -> String {
        match self.read_existing() {
            Stored::Found(existing) => {
                debug!("Loaded player id from {:?}", self.path);
                existing
            }
            Stored::Absent => {
                let id = generate_player_id();
                if let Err(e) = self.persist(&id) {
                    warn!("Player id will not survive a restart: {}", e);
                }
                id
            }
            Stored::Unreadable(e) => {
                warn!("Cannot read player id from {:?} ({}), using a temporary id", self.path, e);
                generate_player_id()
            }
        }
    }

    fn read_existing(&self) -> Stored {
        match fs::read_to_string(&self.path) {
            Ok(text) => {
                let id = text.trim();
                if id.is_empty() {
                    Stored::Absent
                } else {
                    Stored::Found(id.to_string())
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Stored::Absent,
            Err(e) => Stored::Unreadable(e),
        }
    }

    fn persist(&self, id: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                TokebiError::IdentityFailed(format!("Failed to create {:?}: {}", parent, e))
            })?;
        }
        fs::write(&self.path, id).map_err(|e| {
            TokebiError::IdentityFailed(format!("Failed to write {:?}: {}", self.path, e))
        })?;
        Ok(())
    }
}

/// New identifier: `player_<unix-seconds>_<1000-9999>`
pub fn generate_player_id() -> String {
    let suffix: u16 = rand::thread_rng().gen_range(1000..10000);
    format!("player_{}_{}", chrono::Utc::now().timestamp(), suffix)
}
