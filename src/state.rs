//! # State Management Module
//!
//! Questo modulo ricorda quali file sono già stati verificati come integri.
//!
//! ## Responsabilità:
//! - Traccia i file verificati senza issue, con dimensione e modification time
//! - Persiste lo stato in file JSON per ogni root scansionata
//! - Permette di saltare file non modificati dalla verifica precedente
//! - Cleanup automatico di entry per file che non esistono più
//!
//! ## Strategia di persistence:
//! - Un file JSON per root (basato su hash del path)
//! - Salvataggio in `~/.mov-checker/verified_<hash>.json`
//! - Solo i file SENZA issue vengono registrati: un file corrotto viene
//!   sempre ricontrollato
//!
//! ## Esempio struttura state file:
//! ```json
//! {
//!   "verified_files": {
//!     "/media/clip.mov": {
//!       "path": "/media/clip.mov",
//!       "modified_time": 1642680000,
//!       "file_size": 1048576,
//!       "verified_at": 1642680000
//!     }
//!   }
//! }
//! ```

use crate::error::CheckError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// A file that passed the integrity check
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VerifiedFile {
    pub path: PathBuf,
    pub modified_time: u64,
    pub file_size: u64,
    pub verified_at: u64,
}

/// State file listing verified files
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct StateFile {
    pub verified_files: HashMap<String, VerifiedFile>,
}

/// Manages the verification state for one scanned root
pub struct StateManager {
    state_file_path: PathBuf,
    state: StateFile,
}

impl StateManager {
    /// Create a state manager under `~/.mov-checker`
    pub async fn new(root: &Path) -> Result<Self> {
        let state_dir = dirs::home_dir()
            .ok_or_else(|| CheckError::State("Could not find home directory".into()))?
            .join(".mov-checker");
        Self::with_state_dir(root, &state_dir).await
    }

    /// Create a state manager storing its file in `state_dir`
    pub async fn with_state_dir(root: &Path, state_dir: &Path) -> Result<Self> {
        fs::create_dir_all(state_dir).await?;

        let state_file_path = state_dir.join(format!("verified_{}.json", Self::root_hash(root)));

        let state = if state_file_path.exists() {
            let content = fs::read_to_string(&state_file_path).await?;
            serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Ignoring unreadable state file {}: {}", state_file_path.display(), e);
                StateFile::default()
            })
        } else {
            StateFile::default()
        };

        debug!(
            "Loaded {} verified entries from {}",
            state.verified_files.len(),
            state_file_path.display()
        );

        Ok(Self {
            state_file_path,
            state,
        })
    }

    /// First 16 hex chars of the SHA-256 of the root path
    fn root_hash(root: &Path) -> String {
        let mut hasher = Sha256::new();
        hasher.update(root.to_string_lossy().as_bytes());
        hex::encode(hasher.finalize())[..16].to_string()
    }

    pub fn state_file_path(&self) -> &Path {
        &self.state_file_path
    }

    /// Save current state to file
    pub async fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.state)?;
        fs::write(&self.state_file_path, content)
            .await
            .map_err(|e| CheckError::State(format!("{}: {}", self.state_file_path.display(), e)))?;
        Ok(())
    }

    /// True when the file was verified clean and is unchanged since
    pub fn is_verified(&self, file_path: &Path, file_size: u64, modified_time: u64) -> bool {
        self.state
            .verified_files
            .get(&*file_path.to_string_lossy())
            .map(|v| v.file_size == file_size && v.modified_time == modified_time)
            .unwrap_or(false)
    }

    /// Record a clean file
    pub async fn mark_verified(&mut self, verified: VerifiedFile) -> Result<()> {
        self.state
            .verified_files
            .insert(verified.path.to_string_lossy().to_string(), verified);
        self.save().await
    }

    /// Drop a file's record, e.g. after it was found to have issues
    pub async fn forget(&mut self, file_path: &Path) -> Result<()> {
        if self
            .state
            .verified_files
            .remove(&*file_path.to_string_lossy())
            .is_some()
        {
            self.save().await?;
        }
        Ok(())
    }

    /// Number of verified files on record
    pub fn verified_count(&self) -> usize {
        self.state.verified_files.len()
    }

    /// Clean up entries for files that no longer exist
    pub async fn cleanup(&mut self) -> Result<()> {
        let before = self.state.verified_files.len();
        self.state.verified_files.retain(|_, v| v.path.exists());

        let removed_count = before - self.state.verified_files.len();
        if removed_count > 0 {
            debug!("Removed {} stale verified entries", removed_count);
            self.save().await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn verified(path: &Path, file_size: u64, modified_time: u64) -> VerifiedFile {
        VerifiedFile {
            path: path.to_path_buf(),
            modified_time,
            file_size,
            verified_at: 1_700_000_000,
        }
    }

    #[tokio::test]
    async fn test_mark_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("media");
        let state_dir = temp_dir.path().join("state");
        let clip = root.join("clip.mov");

        let mut manager = StateManager::with_state_dir(&root, &state_dir).await.unwrap();
        assert!(!manager.is_verified(&clip, 100, 5));
        manager.mark_verified(verified(&clip, 100, 5)).await.unwrap();

        let reloaded = StateManager::with_state_dir(&root, &state_dir).await.unwrap();
        assert!(reloaded.is_verified(&clip, 100, 5));
        assert!(!reloaded.is_verified(&clip, 101, 5));
        assert!(!reloaded.is_verified(&clip, 100, 6));
        assert_eq!(reloaded.verified_count(), 1);
    }

    #[tokio::test]
    async fn test_state_files_are_per_root() {
        let temp_dir = TempDir::new().unwrap();
        let state_dir = temp_dir.path().join("state");
        let a = StateManager::with_state_dir(Path::new("/media/a"), &state_dir).await.unwrap();
        let b = StateManager::with_state_dir(Path::new("/media/b"), &state_dir).await.unwrap();
        assert_ne!(a.state_file_path(), b.state_file_path());
    }

    #[tokio::test]
    async fn test_forget_and_cleanup() {
        let temp_dir = TempDir::new().unwrap();
        let state_dir = temp_dir.path().join("state");
        let existing = temp_dir.path().join("kept.mov");
        std::fs::write(&existing, b"data").unwrap();
        let gone = temp_dir.path().join("deleted.mov");

        let mut manager = StateManager::with_state_dir(temp_dir.path(), &state_dir).await.unwrap();
        manager.mark_verified(verified(&existing, 4, 1)).await.unwrap();
        manager.mark_verified(verified(&gone, 4, 1)).await.unwrap();

        manager.cleanup().await.unwrap();
        assert_eq!(manager.verified_count(), 1);

        manager.forget(&existing).await.unwrap();
        assert_eq!(manager.verified_count(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_state_file_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let state_dir = temp_dir.path().join("state");
        let manager = StateManager::with_state_dir(temp_dir.path(), &state_dir).await.unwrap();
        std::fs::write(manager.state_file_path(), b"{ not json").unwrap();

        let reloaded = StateManager::with_state_dir(temp_dir.path(), &state_dir).await.unwrap();
        assert_eq!(reloaded.verified_count(), 0);
    }
}
