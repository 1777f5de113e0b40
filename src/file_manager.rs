//! # File Management Module
//!
//! Questo modulo gestisce la discovery dei container e l'apertura dei file.
//!
//! ## Responsabilità:
//! - Discovery ricorsiva dei file QuickTime/MP4 in una directory
//! - Apertura read-only con errori tipizzati (permessi, lock) PRIMA del core
//! - Informazioni su dimensione e modification time
//! - Formattazione human-readable di dimensioni e durate
//!
//! ## Formati supportati (default):
//! - MOV, MP4, M4V, M4A
//!
//! ## Esempio:
//! ```rust,ignore
//! let files = FileManager::find_container_files(&root, &config.extensions)?;
//! for file in files {
//!     let (handle, length) = FileManager::open_for_check(&file)?;
//! }
//! ```

use crate::error::CheckError;
use anyhow::Result;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use walkdir::WalkDir;

/// Extensions checked when none are configured
pub const DEFAULT_EXTENSIONS: [&str; 4] = ["mov", "mp4", "m4v", "m4a"];

/// Manages file discovery and opening
pub struct FileManager;

impl FileManager {
    /// Get information about a file (size and modification time)
    pub async fn get_file_info(path: &Path) -> Result<(u64, u64)> {
        let metadata = fs::metadata(path).await?;
        let size = metadata.len();
        let modified = metadata
            .modified()?
            .duration_since(SystemTime::UNIX_EPOCH)?
            .as_secs();
        Ok((size, modified))
    }

    /// Find all container files under `root`, sorted by path.
    ///
    /// A file passed directly is returned as is, whatever its extension.
    pub fn find_container_files(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
        if root.is_file() {
            return Ok(vec![root.to_path_buf()]);
        }
        if !root.is_dir() {
            return Err(CheckError::NotFound(root.to_path_buf()).into());
        }

        let mut files: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|path| Self::has_extension(path, extensions))
            .collect();

        files.sort();
        Ok(files)
    }

    /// Case-insensitive extension check
    pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
        match path.extension() {
            Some(ext) => {
                let ext_lower = ext.to_string_lossy().to_lowercase();
                extensions.iter().any(|e| *e == ext_lower)
            }
            None => false,
        }
    }

    /// Open a file read-only for checking, returning the handle and its length.
    ///
    /// Permission and lock failures surface as typed errors here, before the
    /// stream is handed to the integrity core.
    pub fn open_for_check(path: &Path) -> Result<(File, u64), CheckError> {
        let file = Self::read_only_options()
            .open(path)
            .map_err(|e| CheckError::from_open_error(path.to_path_buf(), e))?;
        let length = file.metadata()?.len();
        Ok((file, length))
    }

    #[cfg(windows)]
    fn read_only_options() -> OpenOptions {
        use std::os::windows::fs::OpenOptionsExt;

        // FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE
        let mut options = OpenOptions::new();
        options.read(true).share_mode(0x1 | 0x2 | 0x4);
        options
    }

    #[cfg(not(windows))]
    fn read_only_options() -> OpenOptions {
        let mut options = OpenOptions::new();
        options.read(true);
        options
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Format seconds as H:MM:SS.s
    pub fn format_duration(seconds: f64) -> String {
        let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        let hours = (seconds / 3600.0).floor() as u64;
        let minutes = ((seconds % 3600.0) / 60.0).floor() as u64;
        let secs = seconds % 60.0;
        format!("{}:{:02}:{:04.1}", hours, minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn default_extensions() -> Vec<String> {
        DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_find_container_files() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("day1").join("cam-b");
        std::fs::create_dir_all(&nested).unwrap();

        std::fs::write(temp_dir.path().join("b.MOV"), b"x").unwrap();
        std::fs::write(temp_dir.path().join("a.mp4"), b"x").unwrap();
        std::fs::write(nested.join("c.m4a"), b"x").unwrap();
        std::fs::write(nested.join("notes.txt"), b"x").unwrap();
        std::fs::write(nested.join("noext"), b"x").unwrap();

        let files = FileManager::find_container_files(temp_dir.path(), &default_extensions()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, ["a.mp4", "b.MOV", "c.m4a"]);
    }

    #[test]
    fn test_single_file_is_returned_as_is() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("recording.bin");
        std::fs::write(&path, b"x").unwrap();

        let files = FileManager::find_container_files(&path, &default_extensions()).unwrap();
        assert_eq!(files, vec![path]);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        assert!(FileManager::find_container_files(&missing, &default_extensions()).is_err());
    }

    #[test]
    fn test_open_for_check() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("clip.mov");
        std::fs::write(&path, vec![0u8; 123]).unwrap();

        let (_file, length) = FileManager::open_for_check(&path).unwrap();
        assert_eq!(length, 123);

        let err = FileManager::open_for_check(&temp_dir.path().join("gone.mov")).unwrap_err();
        assert!(matches!(err, CheckError::NotFound(_)));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(FileManager::format_size(512), "512 B");
        assert_eq!(FileManager::format_size(1536), "1.50 KB");
        assert_eq!(FileManager::format_size(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(FileManager::format_duration(0.0), "0:00:00.0");
        assert_eq!(FileManager::format_duration(90.5), "0:01:30.5");
        assert_eq!(FileManager::format_duration(3723.4), "1:02:03.4");
        assert_eq!(FileManager::format_duration(f64::NAN), "0:00:00.0");
    }
}
