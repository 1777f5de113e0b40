//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione del checker.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri della scansione
//! - Fornisce validazione dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `probe_duration`: Usa ffprobe per la durata totale (default: true)
//! - `probe_timeout_secs`: Timeout del probe in secondi (1-600, default: 30)
//! - `ffprobe_path`: Path esplicito di ffprobe (default: None = ricerca automatica)
//! - `extensions`: Estensioni da controllare (default: mov, mp4, m4v, m4a)
//! - `json_output`: Eventi JSON su stdout (default: false)
//! - `skip_verified`: Salta file già verificati e non modificati (default: false)
//! - `fail_on_issues`: Exit code 1 se un file ha problemi (default: true)
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config {
//!     probe_duration: false,
//!     json_output: true,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use crate::error::CheckError;
use crate::file_manager::DEFAULT_EXTENSIONS;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for an integrity scan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Probe total duration with ffprobe
    pub probe_duration: bool,
    /// Seconds before a duration probe is abandoned
    pub probe_timeout_secs: u64,
    /// Explicit ffprobe binary (None = resolve automatically)
    pub ffprobe_path: Option<PathBuf>,
    /// File extensions to check, lowercase, without dot
    pub extensions: Vec<String>,
    /// Output results as JSON lines for programmatic use
    pub json_output: bool,
    /// Skip files verified clean in a previous run and unchanged since
    pub skip_verified: bool,
    /// Exit with a failure status when any file has issues
    pub fail_on_issues: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            probe_duration: true,
            probe_timeout_secs: 30,
            ffprobe_path: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            json_output: false,
            skip_verified: false,
            fail_on_issues: true,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.probe_timeout_secs == 0 || self.probe_timeout_secs > 600 {
            return Err(CheckError::Config("Probe timeout must be between 1 and 600 seconds".into()).into());
        }

        if self.extensions.is_empty() {
            return Err(CheckError::Config("At least one file extension is required".into()).into());
        }

        for ext in &self.extensions {
            if ext.is_empty() || ext.starts_with('.') || *ext != ext.to_lowercase() {
                return Err(CheckError::Config(format!(
                    "Invalid extension '{}': use lowercase without a leading dot",
                    ext
                ))
                .into());
            }
        }

        if let Some(ref ffprobe) = self.ffprobe_path {
            if !ffprobe.is_file() {
                return Err(CheckError::Config(format!(
                    "ffprobe path is not a file: {}",
                    ffprobe.display()
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Lowercase and strip leading dots from user-supplied extensions
    pub fn normalize_extensions(extensions: &[String]) -> Vec<String> {
        extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect()
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.probe_timeout_secs = 0;
        assert!(config.validate().is_err());

        config.probe_timeout_secs = 30;
        config.extensions = vec![];
        assert!(config.validate().is_err());

        config.extensions = vec![".MOV".to_string()];
        assert!(config.validate().is_err());

        config.extensions = vec!["mov".to_string()];
        config.ffprobe_path = Some(PathBuf::from("/definitely/not/here/ffprobe"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.probe_duration);
        assert_eq!(config.probe_timeout_secs, 30);
        assert_eq!(config.extensions, ["mov", "mp4", "m4v", "m4a"]);
        assert!(!config.json_output);
        assert!(!config.skip_verified);
        assert!(config.fail_on_issues);
    }

    #[test]
    fn test_normalize_extensions() {
        let raw = vec![".MOV".to_string(), " mp4 ".to_string(), "".to_string()];
        assert_eq!(Config::normalize_extensions(&raw), ["mov", "mp4"]);
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let original_config = Config {
            probe_duration: false,
            probe_timeout_secs: 45,
            extensions: vec!["mov".to_string()],
            json_output: true,
            ..Default::default()
        };

        original_config.save_to_file(&config_path).await.unwrap();
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert!(!loaded_config.probe_duration);
        assert_eq!(loaded_config.probe_timeout_secs, 45);
        assert_eq!(loaded_config.extensions, ["mov"]);
        assert!(loaded_config.json_output);
        assert!(loaded_config.fail_on_issues);
    }

    #[tokio::test]
    async fn test_partial_config_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        tokio::fs::write(&config_path, r#"{ "skip_verified": true }"#).await.unwrap();

        let config = Config::from_file(&config_path).await.unwrap();
        assert!(config.skip_verified);
        assert_eq!(config.probe_timeout_secs, 30);
    }

    #[tokio::test]
    async fn test_missing_config_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::from_file(&temp_dir.path().join("absent.json")).await.unwrap();
        assert_eq!(config.probe_timeout_secs, 30);
    }
}
