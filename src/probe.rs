//! # Duration Probe Module
//!
//! Questo modulo ottiene la durata totale di un file tramite `ffprobe`.
//!
//! ## Responsabilità:
//! - Risoluzione del binario ffprobe (path esplicito, bundled o di sistema)
//! - Esecuzione con timeout: il probe è l'unica operazione lenta e bloccante
//! - Parsing del campo `format.duration` dall'output JSON
//!
//! ## Contratto con il core:
//! Il core riceve soltanto un numero di secondi non negativo. Qualsiasi
//! fallimento (tool mancante, timeout, output illeggibile, durata "N/A")
//! diventa `0.0`, cioè "durata sconosciuta".
//!
//! ## Esempio:
//! ```rust,ignore
//! let probe = FfprobeDurationProbe::from_config(&config)?;
//! let seconds = probe.try_probe(&video_path).await.unwrap_or(0.0);
//! let result = check_file(&video_path, || seconds);
//! ```

use crate::config::Config;
use crate::error::CheckError;
use crate::platform::PlatformCommands;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Probes total playback duration with ffprobe
#[derive(Debug, Clone)]
pub struct FfprobeDurationProbe {
    ffprobe: PathBuf,
    timeout: Duration,
}

impl FfprobeDurationProbe {
    pub fn new(ffprobe: PathBuf, timeout: Duration) -> Self {
        Self { ffprobe, timeout }
    }

    /// Resolve ffprobe from the configuration or the platform tool lookup
    pub fn from_config(config: &Config) -> Result<Self, CheckError> {
        let timeout = Duration::from_secs(config.probe_timeout_secs);

        if let Some(ref explicit) = config.ffprobe_path {
            return Ok(Self::new(explicit.clone(), timeout));
        }

        PlatformCommands::instance()
            .require_tool("ffprobe")
            .map(|path| Self::new(path, timeout))
            .map_err(CheckError::MissingDependency)
    }

    pub fn ffprobe_path(&self) -> &Path {
        &self.ffprobe
    }

    /// Run ffprobe and parse its reported duration
    pub async fn try_probe(&self, video_path: &Path) -> Result<f64, CheckError> {
        let mut cmd = Command::new(&self.ffprobe);
        cmd.args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(video_path)
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                CheckError::Probe(format!("ffprobe timed out after {}s", self.timeout.as_secs()))
            })?
            .map_err(|e| {
                CheckError::Probe(format!("Failed to execute {}: {}", self.ffprobe.display(), e))
            })?;

        if !output.status.success() {
            return Err(CheckError::Probe(format!(
                "ffprobe exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let duration = parse_duration(&output.stdout)?;
        debug!("Probed duration of {}: {:.3}s", video_path.display(), duration);
        Ok(duration)
    }
}

/// Extract `format.duration` from ffprobe's JSON output
pub fn parse_duration(stdout: &[u8]) -> Result<f64, CheckError> {
    let info: serde_json::Value = serde_json::from_slice(stdout)
        .map_err(|e| CheckError::Probe(format!("Invalid ffprobe output: {}", e)))?;

    let duration = &info["format"]["duration"];
    let seconds = duration
        .as_str()
        .and_then(|d| d.trim().parse::<f64>().ok())
        .or_else(|| duration.as_f64())
        .ok_or_else(|| CheckError::Probe(format!("No usable duration in ffprobe output: {}", duration)))?;

    if seconds.is_finite() && seconds >= 0.0 {
        Ok(seconds)
    } else {
        Err(CheckError::Probe(format!("Invalid duration value: {}", seconds)))
    }
}
