//! # Integrity Scanner Orchestrator
//!
//! Orchestratore della scansione: trova i file, ottiene la durata, esegue il
//! core su ogni file e riporta i risultati.
//!
//! ## Flusso di esecuzione:
//! 1. Discovery dei container sotto la root (o singolo file)
//! 2. Risoluzione di ffprobe (se manca: warning, durata = 0)
//! 3. Per ogni file, IN SEQUENZA:
//!    - controllo cancellazione (solo tra un file e l'altro)
//!    - skip dei file già verificati e non modificati (opzionale)
//!    - probe della durata con timeout
//!    - `check_file` su un task blocking, atteso prima del file successivo
//!    - aggiornamento statistiche, stato, log / eventi JSON
//! 4. Riepilogo finale
//!
//! ## Esempio:
//! ```rust,ignore
//! let mut scanner = IntegrityScanner::new(&root, config).await?;
//! let summary = scanner.run().await?;
//! if summary.has_issues() { std::process::exit(1); }
//! ```

use crate::{
    checker::check_file,
    config::Config,
    file_manager::FileManager,
    json_output::JsonMessage,
    probe::FfprobeDurationProbe,
    progress::{ProgressManager, ScanStats},
    result::FileCheckResult,
    state::{StateManager, VerifiedFile},
};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime};
use tracing::{debug, info, warn};

/// Outcome of a scan run
#[derive(Debug, Default)]
pub struct ScanSummary {
    pub results: Vec<FileCheckResult>,
    pub stats: ScanStats,
    pub cancelled: bool,
}

impl ScanSummary {
    /// True when any checked file has at least one issue
    pub fn has_issues(&self) -> bool {
        self.results.iter().any(FileCheckResult::has_issues)
    }
}

/// Sequential integrity scanner over a file or directory tree
pub struct IntegrityScanner {
    config: Config,
    root: PathBuf,
    state_manager: Option<StateManager>,
    cancel: Arc<AtomicBool>,
}

impl IntegrityScanner {
    /// Validate the configuration and load verification state if needed
    pub async fn new(root: &Path, config: Config) -> Result<Self> {
        config.validate()?;
        let state_manager = if config.skip_verified {
            Some(StateManager::new(root).await?)
        } else {
            None
        };
        Ok(Self::with_state(root, config, state_manager))
    }

    /// Build a scanner around an existing state manager
    pub fn with_state(root: &Path, config: Config, state_manager: Option<StateManager>) -> Self {
        Self {
            config,
            root: root.to_path_buf(),
            state_manager,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that stops the scan before the next file when set
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Run the scan
    pub async fn run(&mut self) -> Result<ScanSummary> {
        let start_time = Instant::now();

        let files = FileManager::find_container_files(&self.root, &self.config.extensions)?;
        self.emit_start_message(&files);

        if let Some(state_manager) = self.state_manager.as_mut() {
            state_manager.cleanup().await?;
        }

        let probe = self.resolve_probe();
        let progress = if self.config.json_output || files.is_empty() {
            ProgressManager::hidden()
        } else {
            ProgressManager::new(files.len() as u64)
        };

        let mut summary = ScanSummary::default();
        let total = files.len();

        for (index, file_path) in files.iter().enumerate() {
            if self.cancel.load(Ordering::SeqCst) {
                summary.cancelled = true;
                self.handle_cancellation(&summary.stats, total - index, &progress);
                break;
            }

            if self.should_skip(file_path).await {
                summary.stats.add_skipped();
                if self.config.json_output {
                    JsonMessage::file_skipped(index, total, file_path.clone()).emit();
                }
                progress.update(&format!("[SKIP] {}", display_name(file_path)));
                continue;
            }

            let total_duration = match probe {
                Some(ref probe) => match probe.try_probe(file_path).await {
                    Ok(seconds) => seconds,
                    Err(e) => {
                        progress.suspend(|| {
                            warn!("Duration unavailable for {}: {}", file_path.display(), e)
                        });
                        0.0
                    }
                },
                None => 0.0,
            };

            let result = Self::check_blocking(file_path.clone(), total_duration).await?;
            self.record_state(&result, &progress).await;
            summary.stats.add_result(&result);
            self.report_result(index, total, &result, &progress);

            let tag = if result.has_issues() { "[ISSUES]" } else { "[OK]" };
            progress.update(&format!("{} {}", tag, display_name(file_path)));

            summary.results.push(result);
        }

        progress.finish(&summary.stats.format_summary());
        if !summary.cancelled {
            self.print_final_stats(&summary.stats, start_time.elapsed().as_secs_f64());
        }

        Ok(summary)
    }

    /// Run the blocking core on the blocking pool and wait for it
    async fn check_blocking(file_path: PathBuf, total_duration: f64) -> Result<FileCheckResult> {
        let display = file_path.display().to_string();
        tokio::task::spawn_blocking(move || check_file(&file_path, || total_duration))
            .await
            .map_err(|e| anyhow::anyhow!("Check task failed for {}: {}", display, e))
    }

    fn resolve_probe(&self) -> Option<FfprobeDurationProbe> {
        if !self.config.probe_duration {
            debug!("Duration probing disabled");
            return None;
        }

        match FfprobeDurationProbe::from_config(&self.config) {
            Ok(probe) => {
                debug!("Using ffprobe at {}", probe.ffprobe_path().display());
                Some(probe)
            }
            Err(e) => {
                warn!("{}; playable durations will be reported as 0", e);
                None
            }
        }
    }

    /// Skip files verified clean earlier and unchanged since
    async fn should_skip(&self, file_path: &Path) -> bool {
        if !self.config.skip_verified {
            return false;
        }
        let Some(ref state_manager) = self.state_manager else {
            return false;
        };

        match FileManager::get_file_info(file_path).await {
            Ok((size, modified)) => state_manager.is_verified(file_path, size, modified),
            Err(_) => false,
        }
    }

    /// Remember clean files, forget files that now have issues
    async fn record_state(&mut self, result: &FileCheckResult, progress: &ProgressManager) {
        let Some(state_manager) = self.state_manager.as_mut() else {
            return;
        };

        let outcome = if result.has_issues() {
            state_manager.forget(result.file_path()).await
        } else {
            match FileManager::get_file_info(result.file_path()).await {
                Ok((file_size, modified_time)) => {
                    let verified_at = SystemTime::now()
                        .duration_since(SystemTime::UNIX_EPOCH)
                        .unwrap_or_default()
                        .as_secs();
                    state_manager
                        .mark_verified(VerifiedFile {
                            path: result.file_path().to_path_buf(),
                            modified_time,
                            file_size,
                            verified_at,
                        })
                        .await
                }
                Err(e) => Err(e),
            }
        };

        if let Err(e) = outcome {
            progress.suspend(|| {
                warn!("Could not update verification state for {}: {}", result.file_path().display(), e)
            });
        }
    }

    fn emit_start_message(&self, files: &[PathBuf]) {
        if self.config.json_output {
            JsonMessage::start(self.root.clone(), files.len(), self.config.probe_duration).emit();
        } else {
            info!("Checking container integrity in: {}", self.root.display());
            info!("Found {} container files to check", files.len());
        }
    }

    fn report_result(&self, index: usize, total: usize, result: &FileCheckResult, progress: &ProgressManager) {
        if self.config.json_output {
            JsonMessage::file_complete(index, total, result).emit();
            return;
        }

        let name = display_name(result.file_path());
        progress.suspend(|| {
            if result.has_issues() {
                warn!(
                    "[ISSUES] {}: {:.1}% validated, playable {} of {}",
                    name,
                    result.completion_percent(),
                    FileManager::format_duration(result.playable_duration()),
                    FileManager::format_duration(result.total_duration())
                );
                for issue in result.issues() {
                    warn!("  • {}", issue);
                }
            } else {
                info!(
                    "[OK] {}: {} atoms, {}",
                    name,
                    result.boxes().len(),
                    FileManager::format_size(result.file_size())
                );
            }
        });
    }

    fn handle_cancellation(&self, stats: &ScanStats, remaining_files: usize, progress: &ProgressManager) {
        if self.config.json_output {
            JsonMessage::cancelled(stats, remaining_files).emit();
        } else {
            progress.suspend(|| warn!("Scan cancelled, {} files left unchecked", remaining_files));
        }
    }

    fn print_final_stats(&self, stats: &ScanStats, duration: f64) {
        if self.config.json_output {
            JsonMessage::complete(stats, duration).emit();
        } else {
            info!("=== Integrity Check Complete ===");
            info!("Files checked: {}", stats.files_checked);
            info!("Files valid: {}", stats.files_valid);
            info!("Files with issues: {}", stats.files_with_issues);
            info!("Files skipped (already verified): {}", stats.files_skipped);
            info!(
                "Bytes validated: {} of {} ({:.2}%)",
                FileManager::format_size(stats.bytes_validated),
                FileManager::format_size(stats.total_bytes),
                stats.validated_percent()
            );
            info!(
                "Playable duration: {} of {}",
                FileManager::format_duration(stats.playable_duration),
                FileManager::format_duration(stats.total_duration)
            );
            info!("Elapsed: {:.1}s", duration);
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::walker::tests::atom;
    use tempfile::TempDir;

    fn offline_config() -> Config {
        Config {
            probe_duration: false,
            ..Default::default()
        }
    }

    fn write_sample_files(dir: &Path) {
        let mut good = atom(b"ftyp", 32);
        good.extend(atom(b"moov", 200));
        good.extend(atom(b"mdat", 800));
        std::fs::write(dir.join("a_good.mov"), &good).unwrap();

        let mut broken = good.clone();
        broken.truncate(600);
        std::fs::write(dir.join("b_broken.mp4"), &broken).unwrap();

        std::fs::write(dir.join("c_notes.txt"), b"not a container").unwrap();
    }

    #[tokio::test]
    async fn test_scan_directory() {
        let temp_dir = TempDir::new().unwrap();
        write_sample_files(temp_dir.path());

        let mut scanner = IntegrityScanner::new(temp_dir.path(), offline_config()).await.unwrap();
        let summary = scanner.run().await.unwrap();

        assert!(!summary.cancelled);
        assert_eq!(summary.results.len(), 2);
        assert!(!summary.results[0].has_issues());
        assert!(summary.results[1].has_issues());
        assert!(summary.has_issues());
        assert_eq!(summary.stats.files_valid, 1);
        assert_eq!(summary.stats.files_with_issues, 1);
        assert_eq!(summary.stats.bytes_validated, 1032 + 232);
    }

    #[tokio::test]
    async fn test_cancel_before_first_file() {
        let temp_dir = TempDir::new().unwrap();
        write_sample_files(temp_dir.path());

        let mut scanner = IntegrityScanner::new(temp_dir.path(), offline_config()).await.unwrap();
        scanner.cancel_flag().store(true, Ordering::SeqCst);
        let summary = scanner.run().await.unwrap();

        assert!(summary.cancelled);
        assert!(summary.results.is_empty());
    }

    #[tokio::test]
    async fn test_skip_verified_files() {
        let temp_dir = TempDir::new().unwrap();
        let media = temp_dir.path().join("media");
        std::fs::create_dir_all(&media).unwrap();
        write_sample_files(&media);
        let state_dir = temp_dir.path().join("state");

        let config = Config {
            skip_verified: true,
            ..offline_config()
        };

        let state = StateManager::with_state_dir(&media, &state_dir).await.unwrap();
        let mut first = IntegrityScanner::with_state(&media, config.clone(), Some(state));
        let summary = first.run().await.unwrap();
        assert_eq!(summary.stats.files_checked, 2);
        assert_eq!(summary.stats.files_skipped, 0);

        let state = StateManager::with_state_dir(&media, &state_dir).await.unwrap();
        assert_eq!(state.verified_count(), 1);
        let mut second = IntegrityScanner::with_state(&media, config, Some(state));
        let summary = second.run().await.unwrap();
        assert_eq!(summary.stats.files_skipped, 1);
        assert_eq!(summary.stats.files_checked, 1);
        assert!(summary.results[0].has_issues());
    }

    #[tokio::test]
    async fn test_single_file_root() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tiny.mov");
        std::fs::write(&path, [0u8; 5]).unwrap();

        let mut scanner = IntegrityScanner::new(&path, offline_config()).await.unwrap();
        let summary = scanner.run().await.unwrap();
        assert_eq!(summary.results.len(), 1);
        assert_eq!(summary.results[0].issues().len(), 1);
        assert!(summary.results[0].issues()[0].contains("too small"));
    }

    #[tokio::test]
    async fn test_failed_duration_lookup_reports_zero() {
        let temp_dir = TempDir::new().unwrap();
        let media = temp_dir.path().join("media");
        std::fs::create_dir_all(&media).unwrap();
        write_sample_files(&media);
        let fake_ffprobe = temp_dir.path().join("ffprobe-not-a-binary");
        std::fs::write(&fake_ffprobe, b"").unwrap();

        let config = Config {
            probe_duration: true,
            ffprobe_path: Some(fake_ffprobe),
            ..Default::default()
        };
        let mut scanner = IntegrityScanner::new(&media, config).await.unwrap();
        let summary = scanner.run().await.unwrap();

        assert_eq!(summary.results.len(), 2);
        assert!(summary.results.iter().all(|r| r.total_duration() == 0.0));
        assert_eq!(summary.stats.files_valid, 1);
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            extensions: vec![],
            ..offline_config()
        };
        assert!(IntegrityScanner::new(temp_dir.path(), config).await.is_err());
    }
}
