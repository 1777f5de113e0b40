//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking e le statistiche della scansione.
//!
//! ## Componenti principali:
//! - `ProgressManager`: Progress bar `indicatif` (nascosta in modalità JSON)
//! - `ScanStats`: Statistiche cumulative dei file controllati
//!
//! ## Statistiche tracciate:
//! - **files_checked**: File analizzati
//! - **files_valid**: File senza issue
//! - **files_with_issues**: File con almeno una issue
//! - **files_skipped**: File saltati perché già verificati
//! - **total_bytes** / **bytes_validated**: Copertura in byte
//! - **total_duration** / **playable_duration**: Durata totale e stimata riproducibile
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:12] [========================>---------------] 61/100 (61%) [ISSUES] clip_017.mov
//! ```

use crate::file_manager::FileManager;
use crate::result::FileCheckResult;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;

/// Manages progress reporting for a scan
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Progress manager that draws nothing (JSON mode, tests)
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Clear the bar while `f` writes to the terminal, then redraw it
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.bar.suspend(f)
    }
}

/// Statistics for one scan run
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ScanStats {
    pub files_checked: usize,
    pub files_valid: usize,
    pub files_with_issues: usize,
    pub files_skipped: usize,
    pub total_bytes: u64,
    pub bytes_validated: u64,
    pub total_duration: f64,
    pub playable_duration: f64,
}

impl ScanStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_result(&mut self, result: &FileCheckResult) {
        self.files_checked += 1;
        if result.has_issues() {
            self.files_with_issues += 1;
        } else {
            self.files_valid += 1;
        }
        self.total_bytes += result.file_size();
        self.bytes_validated += result.bytes_validated();
        self.total_duration += result.total_duration();
        self.playable_duration += result.playable_duration();
    }

    pub fn add_skipped(&mut self) {
        self.files_skipped += 1;
    }

    /// Validated share of all checked bytes, in percent
    pub fn validated_percent(&self) -> f64 {
        if self.total_bytes > 0 {
            (self.bytes_validated as f64 / self.total_bytes as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Checked: {} files | Valid: {} | With issues: {} | Skipped: {} | Validated: {} of {} ({:.2}%) | Playable: {} of {}",
            self.files_checked,
            self.files_valid,
            self.files_with_issues,
            self.files_skipped,
            FileManager::format_size(self.bytes_validated),
            FileManager::format_size(self.total_bytes),
            self.validated_percent(),
            FileManager::format_duration(self.playable_duration),
            FileManager::format_duration(self.total_duration),
        )
    }
}
