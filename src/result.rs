//! # Result Model Module
//!
//! Questo modulo definisce il verdetto di integrità prodotto per ogni file.
//!
//! ## Responsabilità:
//! - `FileCheckBuilder`: accumulatore passato al walker e all'assessor
//! - `FileCheckResult`: risultato finale immutabile, consumato dai report
//!
//! ## Invarianti:
//! - `bytes_validated <= file_size` sempre
//! - `playable_duration <= total_duration` sempre
//! - `issues` è un log append-only in ordine di rilevamento
//! - `boxes` è in ordine di file, mai riordinato
//!
//! ## Esempio struttura JSON:
//! ```json
//! {
//!   "file_path": "/media/clip.mov",
//!   "file_size": 5032,
//!   "bytes_validated": 5032,
//!   "boxes": [{ "type": "ftyp", "size": 32, "offset": 0, "is_complete": true }],
//!   "issues": [],
//!   "has_issues": false,
//!   "total_duration": 12.5,
//!   "playable_duration": 12.5
//! }
//! ```

use crate::atom::{BoxRecord, WalkStop};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::path::{Path, PathBuf};

/// Accumulates boxes and issues while a file is being checked.
///
/// Threaded by `&mut` through the walker and handed by value to the
/// assessor, which finalizes it exactly once.
#[derive(Debug, Clone)]
pub struct FileCheckBuilder {
    file_path: PathBuf,
    file_size: u64,
    bytes_validated: u64,
    boxes: Vec<BoxRecord>,
    issues: Vec<String>,
    stop: WalkStop,
}

impl FileCheckBuilder {
    pub fn new(file_path: impl Into<PathBuf>, file_size: u64) -> Self {
        Self {
            file_path: file_path.into(),
            file_size,
            bytes_validated: 0,
            boxes: Vec::new(),
            issues: Vec::new(),
            stop: WalkStop::EndOfData,
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn bytes_validated(&self) -> u64 {
        self.bytes_validated
    }

    pub fn boxes(&self) -> &[BoxRecord] {
        &self.boxes
    }

    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    pub fn stop_reason(&self) -> WalkStop {
        self.stop
    }

    pub fn push_box(&mut self, record: BoxRecord) {
        self.boxes.push(record);
    }

    pub fn push_issue(&mut self, issue: impl Into<String>) {
        self.issues.push(issue.into());
    }

    pub fn set_stop(&mut self, stop: WalkStop) {
        self.stop = stop;
    }

    /// Clamped to the file size
    pub fn set_bytes_validated(&mut self, bytes: u64) {
        self.bytes_validated = bytes.min(self.file_size);
    }

    /// Freeze into the immutable result.
    ///
    /// Durations are sanitized so the result invariants hold whatever the
    /// caller passes: non-finite or negative totals become 0 and the
    /// playable part never exceeds the total.
    pub fn finish(self, total_duration: f64, playable_duration: f64) -> FileCheckResult {
        let total_duration = sanitize_seconds(total_duration);
        let playable_duration = sanitize_seconds(playable_duration).min(total_duration);

        FileCheckResult {
            file_path: self.file_path,
            file_size: self.file_size,
            bytes_validated: self.bytes_validated,
            boxes: self.boxes,
            issues: self.issues,
            total_duration,
            playable_duration,
        }
    }
}

/// Paths as strings, with invalid UTF-8 replaced by U+FFFD
pub(crate) fn serialize_path_lossy<P, S>(path: &P, serializer: S) -> Result<S::Ok, S::Error>
where
    P: AsRef<Path>,
    S: Serializer,
{
    serializer.serialize_str(&path.as_ref().to_string_lossy())
}

/// Zero for NaN, infinities and negative values
pub(crate) fn sanitize_seconds(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

/// Integrity verdict for one file
#[derive(Debug, Clone, PartialEq)]
pub struct FileCheckResult {
    file_path: PathBuf,
    file_size: u64,
    bytes_validated: u64,
    boxes: Vec<BoxRecord>,
    issues: Vec<String>,
    total_duration: f64,
    playable_duration: f64,
}

impl FileCheckResult {
    /// Result for a file that could not be opened or read at all
    pub fn unreadable(file_path: impl Into<PathBuf>, file_size: u64, reason: &str) -> Self {
        let mut builder = FileCheckBuilder::new(file_path, file_size);
        builder.push_issue(format!("Error reading file: {}", reason));
        builder.set_stop(WalkStop::ReadError);
        builder.finish(0.0, 0.0)
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn bytes_validated(&self) -> u64 {
        self.bytes_validated
    }

    pub fn boxes(&self) -> &[BoxRecord] {
        &self.boxes
    }

    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Total playback duration in seconds, 0 when unknown
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    /// Estimated playable seconds, 0 when the total is unknown
    pub fn playable_duration(&self) -> f64 {
        self.playable_duration
    }

    /// Share of the file covered by validated atoms, in percent
    pub fn completion_percent(&self) -> f64 {
        if self.file_size == 0 {
            0.0
        } else {
            self.bytes_validated as f64 * 100.0 / self.file_size as f64
        }
    }
}

impl Serialize for FileCheckResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FileCheckResult", 8)?;
        state.serialize_field("file_path", &self.file_path.to_string_lossy())?;
        state.serialize_field("file_size", &self.file_size)?;
        state.serialize_field("bytes_validated", &self.bytes_validated)?;
        state.serialize_field("boxes", &self.boxes)?;
        state.serialize_field("issues", &self.issues)?;
        state.serialize_field("has_issues", &self.has_issues())?;
        state.serialize_field("total_duration", &self.total_duration)?;
        state.serialize_field("playable_duration", &self.playable_duration)?;
        state.end()
    }
}
