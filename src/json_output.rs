//! # JSON Output Module
//!
//! Questo modulo emette eventi JSON strutturati, uno per riga, su stdout.
//!
//! ## Responsabilità:
//! - Serializza ogni `FileCheckResult` così com'è, senza formattazione
//! - Fornisce un'interfaccia stabile per batch job e processi esterni
//! - I path non UTF-8 vengono serializzati in forma lossy (U+FFFD), così
//!   nessun evento viene perso
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio scansione
//! - `file_complete`: Risultato di un file
//! - `file_skipped`: File già verificato e non modificato
//! - `complete`: Fine scansione con statistiche
//! - `cancelled`: Scansione interrotta dall'utente
//! - `error`: Errore generale

use crate::progress::ScanStats;
use crate::result::{serialize_path_lossy, FileCheckResult};
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

/// JSON event emitted during a scan
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    /// Scan started
    Start {
        #[serde(serialize_with = "serialize_path_lossy")]
        root: PathBuf,
        total_files: usize,
        probe_duration: bool,
    },

    /// One file checked
    FileComplete {
        index: usize,
        total: usize,
        result: FileCheckResult,
    },

    /// File skipped as already verified
    FileSkipped {
        index: usize,
        total: usize,
        #[serde(serialize_with = "serialize_path_lossy")]
        path: PathBuf,
    },

    /// Scan finished
    Complete {
        stats: ScanStats,
        duration_seconds: f64,
    },

    /// Scan stopped between two files
    Cancelled { stats: ScanStats, remaining_files: usize },

    /// General error
    Error {
        message: String,
        details: Option<String>,
    },
}

impl JsonMessage {
    /// Emit the message as one JSON line on stdout
    pub fn emit(&self) {
        match self.to_line() {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("Could not serialize JSON event: {}", e),
        }
    }

    /// Serialized form of the message
    pub fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn start(root: PathBuf, total_files: usize, probe_duration: bool) -> Self {
        Self::Start {
            root,
            total_files,
            probe_duration,
        }
    }

    pub fn file_complete(index: usize, total: usize, result: &FileCheckResult) -> Self {
        Self::FileComplete {
            index,
            total,
            result: result.clone(),
        }
    }

    pub fn file_skipped(index: usize, total: usize, path: PathBuf) -> Self {
        Self::FileSkipped { index, total, path }
    }

    pub fn complete(stats: &ScanStats, duration_seconds: f64) -> Self {
        Self::Complete {
            stats: stats.clone(),
            duration_seconds,
        }
    }

    pub fn cancelled(stats: &ScanStats, remaining_files: usize) -> Self {
        Self::Cancelled {
            stats: stats.clone(),
            remaining_files,
        }
    }

    pub fn error(message: String, details: Option<String>) -> Self {
        Self::Error { message, details }
    }
}
