//! # Error Types Module
//!
//! Questo modulo definisce i tipi di errore dei collaboratori del checker.
//!
//! ## Responsabilità:
//! - Definisce `CheckError` per categorizzare gli errori fuori dal contenuto del file
//! - Distingue i fallimenti di apertura (permessi, lock) da quelli di I/O generico
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Nota:
//! Il contenuto malformato di un container NON è mai un errore: viene riportato
//! come issue dentro `FileCheckResult`. Questi errori riguardano solo lo stream,
//! il probe della durata, la configurazione e lo stato persistito.
//!
//! ## Categorie di errori:
//! - `Io`: Errori di I/O generici
//! - `NotFound` / `PermissionDenied` / `Locked`: Fallimenti tipizzati in apertura
//! - `Probe`: Errore del probe della durata (ffprobe)
//! - `MissingDependency`: Tool esterno mancante
//! - `Config`: Configurazione non valida
//! - `State`: Errori di gestione file di stato

use std::path::PathBuf;

/// Error types raised by the collaborators around the integrity core
#[derive(thiserror::Error, Debug)]
pub enum CheckError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("File is locked by another process: {}", .0.display())]
    Locked(PathBuf),

    #[error("Duration probe error: {0}")]
    Probe(String),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("State file error: {0}")]
    State(String),
}

impl CheckError {
    /// Map an `open()` failure to a typed error for the given path
    pub fn from_open_error(path: PathBuf, err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        if is_sharing_violation(&err) {
            return Self::Locked(path);
        }

        match err.kind() {
            ErrorKind::NotFound => Self::NotFound(path),
            ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            ErrorKind::WouldBlock => Self::Locked(path),
            _ => Self::Io(err),
        }
    }
}

/// ERROR_SHARING_VIOLATION (32) and ERROR_LOCK_VIOLATION (33) on Windows
fn is_sharing_violation(err: &std::io::Error) -> bool {
    cfg!(windows) && matches!(err.raw_os_error(), Some(32) | Some(33))
}
