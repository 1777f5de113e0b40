//! # MOV Integrity Checker Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `atom`: Walker degli atom top-level (header, extended size, tipi noti)
//! - `assessor`: Controlli strutturali e stima della durata riproducibile
//! - `result`: Accumulatore e risultato immutabile per file
//! - `checker`: Punto di ingresso del core (`analyze`, `check_file`)
//! - `probe`: Durata totale via ffprobe
//! - `scanner`: Orchestratore della scansione
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom
//! - `state`: Tracking dei file già verificati
//! - `file_manager`: Discovery dei container e apertura dei file
//! - `progress`: Progress tracking e statistiche
//! - `json_output`: Eventi JSON per uso programmatico
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use mov_integrity_checker::check_file;
//!
//! let result = check_file(&path, || 0.0);
//! for issue in result.issues() {
//!     println!("{}", issue);
//! }
//! ```

pub mod assessor;
pub mod atom;
pub mod checker;
pub mod config;
pub mod error;
pub mod file_manager;
pub mod json_output;
pub mod platform;
pub mod probe;
pub mod progress;
pub mod result;
pub mod scanner;
pub mod state;
pub mod tool_resolver;

pub use atom::{BoxRecord, FourCc, WalkStop};
pub use checker::{analyze, check_file};
pub use config::Config;
pub use error::CheckError;
pub use json_output::JsonMessage;
pub use result::{FileCheckBuilder, FileCheckResult};
pub use scanner::{IntegrityScanner, ScanSummary};
