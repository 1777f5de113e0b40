//! # Integrity Assessor Module
//!
//! Valuta gli atom decodificati dal walker e produce il verdetto finale.
//!
//! ## Controlli (indipendenti, possono scattare insieme):
//! - **Atom richiesti**: `ftyp`, `moov`, `mdat` devono esserci (solo se è stato
//!   decodificato almeno un atom)
//! - **Ordine**: `ftyp`, se presente, deve essere il primo atom
//! - **Gap finale**: l'ultimo atom completo deve finire esattamente a fine file
//! - **Verdetto**: stop fatale, atom incompleto o nessun atom → marker generico
//!
//! Dopo un errore di I/O i controlli sul contenuto non vengono eseguiti: resta
//! solo l'issue di lettura più il marker generico.
//!
//! ## Durata riproducibile:
//! Stima proporzionale ai byte: `total * bytes_validated / file_size`.
//! Assume bitrate costante e dati distribuiti uniformemente sulla timeline;
//! le sample table di `moov` non vengono lette, quindi non è una misura
//! accurata al frame.

use crate::atom::{BoxRecord, FourCc, WalkStop};
use crate::result::{sanitize_seconds, FileCheckBuilder, FileCheckResult};

/// Atoms every well-formed file must carry, with their meaning
pub const REQUIRED_BOXES: [(FourCc, &str); 3] = [
    (FourCc::FTYP, "file type header"),
    (FourCc::MOOV, "movie metadata"),
    (FourCc::MDAT, "media data"),
];

/// Generic marker appended whenever the structure is broken.
///
/// Downstream consumers match on this exact string as a boolean signal.
pub const INVALID_STRUCTURE_ISSUE: &str = "File structure is invalid or incomplete";

/// Run every policy check and finalize the result.
///
/// `total_duration` comes from the duration probe; 0 means unknown.
pub fn assess(mut builder: FileCheckBuilder, total_duration: f64) -> FileCheckResult {
    match builder.stop_reason() {
        // The walker already explained an undersized file; nothing else applies
        WalkStop::TooSmall => {}
        // Bytes never read say nothing about missing atoms or trailing data
        WalkStop::ReadError => builder.push_issue(INVALID_STRUCTURE_ISSUE),
        stop => {
            let findings = structural_findings(builder.boxes(), builder.file_size(), stop);
            for issue in findings {
                builder.push_issue(issue);
            }
        }
    }

    let total_duration = sanitize_seconds(total_duration);
    let playable_duration = estimate_playable_duration(
        total_duration,
        builder.bytes_validated(),
        builder.file_size(),
    );

    builder.finish(total_duration, playable_duration)
}

/// Byte-proportional playable time; 0 when either input is unknown
pub fn estimate_playable_duration(total_duration: f64, bytes_validated: u64, file_size: u64) -> f64 {
    if total_duration <= 0.0 || file_size == 0 {
        return 0.0;
    }
    let completion_ratio = bytes_validated.min(file_size) as f64 / file_size as f64;
    total_duration * completion_ratio
}

fn structural_findings(boxes: &[BoxRecord], file_size: u64, stop: WalkStop) -> Vec<String> {
    let mut issues = Vec::new();

    if !boxes.is_empty() {
        for (box_type, meaning) in REQUIRED_BOXES {
            if !boxes.iter().any(|b| b.box_type == box_type) {
                issues.push(format!("Missing '{}' atom ({})", box_type, meaning));
            }
        }
    }

    if let Some(index) = boxes.iter().position(|b| b.box_type == FourCc::FTYP) {
        if index != 0 {
            issues.push(format!(
                "'ftyp' atom should be the first atom but was found at offset {}",
                boxes[index].offset
            ));
        }
    }

    if let Some(last) = boxes.last() {
        if last.is_complete {
            if let Some(end) = last.end() {
                if end != file_size {
                    issues.push(format!(
                        "Last atom '{}' ends at offset {} but the file is {} bytes ({} trailing bytes unaccounted for)",
                        last.box_type,
                        end,
                        file_size,
                        file_size.saturating_sub(end)
                    ));
                }
            }
        }
    }

    let any_incomplete = boxes.iter().any(|b| !b.is_complete);
    if stop.is_fatal() || any_incomplete || boxes.is_empty() {
        issues.push(INVALID_STRUCTURE_ISSUE.to_string());
    }

    issues
}
