//! # Integrity Checker Module
//!
//! Punto di ingresso del core: collega walker, probe della durata e assessor.
//!
//! ## Flusso:
//! 1. Crea un `FileCheckBuilder` per il file
//! 2. Il walker legge gli header degli atom dallo stream
//! 3. Un errore di I/O diventa UNA issue "Error reading file", il risultato
//!    parziale viene mantenuto
//! 4. Il probe della durata viene chiamato al massimo una volta
//! 5. L'assessor applica i controlli e congela il risultato
//!
//! Il core non lancia processi esterni e non stampa nulla: il probe è una
//! closure fornita dal chiamante.
//!
//! ## Esempio:
//! ```rust,ignore
//! let result = check_file(&path, || 120.0);
//! if result.has_issues() {
//!     for issue in result.issues() { eprintln!("{}", issue); }
//! }
//! ```

use crate::atom::{walk, WalkStop};
use crate::assessor::assess;
use crate::file_manager::FileManager;
use crate::result::{FileCheckBuilder, FileCheckResult};
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Check one container stream of known length.
///
/// `duration_probe` returns the total playback duration in seconds, or 0
/// when unknown. It is not called for files too small to hold an atom.
pub fn analyze<R, F>(
    file_path: impl Into<PathBuf>,
    file_length: u64,
    stream: &mut R,
    duration_probe: F,
) -> FileCheckResult
where
    R: Read + Seek,
    F: FnOnce() -> f64,
{
    let mut builder = FileCheckBuilder::new(file_path, file_length);

    if let Err(e) = walk(stream, &mut builder) {
        warn!("Read failure in {}: {}", builder.file_path().display(), e);
        builder.push_issue(format!("Error reading file: {}", e));
        builder.set_stop(WalkStop::ReadError);
    }

    let total_duration = if builder.stop_reason() == WalkStop::TooSmall {
        0.0
    } else {
        duration_probe()
    };

    debug!(
        "{}: {} atoms, {}/{} bytes validated, stop: {:?}",
        builder.file_path().display(),
        builder.boxes().len(),
        builder.bytes_validated(),
        builder.file_size(),
        builder.stop_reason()
    );

    assess(builder, total_duration)
}

/// Open `path` read-only and check it.
///
/// Open failures never escape: they become a result carrying a single
/// "Error reading file" issue.
pub fn check_file<F>(path: &Path, duration_probe: F) -> FileCheckResult
where
    F: FnOnce() -> f64,
{
    match FileManager::open_for_check(path) {
        Ok((mut file, length)) => analyze(path, length, &mut file, duration_probe),
        Err(e) => {
            warn!("Cannot open {}: {}", path.display(), e);
            let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
            FileCheckResult::unreadable(path, size, &e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessor::INVALID_STRUCTURE_ISSUE;
    use crate::atom::walker::tests::atom;
    use crate::atom::FourCc;
    use std::cell::Cell;
    use std::io::{self, Cursor, SeekFrom};
    use tempfile::TempDir;

    /// Stream that fails once reads go past a given offset
    struct FailingStream {
        inner: Cursor<Vec<u8>>,
        fail_after: u64,
    }

    impl Read for FailingStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.inner.position() >= self.fail_after {
                return Err(io::Error::new(io::ErrorKind::Other, "device not ready"));
            }
            self.inner.read(buf)
        }
    }

    impl Seek for FailingStream {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    fn sample_file() -> Vec<u8> {
        let mut data = atom(b"ftyp", 32);
        data.extend(atom(b"moov", 1000));
        data.extend(atom(b"mdat", 4000));
        data
    }

    #[test]
    fn test_analyze_uses_probe_duration() {
        let data = sample_file();
        let result = analyze("clip.mov", data.len() as u64, &mut Cursor::new(&data), || 75.0);
        assert!(!result.has_issues());
        assert_eq!(result.total_duration(), 75.0);
        assert_eq!(result.playable_duration(), 75.0);
        assert_eq!(result.file_path(), Path::new("clip.mov"));
    }

    #[test]
    fn test_probe_not_called_for_undersized_file() {
        let called = Cell::new(false);
        let data = [0u8; 7];
        let result = analyze("tiny.mov", 7, &mut Cursor::new(&data), || {
            called.set(true);
            10.0
        });
        assert!(!called.get());
        assert_eq!(result.issues().len(), 1);
        assert_eq!(result.total_duration(), 0.0);
    }

    #[test]
    fn test_negative_probe_value_means_unknown() {
        let data = sample_file();
        let result = analyze("clip.mov", data.len() as u64, &mut Cursor::new(&data), || -1.0);
        assert_eq!(result.total_duration(), 0.0);
        assert_eq!(result.playable_duration(), 0.0);
    }

    #[test]
    fn test_read_failure_keeps_partial_result() {
        let data = sample_file();
        let mut stream = FailingStream {
            inner: Cursor::new(data.clone()),
            fail_after: 32,
        };

        let result = analyze("clip.mov", data.len() as u64, &mut stream, || 0.0);
        assert_eq!(result.boxes().len(), 1);
        assert_eq!(result.boxes()[0].box_type, FourCc::FTYP);
        assert_eq!(result.bytes_validated(), 32);
        assert_eq!(
            result.issues(),
            ["Error reading file: device not ready", INVALID_STRUCTURE_ISSUE]
        );
    }

    #[test]
    fn test_check_file_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("clip.mov");
        let mut data = sample_file();
        data.truncate(3000);
        std::fs::write(&path, &data).unwrap();

        let result = check_file(&path, || 100.0);
        assert_eq!(result.file_size(), 3000);
        assert_eq!(result.bytes_validated(), 1032);
        assert!(!result.boxes()[2].is_complete);
        assert!((result.playable_duration() - 34.4).abs() < 1e-9);
    }

    #[test]
    fn test_check_file_missing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.mov");

        let result = check_file(&path, || 100.0);
        assert_eq!(result.issues().len(), 1);
        assert!(result.issues()[0].starts_with("Error reading file: File not found"));
        assert_eq!(result.file_size(), 0);
        assert_eq!(result.total_duration(), 0.0);
    }
}
