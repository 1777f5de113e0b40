//! # Atom Walker
//!
//! Scansione in singolo passaggio degli header top-level di un container.
//!
//! ## Algoritmo:
//! 1. File più piccolo di un header (8 byte) → issue "too small", nessun atom
//! 2. Per ogni posizione: seek, lettura size (u32 BE) + tipo (4 byte)
//! 3. size == 1 → segue la size estesa a 64 bit, header da 16 byte
//! 4. size == 0 → l'atom si estende fino a fine file
//! 5. size < header → errore strutturale, stop
//! 6. Atom che supera la fine del file → troncamento, stop
//! 7. Tipo sconosciuto e non stampabile → warning, si continua
//!
//! Il walker si ferma sempre alla PRIMA condizione fatale: nessun tentativo
//! di risincronizzazione cercando l'header successivo. Il payload degli atom
//! non viene mai letto.

use super::{BoxRecord, FourCc};
use crate::result::FileCheckBuilder;
use serde::Serialize;
use std::io::{self, Read, Seek, SeekFrom};
use tracing::debug;

/// Size of a compact atom header: 32-bit size + type
pub const HEADER_SIZE: u64 = 8;
/// Size of a header carrying a 64-bit extended size
pub const EXTENDED_HEADER_SIZE: u64 = 16;

/// Why the walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkStop {
    /// Every byte up to the file length was covered by complete atoms
    EndOfData,
    /// Fewer bytes than a single header
    TooSmall,
    TruncatedHeader,
    TruncatedExtendedSize,
    /// Declared size smaller than the header itself
    InvalidSize,
    TruncatedBox,
    /// The stream failed underneath the walker
    ReadError,
}

impl WalkStop {
    /// True for every stop reason except reaching the end cleanly
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::EndOfData)
    }
}

/// Walk the top-level atoms of `reader`, recording boxes and issues into `builder`.
///
/// The file length is taken from the builder; reads never go past it even
/// when the underlying stream is longer. Only genuine I/O failures are
/// returned as errors, and `bytes_validated` is recorded in every case.
pub fn walk<R: Read + Seek>(reader: &mut R, builder: &mut FileCheckBuilder) -> io::Result<()> {
    let file_length = builder.file_size();

    if file_length < HEADER_SIZE {
        builder.push_issue(format!(
            "File is too small to be a valid container ({} bytes)",
            file_length
        ));
        builder.set_stop(WalkStop::TooSmall);
        return Ok(());
    }

    let mut position = 0u64;
    let result = walk_boxes(reader, file_length, builder, &mut position);
    builder.set_bytes_validated(position);
    result
}

fn walk_boxes<R: Read + Seek>(
    reader: &mut R,
    file_length: u64,
    builder: &mut FileCheckBuilder,
    position: &mut u64,
) -> io::Result<()> {
    while *position < file_length {
        let offset = *position;
        reader.seek(SeekFrom::Start(offset))?;
        let mut limited = reader.by_ref().take(file_length - offset);

        let mut header = [0u8; HEADER_SIZE as usize];
        let read = read_up_to(&mut limited, &mut header)?;
        if read < header.len() {
            builder.push_issue(format!(
                "Incomplete atom header at offset {}: expected {} bytes, found {}",
                offset, HEADER_SIZE, read
            ));
            builder.set_stop(WalkStop::TruncatedHeader);
            return Ok(());
        }

        let declared_size = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        let box_type = FourCc([header[4], header[5], header[6], header[7]]);

        let mut header_size = HEADER_SIZE;
        let size = match declared_size {
            1 => {
                let mut extended = [0u8; 8];
                let read = read_up_to(&mut limited, &mut extended)?;
                if read < extended.len() {
                    builder.push_issue(format!(
                        "Incomplete extended size for '{}' atom at offset {}: expected 8 bytes, found {}",
                        box_type, offset, read
                    ));
                    builder.set_stop(WalkStop::TruncatedExtendedSize);
                    return Ok(());
                }
                header_size = EXTENDED_HEADER_SIZE;
                u64::from_be_bytes(extended)
            }
            0 => file_length - offset,
            n => u64::from(n),
        };

        if size < header_size {
            builder.push_issue(format!(
                "Invalid atom size {} for '{}' at offset {}: smaller than its {}-byte header",
                size, box_type, offset, header_size
            ));
            builder.set_stop(WalkStop::InvalidSize);
            return Ok(());
        }

        let end = offset.checked_add(size).filter(|&end| end <= file_length);
        let record = BoxRecord {
            box_type,
            size,
            offset,
            is_complete: end.is_some(),
        };
        builder.push_box(record);

        let Some(end) = end else {
            let available = file_length - offset;
            let missing = size - available;
            builder.push_issue(format!(
                "Incomplete '{}' atom at offset {}: declared {} bytes but only {} available ({} bytes missing, {:.1}% of the atom)",
                box_type,
                offset,
                size,
                available,
                missing,
                missing as f64 * 100.0 / size as f64
            ));
            builder.set_stop(WalkStop::TruncatedBox);
            return Ok(());
        };

        if !box_type.is_known() && !box_type.is_printable() {
            builder.push_issue(format!(
                "Unknown or invalid atom type '{}' at offset {}",
                box_type, offset
            ));
        }

        debug!("Atom '{}' at {} ({} bytes)", box_type, offset, size);
        *position = end;
    }

    builder.set_stop(WalkStop::EndOfData);
    Ok(())
}

/// Fill `buf` as far as the reader allows; a short count means end of data
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
