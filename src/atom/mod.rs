//! # Atom Module
//!
//! Lettura degli header degli atom (box) di un container QuickTime/MP4.
//! - `fourcc`: Tag a 4 caratteri e allow-list statica dei tipi noti
//! - `walker`: Scansione lineare degli header top-level

pub mod fourcc;
pub mod walker;

pub use fourcc::FourCc;
pub use walker::{walk, WalkStop};

use serde::Serialize;

/// One decoded top-level atom header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoxRecord {
    #[serde(rename = "type")]
    pub box_type: FourCc,
    /// Declared length including the header (extended size resolved)
    pub size: u64,
    /// Absolute offset of the first header byte
    pub offset: u64,
    pub is_complete: bool,
}

impl BoxRecord {
    /// Offset one past the last byte the atom claims, `None` on overflow
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.size)
    }
}
