//! Four-character atom tags and the static allow-list of known top-level types.

use serde::{Serialize, Serializer};
use std::fmt;

/// A raw 4-byte atom type tag.
///
/// The bytes are kept verbatim; nothing guarantees they are printable. The
/// `Display` impl renders printable ASCII as-is and escapes everything else
/// as `\xNN`, so a tag read from garbage data still produces a stable,
/// readable issue string.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    pub const FTYP: FourCc = FourCc(*b"ftyp");
    pub const MOOV: FourCc = FourCc(*b"moov");
    pub const MDAT: FourCc = FourCc(*b"mdat");

    /// True when every byte is printable ASCII (0x20..=0x7E)
    pub fn is_printable(&self) -> bool {
        self.0.iter().all(|b| (0x20..=0x7e).contains(b))
    }

    /// True when the tag is one of the known top-level container atoms
    pub fn is_known(&self) -> bool {
        KNOWN_TOP_LEVEL_TYPES.contains(self)
    }
}

/// Top-level atom types defined by QuickTime and ISO BMFF.
pub const KNOWN_TOP_LEVEL_TYPES: [FourCc; 20] = [
    FourCc(*b"ftyp"),
    FourCc(*b"moov"),
    FourCc(*b"mdat"),
    FourCc(*b"free"),
    FourCc(*b"skip"),
    FourCc(*b"wide"),
    FourCc(*b"pnot"),
    FourCc(*b"PICT"),
    FourCc(*b"uuid"),
    FourCc(*b"udta"),
    FourCc(*b"meta"),
    FourCc(*b"pdin"),
    FourCc(*b"moof"),
    FourCc(*b"mfra"),
    FourCc(*b"sidx"),
    FourCc(*b"ssix"),
    FourCc(*b"styp"),
    FourCc(*b"prft"),
    FourCc(*b"emsg"),
    FourCc(*b"bloc"),
];

impl From<[u8; 4]> for FourCc {
    fn from(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if (0x20..=0x7e).contains(&b) {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02X}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc(\"{}\")", self)
    }
}

impl Serialize for FourCc {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_escapes_non_printable_bytes() {
        assert_eq!(FourCc(*b"moov").to_string(), "moov");
        assert_eq!(FourCc([0x00, b'a', 0xff, b' ']).to_string(), "\\x00a\\xFF ");
    }

    #[test]
    fn test_printable_and_known() {
        assert!(FourCc::MDAT.is_known());
        assert!(FourCc(*b"free").is_printable());

        let vendor = FourCc(*b"XiPh");
        assert!(!vendor.is_known());
        assert!(vendor.is_printable());

        let garbage = FourCc([0x00, 0x00, 0x00, 0x00]);
        assert!(!garbage.is_known());
        assert!(!garbage.is_printable());
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&FourCc([b'm', b'd', b'a', 0x01])).unwrap();
        assert_eq!(json, "\"mda\\\\x01\"");
    }
}
