//! Content fingerprints for emitted artifacts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 128-bit XXH3 fingerprint of an emitted artifact, stored as one
/// `u128`.
///
/// Compilation is required to be deterministic: the same design and top
/// module must produce byte-identical output, so two compiles of the same
/// input always carry the same `Fingerprint`. Embedders can use it as a
/// cache key for instantiated runtimes; the CLI prints the [`short`]
/// form next to build artifacts.
///
/// [`short`]: Fingerprint::short
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(u128);

impl Fingerprint {
    /// Computes a fingerprint of a byte slice using XXH3-128.
    pub fn of(data: &[u8]) -> Self {
        Self(xxhash_rust::xxh3::xxh3_128(data))
    }

    /// Returns the raw 128-bit value.
    pub fn as_u128(self) -> u128 {
        self.0
    }

    /// Returns the abbreviated 8-hex-digit form (the top 32 bits), enough
    /// to tell two builds apart at a glance.
    pub fn short(self) -> String {
        format!("{:08x}", (self.0 >> 96) as u32)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        assert_eq!(Fingerprint::of(b"\0asm"), Fingerprint::of(b"\0asm"));
    }

    #[test]
    fn distinguishes_inputs() {
        assert_ne!(Fingerprint::of(b"a"), Fingerprint::of(b"b"));
    }

    #[test]
    fn display_is_full_hex() {
        let fp = Fingerprint::of(b"x");
        let s = format!("{fp}");
        assert_eq!(s.len(), 32);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(u128::from_str_radix(&s, 16).unwrap(), fp.as_u128());
    }

    #[test]
    fn short_is_display_prefix() {
        let fp = Fingerprint::of(b"prefix");
        assert_eq!(fp.short().len(), 8);
        assert!(format!("{fp}").starts_with(&fp.short()));
    }

    #[test]
    fn debug_uses_short_form() {
        let fp = Fingerprint::of(b"dbg");
        assert_eq!(format!("{fp:?}"), format!("Fingerprint({})", fp.short()));
    }

    #[test]
    fn serde_roundtrip() {
        let fp = Fingerprint::of(b"roundtrip");
        let json = serde_json::to_string(&fp).unwrap();
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(fp, back);
    }
}
