//! The shared-memory layout of packed signal state.

use serde::{Deserialize, Serialize};
use strand_common::{bit_mask, byte_offset, words_for};
use strand_ir::{SignalId, CONST_1};

/// Bytes reserved past the signal words for embedder scratch use.
const SCRATCH_BYTES: u32 = 1024;

/// The WASM page size.
const PAGE_BYTES: u32 = 65536;

/// Where each signal lives in linear memory.
///
/// Word `id / 32` sits at byte offset `4 * (id / 32)`; the signal is bit
/// `id % 32` of that word, LSB-first. The layout is a pure function of the
/// signal count, shared verbatim between the emitter (as baked-in
/// constants) and the host runtime (for `set_signal`/`get_signal`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLayout {
    /// Number of signals, i.e. the dense id space size.
    pub signal_count: u32,
    /// Number of packed 32-bit words.
    pub words: u32,
    /// Initial memory size in 64 KiB pages.
    pub initial_pages: u32,
    /// Maximum memory size in pages (twice the initial size).
    pub max_pages: u32,
}

impl MemoryLayout {
    /// Computes the layout for `signal_count` signals.
    pub fn new(signal_count: u32) -> Self {
        let words = words_for(signal_count);
        let initial_pages = (words * 4 + SCRATCH_BYTES).div_ceil(PAGE_BYTES);
        Self {
            signal_count,
            words,
            initial_pages,
            max_pages: initial_pages * 2,
        }
    }

    /// Byte offset of the word holding `id`.
    pub fn byte_offset(&self, id: SignalId) -> u32 {
        byte_offset(id.as_raw())
    }

    /// Bit position of `id` within its word.
    pub fn bit_shift(&self, id: SignalId) -> u32 {
        id.as_raw() & 31
    }

    /// Single-bit mask of `id` within its word.
    pub fn mask(&self, id: SignalId) -> u32 {
        bit_mask(id.as_raw())
    }

    /// Byte offset of the word the embedder must touch to set `const_1`.
    pub fn const_one_byte_offset(&self) -> u32 {
        self.byte_offset(CONST_1)
    }

    /// The mask the embedder must OR into that word after instantiation.
    pub fn const_one_mask(&self) -> u32 {
        self.mask(CONST_1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_circuit_is_one_page() {
        let layout = MemoryLayout::new(40);
        assert_eq!(layout.words, 2);
        assert_eq!(layout.initial_pages, 1);
        assert_eq!(layout.max_pages, 2);
    }

    #[test]
    fn page_count_grows_with_signals() {
        // 17 000 words of signals plus scratch exceeds one page.
        let layout = MemoryLayout::new(32 * 17_000);
        assert_eq!(layout.words, 17_000);
        assert_eq!(layout.initial_pages, (17_000u32 * 4 + 1024).div_ceil(65536));
        assert!(layout.initial_pages > 1);
    }

    #[test]
    fn offsets_and_masks() {
        let layout = MemoryLayout::new(64);
        let id = SignalId::from_raw(37);
        assert_eq!(layout.byte_offset(id), 4);
        assert_eq!(layout.bit_shift(id), 5);
        assert_eq!(layout.mask(id), 1 << 5);
    }

    #[test]
    fn const_one_location() {
        let layout = MemoryLayout::new(8);
        assert_eq!(layout.const_one_byte_offset(), 0);
        assert_eq!(layout.const_one_mask(), 0b10);
    }
}
