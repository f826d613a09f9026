//! Shared foundational types for the strand circuit compiler.
//!
//! This crate provides interned identifiers, bit/word packing arithmetic for
//! the packed signal memory, content fingerprinting, and the internal-error
//! result type used by every pipeline stage.

#![warn(missing_docs)]

pub mod bits;
pub mod fingerprint;
pub mod ident;
pub mod result;

pub use bits::{bit_mask, byte_offset, word_index, words_for};
pub use fingerprint::Fingerprint;
pub use ident::{sanitize_ident, Ident, Interner};
pub use result::{InternalError, Stage, StrandResult};
