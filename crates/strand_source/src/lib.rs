//! Source locations for designs and assembly listings.
//!
//! Provides [`FileId`], byte-offset [`Span`]s, and a [`LineIndex`] that maps
//! offsets back to line/column pairs and line text for diagnostic rendering.

#![warn(missing_docs)]

mod file_id;
mod line_index;
mod span;

pub use file_id::FileId;
pub use line_index::LineIndex;
pub use span::Span;
