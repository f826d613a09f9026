//! Opaque handles for source files.

use serde::{Deserialize, Serialize};

/// An opaque handle identifying one source file within a compilation.
///
/// The front-end collaborator assigns file ids when it loads sources; the
/// core only threads them through spans so diagnostics can name the file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct FileId(u32);

impl FileId {
    /// The id used by spans with no real source file behind them.
    pub const DUMMY: FileId = FileId(u32::MAX);

    /// Creates a file id from a raw index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}
