//! Severity levels for diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How serious a diagnostic is.
///
/// Errors block artifact release; warnings do not. There is no
/// note-severity level: notes attach to a parent diagnostic instead.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Severity {
    /// A warning; compilation continues and artifacts are still released.
    Warning,
    /// An error; artifacts are withheld.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(format!("{}", Severity::Error), "error");
        assert_eq!(format!("{}", Severity::Warning), "warning");
    }

    #[test]
    fn ordering_by_match() {
        assert_ne!(Severity::Error, Severity::Warning);
    }
}
