//! Diagnostic codes with category prefixes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Error diagnostics, prefixed with `E`.
    Error,
    /// Warning diagnostics, prefixed with `W`.
    Warning,
    /// Assembler diagnostics, prefixed with `A`.
    Assembler,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Assembler => 'A',
        }
    }
}

/// A category plus number uniquely identifying one kind of diagnostic.
///
/// Displayed as e.g. `E103` or `A204`. Numbering blocks: `E1xx` elaboration,
/// `E2xx` levelisation and emission, `W1xx` design warnings, `A2xx`
/// assembler errors.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The code category.
    pub category: Category,
    /// The number within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.category.prefix(), self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        assert_eq!(
            format!("{}", DiagnosticCode::new(Category::Error, 103)),
            "E103"
        );
        assert_eq!(
            format!("{}", DiagnosticCode::new(Category::Assembler, 204)),
            "A204"
        );
    }

    #[test]
    fn equality() {
        let a = DiagnosticCode::new(Category::Warning, 101);
        let b = DiagnosticCode::new(Category::Warning, 101);
        let c = DiagnosticCode::new(Category::Error, 101);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
