//! The diagnostic record type.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use strand_source::Span;

/// A structured diagnostic message.
///
/// Carries a severity, a code, the primary message and span, plus optional
/// notes and help lines. Assembler diagnostics also record the 1-based
/// source line number and caret column directly, since assembly sources are
/// line-oriented and may arrive through a streaming reader that keeps no
/// full text in memory.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level.
    pub severity: Severity,
    /// The code identifying the kind of diagnostic.
    pub code: DiagnosticCode,
    /// The main message.
    pub message: String,
    /// The primary source span (dummy for line-oriented diagnostics).
    pub span: Span,
    /// 1-based source line number, when known without a span.
    pub line: Option<u32>,
    /// The text of the offending source line, when captured at emit time.
    pub source_line: Option<String>,
    /// 1-based caret column within `source_line`.
    pub caret_col: Option<u32>,
    /// Explanatory footnotes.
    pub notes: Vec<String>,
    /// Actionable suggestions.
    pub help: Vec<String>,
}

impl Diagnostic {
    /// Creates an error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::new(Severity::Error, code, message, span)
    }

    /// Creates a warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::new(Severity::Warning, code, message, span)
    }

    fn new(
        severity: Severity,
        code: DiagnosticCode,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            span,
            line: None,
            source_line: None,
            caret_col: None,
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Attaches a 1-based line number and the offending line's text.
    pub fn at_line(mut self, line: u32, text: impl Into<String>) -> Self {
        self.line = Some(line);
        self.source_line = Some(text.into());
        self
    }

    /// Sets the 1-based caret column within the attached source line.
    pub fn with_caret(mut self, col: u32) -> Self {
        self.caret_col = Some(col);
        self
    }

    /// Adds a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a help message.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }
}
