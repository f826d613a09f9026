//! Accumulator for diagnostics emitted during one compile or assemble run.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A thread-safe accumulator for diagnostics.
///
/// One sink is owned per invocation and threaded as an explicit parameter.
/// The error count is tracked atomically so `has_errors` never takes the
/// vector lock.
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
    error_count: AtomicUsize,
}

impl DiagnosticSink {
    /// Creates a new empty sink.
    pub fn new() -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            error_count: AtomicUsize::new(0),
        }
    }

    /// Emits a diagnostic into the sink.
    pub fn emit(&self, diag: Diagnostic) {
        if diag.severity == Severity::Error {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
        self.diagnostics.lock().unwrap().push(diag);
    }

    /// Returns `true` if any error-severity diagnostics were emitted.
    pub fn has_errors(&self) -> bool {
        self.error_count.load(Ordering::Relaxed) > 0
    }

    /// Returns the number of error-severity diagnostics emitted so far.
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Takes all accumulated diagnostics, leaving the sink empty.
    ///
    /// The error count is not reset; it reflects the whole invocation.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.lock().unwrap())
    }

    /// Returns a snapshot of all accumulated diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().unwrap().clone()
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};
    use strand_source::Span;

    fn err() -> Diagnostic {
        Diagnostic::error(
            DiagnosticCode::new(Category::Error, 100),
            "boom",
            Span::DUMMY,
        )
    }

    fn warn() -> Diagnostic {
        Diagnostic::warning(
            DiagnosticCode::new(Category::Warning, 100),
            "hm",
            Span::DUMMY,
        )
    }

    #[test]
    fn starts_empty() {
        let sink = DiagnosticSink::new();
        assert!(!sink.has_errors());
        assert!(sink.take_all().is_empty());
    }

    #[test]
    fn counts_only_errors() {
        let sink = DiagnosticSink::new();
        sink.emit(warn());
        sink.emit(err());
        sink.emit(warn());
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.diagnostics().len(), 3);
    }

    #[test]
    fn take_all_drains_but_keeps_count() {
        let sink = DiagnosticSink::new();
        sink.emit(err());
        assert_eq!(sink.take_all().len(), 1);
        assert!(sink.take_all().is_empty());
        assert!(sink.has_errors());
    }
}
