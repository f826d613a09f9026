//! Warning constructors for non-fatal elaboration findings.
//!
//! Warning codes `W100`--`W101` cover connectivity findings that do not
//! block compilation.

use strand_diagnostics::{Category, Diagnostic, DiagnosticCode};
use strand_source::Span;

/// Output port left unconnected on an instance.
pub const W100: DiagnosticCode = DiagnosticCode::new(Category::Warning, 100);

/// Signal read by a primitive but driven by nothing.
pub const W101: DiagnosticCode = DiagnosticCode::new(Category::Warning, 101);

/// Creates the unconnected-output warning.
pub(crate) fn unconnected_output(port: &str, instance: &str, span: Span) -> Diagnostic {
    Diagnostic::warning(
        W100,
        format!("output `{port}` of instance `{instance}` is unconnected"),
        span,
    )
    .with_note("the output drives an anonymous net")
}

/// Creates the undriven-signal warning.
pub(crate) fn undriven_signal(name: &str) -> Diagnostic {
    Diagnostic::warning(
        W101,
        format!("signal `{name}` is read but has no driver"),
        Span::DUMMY,
    )
    .with_note("an undriven signal reads as constant 0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_messages() {
        let w = unconnected_output("q", "top.r0", Span::DUMMY);
        assert_eq!(w.code, W100);
        assert!(w.message.contains("top.r0"));

        let w = undriven_signal("top.x");
        assert_eq!(w.code, W101);
        assert!(w.message.contains("top.x"));
    }
}
