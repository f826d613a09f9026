//! Terminal rendering for diagnostics.
//!
//! Produces rustc-style output:
//!
//! ```text
//! error[A201]: undefined symbol `START`
//!   --> listing.s:12
//!    |
//! 12 |     JMP START
//!    |         ^
//!    = help: define the label or .equ before use
//! ```

use crate::diagnostic::Diagnostic;

/// Renders one diagnostic into a human-readable string.
///
/// `file_name` labels the location line; pass the design or listing path.
/// Diagnostics without a captured source line render as the header plus
/// notes only.
pub fn render(diag: &Diagnostic, file_name: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}[{}]: {}\n",
        diag.severity, diag.code, diag.message
    ));

    if let Some(line) = diag.line {
        out.push_str(&format!("  --> {file_name}:{line}\n"));
        if let Some(text) = &diag.source_line {
            let num = line.to_string();
            let pad = " ".repeat(num.len());
            out.push_str(&format!("{pad} |\n"));
            out.push_str(&format!("{num} | {text}\n"));
            let col = diag.caret_col.unwrap_or(1) as usize;
            out.push_str(&format!("{pad} | {}^\n", " ".repeat(col.saturating_sub(1))));
        }
    } else if !diag.span.is_dummy() {
        out.push_str(&format!("  --> {file_name}\n"));
    }

    for note in &diag.notes {
        out.push_str(&format!("   = note: {note}\n"));
    }
    for help in &diag.help {
        out.push_str(&format!("   = help: {help}\n"));
    }
    out
}

/// Renders a batch of diagnostics separated by blank lines.
pub fn render_all(diags: &[Diagnostic], file_name: &str) -> String {
    diags
        .iter()
        .map(|d| render(d, file_name))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};
    use strand_source::Span;

    #[test]
    fn renders_line_and_caret() {
        let d = Diagnostic::error(
            DiagnosticCode::new(Category::Assembler, 201),
            "undefined symbol `START`",
            Span::DUMMY,
        )
        .at_line(12, "    JMP START")
        .with_caret(9);
        let s = render(&d, "listing.s");
        assert!(s.contains("error[A201]: undefined symbol `START`"));
        assert!(s.contains("--> listing.s:12"));
        assert!(s.contains("12 |     JMP START"));
        assert!(s.contains("   |         ^"));
    }

    #[test]
    fn renders_header_only_without_line() {
        let d = Diagnostic::error(
            DiagnosticCode::new(Category::Error, 101),
            "undefined module `alu`",
            Span::DUMMY,
        )
        .with_help("check the module name");
        let s = render(&d, "design.json");
        assert!(s.starts_with("error[E101]"));
        assert!(s.contains("= help: check the module name"));
        assert!(!s.contains("-->"));
    }

    #[test]
    fn render_all_joins() {
        let d = Diagnostic::warning(
            DiagnosticCode::new(Category::Warning, 101),
            "w",
            Span::DUMMY,
        );
        let s = render_all(&[d.clone(), d], "f");
        assert_eq!(s.matches("warning[W101]").count(), 2);
    }
}
