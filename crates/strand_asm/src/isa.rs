//! The instruction-set backend contract.
//!
//! The two-pass engine owns symbols, the location counter, directives, and
//! macros; an [`Isa`] only sizes and encodes instructions. Both backends
//! must agree with themselves across passes: `size_of` in pass 1 and the
//! byte count produced by `encode` in pass 2 must match for every line, or
//! the layout (and every forward reference) would shift.

use crate::expr::{self, EvalError, Symbol};
use std::collections::HashMap;

/// Per-line context handed to an ISA backend.
pub struct PassCtx<'a> {
    /// The location counter at the start of the instruction.
    pub pc: u32,
    /// The symbol table (complete in pass 2, partial in pass 1).
    pub symbols: &'a HashMap<String, Symbol>,
    /// The 1-based line number being processed.
    pub line: u32,
    /// `true` during the emission pass.
    pub pass2: bool,
}

impl PassCtx<'_> {
    /// Evaluates an operand expression against the full symbol table.
    ///
    /// In pass 2, an undefined symbol here is the `UndefinedSymbol`
    /// diagnostic; in pass 1 callers use it for "resolvable now" checks.
    pub fn eval(&self, text: &str) -> Result<i64, EvalError> {
        expr::eval(text, self.symbols, self.pc, None)
    }

    /// Evaluates using only symbols defined on or before this line — the
    /// view both passes share, used for layout decisions.
    pub fn eval_backward(&self, text: &str) -> Result<i64, EvalError> {
        expr::eval(text, self.symbols, self.pc, Some(self.line))
    }

    /// `true` when the expression is a plain literal (no symbols), so its
    /// value is identical in both passes regardless of definition order.
    pub fn is_literal(&self, text: &str) -> bool {
        expr::eval(text, &HashMap::new(), self.pc, None).is_ok()
    }
}

/// Why an instruction failed to size or encode.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AsmFailure {
    /// An operand references an undefined symbol. Collected as the
    /// `UndefinedSymbol` diagnostic during pass 2.
    #[error("undefined symbol `{0}`")]
    Undefined(String),

    /// Anything else: unknown mnemonic, bad operand shape, value out of
    /// range.
    #[error("{0}")]
    Other(String),
}

impl From<EvalError> for AsmFailure {
    fn from(err: EvalError) -> Self {
        match err {
            EvalError::Undefined(name) => AsmFailure::Undefined(name),
            EvalError::Syntax(msg) => AsmFailure::Other(msg),
        }
    }
}

impl From<String> for AsmFailure {
    fn from(msg: String) -> Self {
        AsmFailure::Other(msg)
    }
}

/// One byte-oriented, little-endian instruction set.
pub trait Isa {
    /// The ISA's display name.
    fn name(&self) -> &'static str;

    /// The size of a `.word`/`.dw` datum in bytes.
    fn word_bytes(&self) -> u32;

    /// Computes the encoded size of an instruction in bytes (pass 1).
    ///
    /// Must not depend on symbol values that could differ between passes;
    /// pseudo-instruction sizing uses literal-ness or backward-only
    /// evaluation for exactly that reason.
    fn size_of(&self, mnemonic: &str, operands: &[String], ctx: &PassCtx)
        -> Result<u32, AsmFailure>;

    /// Encodes an instruction, appending to `out` (pass 2).
    fn encode(
        &self,
        mnemonic: &str,
        operands: &[String],
        ctx: &PassCtx,
        out: &mut Vec<u8>,
    ) -> Result<(), AsmFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literalness_ignores_symbols() {
        let mut symbols = HashMap::new();
        symbols.insert("X".to_string(), Symbol { value: 5, line: 1 });
        let ctx = PassCtx {
            pc: 0,
            symbols: &symbols,
            line: 10,
            pass2: false,
        };
        assert!(ctx.is_literal("42"));
        assert!(ctx.is_literal("$FF+1"));
        assert!(!ctx.is_literal("X"));
        assert!(!ctx.is_literal("X+1"));
    }

    #[test]
    fn backward_eval_respects_definition_order() {
        let mut symbols = HashMap::new();
        symbols.insert("EARLY".to_string(), Symbol { value: 1, line: 2 });
        symbols.insert("LATE".to_string(), Symbol { value: 2, line: 30 });
        let ctx = PassCtx {
            pc: 0,
            symbols: &symbols,
            line: 10,
            pass2: true,
        };
        assert_eq!(ctx.eval_backward("EARLY").unwrap(), 1);
        assert!(ctx.eval_backward("LATE").is_err());
        assert_eq!(ctx.eval("LATE").unwrap(), 2);
    }
}
