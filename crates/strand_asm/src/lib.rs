//! A two-pass assembler core for byte-oriented, little-endian ISAs.
//!
//! The engine owns everything ISA-independent: the streaming source
//! reader, comment stripping, labels, `.org`/`.equ` and the data
//! directives, macro capture and expansion, the symbol table, and error
//! collection. Instruction sizing and encoding are delegated to an
//! [`Isa`] backend; [`Mos6502`] (variable 1–3 byte encodings) and
//! [`Rv32i`] (fixed 4 bytes, rich pseudo-instructions) ship in-tree.
//!
//! Pass 1 lays out: it tracks the location counter, binds labels and
//! equates, and sizes every instruction. Pass 2 rewinds the reader and
//! emits bytes with all forward references resolvable; a still-undefined
//! symbol becomes an `UndefinedSymbol` diagnostic. Recoverable errors
//! collect with full line context; the byte image is only released when
//! the error list is empty.

#![warn(missing_docs)]

mod expr;
mod isa;
mod macros;
mod mos6502;
mod reader;
mod rv32i;

pub use expr::{unescape, EvalError, Symbol};
pub use isa::{AsmFailure, Isa, PassCtx};
pub use macros::{Macro, MacroTable};
pub use mos6502::Mos6502;
pub use reader::{
    BlockDevice, BlockReader, ReadError, SourceReader, StringReader, DEFAULT_LINE_BUFFER,
    SECTOR_SIZE,
};
pub use rv32i::Rv32i;

use std::collections::HashMap;
use strand_diagnostics::{Category, Diagnostic, DiagnosticCode};
use strand_source::Span;

/// General syntax or directive error.
pub const A200: DiagnosticCode = DiagnosticCode::new(Category::Assembler, 200);
/// Undefined symbol at emission time.
pub const A201: DiagnosticCode = DiagnosticCode::new(Category::Assembler, 201);
/// Duplicate label.
pub const A202: DiagnosticCode = DiagnosticCode::new(Category::Assembler, 202);
/// Macro definition or expansion error.
pub const A203: DiagnosticCode = DiagnosticCode::new(Category::Assembler, 203);
/// Instruction encoding error.
pub const A204: DiagnosticCode = DiagnosticCode::new(Category::Assembler, 204);

/// The result of one assembly run.
#[derive(Debug)]
pub struct Assembly {
    /// The program's lowest emitted address.
    pub origin: u32,
    /// The packed byte image starting at `origin`; empty when `errors`
    /// is non-empty.
    pub bytes: Vec<u8>,
    /// Final symbol values.
    pub symbols: HashMap<String, i64>,
    /// Collected diagnostics, in source order per pass.
    pub errors: Vec<Diagnostic>,
}

impl Assembly {
    /// `true` when assembly succeeded and `bytes` is meaningful.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Assembles from a [`SourceReader`], rewinding it between passes.
///
/// Only unrecoverable reader failures (device errors, a line overflowing
/// the streaming buffer) short-circuit as `Err`; everything else collects
/// into [`Assembly::errors`].
pub fn assemble(reader: &mut dyn SourceReader, isa: &dyn Isa) -> Result<Assembly, ReadError> {
    let mut engine = Engine::new(isa);

    engine.run_pass(reader, false)?;
    engine.origin = engine.min_emit_pc.unwrap_or(0);
    reader.rewind()?;
    engine.run_pass(reader, true)?;

    let symbols = engine
        .symbols
        .iter()
        .map(|(name, sym)| (name.clone(), sym.value))
        .collect();
    let bytes = if engine.errors.is_empty() {
        engine.out
    } else {
        Vec::new()
    };
    Ok(Assembly {
        origin: engine.origin,
        bytes,
        symbols,
        errors: engine.errors,
    })
}

/// Assembles an in-memory source string.
pub fn assemble_str(source: &str, isa: &dyn Isa) -> Result<Assembly, ReadError> {
    assemble(&mut StringReader::new(source), isa)
}

struct Engine<'a> {
    isa: &'a dyn Isa,
    symbols: HashMap<String, Symbol>,
    macros: MacroTable,
    errors: Vec<Diagnostic>,
    pc: u32,
    /// Lowest PC at which any byte was emitted (pass 1).
    min_emit_pc: Option<u32>,
    origin: u32,
    out: Vec<u8>,
    pass2: bool,
    line_no: u32,
    capture: Option<Macro>,
}

impl<'a> Engine<'a> {
    fn new(isa: &'a dyn Isa) -> Self {
        Self {
            isa,
            symbols: HashMap::new(),
            macros: MacroTable::new(),
            errors: Vec::new(),
            pc: 0,
            min_emit_pc: None,
            origin: 0,
            out: Vec::new(),
            pass2: false,
            line_no: 0,
            capture: None,
        }
    }

    fn run_pass(&mut self, reader: &mut dyn SourceReader, pass2: bool) -> Result<(), ReadError> {
        self.pass2 = pass2;
        self.pc = 0;
        self.line_no = 0;
        self.capture = None;
        while let Some(line) = reader.next_line()? {
            self.line_no += 1;
            self.handle_line(&line, 0);
        }
        if self.capture.take().is_some() && !pass2 {
            self.error(A203, "`.macro` without matching `.endmacro`", "", 1);
        }
        Ok(())
    }

    fn error(&mut self, code: DiagnosticCode, message: impl Into<String>, line: &str, col: u32) {
        let diag = Diagnostic::error(code, message, Span::DUMMY)
            .at_line(self.line_no, line)
            .with_caret(col);
        self.errors.push(diag);
    }

    /// Records an error that pass 2 would re-detect identically, so it is
    /// only collected during pass 1.
    fn error_once(
        &mut self,
        code: DiagnosticCode,
        message: impl Into<String>,
        line: &str,
        col: u32,
    ) {
        if !self.pass2 {
            self.error(code, message, line, col);
        }
    }

    fn column_of(line: &str, needle: &str) -> u32 {
        line.find(needle).map_or(1, |pos| pos as u32 + 1)
    }

    fn handle_line(&mut self, raw: &str, depth: u32) {
        if depth > macros::MAX_DEPTH {
            self.error_once(A203, "macro expansion too deep", raw, 1);
            return;
        }

        let stripped = strip_comment(raw);

        // Inside a macro body, only `.endmacro` is interpreted.
        if self.capture.is_some() {
            let word = stripped.trim().split_whitespace().next().unwrap_or("");
            if word.eq_ignore_ascii_case(".endmacro") {
                let mac = self.capture.take().expect("capture checked");
                self.macros.define(mac);
            } else if let Some(mac) = self.capture.as_mut() {
                mac.body.push(raw.to_string());
            }
            return;
        }

        let mut rest = stripped.trim();

        // `NAME = expr` / `NAME .equ expr` equate forms.
        if let Some((name, value)) = split_equate(rest) {
            self.bind_equate(name, value, raw);
            return;
        }

        // Leading labels.
        while let Some((label, after)) = split_label(rest) {
            self.bind_label(label, raw);
            rest = after.trim_start();
        }
        if rest.is_empty() {
            return;
        }

        let (word, operands_text) = match rest.split_once(char::is_whitespace) {
            Some((word, tail)) => (word, tail.trim()),
            None => (rest, ""),
        };

        if let Some(directive) = word.strip_prefix('.') {
            self.handle_directive(directive, operands_text, raw);
            return;
        }

        if let Some(mac) = self.macros.get(word).cloned() {
            let args = split_operands(operands_text);
            match mac.expand(&args) {
                Ok(lines) => {
                    let saved_line = self.line_no;
                    for line in lines {
                        self.handle_line(&line, depth + 1);
                        self.line_no = saved_line;
                    }
                }
                Err(msg) => self.error_once(A203, msg, raw, Self::column_of(raw, word)),
            }
            return;
        }

        self.handle_instruction(word, operands_text, raw);
    }

    fn handle_instruction(&mut self, word: &str, operands_text: &str, raw: &str) {
        let mnemonic = word.to_ascii_uppercase();
        let operands = split_operands(operands_text);
        let ctx = PassCtx {
            pc: self.pc,
            symbols: &self.symbols,
            line: self.line_no,
            pass2: self.pass2,
        };
        if self.pass2 {
            let mut bytes = Vec::new();
            match self.isa.encode(&mnemonic, &operands, &ctx, &mut bytes) {
                Ok(()) => self.emit(&bytes),
                Err(failure) => {
                    let code = match &failure {
                        AsmFailure::Undefined(_) => A201,
                        AsmFailure::Other(_) => A204,
                    };
                    let col = Self::column_of(raw, word);
                    self.error(code, failure.to_string(), raw, col);
                }
            }
        } else {
            // Layout only; every sizing failure re-surfaces from `encode`
            // in pass 2, where it is reported exactly once.
            if let Ok(size) = self.isa.size_of(&mnemonic, &operands, &ctx) {
                self.advance(size);
            }
        }
    }

    fn handle_directive(&mut self, directive: &str, operands_text: &str, raw: &str) {
        let lower = directive.to_ascii_lowercase();
        match lower.as_str() {
            "org" => {
                if let Some(value) = self.eval_now(operands_text, raw) {
                    self.pc = value as u32;
                }
            }
            "equ" => {
                let mut parts = split_operands(operands_text);
                if parts.len() != 2 {
                    self.error_once(A200, "`.equ` expects NAME, VALUE", raw, 1);
                    return;
                }
                let value = parts.pop().expect("len checked");
                let name = parts.pop().expect("len checked");
                self.bind_equate(&name, &value, raw);
            }
            "byte" | "db" => self.data_bytes(operands_text, raw, 1),
            "half" | "dh" => self.data_bytes(operands_text, raw, 2),
            "word" | "dw" => self.data_bytes(operands_text, raw, self.isa.word_bytes()),
            "ascii" => self.data_string(operands_text, raw, false),
            "asciiz" => self.data_string(operands_text, raw, true),
            "space" => {
                if let Some(count) = self.eval_now(operands_text, raw) {
                    if self.pass2 {
                        self.emit(&vec![0u8; count as usize]);
                    } else {
                        self.advance(count as u32);
                    }
                }
            }
            "align" => {
                if let Some(align) = self.eval_now(operands_text, raw) {
                    if align <= 0 {
                        self.error_once(A200, "`.align` expects a positive value", raw, 1);
                        return;
                    }
                    let align = align as u32;
                    let pad = (align - self.pc % align) % align;
                    if self.pass2 {
                        self.emit(&vec![0u8; pad as usize]);
                    } else {
                        self.advance(pad);
                    }
                }
            }
            "macro" => match macros::parse_header(operands_text) {
                Ok((name, params)) => {
                    self.capture = Some(Macro {
                        name,
                        params,
                        body: Vec::new(),
                    });
                }
                Err(msg) => self.error_once(A203, msg, raw, 1),
            },
            "endmacro" => self.error_once(A203, "`.endmacro` without `.macro`", raw, 1),
            other => self.error_once(A200, format!("unknown directive `.{other}`"), raw, 1),
        }
    }

    /// Evaluates a directive operand that must resolve in both passes.
    fn eval_now(&mut self, text: &str, raw: &str) -> Option<i64> {
        match expr::eval(text, &self.symbols, self.pc, Some(self.line_no)) {
            Ok(value) => Some(value),
            Err(err) => {
                if !self.pass2 {
                    let code = match err {
                        EvalError::Undefined(_) => A201,
                        EvalError::Syntax(_) => A200,
                    };
                    self.error(code, err.to_string(), raw, 1);
                }
                None
            }
        }
    }

    fn data_bytes(&mut self, operands_text: &str, raw: &str, unit: u32) {
        let mut bytes = Vec::new();
        for item in split_operands(operands_text) {
            if item.starts_with('"') {
                match parse_string(&item) {
                    Ok(text) => bytes.extend_from_slice(&text),
                    Err(msg) => {
                        if !self.pass2 {
                            self.error(A200, msg, raw, Self::column_of(raw, &item));
                        }
                        continue;
                    }
                }
                continue;
            }
            // Sized numeric datum. Sizes never depend on values, so pass 1
            // just reserves space; only pass 2 needs the value.
            if self.pass2 {
                match expr::eval(&item, &self.symbols, self.pc, None) {
                    Ok(value) => {
                        bytes.extend_from_slice(&value.to_le_bytes()[..unit as usize]);
                    }
                    Err(err) => {
                        let code = match err {
                            EvalError::Undefined(_) => A201,
                            EvalError::Syntax(_) => A200,
                        };
                        self.error(code, err.to_string(), raw, Self::column_of(raw, &item));
                        bytes.extend_from_slice(&vec![0u8; unit as usize]);
                    }
                }
            } else {
                bytes.extend_from_slice(&vec![0u8; unit as usize]);
            }
        }
        if self.pass2 {
            self.emit(&bytes);
        } else {
            self.advance(bytes.len() as u32);
        }
    }

    fn data_string(&mut self, operands_text: &str, raw: &str, terminate: bool) {
        match parse_string(operands_text.trim()) {
            Ok(mut bytes) => {
                if terminate {
                    bytes.push(0);
                }
                if self.pass2 {
                    self.emit(&bytes);
                } else {
                    self.advance(bytes.len() as u32);
                }
            }
            Err(msg) => {
                if !self.pass2 {
                    self.error(A200, msg, raw, 1);
                }
            }
        }
    }

    fn bind_label(&mut self, name: &str, raw: &str) {
        if self.pass2 {
            return;
        }
        if self.symbols.contains_key(name) {
            self.error(
                A202,
                format!("duplicate label `{name}`"),
                raw,
                Self::column_of(raw, name),
            );
            return;
        }
        self.symbols.insert(
            name.to_string(),
            Symbol {
                value: self.pc as i64,
                line: self.line_no,
            },
        );
    }

    fn bind_equate(&mut self, name: &str, value_text: &str, raw: &str) {
        match expr::eval(value_text, &self.symbols, self.pc, Some(self.line_no)) {
            Ok(value) => {
                self.symbols.insert(
                    name.to_string(),
                    Symbol {
                        value,
                        line: self.line_no,
                    },
                );
            }
            Err(err) => {
                if !self.pass2 {
                    let code = match err {
                        EvalError::Undefined(_) => A201,
                        EvalError::Syntax(_) => A200,
                    };
                    self.error(code, err.to_string(), raw, 1);
                }
            }
        }
    }

    fn advance(&mut self, size: u32) {
        if size > 0 && !self.pass2 {
            let pc = self.pc;
            self.min_emit_pc = Some(self.min_emit_pc.map_or(pc, |m| m.min(pc)));
        }
        self.pc += size;
    }

    fn emit(&mut self, bytes: &[u8]) {
        if !bytes.is_empty() {
            let start = (self.pc - self.origin) as usize;
            if self.out.len() < start + bytes.len() {
                self.out.resize(start + bytes.len(), 0);
            }
            self.out[start..start + bytes.len()].copy_from_slice(bytes);
        }
        self.pc += bytes.len() as u32;
    }
}

/// Strips a `;` or `#` comment, honouring string and char quotes.
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut in_char = false;
    let mut prev_backslash = false;
    for (i, c) in line.char_indices() {
        if prev_backslash {
            prev_backslash = false;
            continue;
        }
        match c {
            '\\' if in_string || in_char => prev_backslash = true,
            '"' if !in_char => in_string = !in_string,
            '\'' if !in_string => in_char = !in_char,
            ';' | '#' if !in_string && !in_char => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Splits off a leading `name:` label, if present.
fn split_label(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    let end = text.find(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != '.')?;
    if end == 0 || !text[end..].starts_with(':') {
        return None;
    }
    Some((&text[..end], &text[end + 1..]))
}

/// Recognises `NAME = expr` and `NAME .equ expr` equate lines.
fn split_equate(text: &str) -> Option<(&str, &str)> {
    let text = text.trim();
    let end = text.find(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != '.')?;
    if end == 0 {
        return None;
    }
    let name = &text[..end];
    let tail = text[end..].trim_start();
    if let Some(value) = tail.strip_prefix('=') {
        return Some((name, value.trim()));
    }
    let mut words = tail.splitn(2, char::is_whitespace);
    if words.next()?.eq_ignore_ascii_case(".equ") {
        return Some((name, words.next().unwrap_or("").trim()));
    }
    None
}

/// Splits an operand list on top-level commas, honouring parentheses and
/// quoted literals.
fn split_operands(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut depth = 0u32;
    let mut in_string = false;
    let mut in_char = false;
    let mut prev_backslash = false;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if prev_backslash {
            prev_backslash = false;
            continue;
        }
        match c {
            '\\' if in_string || in_char => prev_backslash = true,
            '"' if !in_char => in_string = !in_string,
            '\'' if !in_string => in_char = !in_char,
            '(' if !in_string && !in_char => depth += 1,
            ')' if !in_string && !in_char => depth = depth.saturating_sub(1),
            ',' if depth == 0 && !in_string && !in_char => {
                parts.push(text[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(text[start..].trim().to_string());
    parts
}

/// Parses a double-quoted string literal into bytes.
fn parse_string(text: &str) -> Result<Vec<u8>, String> {
    let inner = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .ok_or_else(|| "expected a double-quoted string".to_string())?;
    unescape(inner)
}
