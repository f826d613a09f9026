//! MOS 6502 backend: all documented opcodes and addressing modes.
//!
//! Encodings are 1–3 bytes. The zero-page forms are chosen over absolute
//! only when the address is a literal, or a symbol defined on or before
//! the using line, and fits in one byte — the one rule that keeps pass-1
//! sizing and pass-2 encoding in agreement for forward references (which
//! always take the absolute form).

use crate::isa::{AsmFailure, Isa, PassCtx};

/// The MOS 6502 instruction set.
pub struct Mos6502;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndexedIndirect,
    IndirectIndexed,
    Relative,
}

impl Mode {
    fn operand_bytes(self) -> u32 {
        match self {
            Mode::Implied | Mode::Accumulator => 0,
            Mode::Immediate
            | Mode::ZeroPage
            | Mode::ZeroPageX
            | Mode::ZeroPageY
            | Mode::IndexedIndirect
            | Mode::IndirectIndexed
            | Mode::Relative => 1,
            Mode::Absolute | Mode::AbsoluteX | Mode::AbsoluteY | Mode::Indirect => 2,
        }
    }
}

const BRANCHES: &[&str] = &["BCC", "BCS", "BEQ", "BMI", "BNE", "BPL", "BVC", "BVS"];

/// A parsed operand shape plus the expression text it carries.
struct Parsed<'t> {
    mode: Mode,
    expr: Option<&'t str>,
}

impl Mos6502 {
    fn parse<'t>(
        &self,
        mnemonic: &str,
        operands: &'t [String],
        ctx: &PassCtx,
    ) -> Result<Parsed<'t>, AsmFailure> {
        if BRANCHES.contains(&mnemonic) {
            let [target] = operands else {
                return Err(AsmFailure::Other(format!(
                    "{mnemonic} expects a branch target"
                )));
            };
            return Ok(Parsed {
                mode: Mode::Relative,
                expr: Some(target.as_str()),
            });
        }

        match operands {
            [] => Ok(Parsed {
                mode: Mode::Implied,
                expr: None,
            }),
            [only] if only.eq_ignore_ascii_case("A") => Ok(Parsed {
                mode: Mode::Accumulator,
                expr: None,
            }),
            [only] if only.starts_with('#') => Ok(Parsed {
                mode: Mode::Immediate,
                expr: Some(&only[1..]),
            }),
            [only] if only.starts_with('(') && only.ends_with(')') => {
                let inner = &only[1..only.len() - 1];
                if let Some(expr) = strip_index_suffix(inner, 'X') {
                    Ok(Parsed {
                        mode: Mode::IndexedIndirect,
                        expr: Some(expr),
                    })
                } else {
                    Ok(Parsed {
                        mode: Mode::Indirect,
                        expr: Some(inner),
                    })
                }
            }
            [indirect, index]
                if indirect.starts_with('(')
                    && indirect.ends_with(')')
                    && index.eq_ignore_ascii_case("Y") =>
            {
                Ok(Parsed {
                    mode: Mode::IndirectIndexed,
                    expr: Some(&indirect[1..indirect.len() - 1]),
                })
            }
            [addr] => Ok(self.direct(mnemonic, addr, None, ctx)),
            [addr, index] if index.eq_ignore_ascii_case("X") => {
                Ok(self.direct(mnemonic, addr, Some('X'), ctx))
            }
            [addr, index] if index.eq_ignore_ascii_case("Y") => {
                Ok(self.direct(mnemonic, addr, Some('Y'), ctx))
            }
            _ => Err(AsmFailure::Other(format!(
                "unsupported operands for {mnemonic}"
            ))),
        }
    }

    /// Picks zero-page or absolute for a direct address operand.
    fn direct<'t>(
        &self,
        mnemonic: &str,
        addr: &'t str,
        index: Option<char>,
        ctx: &PassCtx,
    ) -> Parsed<'t> {
        let (zp, abs) = match index {
            None => (Mode::ZeroPage, Mode::Absolute),
            Some('X') => (Mode::ZeroPageX, Mode::AbsoluteX),
            _ => (Mode::ZeroPageY, Mode::AbsoluteY),
        };
        let fits_zp = matches!(ctx.eval_backward(addr), Ok(v) if (0..256).contains(&v));
        let mode = if fits_zp && opcode(mnemonic, zp).is_some() {
            zp
        } else {
            abs
        };
        Parsed {
            mode,
            expr: Some(addr),
        }
    }
}

impl Isa for Mos6502 {
    fn name(&self) -> &'static str {
        "6502"
    }

    fn word_bytes(&self) -> u32 {
        2
    }

    fn size_of(
        &self,
        mnemonic: &str,
        operands: &[String],
        ctx: &PassCtx,
    ) -> Result<u32, AsmFailure> {
        let parsed = self.parse(mnemonic, operands, ctx)?;
        opcode(mnemonic, parsed.mode).ok_or_else(|| unknown(mnemonic, parsed.mode))?;
        Ok(1 + parsed.mode.operand_bytes())
    }

    fn encode(
        &self,
        mnemonic: &str,
        operands: &[String],
        ctx: &PassCtx,
        out: &mut Vec<u8>,
    ) -> Result<(), AsmFailure> {
        let parsed = self.parse(mnemonic, operands, ctx)?;
        let op = opcode(mnemonic, parsed.mode).ok_or_else(|| unknown(mnemonic, parsed.mode))?;
        out.push(op);

        let Some(expr) = parsed.expr else {
            return Ok(());
        };
        let value = ctx.eval(expr)?;

        match parsed.mode {
            Mode::Relative => {
                let offset = value - (ctx.pc as i64 + 2);
                if !(-128..=127).contains(&offset) {
                    return Err(AsmFailure::Other(format!(
                        "branch target out of range ({offset} bytes)"
                    )));
                }
                out.push(offset as u8);
            }
            Mode::Immediate
            | Mode::ZeroPage
            | Mode::ZeroPageX
            | Mode::ZeroPageY
            | Mode::IndexedIndirect
            | Mode::IndirectIndexed => {
                if !(-128..256).contains(&value) {
                    return Err(AsmFailure::Other(format!(
                        "value {value} does not fit in one byte"
                    )));
                }
                out.push(value as u8);
            }
            Mode::Absolute | Mode::AbsoluteX | Mode::AbsoluteY | Mode::Indirect => {
                if !(0..65536).contains(&value) {
                    return Err(AsmFailure::Other(format!(
                        "address {value} does not fit in 16 bits"
                    )));
                }
                out.push(value as u8);
                out.push((value >> 8) as u8);
            }
            Mode::Implied | Mode::Accumulator => unreachable!("no operand expression"),
        }
        Ok(())
    }
}

fn unknown(mnemonic: &str, mode: Mode) -> AsmFailure {
    AsmFailure::Other(format!(
        "{mnemonic} does not support {mode:?} addressing"
    ))
}

/// Strips a trailing `,X`-style register suffix inside indirect parens.
fn strip_index_suffix(inner: &str, register: char) -> Option<&str> {
    let (head, tail) = inner.rsplit_once(',')?;
    let tail = tail.trim();
    if tail.len() == 1 && tail.chars().next()?.eq_ignore_ascii_case(&register) {
        Some(head.trim_end())
    } else {
        None
    }
}

/// The documented-opcode table.
fn opcode(mnemonic: &str, mode: Mode) -> Option<u8> {
    use Mode::*;
    let op = match (mnemonic, mode) {
        ("ADC", Immediate) => 0x69,
        ("ADC", ZeroPage) => 0x65,
        ("ADC", ZeroPageX) => 0x75,
        ("ADC", Absolute) => 0x6D,
        ("ADC", AbsoluteX) => 0x7D,
        ("ADC", AbsoluteY) => 0x79,
        ("ADC", IndexedIndirect) => 0x61,
        ("ADC", IndirectIndexed) => 0x71,
        ("AND", Immediate) => 0x29,
        ("AND", ZeroPage) => 0x25,
        ("AND", ZeroPageX) => 0x35,
        ("AND", Absolute) => 0x2D,
        ("AND", AbsoluteX) => 0x3D,
        ("AND", AbsoluteY) => 0x39,
        ("AND", IndexedIndirect) => 0x21,
        ("AND", IndirectIndexed) => 0x31,
        ("ASL", Accumulator) | ("ASL", Implied) => 0x0A,
        ("ASL", ZeroPage) => 0x06,
        ("ASL", ZeroPageX) => 0x16,
        ("ASL", Absolute) => 0x0E,
        ("ASL", AbsoluteX) => 0x1E,
        ("BCC", Relative) => 0x90,
        ("BCS", Relative) => 0xB0,
        ("BEQ", Relative) => 0xF0,
        ("BIT", ZeroPage) => 0x24,
        ("BIT", Absolute) => 0x2C,
        ("BMI", Relative) => 0x30,
        ("BNE", Relative) => 0xD0,
        ("BPL", Relative) => 0x10,
        ("BRK", Implied) => 0x00,
        ("BVC", Relative) => 0x50,
        ("BVS", Relative) => 0x70,
        ("CLC", Implied) => 0x18,
        ("CLD", Implied) => 0xD8,
        ("CLI", Implied) => 0x58,
        ("CLV", Implied) => 0xB8,
        ("CMP", Immediate) => 0xC9,
        ("CMP", ZeroPage) => 0xC5,
        ("CMP", ZeroPageX) => 0xD5,
        ("CMP", Absolute) => 0xCD,
        ("CMP", AbsoluteX) => 0xDD,
        ("CMP", AbsoluteY) => 0xD9,
        ("CMP", IndexedIndirect) => 0xC1,
        ("CMP", IndirectIndexed) => 0xD1,
        ("CPX", Immediate) => 0xE0,
        ("CPX", ZeroPage) => 0xE4,
        ("CPX", Absolute) => 0xEC,
        ("CPY", Immediate) => 0xC0,
        ("CPY", ZeroPage) => 0xC4,
        ("CPY", Absolute) => 0xCC,
        ("DEC", ZeroPage) => 0xC6,
        ("DEC", ZeroPageX) => 0xD6,
        ("DEC", Absolute) => 0xCE,
        ("DEC", AbsoluteX) => 0xDE,
        ("DEX", Implied) => 0xCA,
        ("DEY", Implied) => 0x88,
        ("EOR", Immediate) => 0x49,
        ("EOR", ZeroPage) => 0x45,
        ("EOR", ZeroPageX) => 0x55,
        ("EOR", Absolute) => 0x4D,
        ("EOR", AbsoluteX) => 0x5D,
        ("EOR", AbsoluteY) => 0x59,
        ("EOR", IndexedIndirect) => 0x41,
        ("EOR", IndirectIndexed) => 0x51,
        ("INC", ZeroPage) => 0xE6,
        ("INC", ZeroPageX) => 0xF6,
        ("INC", Absolute) => 0xEE,
        ("INC", AbsoluteX) => 0xFE,
        ("INX", Implied) => 0xE8,
        ("INY", Implied) => 0xC8,
        ("JMP", Absolute) => 0x4C,
        ("JMP", Indirect) => 0x6C,
        ("JSR", Absolute) => 0x20,
        ("LDA", Immediate) => 0xA9,
        ("LDA", ZeroPage) => 0xA5,
        ("LDA", ZeroPageX) => 0xB5,
        ("LDA", Absolute) => 0xAD,
        ("LDA", AbsoluteX) => 0xBD,
        ("LDA", AbsoluteY) => 0xB9,
        ("LDA", IndexedIndirect) => 0xA1,
        ("LDA", IndirectIndexed) => 0xB1,
        ("LDX", Immediate) => 0xA2,
        ("LDX", ZeroPage) => 0xA6,
        ("LDX", ZeroPageY) => 0xB6,
        ("LDX", Absolute) => 0xAE,
        ("LDX", AbsoluteY) => 0xBE,
        ("LDY", Immediate) => 0xA0,
        ("LDY", ZeroPage) => 0xA4,
        ("LDY", ZeroPageX) => 0xB4,
        ("LDY", Absolute) => 0xAC,
        ("LDY", AbsoluteX) => 0xBC,
        ("LSR", Accumulator) | ("LSR", Implied) => 0x4A,
        ("LSR", ZeroPage) => 0x46,
        ("LSR", ZeroPageX) => 0x56,
        ("LSR", Absolute) => 0x4E,
        ("LSR", AbsoluteX) => 0x5E,
        ("NOP", Implied) => 0xEA,
        ("ORA", Immediate) => 0x09,
        ("ORA", ZeroPage) => 0x05,
        ("ORA", ZeroPageX) => 0x15,
        ("ORA", Absolute) => 0x0D,
        ("ORA", AbsoluteX) => 0x1D,
        ("ORA", AbsoluteY) => 0x19,
        ("ORA", IndexedIndirect) => 0x01,
        ("ORA", IndirectIndexed) => 0x11,
        ("PHA", Implied) => 0x48,
        ("PHP", Implied) => 0x08,
        ("PLA", Implied) => 0x68,
        ("PLP", Implied) => 0x28,
        ("ROL", Accumulator) | ("ROL", Implied) => 0x2A,
        ("ROL", ZeroPage) => 0x26,
        ("ROL", ZeroPageX) => 0x36,
        ("ROL", Absolute) => 0x2E,
        ("ROL", AbsoluteX) => 0x3E,
        ("ROR", Accumulator) | ("ROR", Implied) => 0x6A,
        ("ROR", ZeroPage) => 0x66,
        ("ROR", ZeroPageX) => 0x76,
        ("ROR", Absolute) => 0x6E,
        ("ROR", AbsoluteX) => 0x7E,
        ("RTI", Implied) => 0x40,
        ("RTS", Implied) => 0x60,
        ("SBC", Immediate) => 0xE9,
        ("SBC", ZeroPage) => 0xE5,
        ("SBC", ZeroPageX) => 0xF5,
        ("SBC", Absolute) => 0xED,
        ("SBC", AbsoluteX) => 0xFD,
        ("SBC", AbsoluteY) => 0xF9,
        ("SBC", IndexedIndirect) => 0xE1,
        ("SBC", IndirectIndexed) => 0xF1,
        ("SEC", Implied) => 0x38,
        ("SED", Implied) => 0xF8,
        ("SEI", Implied) => 0x78,
        ("STA", ZeroPage) => 0x85,
        ("STA", ZeroPageX) => 0x95,
        ("STA", Absolute) => 0x8D,
        ("STA", AbsoluteX) => 0x9D,
        ("STA", AbsoluteY) => 0x99,
        ("STA", IndexedIndirect) => 0x81,
        ("STA", IndirectIndexed) => 0x91,
        ("STX", ZeroPage) => 0x86,
        ("STX", ZeroPageY) => 0x96,
        ("STX", Absolute) => 0x8E,
        ("STY", ZeroPage) => 0x84,
        ("STY", ZeroPageX) => 0x94,
        ("STY", Absolute) => 0x8C,
        ("TAX", Implied) => 0xAA,
        ("TAY", Implied) => 0xA8,
        ("TSX", Implied) => 0xBA,
        ("TXA", Implied) => 0x8A,
        ("TXS", Implied) => 0x9A,
        ("TYA", Implied) => 0x98,
        _ => return None,
    };
    Some(op)
}
