//! RV32I backend: the base integer set plus the standard pseudo-instructions.
//!
//! Every real instruction is 4 bytes. Pseudo-instruction sizes are decided
//! syntactically — `LI` with a literal immediate in ADDI range is 4 bytes,
//! any other `LI`, plus `LA` and `CALL`, are 8 — so pass 1 and pass 2
//! always agree on layout.

use crate::isa::{AsmFailure, Isa, PassCtx};

/// The RV32I instruction set.
pub struct Rv32i;

const OP_LUI: u32 = 0x37;
const OP_AUIPC: u32 = 0x17;
const OP_JAL: u32 = 0x6F;
const OP_JALR: u32 = 0x67;
const OP_BRANCH: u32 = 0x63;
const OP_LOAD: u32 = 0x03;
const OP_STORE: u32 = 0x23;
const OP_IMM: u32 = 0x13;
const OP_REG: u32 = 0x33;
const OP_SYSTEM: u32 = 0x73;

/// Resolves a register name: `x0`..`x31` or an ABI name.
fn reg(name: &str) -> Result<u32, AsmFailure> {
    let lower = name.to_ascii_lowercase();
    if let Some(num) = lower.strip_prefix('x') {
        if let Ok(n) = num.parse::<u32>() {
            if n < 32 {
                return Ok(n);
            }
        }
    }
    let n = match lower.as_str() {
        "zero" => 0,
        "ra" => 1,
        "sp" => 2,
        "gp" => 3,
        "tp" => 4,
        "t0" => 5,
        "t1" => 6,
        "t2" => 7,
        "s0" | "fp" => 8,
        "s1" => 9,
        "a0" => 10,
        "a1" => 11,
        "a2" => 12,
        "a3" => 13,
        "a4" => 14,
        "a5" => 15,
        "a6" => 16,
        "a7" => 17,
        "s2" => 18,
        "s3" => 19,
        "s4" => 20,
        "s5" => 21,
        "s6" => 22,
        "s7" => 23,
        "s8" => 24,
        "s9" => 25,
        "s10" => 26,
        "s11" => 27,
        "t3" => 28,
        "t4" => 29,
        "t5" => 30,
        "t6" => 31,
        _ => return Err(AsmFailure::Other(format!("unknown register `{name}`"))),
    };
    Ok(n)
}

fn r_type(funct7: u32, rs2: u32, rs1: u32, funct3: u32, rd: u32) -> u32 {
    funct7 << 25 | rs2 << 20 | rs1 << 15 | funct3 << 12 | rd << 7 | OP_REG
}

fn i_type(imm: i32, rs1: u32, funct3: u32, rd: u32, opcode: u32) -> u32 {
    (imm as u32 & 0xFFF) << 20 | rs1 << 15 | funct3 << 12 | rd << 7 | opcode
}

fn s_type(imm: i32, rs2: u32, rs1: u32, funct3: u32) -> u32 {
    let imm = imm as u32;
    (imm >> 5 & 0x7F) << 25 | rs2 << 20 | rs1 << 15 | funct3 << 12 | (imm & 0x1F) << 7 | OP_STORE
}

fn b_type(offset: i32, rs2: u32, rs1: u32, funct3: u32) -> u32 {
    let imm = offset as u32;
    (imm >> 12 & 1) << 31
        | (imm >> 5 & 0x3F) << 25
        | rs2 << 20
        | rs1 << 15
        | funct3 << 12
        | (imm >> 1 & 0xF) << 8
        | (imm >> 11 & 1) << 7
        | OP_BRANCH
}

fn u_type(imm20: u32, rd: u32, opcode: u32) -> u32 {
    (imm20 & 0xF_FFFF) << 12 | rd << 7 | opcode
}

fn j_type(offset: i32, rd: u32) -> u32 {
    let imm = offset as u32;
    (imm >> 20 & 1) << 31
        | (imm >> 1 & 0x3FF) << 21
        | (imm >> 11 & 1) << 20
        | (imm >> 12 & 0xFF) << 12
        | rd << 7
        | OP_JAL
}

/// Splits a 32-bit value into the `LUI`/`AUIPC` upper 20 bits and the
/// sign-extended low 12 bits whose sum reconstructs it exactly.
fn hi_lo(value: i32) -> (u32, i32) {
    let lo = (value << 20) >> 20;
    let hi = (value.wrapping_sub(lo) as u32) >> 12;
    (hi, lo)
}

/// Parses a `imm(reg)` memory operand.
fn mem_operand(text: &str) -> Result<(&str, &str), AsmFailure> {
    let open = text
        .find('(')
        .ok_or_else(|| AsmFailure::Other(format!("expected `imm(reg)`, got `{text}`")))?;
    let close = text
        .rfind(')')
        .filter(|&c| c > open)
        .ok_or_else(|| AsmFailure::Other(format!("unclosed `(` in `{text}`")))?;
    let imm = text[..open].trim();
    let imm = if imm.is_empty() { "0" } else { imm };
    Ok((imm, text[open + 1..close].trim()))
}

struct Shape {
    /// Real instructions are 4 bytes; `LI` (wide), `LA`, `CALL` are 8.
    size: u32,
}

impl Rv32i {
    fn shape(&self, mnemonic: &str, operands: &[String], ctx: &PassCtx) -> Shape {
        let size = match mnemonic {
            "LI" => {
                let wide = match operands {
                    [_, imm] if ctx.is_literal(imm) => {
                        // Literal values are pass-independent; range picks
                        // the short form.
                        !matches!(ctx.eval(imm), Ok(v) if (-2048..2048).contains(&v))
                    }
                    _ => true,
                };
                if wide {
                    8
                } else {
                    4
                }
            }
            "LA" | "CALL" => 8,
            _ => 4,
        };
        Shape { size }
    }

    fn check_imm12(value: i64) -> Result<i32, AsmFailure> {
        if !(-2048..2048).contains(&value) {
            return Err(AsmFailure::Other(format!(
                "immediate {value} does not fit in 12 bits"
            )));
        }
        Ok(value as i32)
    }

    fn branch_offset(ctx: &PassCtx, target: i64) -> Result<i32, AsmFailure> {
        let offset = target - ctx.pc as i64;
        if offset % 2 != 0 || !(-4096..4096).contains(&offset) {
            return Err(AsmFailure::Other(format!(
                "branch offset {offset} is out of range"
            )));
        }
        Ok(offset as i32)
    }

    fn emit_words(out: &mut Vec<u8>, words: &[u32]) {
        for word in words {
            out.extend_from_slice(&word.to_le_bytes());
        }
    }

    #[allow(clippy::too_many_lines)]
    fn encode_inner(
        &self,
        mnemonic: &str,
        operands: &[String],
        ctx: &PassCtx,
    ) -> Result<Vec<u32>, AsmFailure> {
        let want = |n: usize| -> Result<(), AsmFailure> {
            if operands.len() == n {
                Ok(())
            } else {
                Err(AsmFailure::Other(format!(
                    "{mnemonic} expects {n} operand(s), got {}",
                    operands.len()
                )))
            }
        };

        // R-type register arithmetic.
        if let Some((funct7, funct3)) = match mnemonic {
            "ADD" => Some((0x00, 0x0)),
            "SUB" => Some((0x20, 0x0)),
            "SLL" => Some((0x00, 0x1)),
            "SLT" => Some((0x00, 0x2)),
            "SLTU" => Some((0x00, 0x3)),
            "XOR" => Some((0x00, 0x4)),
            "SRL" => Some((0x00, 0x5)),
            "SRA" => Some((0x20, 0x5)),
            "OR" => Some((0x00, 0x6)),
            "AND" => Some((0x00, 0x7)),
            _ => None,
        } {
            want(3)?;
            let rd = reg(&operands[0])?;
            let rs1 = reg(&operands[1])?;
            let rs2 = reg(&operands[2])?;
            return Ok(vec![r_type(funct7, rs2, rs1, funct3, rd)]);
        }

        // I-type immediate arithmetic.
        if let Some(funct3) = match mnemonic {
            "ADDI" => Some(0x0),
            "SLTI" => Some(0x2),
            "SLTIU" => Some(0x3),
            "XORI" => Some(0x4),
            "ORI" => Some(0x6),
            "ANDI" => Some(0x7),
            _ => None,
        } {
            want(3)?;
            let rd = reg(&operands[0])?;
            let rs1 = reg(&operands[1])?;
            let imm = Self::check_imm12(ctx.eval(&operands[2])?)?;
            return Ok(vec![i_type(imm, rs1, funct3, rd, OP_IMM)]);
        }

        // Shifts with a 5-bit shift amount.
        if let Some((funct3, upper)) = match mnemonic {
            "SLLI" => Some((0x1, 0x00)),
            "SRLI" => Some((0x5, 0x00)),
            "SRAI" => Some((0x5, 0x20)),
            _ => None,
        } {
            want(3)?;
            let rd = reg(&operands[0])?;
            let rs1 = reg(&operands[1])?;
            let shamt = ctx.eval(&operands[2])?;
            if !(0..32).contains(&shamt) {
                return Err(AsmFailure::Other(format!(
                    "shift amount {shamt} is out of range"
                )));
            }
            let imm = (upper << 5 | shamt as u32) as i32;
            return Ok(vec![i_type(imm, rs1, funct3, rd, OP_IMM)]);
        }

        // Loads.
        if let Some(funct3) = match mnemonic {
            "LB" => Some(0x0),
            "LH" => Some(0x1),
            "LW" => Some(0x2),
            "LBU" => Some(0x4),
            "LHU" => Some(0x5),
            _ => None,
        } {
            want(2)?;
            let rd = reg(&operands[0])?;
            let (imm, base) = mem_operand(&operands[1])?;
            let imm = Self::check_imm12(ctx.eval(imm)?)?;
            return Ok(vec![i_type(imm, reg(base)?, funct3, rd, OP_LOAD)]);
        }

        // Stores.
        if let Some(funct3) = match mnemonic {
            "SB" => Some(0x0),
            "SH" => Some(0x1),
            "SW" => Some(0x2),
            _ => None,
        } {
            want(2)?;
            let rs2 = reg(&operands[0])?;
            let (imm, base) = mem_operand(&operands[1])?;
            let imm = Self::check_imm12(ctx.eval(imm)?)?;
            return Ok(vec![s_type(imm, rs2, reg(base)?, funct3)]);
        }

        // Branches.
        if let Some(funct3) = match mnemonic {
            "BEQ" => Some(0x0),
            "BNE" => Some(0x1),
            "BLT" => Some(0x4),
            "BGE" => Some(0x5),
            "BLTU" => Some(0x6),
            "BGEU" => Some(0x7),
            _ => None,
        } {
            want(3)?;
            let rs1 = reg(&operands[0])?;
            let rs2 = reg(&operands[1])?;
            let offset = Self::branch_offset(ctx, ctx.eval(&operands[2])?)?;
            return Ok(vec![b_type(offset, rs2, rs1, funct3)]);
        }

        match mnemonic {
            "LUI" | "AUIPC" => {
                want(2)?;
                let rd = reg(&operands[0])?;
                let imm = ctx.eval(&operands[1])?;
                if !(0..=0xF_FFFF).contains(&imm) {
                    return Err(AsmFailure::Other(format!(
                        "upper immediate {imm} does not fit in 20 bits"
                    )));
                }
                let opcode = if mnemonic == "LUI" { OP_LUI } else { OP_AUIPC };
                Ok(vec![u_type(imm as u32, rd, opcode)])
            }
            "JAL" => {
                let (rd, target) = match operands {
                    [target] => (1, target),
                    [rd, target] => (reg(rd)?, target),
                    _ => return Err(AsmFailure::Other("JAL expects [rd,] target".to_string())),
                };
                let offset = Self::jump_offset(ctx, ctx.eval(target)?)?;
                Ok(vec![j_type(offset, rd)])
            }
            "JALR" => {
                let (rd, rs1, imm) = match operands {
                    [rs1] => (1, reg(rs1)?, 0),
                    [rd, mem] if mem.contains('(') => {
                        let (imm, base) = mem_operand(mem)?;
                        (reg(rd)?, reg(base)?, Self::check_imm12(ctx.eval(imm)?)?)
                    }
                    [rd, rs1, imm] => (
                        reg(rd)?,
                        reg(rs1)?,
                        Self::check_imm12(ctx.eval(imm)?)?,
                    ),
                    _ => {
                        return Err(AsmFailure::Other(
                            "JALR expects rs1 | rd, imm(rs1) | rd, rs1, imm".to_string(),
                        ))
                    }
                };
                Ok(vec![i_type(imm, rs1, 0x0, rd, OP_JALR)])
            }
            "ECALL" => {
                want(0)?;
                Ok(vec![0x0000_0073])
            }
            "EBREAK" => {
                want(0)?;
                Ok(vec![0x0010_0073])
            }
            "FENCE" => Ok(vec![0x0FF0_000F]),

            // Pseudo-instructions.
            "NOP" => {
                want(0)?;
                Ok(vec![i_type(0, 0, 0x0, 0, OP_IMM)])
            }
            "MV" => {
                want(2)?;
                let rd = reg(&operands[0])?;
                let rs1 = reg(&operands[1])?;
                Ok(vec![i_type(0, rs1, 0x0, rd, OP_IMM)])
            }
            "LI" => {
                want(2)?;
                let rd = reg(&operands[0])?;
                let value = ctx.eval(&operands[1])?;
                if self.shape(mnemonic, operands, ctx).size == 4 {
                    let imm = Self::check_imm12(value)?;
                    Ok(vec![i_type(imm, 0, 0x0, rd, OP_IMM)])
                } else {
                    let (hi, lo) = hi_lo(value as i32);
                    Ok(vec![
                        u_type(hi, rd, OP_LUI),
                        i_type(lo, rd, 0x0, rd, OP_IMM),
                    ])
                }
            }
            "LA" => {
                want(2)?;
                let rd = reg(&operands[0])?;
                let target = ctx.eval(&operands[1])?;
                let offset = (target - ctx.pc as i64) as i32;
                let (hi, lo) = hi_lo(offset);
                Ok(vec![
                    u_type(hi, rd, OP_AUIPC),
                    i_type(lo, rd, 0x0, rd, OP_IMM),
                ])
            }
            "CALL" => {
                want(1)?;
                let target = ctx.eval(&operands[0])?;
                let offset = (target - ctx.pc as i64) as i32;
                let (hi, lo) = hi_lo(offset);
                Ok(vec![
                    u_type(hi, 1, OP_AUIPC),
                    i_type(lo, 1, 0x0, 1, OP_JALR),
                ])
            }
            "J" => {
                want(1)?;
                let offset = Self::jump_offset(ctx, ctx.eval(&operands[0])?)?;
                Ok(vec![j_type(offset, 0)])
            }
            "JR" => {
                want(1)?;
                Ok(vec![i_type(0, reg(&operands[0])?, 0x0, 0, OP_JALR)])
            }
            "RET" => {
                want(0)?;
                Ok(vec![i_type(0, 1, 0x0, 0, OP_JALR)])
            }
            "BEQZ" | "BNEZ" | "BLTZ" | "BGEZ" => {
                want(2)?;
                let rs1 = reg(&operands[0])?;
                let offset = Self::branch_offset(ctx, ctx.eval(&operands[1])?)?;
                let word = match mnemonic {
                    "BEQZ" => b_type(offset, 0, rs1, 0x0),
                    "BNEZ" => b_type(offset, 0, rs1, 0x1),
                    "BLTZ" => b_type(offset, 0, rs1, 0x4),
                    _ => b_type(offset, 0, rs1, 0x5),
                };
                Ok(vec![word])
            }
            other => Err(AsmFailure::Other(format!("unknown mnemonic `{other}`"))),
        }
    }

    fn jump_offset(ctx: &PassCtx, target: i64) -> Result<i32, AsmFailure> {
        let offset = target - ctx.pc as i64;
        if offset % 2 != 0 || !(-(1 << 20)..(1 << 20)).contains(&offset) {
            return Err(AsmFailure::Other(format!(
                "jump offset {offset} is out of range"
            )));
        }
        Ok(offset as i32)
    }
}

impl Isa for Rv32i {
    fn name(&self) -> &'static str {
        "rv32i"
    }

    fn word_bytes(&self) -> u32 {
        4
    }

    fn size_of(
        &self,
        mnemonic: &str,
        operands: &[String],
        ctx: &PassCtx,
    ) -> Result<u32, AsmFailure> {
        Ok(self.shape(mnemonic, operands, ctx).size)
    }

    fn encode(
        &self,
        mnemonic: &str,
        operands: &[String],
        ctx: &PassCtx,
        out: &mut Vec<u8>,
    ) -> Result<(), AsmFailure> {
        let words = self.encode_inner(mnemonic, operands, ctx)?;
        Self::emit_words(out, &words);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble_str;

    fn bytes(source: &str) -> Vec<u8> {
        let asm = assemble_str(source, &Rv32i).unwrap();
        assert!(asm.errors.is_empty(), "{:#?}", asm.errors);
        asm.bytes
    }

    fn words(source: &str) -> Vec<u32> {
        bytes(source)
            .chunks(4)
            .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
            .collect()
    }

    #[test]
    fn addi_and_ecall() {
        let ws = words("ADDI a0, zero, 42\nECALL\n");
        assert_eq!(ws, vec![0x02A0_0513, 0x0000_0073]);
    }

    #[test]
    fn register_names_and_aliases() {
        assert_eq!(reg("x10").unwrap(), 10);
        assert_eq!(reg("a0").unwrap(), 10);
        assert_eq!(reg("fp").unwrap(), 8);
        assert_eq!(reg("s0").unwrap(), 8);
        assert!(reg("x32").is_err());
        assert!(reg("q7").is_err());
    }

    #[test]
    fn r_type_encoding() {
        let ws = words("ADD a0, a1, a2\nSUB t0, t1, t2\n");
        assert_eq!(ws[0], 0x00C5_8533);
        assert_eq!(ws[1], 0x4073_02B3);
    }

    #[test]
    fn loads_and_stores() {
        let ws = words("LW a0, 8(sp)\nSW a0, -4(sp)\n");
        assert_eq!(ws[0], 0x0081_2503);
        // sw a0, -4(sp): imm=-4 -> 0xFFC; imm[11:5]=0x7F, imm[4:0]=0x1C
        assert_eq!(ws[1], 0xFEA1_2E23);
    }

    #[test]
    fn branch_encoding_round_trips_offset() {
        // beq x0, x0, +8
        let ws = words("BEQ zero, zero, *+8\n");
        let w = ws[0];
        let imm12 = (w >> 31) & 1;
        let imm10_5 = (w >> 25) & 0x3F;
        let imm4_1 = (w >> 8) & 0xF;
        let imm11 = (w >> 7) & 1;
        let offset = (imm12 << 12 | imm11 << 11 | imm10_5 << 5 | imm4_1 << 1) as i32;
        assert_eq!(offset, 8);
    }

    #[test]
    fn li_short_form_in_range() {
        let asm = assemble_str("LI a0, 2047\nLI a1, -2048\n", &Rv32i).unwrap();
        assert!(asm.errors.is_empty());
        assert_eq!(asm.bytes.len(), 8);
        let ws = words("LI a0, 2047\nLI a1, -2048\n");
        assert_eq!(ws[0], 0x7FF0_0513);
        assert_eq!(ws[1], 0x8000_0593);
    }

    #[test]
    fn li_wide_form_reconstructs_value() {
        for value in [2048i64, -2049, 0x12345678, -1i64 << 31, 0x7FFF_FFFF] {
            let ws = words(&format!("LI a0, {value}\n"));
            assert_eq!(ws.len(), 2, "value {value}");
            let hi = (ws[0] >> 12) as i32;
            let lo = ((ws[1] >> 20) as i32) << 20 >> 20;
            let loaded = (hi << 12).wrapping_add(lo);
            assert_eq!(loaded, value as i32, "value {value}");
        }
    }

    #[test]
    fn la_pair_sums_to_label_address() {
        let source = ".org 0x1000\nLA a0, DATA\nNOP\nDATA: .word 0\n";
        let ws = words(source);
        // auipc at 0x1000; data label at 0x100C
        let hi = (ws[0] >> 12) as i32;
        let lo = ((ws[1] >> 20) as i32) << 20 >> 20;
        assert_eq!(0x1000 + (hi << 12).wrapping_add(lo), 0x100C);
        assert_eq!(ws[0] & 0x7F, OP_AUIPC);
        assert_eq!(ws[1] & 0x7F, OP_IMM);
    }

    #[test]
    fn pseudo_instructions() {
        let ws = words("NOP\nMV a0, a1\nRET\nJR t0\n");
        assert_eq!(ws[0], 0x0000_0013);
        assert_eq!(ws[1], 0x0005_8513);
        assert_eq!(ws[2], 0x0000_8067);
        assert_eq!(ws[3], 0x0002_8067);
    }

    #[test]
    fn forward_branch_resolves_in_pass_two() {
        let source = "BEQZ a0, DONE\nNOP\nDONE: RET\n";
        let ws = words(source);
        assert_eq!(ws.len(), 3);
        // offset +8 from instruction 0
        let w = ws[0];
        assert_eq!(w & 0x7F, OP_BRANCH);
        let imm4_1 = (w >> 8) & 0xF;
        assert_eq!(imm4_1 << 1, 8);
    }

    #[test]
    fn undefined_symbol_is_collected() {
        let asm = assemble_str("J NOWHERE\n", &Rv32i).unwrap();
        assert_eq!(asm.errors.len(), 1);
        assert!(asm.errors[0].message.contains("NOWHERE"));
        assert!(asm.bytes.is_empty());
    }
}
