//! Acceptance tests for the two-pass engine across both ISA backends.

use strand_asm::{
    assemble, assemble_str, BlockDevice, BlockReader, Mos6502, Rv32i, StringReader, SECTOR_SIZE,
};

fn bytes_6502(source: &str) -> Vec<u8> {
    let asm = assemble_str(source, &Mos6502).unwrap();
    assert!(asm.errors.is_empty(), "{:#?}", asm.errors);
    asm.bytes
}

#[test]
fn forward_reference_jump() {
    let source = ".org $0800\nJMP START\nNOP\nSTART: RTS\n";
    assert_eq!(bytes_6502(source), vec![0x4C, 0x04, 0x08, 0xEA, 0x60]);
}

#[test]
fn dw_is_little_endian() {
    assert_eq!(
        bytes_6502(".DW $1234, $ABCD\n"),
        vec![0x34, 0x12, 0xCD, 0xAB]
    );
}

#[test]
fn db_strings_and_bytes() {
    let source = ".DB \"Hi\"\n.DB \"OK\",0x0D,0x0A,0\n";
    assert_eq!(
        bytes_6502(source),
        vec![0x48, 0x69, 0x4F, 0x4B, 0x0D, 0x0A, 0x00]
    );
}

#[test]
fn ascii_directives() {
    assert_eq!(bytes_6502(".ascii \"AB\"\n.asciiz \"C\"\n"), b"ABC\0");
    assert_eq!(bytes_6502(".asciiz \"a\\tb\\n\"\n"), b"a\tb\n\0");
}

#[test]
fn org_gap_pads_with_zeros() {
    let source = ".org $0800\nNOP\n.org $0804\nRTS\n";
    assert_eq!(bytes_6502(source), vec![0xEA, 0, 0, 0, 0x60]);
}

#[test]
fn symbols_appear_in_the_result() {
    let asm = assemble_str(".org $0800\nSTART: RTS\nVALUE = 7\n", &Mos6502).unwrap();
    assert_eq!(asm.symbols.get("START"), Some(&0x0800));
    assert_eq!(asm.symbols.get("VALUE"), Some(&7));
    assert_eq!(asm.origin, 0x0800);
}

#[test]
fn duplicate_label_is_collected() {
    let asm = assemble_str("L: NOP\nL: NOP\n", &Mos6502).unwrap();
    assert_eq!(asm.errors.len(), 1);
    assert!(asm.errors[0].message.contains("duplicate label `L`"));
    assert_eq!(asm.errors[0].line, Some(2));
}

#[test]
fn undefined_symbol_reports_line_and_caret() {
    let asm = assemble_str("NOP\n    JMP NOWHERE\n", &Mos6502).unwrap();
    assert_eq!(asm.errors.len(), 1);
    let err = &asm.errors[0];
    assert!(err.message.contains("NOWHERE"));
    assert_eq!(err.line, Some(2));
    assert_eq!(err.source_line.as_deref(), Some("    JMP NOWHERE"));
    assert_eq!(err.caret_col, Some(5));
}

#[test]
fn macro_body_used_twice_doubles_the_bytes() {
    let source = "\
.macro PUSH16 val
  LDA #<\\val
  PHA
  LDA #>\\val
  PHA
.endmacro
PUSH16 $1234
PUSH16 $1234
";
    let emitted = bytes_6502(source);
    assert_eq!(emitted.len(), 12);
    let (first, second) = emitted.split_at(6);
    assert_eq!(first, second);
    assert_eq!(&first[..2], &[0xA9, 0x34]);
}

#[test]
fn macro_labels_bind_at_expansion() {
    let source = "\
.macro JUMPBACK target
  JMP \\target
.endmacro
TOP: NOP
JUMPBACK TOP
";
    assert_eq!(bytes_6502(source), vec![0xEA, 0x4C, 0x00, 0x00]);
}

#[test]
fn rv32i_round_trip() {
    let asm = assemble_str("ADDI a0, zero, 42\nECALL\n", &Rv32i).unwrap();
    assert!(asm.errors.is_empty());
    assert_eq!(asm.bytes[0..4], [0x13, 0x05, 0xA0, 0x02]);
    assert_eq!(asm.bytes[4..8], [0x73, 0x00, 0x00, 0x00]);
}

#[test]
fn rv32i_li_sizing() {
    // In-range literal: one ADDI.
    let asm = assemble_str("LI a0, -2048\n", &Rv32i).unwrap();
    assert_eq!(asm.bytes.len(), 4);
    // Out-of-range literal: LUI + ADDI.
    let asm = assemble_str("LI a0, 2048\n", &Rv32i).unwrap();
    assert_eq!(asm.bytes.len(), 8);
    // Symbolic operand: wide form regardless of value.
    let asm = assemble_str("V = 5\nLI a0, V\n", &Rv32i).unwrap();
    assert_eq!(asm.bytes.len(), 8);
}

#[test]
fn rv32i_la_resolves_forward() {
    let source = ".org 0x2000\nLA a0, MSG\nECALL\nMSG: .asciiz \"hey\"\n";
    let asm = assemble_str(source, &Rv32i).unwrap();
    assert!(asm.errors.is_empty(), "{:#?}", asm.errors);
    let auipc = u32::from_le_bytes(asm.bytes[0..4].try_into().unwrap());
    let addi = u32::from_le_bytes(asm.bytes[4..8].try_into().unwrap());
    let hi = (auipc >> 12) as i32;
    let lo = ((addi >> 20) as i32) << 20 >> 20;
    assert_eq!(0x2000 + (hi << 12).wrapping_add(lo), 0x200C);
}

// --- streaming equivalence ----------------------------------------------

struct MemDevice {
    image: Vec<u8>,
}

impl MemDevice {
    fn from_text(text: &str) -> Self {
        let mut image = text.as_bytes().to_vec();
        let sectors = image.len().div_ceil(SECTOR_SIZE).max(1);
        image.resize(sectors * SECTOR_SIZE, 0);
        Self { image }
    }
}

impl BlockDevice for MemDevice {
    fn read_sector(&mut self, index: u32, buf: &mut [u8; SECTOR_SIZE]) -> Result<(), String> {
        let start = index as usize * SECTOR_SIZE;
        buf.copy_from_slice(&self.image[start..start + SECTOR_SIZE]);
        Ok(())
    }

    fn sector_count(&self) -> u32 {
        (self.image.len() / SECTOR_SIZE) as u32
    }
}

#[test]
fn streaming_source_assembles_identically() {
    // A source comfortably larger than one sector, with labels spanning
    // sector boundaries.
    let mut source = String::from(".org $0800\n");
    for i in 0..300 {
        source.push_str(&format!("L{i}: LDA #{}\n", i % 256));
    }
    source.push_str("JMP L0\n");
    assert!(source.len() > 2 * SECTOR_SIZE);

    let in_memory = assemble(&mut StringReader::new(&source), &Mos6502).unwrap();
    let mut streamed_reader = BlockReader::new(MemDevice::from_text(&source));
    let streamed = assemble(&mut streamed_reader, &Mos6502).unwrap();

    assert!(in_memory.errors.is_empty());
    assert!(streamed.errors.is_empty());
    assert_eq!(in_memory.bytes, streamed.bytes);
    assert_eq!(in_memory.origin, streamed.origin);
}
