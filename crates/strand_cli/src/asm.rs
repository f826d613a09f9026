//! `strand asm`: assemble a 6502 or RV32I source file.

use crate::IsaChoice;
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use strand_asm::{assemble_str, Isa, Mos6502, Rv32i};
use strand_diagnostics::render;

/// Arguments for the `strand asm` subcommand.
#[derive(Parser, Debug)]
pub struct AsmArgs {
    /// The assembly source file.
    pub file: String,

    /// Target instruction set.
    #[arg(long, value_enum)]
    pub isa: IsaChoice,

    /// Output path; defaults to the input with a `.bin` extension.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Print the symbol table after assembling.
    #[arg(long)]
    pub symbols: bool,
}

pub fn run(args: &AsmArgs, quiet: bool) -> Result<(), String> {
    let source = fs::read_to_string(&args.file)
        .map_err(|e| format!("cannot read `{}`: {e}", args.file))?;
    let isa: &dyn Isa = match args.isa {
        IsaChoice::Mos6502 => &Mos6502,
        IsaChoice::Rv32i => &Rv32i,
    };
    let assembly = assemble_str(&source, isa).map_err(|e| e.to_string())?;

    if !assembly.errors.is_empty() {
        eprint!("{}", render::render_all(&assembly.errors, &args.file));
        return Err(format!(
            "{} error(s) in `{}`",
            assembly.errors.len(),
            args.file
        ));
    }

    let out_path = args
        .output
        .clone()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&args.file).with_extension("bin"));
    fs::write(&out_path, &assembly.bytes).map_err(|e| e.to_string())?;

    if !quiet {
        println!(
            "assembled `{}`: {} bytes at origin 0x{:04X} -> {}",
            args.file,
            assembly.bytes.len(),
            assembly.origin,
            out_path.display()
        );
    }
    if args.symbols {
        let mut symbols: Vec<_> = assembly.symbols.iter().collect();
        symbols.sort_by_key(|(name, _)| name.clone());
        for (name, value) in symbols {
            println!("{name} = 0x{value:04X}");
        }
    }
    Ok(())
}
