//! Strand CLI — compile HDL designs to WebAssembly and assemble retro
//! machine code.
//!
//! Provides `strand init` for project scaffolding, `strand build` to
//! compile a design into a `.wasm` evaluator plus its signal map,
//! `strand run` to drive a compiled design from the command line, and
//! `strand asm` for the 6502/RV32I assembler.

#![warn(missing_docs)]

mod asm;
mod build;
mod init;
mod run;

use clap::{Parser, Subcommand, ValueEnum};
use std::process;

/// Strand — an HDL-to-WebAssembly circuit compiler.
#[derive(Parser, Debug)]
#[command(name = "strand", version, about = "Strand HDL toolchain")]
pub struct Cli {
    /// Suppress informational output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a custom `strand.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new strand project.
    Init {
        /// Project name (creates a subdirectory). If omitted, initializes
        /// the current directory.
        name: Option<String>,
    },
    /// Compile the project's design to WebAssembly.
    Build(build::BuildArgs),
    /// Compile and drive a design: set inputs, clock it, read outputs.
    Run(run::RunArgs),
    /// Assemble a source file.
    Asm(asm::AsmArgs),
}

/// Target instruction set for `strand asm`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum IsaChoice {
    /// MOS 6502 (variable 1–3 byte encodings).
    #[value(name = "6502")]
    Mos6502,
    /// RV32I (fixed 4-byte encodings).
    Rv32i,
}

fn main() {
    let cli = Cli::parse();
    let result = match &cli.command {
        Command::Init { name } => init::run(name.as_deref(), cli.quiet),
        Command::Build(args) => build::run(&cli, args),
        Command::Run(args) => run::run(&cli, args),
        Command::Asm(args) => asm::run(args, cli.quiet),
    };
    if let Err(message) = result {
        eprintln!("error: {message}");
        process::exit(1);
    }
}
