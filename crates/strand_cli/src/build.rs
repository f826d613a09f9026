//! `strand build`: design JSON to `.wasm` + signal map.

use crate::Cli;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use strand_diagnostics::{render, DiagnosticSink};
use strand_hdl::Design;
use strand_sim::CompiledCircuit;
use strand_wasm::OptLevel;

/// Arguments for the `strand build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Override the design JSON path from `strand.toml`.
    #[arg(long)]
    pub design: Option<String>,

    /// Override the top module from `strand.toml`.
    #[arg(long)]
    pub top: Option<String>,
}

pub fn run(cli: &Cli, args: &BuildArgs) -> Result<(), String> {
    let config_path = cli.config.clone().unwrap_or_else(|| {
        strand_config::CONFIG_FILE.to_string()
    });
    let config = strand_config::load(Path::new(&config_path)).map_err(|e| e.to_string())?;

    let design_path = args.design.clone().unwrap_or(config.project.design);
    let top = args.top.clone().unwrap_or(config.project.top);
    let opt = match config.build.opt_level {
        2 => Some(OptLevel::Two),
        4 => Some(OptLevel::Four),
        _ => None,
    };

    let circuit = compile_design(&design_path, &top, opt, cli.quiet)?;

    let out_dir = PathBuf::from(&config.build.out_dir);
    fs::create_dir_all(&out_dir).map_err(|e| e.to_string())?;
    let wasm_path = out_dir.join(format!("{top}.wasm"));
    fs::write(&wasm_path, &circuit.wasm).map_err(|e| e.to_string())?;
    let map_path = out_dir.join(format!("{top}.signals.json"));
    let map = serde_json::json!({
        "layout": circuit.layout,
        "signals": circuit.signals,
        "ports": circuit.ports,
        "exports": circuit.exports,
        "fingerprint": circuit.fingerprint.to_string(),
    });
    fs::write(&map_path, serde_json::to_vec_pretty(&map).map_err(|e| e.to_string())?)
        .map_err(|e| e.to_string())?;

    if !cli.quiet {
        let stats = circuit.stats;
        println!(
            "built `{top}`: {} gates in {} levels, {} dffs, {} behavioral, {} signals",
            stats.gates,
            stats.levels,
            stats.dffs,
            stats.behavioral,
            circuit.signals.len()
        );
        println!("  {} ({} bytes)", wasm_path.display(), circuit.wasm.len());
        println!("  {}", map_path.display());
    }
    Ok(())
}

/// Loads a design JSON and compiles it, rendering any warnings.
pub fn compile_design(
    design_path: &str,
    top: &str,
    opt: Option<OptLevel>,
    quiet: bool,
) -> Result<CompiledCircuit, String> {
    let text = fs::read_to_string(design_path)
        .map_err(|e| format!("cannot read `{design_path}`: {e}"))?;
    let design: Design = serde_json::from_str(&text)
        .map_err(|e| format!("`{design_path}` is not a valid design: {e}"))?;

    let sink = DiagnosticSink::new();
    let result = strand_sim::compile_with(&design, top, opt, &sink);
    if !quiet {
        for diag in sink.take_all() {
            eprint!("{}", render::render(&diag, design_path));
        }
    }
    result.map_err(|e| e.to_string())
}
