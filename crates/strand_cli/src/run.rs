//! `strand run`: compile, instantiate, and drive a design.

use crate::{build, Cli};
use clap::Parser;
use std::path::Path;
use strand_ir::PortDir;
use strand_sim::Runtime;

/// Arguments for the `strand run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Input assignments, e.g. `--set a=0x7F --set b=1`.
    #[arg(long = "set", value_name = "PORT=VALUE")]
    pub sets: Vec<String>,

    /// Number of clock cycles to run.
    #[arg(long, default_value_t = 1)]
    pub cycles: u32,

    /// Output ports to print; all outputs when omitted.
    #[arg(long = "get", value_name = "PORT")]
    pub gets: Vec<String>,

    /// Override the top module from `strand.toml`.
    #[arg(long)]
    pub top: Option<String>,
}

pub fn run(cli: &Cli, args: &RunArgs) -> Result<(), String> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| strand_config::CONFIG_FILE.to_string());
    let config = strand_config::load(Path::new(&config_path)).map_err(|e| e.to_string())?;
    let top = args.top.clone().unwrap_or(config.project.top);

    let circuit = build::compile_design(&config.project.design, &top, None, cli.quiet)?;
    let mut runtime = Runtime::instantiate(&circuit).map_err(|e| e.to_string())?;

    for assignment in &args.sets {
        let (port, value) = assignment
            .split_once('=')
            .ok_or_else(|| format!("`--set {assignment}` is not PORT=VALUE"))?;
        let value = parse_value(value)?;
        runtime
            .set_port(port, value)
            .map_err(|e| e.to_string())?;
    }

    runtime.run_cycles(args.cycles).map_err(|e| e.to_string())?;

    let outputs: Vec<String> = if args.gets.is_empty() {
        circuit
            .ports
            .iter()
            .filter(|p| p.dir == PortDir::Output)
            .map(|p| p.name.clone())
            .collect()
    } else {
        args.gets.clone()
    };
    for name in outputs {
        let value = runtime.get_port(&name).map_err(|e| e.to_string())?;
        println!("{name} = 0x{value:X}");
    }
    Ok(())
}

fn parse_value(text: &str) -> Result<u64, String> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|e| e.to_string())
    } else {
        text.parse().map_err(|e: std::num::ParseIntError| e.to_string())
    }
}
