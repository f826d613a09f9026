//! The compiler facade and execution runtime.
//!
//! [`compile`] runs the whole pipeline — elaborate, levelise, emit — and
//! returns a [`CompiledCircuit`]: the WASM binary plus everything an
//! embedder needs to drive it (memory layout, signal table, port map,
//! export list, content fingerprint).
//!
//! [`Runtime`] instantiates a compiled circuit under wasmtime with a
//! host-created `env.memory`, initialises the `const_1` bit, and exposes
//! `set_signal`/`get_signal`/`evaluate`/`run_cycles` plus multi-bit port
//! helpers. The runtime is single-threaded: set inputs, call `evaluate`,
//! read outputs.

#![warn(missing_docs)]

mod circuit;
mod error;
mod runtime;

pub use circuit::{CircuitStats, CompiledCircuit};
pub use error::CompileError;
pub use runtime::Runtime;

use strand_diagnostics::DiagnosticSink;
use strand_hdl::Design;
use strand_wasm::OptLevel;

/// Compiles `design` down to a WebAssembly circuit evaluator, using the
/// default optimisation policy (level 4 unless behavioral instances are
/// present).
pub fn compile(
    design: &Design,
    top: &str,
    sink: &DiagnosticSink,
) -> Result<CompiledCircuit, CompileError> {
    compile_with(design, top, None, sink)
}

/// Compiles `design` with an explicit optimisation level.
pub fn compile_with(
    design: &Design,
    top: &str,
    opt: Option<OptLevel>,
    sink: &DiagnosticSink,
) -> Result<CompiledCircuit, CompileError> {
    let netlist = strand_elaborate::elaborate(design, top, sink)?;
    let leveled = strand_levelize::levelize(netlist)?;
    let opt = opt.unwrap_or_else(|| OptLevel::default_for(&leveled));
    let wasm = strand_wasm::emit(&leveled, opt)?;
    Ok(CompiledCircuit::new(leveled, wasm))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strand_hdl::{Direction, Instance, ModuleBody, ModuleDef, NetExpr, PortDecl};
    use strand_source::Span;

    fn inverter() -> Design {
        Design {
            modules: vec![ModuleDef {
                name: "inv".into(),
                ports: vec![
                    PortDecl {
                        name: "a".into(),
                        dir: Direction::Input,
                        width: 1,
                        span: Span::DUMMY,
                    },
                    PortDecl {
                        name: "y".into(),
                        dir: Direction::Output,
                        width: 1,
                        span: Span::DUMMY,
                    },
                ],
                body: ModuleBody::Structural {
                    wires: vec![],
                    instances: vec![Instance {
                        module: "not".into(),
                        name: "n0".into(),
                        connections: vec![
                            ("a".into(), NetExpr::Ref("a".into())),
                            ("y".into(), NetExpr::Ref("y".into())),
                        ],
                        span: Span::DUMMY,
                    }],
                },
                span: Span::DUMMY,
            }],
        }
    }

    #[test]
    fn compile_produces_expected_exports() {
        let sink = DiagnosticSink::new();
        let circuit = compile(&inverter(), "inv", &sink).unwrap();
        assert!(circuit.exports.iter().any(|e| e == "evaluate"));
        assert!(circuit.exports.iter().any(|e| e == "run_cycles"));
        assert!(!circuit.exports.iter().any(|e| e == "evaluate_comb"));
        assert_eq!(circuit.stats.gates, 1);
    }

    #[test]
    fn compile_is_deterministic_end_to_end() {
        let sink = DiagnosticSink::new();
        let a = compile(&inverter(), "inv", &sink).unwrap();
        let b = compile(&inverter(), "inv", &sink).unwrap();
        assert_eq!(a.wasm, b.wasm);
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_eq!(
            a.signals.iter().map(|s| &s.name).collect::<Vec<_>>(),
            b.signals.iter().map(|s| &s.name).collect::<Vec<_>>()
        );
    }

    #[test]
    fn compile_errors_propagate() {
        let sink = DiagnosticSink::new();
        assert!(matches!(
            compile(&inverter(), "missing", &sink),
            Err(CompileError::Elaborate(_))
        ));
    }
}
