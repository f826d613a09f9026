//! The wasmtime-backed execution runtime.

use crate::circuit::CompiledCircuit;
use crate::error::CompileError;
use strand_common::{bit_mask, byte_offset};
use strand_ir::{PortBinding, SignalId, CONST_1};
use wasmtime::{Engine, Linker, Memory, MemoryType, Module, Store, TypedFunc};

/// A live, instantiated circuit.
///
/// The host owns the linear memory and passes it to the module as the
/// `env.memory` import, so signal state stays visible on both sides. All
/// access is single-threaded: set inputs, [`evaluate`](Self::evaluate),
/// read outputs.
///
/// For circuits with behavioral instances the split half-steps are also
/// exported, and an embedder that hosts extra behavioral work outside the
/// module must preserve the cycle ordering:
///
/// ```text
/// set inputs -> evaluate_comb -> host work -> evaluate_dff
///            -> evaluate_comb -> read outputs
/// ```
pub struct Runtime {
    store: Store<()>,
    memory: Memory,
    evaluate: TypedFunc<(), ()>,
    run_cycles: TypedFunc<i32, ()>,
    evaluate_comb: Option<TypedFunc<(), ()>>,
    evaluate_dff: Option<TypedFunc<(), ()>>,
    ports: Vec<PortBinding>,
}

fn runtime_err(e: impl std::fmt::Display) -> CompileError {
    CompileError::Runtime(e.to_string())
}

impl Runtime {
    /// Instantiates a compiled circuit.
    ///
    /// Creates the memory at the circuit's computed page counts, links it
    /// as `env.memory`, instantiates the module, and sets the `const_1`
    /// bit — after this returns, `get_signal(1)` is already 1.
    pub fn instantiate(circuit: &CompiledCircuit) -> Result<Self, CompileError> {
        let engine = Engine::default();
        let module = Module::new(&engine, &circuit.wasm).map_err(runtime_err)?;
        let mut store = Store::new(&engine, ());
        let memory = Memory::new(
            &mut store,
            MemoryType::new(
                circuit.layout.initial_pages,
                Some(circuit.layout.max_pages),
            ),
        )
        .map_err(runtime_err)?;

        let mut linker = Linker::new(&engine);
        linker
            .define(&mut store, strand_wasm::IMPORT_MODULE, strand_wasm::IMPORT_MEMORY, memory)
            .map_err(runtime_err)?;
        let instance = linker.instantiate(&mut store, &module).map_err(runtime_err)?;

        let evaluate = instance
            .get_typed_func::<(), ()>(&mut store, strand_wasm::EXPORT_EVALUATE)
            .map_err(runtime_err)?;
        let run_cycles = instance
            .get_typed_func::<i32, ()>(&mut store, strand_wasm::EXPORT_RUN_CYCLES)
            .map_err(runtime_err)?;
        let evaluate_comb = instance
            .get_typed_func::<(), ()>(&mut store, strand_wasm::EXPORT_EVALUATE_COMB)
            .ok();
        let evaluate_dff = instance
            .get_typed_func::<(), ()>(&mut store, strand_wasm::EXPORT_EVALUATE_DFF)
            .ok();

        let mut runtime = Self {
            store,
            memory,
            evaluate,
            run_cycles,
            evaluate_comb,
            evaluate_dff,
            ports: circuit.ports.clone(),
        };
        runtime.set_signal(CONST_1, true);
        Ok(runtime)
    }

    /// Writes one signal bit (read-modify-write on its packed word).
    pub fn set_signal(&mut self, id: SignalId, value: bool) {
        let offset = byte_offset(id.as_raw()) as usize;
        let mask = bit_mask(id.as_raw());
        let data = self.memory.data_mut(&mut self.store);
        let mut word = u32::from_le_bytes(data[offset..offset + 4].try_into().unwrap());
        if value {
            word |= mask;
        } else {
            word &= !mask;
        }
        data[offset..offset + 4].copy_from_slice(&word.to_le_bytes());
    }

    /// Reads one signal bit (shift and mask).
    pub fn get_signal(&self, id: SignalId) -> bool {
        let offset = byte_offset(id.as_raw()) as usize;
        let data = self.memory.data(&self.store);
        let word = u32::from_le_bytes(data[offset..offset + 4].try_into().unwrap());
        word & bit_mask(id.as_raw()) != 0
    }

    /// Runs one simulated clock cycle.
    pub fn evaluate(&mut self) -> Result<(), CompileError> {
        self.evaluate.call(&mut self.store, ()).map_err(runtime_err)
    }

    /// Runs `n` simulated clock cycles inside WASM.
    pub fn run_cycles(&mut self, n: u32) -> Result<(), CompileError> {
        self.run_cycles
            .call(&mut self.store, n as i32)
            .map_err(runtime_err)
    }

    /// Runs the combinational half-step. Present iff the circuit has
    /// behavioral instances.
    pub fn evaluate_comb(&mut self) -> Result<(), CompileError> {
        let func = self.evaluate_comb.clone().ok_or_else(|| {
            CompileError::MissingExport(strand_wasm::EXPORT_EVALUATE_COMB.to_string())
        })?;
        func.call(&mut self.store, ()).map_err(runtime_err)
    }

    /// Runs the DFF half-step (sample every D, then commit every Q).
    /// Present iff the circuit has behavioral instances.
    pub fn evaluate_dff(&mut self) -> Result<(), CompileError> {
        let func = self.evaluate_dff.clone().ok_or_else(|| {
            CompileError::MissingExport(strand_wasm::EXPORT_EVALUATE_DFF.to_string())
        })?;
        func.call(&mut self.store, ()).map_err(runtime_err)
    }

    fn port(&self, name: &str) -> Result<PortBinding, CompileError> {
        self.ports
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .ok_or_else(|| CompileError::UnknownPort(name.to_string()))
    }

    /// Packs `value` into a named multi-bit port, bit 0 first.
    pub fn set_port(&mut self, name: &str, value: u64) -> Result<(), CompileError> {
        let port = self.port(name)?;
        for (i, &bit) in port.bits.iter().enumerate() {
            self.set_signal(bit, (value >> i) & 1 == 1);
        }
        Ok(())
    }

    /// Unpacks a named multi-bit port into an integer, bit 0 first.
    pub fn get_port(&self, name: &str) -> Result<u64, CompileError> {
        let port = self.port(name)?;
        let mut value = 0u64;
        for (i, &bit) in port.bits.iter().enumerate() {
            if self.get_signal(bit) {
                value |= 1 << i;
            }
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;
    use strand_diagnostics::DiagnosticSink;
    use strand_hdl::{Design, Direction, Instance, ModuleBody, ModuleDef, NetExpr, PortDecl};
    use strand_ir::CONST_0;
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
    fn constants_initialised_after_instantiate() {
        let sink = DiagnosticSink::new();
        let circuit = compile(&inverter(), "inv", &sink).unwrap();
        let runtime = Runtime::instantiate(&circuit).unwrap();
        assert!(!runtime.get_signal(CONST_0));
        assert!(runtime.get_signal(CONST_1));
    }

    #[test]
    fn signal_roundtrip_before_evaluate() {
        let sink = DiagnosticSink::new();
        let circuit = compile(&inverter(), "inv", &sink).unwrap();
        let mut runtime = Runtime::instantiate(&circuit).unwrap();
        for id in 2..circuit.signals.len() as u32 {
            let id = SignalId::from_raw(id);
            runtime.set_signal(id, true);
            assert!(runtime.get_signal(id));
            runtime.set_signal(id, false);
            assert!(!runtime.get_signal(id));
        }
    }

    #[test]
    fn inverter_inverts() {
        let sink = DiagnosticSink::new();
        let circuit = compile(&inverter(), "inv", &sink).unwrap();
        let mut runtime = Runtime::instantiate(&circuit).unwrap();
        runtime.set_port("a", 0).unwrap();
        runtime.evaluate().unwrap();
        assert_eq!(runtime.get_port("y").unwrap(), 1);
        runtime.set_port("a", 1).unwrap();
        runtime.evaluate().unwrap();
        assert_eq!(runtime.get_port("y").unwrap(), 0);
    }

    #[test]
    fn split_steps_absent_on_nand_only_circuit() {
        let sink = DiagnosticSink::new();
        let circuit = compile(&inverter(), "inv", &sink).unwrap();
        let mut runtime = Runtime::instantiate(&circuit).unwrap();
        assert!(matches!(
            runtime.evaluate_comb(),
            Err(CompileError::MissingExport(_))
        ));
    }

    #[test]
    fn unknown_port_is_reported() {
        let sink = DiagnosticSink::new();
        let circuit = compile(&inverter(), "inv", &sink).unwrap();
        let mut runtime = Runtime::instantiate(&circuit).unwrap();
        assert!(matches!(
            runtime.set_port("nope", 1),
            Err(CompileError::UnknownPort(_))
        ));
    }
}
