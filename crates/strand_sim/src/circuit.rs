//! The compiled-circuit artifact.

use serde::{Deserialize, Serialize};
use strand_common::Fingerprint;
use strand_ir::{LevelizedNetlist, PortBinding, Signal};
use strand_wasm::MemoryLayout;

/// Shape statistics of a levelized netlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitStats {
    /// Total NAND gates.
    pub gates: usize,
    /// Combinational depth (number of levels).
    pub levels: usize,
    /// D flip-flops.
    pub dffs: usize,
    /// Behavioral instances.
    pub behavioral: usize,
}

/// Everything an embedder needs to instantiate and drive one circuit.
///
/// Serialisable as a build artifact: the CLI writes the binary next to a
/// JSON rendering of the metadata so out-of-process embedders (a browser
/// host, say) can find their ports and signal offsets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledCircuit {
    /// The emitted WebAssembly binary.
    pub wasm: Vec<u8>,
    /// The packed signal-memory layout (page counts included).
    pub layout: MemoryLayout,
    /// All signals, dense by id.
    pub signals: Vec<Signal>,
    /// Top-module port bindings.
    pub ports: Vec<PortBinding>,
    /// Names of the function exports present in `wasm`.
    pub exports: Vec<String>,
    /// XXH3 fingerprint of `wasm`.
    pub fingerprint: Fingerprint,
    /// Netlist shape statistics.
    pub stats: CircuitStats,
}

impl CompiledCircuit {
    pub(crate) fn new(netlist: LevelizedNetlist, wasm: Vec<u8>) -> Self {
        let mut exports = vec![
            strand_wasm::EXPORT_EVALUATE.to_string(),
            strand_wasm::EXPORT_RUN_CYCLES.to_string(),
        ];
        if netlist.has_behavioral() {
            exports.push(strand_wasm::EXPORT_EVALUATE_COMB.to_string());
            exports.push(strand_wasm::EXPORT_EVALUATE_DFF.to_string());
        }
        let stats = CircuitStats {
            gates: netlist.gate_count(),
            levels: netlist.levels.len(),
            dffs: netlist.dffs.len(),
            behavioral: netlist.behavioral.len(),
        };
        let fingerprint = Fingerprint::of(&wasm);
        Self {
            layout: MemoryLayout::new(netlist.signals.len() as u32),
            signals: netlist.signals,
            ports: netlist.ports,
            exports,
            fingerprint,
            stats,
            wasm,
        }
    }

    /// Looks up a top-level port binding by name.
    pub fn port(&self, name: &str) -> Option<&PortBinding> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Initial memory size in pages, as required by the `env.memory`
    /// import.
    pub fn memory_pages(&self) -> u32 {
        self.layout.initial_pages
    }
}
