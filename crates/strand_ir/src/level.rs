//! The levelized netlist: the frozen hand-off to the emitter.

use crate::behav::BehavModule;
use crate::netlist::{BehavioralInstance, Dff, NandGate, PortBinding};
use crate::signal::Signal;
use serde::{Deserialize, Serialize};
use strand_common::words_for;

/// A topologically ordered, frozen netlist.
///
/// `levels` partitions the NAND set: a gate in level `k` reads only
/// signals driven in levels `< k`, DFF `q`s, behavioral outputs, primary
/// inputs, or constants. Within a level, gates keep extraction order so
/// the emitted binary is deterministic.
///
/// The emitter is a pure function of this value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelizedNetlist {
    /// All signals, dense by id.
    pub signals: Vec<Signal>,
    /// NAND gates partitioned by combinational depth.
    pub levels: Vec<Vec<NandGate>>,
    /// D flip-flops in extraction order.
    pub dffs: Vec<Dff>,
    /// Behavioral instances in extraction order.
    pub behavioral: Vec<BehavioralInstance>,
    /// Behavioral definitions, indexed by `BehavDefId`.
    pub behavioral_defs: Vec<BehavModule>,
    /// Top-module port bindings.
    pub ports: Vec<PortBinding>,
}

impl LevelizedNetlist {
    /// Total NAND gate count across all levels.
    pub fn gate_count(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    /// Number of 32-bit words of packed signal state.
    pub fn word_count(&self) -> u32 {
        words_for(self.signals.len() as u32)
    }

    /// Returns `true` if the circuit contains behavioral instances.
    pub fn has_behavioral(&self) -> bool {
        !self.behavioral.is_empty()
    }

    /// Looks up a top-level port binding by name.
    pub fn port(&self, name: &str) -> Option<&PortBinding> {
        self.ports.iter().find(|p| p.name == name)
    }
}
