//! Flat netlist primitives and the elaboration output.
//!
//! After extraction a circuit is nothing but NAND gates, D flip-flops,
//! and behavioral instances over a dense signal id space. Every output
//! signal has exactly one driver; the elaborator enforces this.

use crate::arena::Arena;
use crate::behav::{BehavDefId, BehavModule};
use crate::ids::{BehavId, DffId, GateId, SignalId};
use crate::signal::SignalTable;
use serde::{Deserialize, Serialize};

/// The sole combinational primitive: `out = !(in1 & in2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NandGate {
    /// First input signal.
    pub in1: SignalId,
    /// Second input signal.
    pub in2: SignalId,
    /// Output signal; written by this gate and nothing else.
    pub out: SignalId,
}

/// An edge-triggered D flip-flop.
///
/// Clock and reset are implicit: `q` takes the value `d` had before the
/// clock edge, once per `evaluate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dff {
    /// The data input, sampled before any `q` is written.
    pub d: SignalId,
    /// The registered output.
    pub q: SignalId,
}

/// One instance of a behavioral module, wired into the bit-level circuit.
///
/// `inputs` and `outputs` are aligned with the definition's port order;
/// each entry is the ordered little-endian bit list for that port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehavioralInstance {
    /// The behavioral definition this instance executes.
    pub def: BehavDefId,
    /// Hierarchical instance name.
    pub name: String,
    /// Bit lists feeding each definition input, in definition order.
    pub inputs: Vec<Vec<SignalId>>,
    /// Bit lists driven by each definition output, in definition order.
    pub outputs: Vec<Vec<SignalId>>,
}

/// The direction of a top-level port binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDir {
    /// Set by the embedder before `evaluate`.
    Input,
    /// Read by the embedder after `evaluate`.
    Output,
}

/// A named multi-bit port of the top module with its bit signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortBinding {
    /// The port name.
    pub name: String,
    /// The direction.
    pub dir: PortDir,
    /// Bit signals, little-endian (`bits[0]` is bit 0).
    pub bits: Vec<SignalId>,
}

/// The flat primitive set produced by elaboration and extraction.
///
/// This is the pre-levelisation form: gates are in extraction order, and
/// the signal table is not yet frozen (the leveliser freezes it).
#[derive(Debug)]
pub struct Netlist {
    /// The signal table; still mutable until levelisation.
    pub signals: SignalTable,
    /// NAND gates in extraction order; gate ids are levelisation tie-breaks.
    pub gates: Arena<GateId, NandGate>,
    /// D flip-flops in extraction order.
    pub dffs: Arena<DffId, Dff>,
    /// Behavioral instances in extraction order.
    pub behavioral: Arena<BehavId, BehavioralInstance>,
    /// Behavioral definitions, indexed by [`BehavDefId`].
    pub behavioral_defs: Arena<BehavDefId, BehavModule>,
    /// Top-module port bindings in declaration order.
    pub ports: Vec<PortBinding>,
}

impl Netlist {
    /// Returns the behavioral definition backing an instance.
    pub fn def_of(&self, inst: &BehavioralInstance) -> &BehavModule {
        &self.behavioral_defs[inst.def]
    }

    /// Looks up a top-level port binding by name.
    pub fn port(&self, name: &str) -> Option<&PortBinding> {
        self.ports.iter().find(|p| p.name == name)
    }
}
