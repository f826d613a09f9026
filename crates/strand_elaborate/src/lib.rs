//! Design elaboration and primitive extraction.
//!
//! Takes a [`Design`] (the parser collaborator's AST) and a top module
//! name, recursively instantiates the module hierarchy, and reduces it to
//! the flat primitive [`Netlist`]: NAND gates, D flip-flops, and
//! behavioral instances over a dense signal id space.
//!
//! Derived gates (`not`, `and`, `or`, `xor`, `mux`, `reg`) are synthesised
//! from NAND/DFF compositions here, so nothing below this layer knows any
//! other combinational primitive. `@behavior` bodies are lowered once per
//! definition into the behavioral IR and shared across instances.
//!
//! Fatal problems return [`ElabError`] and short-circuit; non-fatal
//! findings (unconnected outputs, undriven nets) are emitted as warnings
//! into the caller's [`DiagnosticSink`].

#![warn(missing_docs)]

mod behavior;
mod error;
mod net;
mod primitives;
mod warnings;

pub use error::ElabError;

use std::collections::{HashMap, HashSet};
use strand_diagnostics::DiagnosticSink;
use strand_hdl::{Design, Direction, Instance, ModuleBody, ModuleDef};
use strand_ir::{
    Arena, BehavDefId, BehavId, BehavModule, BehavioralInstance, Dff, DffId, GateId, NandGate,
    Netlist, PortBinding, PortDir, SignalId, SignalKind, SignalTable, CONST_0, CONST_1,
};

/// Names in scope inside one module body: net name to little-endian bits.
type Scope = HashMap<String, Vec<SignalId>>;

/// Elaborates `design` starting from `top`, producing a flat netlist.
///
/// The behavioral call graph of the whole design is checked for cycles
/// before anything is instantiated, so a cyclic design fails fast even
/// when the cycle sits in a rarely-instantiated corner.
pub fn elaborate(
    design: &Design,
    top: &str,
    sink: &DiagnosticSink,
) -> Result<Netlist, ElabError> {
    behavior::check_call_graph(design)?;

    let top_def = design
        .module(top)
        .ok_or_else(|| ElabError::UndefinedModule(top.to_string()))?;

    let mut ela = Elaborator::new(design, sink);

    let mut scope = Scope::new();
    for port in &top_def.ports {
        let kind = match port.dir {
            Direction::Input => SignalKind::Input,
            Direction::Output => SignalKind::Output,
        };
        let bits = ela.alloc_bits("", &port.name, port.width, kind)?;
        if port.dir == Direction::Input {
            for &bit in &bits {
                ela.drive(bit)?;
            }
        }
        ela.ports.push(PortBinding {
            name: port.name.clone(),
            dir: match port.dir {
                Direction::Input => PortDir::Input,
                Direction::Output => PortDir::Output,
            },
            bits: bits.clone(),
        });
        scope.insert(port.name.clone(), bits);
    }

    ela.elaborate_body(top_def, "", scope)?;
    ela.warn_undriven();
    Ok(ela.finish())
}

/// Joins a hierarchical path prefix with a local name.
fn qual(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

/// Working state for one elaboration run.
pub(crate) struct Elaborator<'a> {
    pub(crate) design: &'a Design,
    pub(crate) sink: &'a DiagnosticSink,
    pub(crate) signals: SignalTable,
    pub(crate) gates: Arena<GateId, NandGate>,
    pub(crate) dffs: Arena<DffId, Dff>,
    pub(crate) behavioral: Arena<BehavId, BehavioralInstance>,
    pub(crate) behav_defs: Arena<BehavDefId, BehavModule>,
    pub(crate) behav_ids: HashMap<String, BehavDefId>,
    pub(crate) ports: Vec<PortBinding>,
    /// Signals that already have a driver.
    driven: HashSet<SignalId>,
    /// Structural modules currently being elaborated, for cycle detection.
    instance_stack: Vec<String>,
}

impl<'a> Elaborator<'a> {
    fn new(design: &'a Design, sink: &'a DiagnosticSink) -> Self {
        let mut ela = Self {
            design,
            sink,
            signals: SignalTable::new(),
            gates: Arena::new(),
            dffs: Arena::new(),
            behavioral: Arena::new(),
            behav_defs: Arena::new(),
            behav_ids: HashMap::new(),
            ports: Vec::new(),
            driven: HashSet::new(),
            instance_stack: Vec::new(),
        };
        ela.driven.insert(CONST_0);
        ela.driven.insert(CONST_1);
        ela
    }

    /// Allocates the bit signals of a width-`width` net named `name`
    /// under `path`. Bit 0 is allocated first.
    pub(crate) fn alloc_bits(
        &mut self,
        path: &str,
        name: &str,
        width: u32,
        kind: SignalKind,
    ) -> Result<Vec<SignalId>, ElabError> {
        let base = qual(path, name);
        let mut bits = Vec::with_capacity(width as usize);
        for i in 0..width {
            let bit_name = if width == 1 {
                base.clone()
            } else {
                format!("{base}[{i}]")
            };
            bits.push(self.signals.intern(&bit_name, kind)?);
        }
        Ok(bits)
    }

    /// Registers a driver for `id`, failing on the second driver.
    pub(crate) fn drive(&mut self, id: SignalId) -> Result<(), ElabError> {
        if !self.driven.insert(id) {
            return Err(ElabError::DuplicateDriver(
                self.signals.name(id).to_string(),
            ));
        }
        Ok(())
    }

    /// Adds a NAND gate driving `out`.
    pub(crate) fn add_gate(
        &mut self,
        in1: SignalId,
        in2: SignalId,
        out: SignalId,
    ) -> Result<GateId, ElabError> {
        self.drive(out)?;
        Ok(self.gates.alloc(NandGate { in1, in2, out }))
    }

    /// Adds a DFF driving `q`.
    pub(crate) fn add_dff(&mut self, d: SignalId, q: SignalId) -> Result<DffId, ElabError> {
        self.drive(q)?;
        Ok(self.dffs.alloc(Dff { d, q }))
    }

    /// Elaborates one module body with `scope` binding its ports.
    fn elaborate_body(
        &mut self,
        def: &ModuleDef,
        path: &str,
        scope: Scope,
    ) -> Result<(), ElabError> {
        match &def.body {
            ModuleBody::Behavioral(_) => self.instantiate_behavioral(def, path, &scope),
            ModuleBody::Structural { wires, instances } => {
                if self.instance_stack.iter().any(|m| m == &def.name) {
                    return Err(ElabError::CyclicInstantiation(def.name.clone()));
                }
                self.instance_stack.push(def.name.clone());

                let mut scope = scope;
                for wire in wires {
                    let bits = self.alloc_bits(path, &wire.name, wire.width, SignalKind::Wire)?;
                    scope.insert(wire.name.clone(), bits);
                }
                for inst in instances {
                    self.elaborate_instance(inst, path, &scope)?;
                }

                self.instance_stack.pop();
                Ok(())
            }
        }
    }

    /// Elaborates one instantiation inside a structural body.
    fn elaborate_instance(
        &mut self,
        inst: &Instance,
        path: &str,
        scope: &Scope,
    ) -> Result<(), ElabError> {
        if primitives::is_primitive(&inst.module) {
            return self.synth_primitive(inst, path, scope);
        }

        let design = self.design;
        let def = design
            .module(&inst.module)
            .ok_or_else(|| ElabError::UndefinedModule(inst.module.clone()))?;
        let ipath = qual(path, &inst.name);

        let mut bound: HashMap<&str, Vec<SignalId>> = HashMap::new();
        for (formal, actual) in &inst.connections {
            let port = def.port(formal).ok_or_else(|| ElabError::UnknownPort {
                module: inst.module.clone(),
                port: formal.clone(),
            })?;
            let bits = self.eval_net(scope, actual)?;
            if bits.len() as u32 != port.width {
                return Err(ElabError::WidthMismatch {
                    instance: ipath.clone(),
                    port: formal.clone(),
                    expected: port.width,
                    got: bits.len() as u32,
                });
            }
            bound.insert(formal.as_str(), bits);
        }

        let mut child_scope = Scope::new();
        for port in &def.ports {
            let bits = match bound.remove(port.name.as_str()) {
                Some(bits) => bits,
                None => match port.dir {
                    Direction::Input => {
                        return Err(ElabError::UnconnectedInput {
                            instance: ipath.clone(),
                            port: port.name.clone(),
                        })
                    }
                    Direction::Output => {
                        self.sink
                            .emit(warnings::unconnected_output(&port.name, &ipath, inst.span));
                        let mut bits = Vec::with_capacity(port.width as usize);
                        for _ in 0..port.width {
                            let hint = format!("{ipath}.{}", port.name);
                            bits.push(self.signals.alloc_anonymous(&hint)?);
                        }
                        bits
                    }
                },
            };
            child_scope.insert(port.name.clone(), bits);
        }

        if def.is_behavioral() {
            self.instantiate_behavioral(def, &ipath, &child_scope)
        } else {
            self.elaborate_body(def, &ipath, child_scope)
        }
    }

    /// Creates a behavioral instance of `def` with ports bound by `scope`.
    fn instantiate_behavioral(
        &mut self,
        def: &ModuleDef,
        path: &str,
        scope: &Scope,
    ) -> Result<(), ElabError> {
        let def_id = self.lowered_def(&def.name)?;

        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        for port in &def.ports {
            let bits = scope
                .get(&port.name)
                .cloned()
                .ok_or_else(|| ElabError::UnconnectedInput {
                    instance: path.to_string(),
                    port: port.name.clone(),
                })?;
            match port.dir {
                Direction::Input => inputs.push(bits),
                Direction::Output => {
                    for &bit in &bits {
                        self.drive(bit)?;
                    }
                    outputs.push(bits);
                }
            }
        }

        let name = if path.is_empty() {
            def.name.clone()
        } else {
            path.to_string()
        };
        self.behavioral.alloc(BehavioralInstance {
            def: def_id,
            name,
            inputs,
            outputs,
        });
        Ok(())
    }

    /// Warns (once, in id order) about signals that are read but driven by
    /// nothing; they stay zero in memory.
    fn warn_undriven(&self) {
        let mut read: Vec<SignalId> = Vec::new();
        for gate in self.gates.values() {
            read.push(gate.in1);
            read.push(gate.in2);
        }
        for dff in self.dffs.values() {
            read.push(dff.d);
        }
        for inst in self.behavioral.values() {
            for bits in &inst.inputs {
                read.extend(bits.iter().copied());
            }
        }
        read.sort_unstable();
        read.dedup();
        for id in read {
            if !self.driven.contains(&id) {
                self.sink.emit(warnings::undriven_signal(self.signals.name(id)));
            }
        }
    }

    fn finish(self) -> Netlist {
        Netlist {
            signals: self.signals,
            gates: self.gates,
            dffs: self.dffs,
            behavioral: self.behavioral,
            behavioral_defs: self.behav_defs,
            ports: self.ports,
        }
    }
}
