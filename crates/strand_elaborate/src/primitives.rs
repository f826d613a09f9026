//! Built-in primitives and derived-gate synthesis.
//!
//! `nand` and `dff` are the only real primitives. The derived gates are
//! fixed NAND compositions, applied bitwise when connected to multi-bit
//! nets; `reg` is a per-bit DFF bank. Everything here ends up in the same
//! flat gate/DFF arenas as user NANDs.

use crate::error::ElabError;
use crate::{qual, Elaborator, Scope};
use std::collections::HashMap;
use strand_hdl::{Direction, Instance};
use strand_ir::SignalId;

/// Port shape of one builtin.
struct PrimPorts {
    inputs: &'static [&'static str],
    outputs: &'static [&'static str],
    /// Ports fixed at one bit regardless of the instance width.
    single_bit: &'static [&'static str],
}

fn ports_of(module: &str) -> Option<PrimPorts> {
    let p = match module {
        "nand" | "and" | "or" | "xor" => PrimPorts {
            inputs: &["a", "b"],
            outputs: &["y"],
            single_bit: &[],
        },
        "not" => PrimPorts {
            inputs: &["a"],
            outputs: &["y"],
            single_bit: &[],
        },
        "mux" => PrimPorts {
            inputs: &["a", "b", "sel"],
            outputs: &["y"],
            single_bit: &["sel"],
        },
        "dff" | "reg" => PrimPorts {
            inputs: &["d"],
            outputs: &["q"],
            single_bit: &[],
        },
        _ => return None,
    };
    Some(p)
}

/// Returns `true` if `module` names a builtin primitive.
pub(crate) fn is_primitive(module: &str) -> bool {
    ports_of(module).is_some()
}

impl Elaborator<'_> {
    /// Synthesises one builtin instance into NAND/DFF primitives.
    pub(crate) fn synth_primitive(
        &mut self,
        inst: &Instance,
        path: &str,
        scope: &Scope,
    ) -> Result<(), ElabError> {
        let ports = ports_of(&inst.module).expect("caller checked is_primitive");
        let ipath = qual(path, &inst.name);

        let mut bound: HashMap<&str, (Direction, Vec<SignalId>)> = HashMap::new();
        for (formal, actual) in &inst.connections {
            let dir = if ports.inputs.contains(&formal.as_str()) {
                Direction::Input
            } else if ports.outputs.contains(&formal.as_str()) {
                Direction::Output
            } else {
                return Err(ElabError::UnknownPort {
                    module: inst.module.clone(),
                    port: formal.clone(),
                });
            };
            let bits = self.eval_net(scope, actual)?;
            bound.insert(formal.as_str(), (dir, bits));
        }

        // The instance width is set by the widest data port; every data
        // port must match it exactly.
        let width = bound
            .iter()
            .filter(|(name, _)| !ports.single_bit.contains(&name.as_ref()))
            .map(|(_, (_, bits))| bits.len())
            .max()
            .unwrap_or(1);

        let span = inst.span;
        let mut take = |name: &'static str,
                        ela: &mut Self|
         -> Result<Vec<SignalId>, ElabError> {
            match bound.remove(name) {
                Some((_, bits)) => {
                    let expected = if ports.single_bit.contains(&name) { 1 } else { width };
                    if bits.len() != expected {
                        return Err(ElabError::WidthMismatch {
                            instance: ipath.clone(),
                            port: name.to_string(),
                            expected: expected as u32,
                            got: bits.len() as u32,
                        });
                    }
                    Ok(bits)
                }
                None if ports.inputs.contains(&name) => Err(ElabError::UnconnectedInput {
                    instance: ipath.clone(),
                    port: name.to_string(),
                }),
                None => {
                    // Unconnected output: keep the gate, sink it anonymously.
                    ela.sink
                        .emit(crate::warnings::unconnected_output(name, &ipath, span));
                    let expected = if ports.single_bit.contains(&name) { 1 } else { width };
                    let mut bits = Vec::with_capacity(expected);
                    for _ in 0..expected {
                        bits.push(ela.signals.alloc_anonymous(&format!("{ipath}.{name}"))?);
                    }
                    Ok(bits)
                }
            }
        };

        match inst.module.as_str() {
            "nand" => {
                let a = take("a", self)?;
                let b = take("b", self)?;
                let y = take("y", self)?;
                for i in 0..width {
                    self.add_gate(a[i], b[i], y[i])?;
                }
            }
            "not" => {
                let a = take("a", self)?;
                let y = take("y", self)?;
                for i in 0..width {
                    self.add_gate(a[i], a[i], y[i])?;
                }
            }
            "and" => {
                let a = take("a", self)?;
                let b = take("b", self)?;
                let y = take("y", self)?;
                for i in 0..width {
                    let t = self.signals.alloc_anonymous(&format!("{ipath}.t"))?;
                    self.add_gate(a[i], b[i], t)?;
                    self.add_gate(t, t, y[i])?;
                }
            }
            "or" => {
                let a = take("a", self)?;
                let b = take("b", self)?;
                let y = take("y", self)?;
                for i in 0..width {
                    let na = self.signals.alloc_anonymous(&format!("{ipath}.na"))?;
                    let nb = self.signals.alloc_anonymous(&format!("{ipath}.nb"))?;
                    self.add_gate(a[i], a[i], na)?;
                    self.add_gate(b[i], b[i], nb)?;
                    self.add_gate(na, nb, y[i])?;
                }
            }
            "xor" => {
                let a = take("a", self)?;
                let b = take("b", self)?;
                let y = take("y", self)?;
                for i in 0..width {
                    let t = self.signals.alloc_anonymous(&format!("{ipath}.t"))?;
                    let u = self.signals.alloc_anonymous(&format!("{ipath}.u"))?;
                    let v = self.signals.alloc_anonymous(&format!("{ipath}.v"))?;
                    self.add_gate(a[i], b[i], t)?;
                    self.add_gate(a[i], t, u)?;
                    self.add_gate(b[i], t, v)?;
                    self.add_gate(u, v, y[i])?;
                }
            }
            "mux" => {
                let a = take("a", self)?;
                let b = take("b", self)?;
                let sel = take("sel", self)?;
                let y = take("y", self)?;
                let ns = self.signals.alloc_anonymous(&format!("{ipath}.ns"))?;
                self.add_gate(sel[0], sel[0], ns)?;
                for i in 0..width {
                    let t = self.signals.alloc_anonymous(&format!("{ipath}.t"))?;
                    let u = self.signals.alloc_anonymous(&format!("{ipath}.u"))?;
                    self.add_gate(a[i], ns, t)?;
                    self.add_gate(b[i], sel[0], u)?;
                    self.add_gate(t, u, y[i])?;
                }
            }
            "dff" | "reg" => {
                let d = take("d", self)?;
                let q = take("q", self)?;
                for i in 0..width {
                    self.add_dff(d[i], q[i])?;
                }
            }
            _ => unreachable!("is_primitive gate"),
        }
        Ok(())
    }
}
