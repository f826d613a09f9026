//! Levelisation: topological ordering of NAND gates by combinational depth.
//!
//! Treats each gate as a vertex with edges from the gates writing its
//! inputs and runs a ready-queue traversal. *Sources* — primary inputs,
//! DFF `q`s, behavioral outputs, constants, and undriven nets — sit at
//! level −1; a gate's level is one more than the deepest of its inputs.
//!
//! If the queue drains with gates unresolved, those gates sit on (or
//! behind) a pure-combinational cycle, which is illegal: the diagnostic
//! walks predecessors until it closes the loop and names the signals on
//! it.
//!
//! Within a level, gates keep extraction order (ascending gate id), so the
//! level structure — and therefore the emitted binary — is deterministic.

#![warn(missing_docs)]

use std::collections::HashMap;
use strand_ir::{GateId, LevelizedNetlist, Netlist, SignalId};

/// A levelisation failure.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    /// A combinational loop with no DFF or behavioral module on it.
    #[error("combinational cycle through {}", path.join(" -> "))]
    CombinationalCycle {
        /// Output signal names of the gates on the cycle, in loop order.
        path: Vec<String>,
    },
}

/// Orders the netlist's gates into levels and freezes the signal table.
///
/// Consumes the netlist: this is the point where the circuit becomes
/// immutable and the emitter's input is fixed.
pub fn levelize(mut netlist: Netlist) -> Result<LevelizedNetlist, LevelError> {
    let gate_count = netlist.gates.len();

    // Which gate drives each signal. Anything absent is a source.
    let mut driver: HashMap<SignalId, GateId> = HashMap::with_capacity(gate_count);
    for (id, gate) in netlist.gates.iter() {
        driver.insert(gate.out, id);
    }

    // Consumers of each gate's output, and the number of gate-driven
    // inputs still unresolved per gate.
    let mut fanout: Vec<Vec<GateId>> = vec![Vec::new(); gate_count];
    let mut pending: Vec<u32> = vec![0; gate_count];
    for (id, gate) in netlist.gates.iter() {
        for input in [gate.in1, gate.in2] {
            if let Some(&pred) = driver.get(&input) {
                fanout[pred.as_raw() as usize].push(id);
                pending[id.as_raw() as usize] += 1;
            }
        }
    }

    let mut level: Vec<Option<u32>> = vec![None; gate_count];
    let mut queue: Vec<GateId> = Vec::new();
    for (id, _) in netlist.gates.iter() {
        if pending[id.as_raw() as usize] == 0 {
            level[id.as_raw() as usize] = Some(0);
            queue.push(id);
        }
    }

    let mut resolved = 0usize;
    while let Some(id) = queue.pop() {
        resolved += 1;
        for &next in &fanout[id.as_raw() as usize] {
            let slot = next.as_raw() as usize;
            pending[slot] -= 1;
            if pending[slot] == 0 {
                let gate = &netlist.gates[next];
                let depth = [gate.in1, gate.in2]
                    .into_iter()
                    .filter_map(|input| driver.get(&input))
                    .map(|&pred| level[pred.as_raw() as usize].expect("predecessor resolved"))
                    .max()
                    .expect("pending gate has a gate-driven input");
                level[slot] = Some(depth + 1);
                queue.push(next);
            }
        }
    }

    if resolved < gate_count {
        return Err(diagnose_cycle(&netlist, &driver, &level));
    }

    // Bucket gates by level in ascending id order.
    let depth = level.iter().flatten().copied().max().map_or(0, |d| d + 1);
    let mut levels = vec![Vec::new(); depth as usize];
    for (id, gate) in netlist.gates.iter() {
        let l = level[id.as_raw() as usize].expect("all gates resolved");
        levels[l as usize].push(*gate);
    }

    Ok(LevelizedNetlist {
        signals: netlist.signals.finalize(),
        levels,
        dffs: netlist.dffs.values().copied().collect(),
        behavioral: netlist.behavioral.values().cloned().collect(),
        behavioral_defs: netlist.behavioral_defs.values().cloned().collect(),
        ports: netlist.ports,
    })
}

/// Walks predecessors from the lowest-id unresolved gate until a gate
/// repeats, then reports the closed loop.
fn diagnose_cycle(
    netlist: &Netlist,
    driver: &HashMap<SignalId, GateId>,
    level: &[Option<u32>],
) -> LevelError {
    let start = netlist
        .gates
        .iter()
        .map(|(id, _)| id)
        .find(|id| level[id.as_raw() as usize].is_none())
        .expect("caller found unresolved gates");

    let mut order: Vec<GateId> = Vec::new();
    let mut seen: HashMap<GateId, usize> = HashMap::new();
    let mut current = start;
    let repeated = loop {
        if let Some(&pos) = seen.get(&current) {
            break pos;
        }
        seen.insert(current, order.len());
        order.push(current);
        let gate = &netlist.gates[current];
        current = [gate.in1, gate.in2]
            .into_iter()
            .filter_map(|input| driver.get(&input).copied())
            .find(|pred| level[pred.as_raw() as usize].is_none())
            .expect("unresolved gate has an unresolved predecessor");
    };

    let mut path: Vec<String> = order[repeated..]
        .iter()
        .map(|&id| netlist.signals.name(netlist.gates[id].out).to_string())
        .collect();
    // Close the loop for readability.
    path.push(path[0].clone());
    LevelError::CombinationalCycle { path }
}
