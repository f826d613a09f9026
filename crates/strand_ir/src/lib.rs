//! The strand intermediate representation.
//!
//! This crate defines everything between elaboration and emission: the
//! [`SignalTable`] with its dense id space, the flat netlist primitives
//! ([`NandGate`], [`Dff`], [`BehavioralInstance`]), the lowered behavioral
//! IR ([`BehavModule`]), and the [`LevelizedNetlist`] handed to the
//! WebAssembly emitter.
//!
//! All cross-references are `u32` index newtypes into arenas/vectors; the
//! graphs contain no owned cycles and serialise trivially.

#![warn(missing_docs)]

mod arena;
pub mod behav;
mod ids;
mod level;
mod netlist;
mod signal;

pub use arena::{Arena, ArenaId};
pub use behav::{
    BehavDefId, BehavExpr, BehavLhs, BehavModule, BehavPattern, BehavStmt, BehavVar, VarSlot,
};
pub use ids::{BehavId, DffId, GateId, SignalId};
pub use level::LevelizedNetlist;
pub use netlist::{BehavioralInstance, Dff, NandGate, Netlist, PortBinding, PortDir};
pub use signal::{Signal, SignalKind, SignalTable, CONST_0, CONST_1};
