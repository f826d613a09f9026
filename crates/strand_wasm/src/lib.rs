//! The WebAssembly emitter.
//!
//! Produces a standalone module whose only job is to evaluate one frozen
//! circuit. All connectivity is baked in: every signal read or write is an
//! `i32.load`/`i32.store` at a constant byte offset with a constant bit
//! mask, and every NAND is inlined as `(in1 & in2) ^ 1` over those packed
//! words. Behavioral bodies are translated to `i32` arithmetic over WASM
//! locals and fully inlined, including cross-module calls.
//!
//! The module imports one linear memory as `env.memory` and exports:
//!
//! | export | signature | present |
//! |---|---|---|
//! | `evaluate` | `() -> ()` | always |
//! | `run_cycles` | `(i32) -> ()` | always |
//! | `evaluate_comb` | `() -> ()` | iff behavioral instances exist |
//! | `evaluate_dff` | `() -> ()` | iff behavioral instances exist |
//! | `memory` | memory | always (re-export of the import) |
//!
//! Every emitted binary is checked with `wasmparser` before release; a
//! validation failure is reported as [`EmitError::WasmValidation`] and
//! indicates a bug in this crate, never in the input.

#![warn(missing_docs)]

mod behav;
mod emit;
mod layout;

pub use emit::emit;
pub use layout::MemoryLayout;

/// Names of the function exports, in export order.
pub const EXPORT_EVALUATE: &str = "evaluate";
/// See [`EXPORT_EVALUATE`].
pub const EXPORT_RUN_CYCLES: &str = "run_cycles";
/// Present only when the circuit contains behavioral instances.
pub const EXPORT_EVALUATE_COMB: &str = "evaluate_comb";
/// Present only when the circuit contains behavioral instances.
pub const EXPORT_EVALUATE_DFF: &str = "evaluate_dff";
/// The re-exported linear memory.
pub const EXPORT_MEMORY: &str = "memory";

/// The import module and field for the linear memory.
pub const IMPORT_MODULE: &str = "env";
/// See [`IMPORT_MODULE`].
pub const IMPORT_MEMORY: &str = "memory";

/// Code generation aggressiveness.
///
/// Level 4 caches same-word signal reads in locals within one level; the
/// cache is sound there because stores during a level only touch bits no
/// gate of that level reads. Level 2 disables the cache and is the default
/// when behavioral instances are present, keeping the behavioral codegen
/// pattern free of interleaved cache state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptLevel {
    /// No read caching.
    Two,
    /// Same-word read caching within each level.
    Four,
}

impl OptLevel {
    /// The default policy for a circuit: level 4 for NAND-only circuits,
    /// level 2 when behavioral instances are present.
    pub fn default_for(netlist: &strand_ir::LevelizedNetlist) -> Self {
        if netlist.has_behavioral() {
            OptLevel::Two
        } else {
            OptLevel::Four
        }
    }
}

/// An emission failure.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// The netlist violates an encoding-time invariant. Indicates a bug in
    /// an earlier stage.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// The emitted binary failed the `wasmparser` self-check. Indicates a
    /// bug in this crate.
    #[error("emitted module failed validation: {0}")]
    WasmValidation(String),
}
