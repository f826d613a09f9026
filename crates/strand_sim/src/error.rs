//! The unified pipeline error.

use strand_elaborate::ElabError;
use strand_levelize::LevelError;
use strand_wasm::EmitError;

/// Any fatal failure between the AST and a running circuit.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// Elaboration or behavioral lowering failed.
    #[error(transparent)]
    Elaborate(#[from] ElabError),

    /// Levelisation failed (combinational cycle).
    #[error(transparent)]
    Levelize(#[from] LevelError),

    /// Emission or self-validation failed.
    #[error(transparent)]
    Emit(#[from] EmitError),

    /// Wasmtime refused to compile, instantiate, or run the module.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// A port name was not found on the compiled circuit.
    #[error("unknown port `{0}`")]
    UnknownPort(String),

    /// A split-step export was requested on a circuit without behavioral
    /// instances.
    #[error("export `{0}` is not present in this circuit")]
    MissingExport(String),
}
