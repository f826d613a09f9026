//! Internal-error result type shared by all pipeline stages.

use std::fmt;

/// Result type for operations that can only fail on a compiler bug.
///
/// User-facing failures (bad designs, bad assembly) are reported through
/// typed error enums or the diagnostic sink; `InternalError` marks states
/// the pipeline should never reach, such as allocating a signal after the
/// table is frozen. Every internal error names the stage that raised it,
/// so a report against a multi-stage compile points straight at the
/// broken pass.
pub type StrandResult<T> = Result<T, InternalError>;

/// The pipeline stage an internal error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Signal-id allocation and the frozen table.
    SignalTable,
    /// Hierarchy elaboration and primitive extraction.
    Elaborate,
    /// Behavioral lowering.
    Lower,
    /// Gate levelisation.
    Levelize,
    /// WebAssembly emission.
    Emit,
    /// The host-side runtime.
    Runtime,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::SignalTable => "signal table",
            Stage::Elaborate => "elaboration",
            Stage::Lower => "behavioral lowering",
            Stage::Levelize => "levelisation",
            Stage::Emit => "emission",
            Stage::Runtime => "runtime",
        };
        f.write_str(name)
    }
}

/// An internal compiler error: a bug in strand, not a user input problem.
#[derive(Debug, thiserror::Error)]
#[error("internal compiler error in {stage}: {message}")]
pub struct InternalError {
    /// The stage whose invariant was violated.
    pub stage: Stage,
    /// Description of the violated invariant.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error raised by `stage`.
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_the_stage() {
        let err = InternalError::new(Stage::SignalTable, "allocation after finalize");
        assert_eq!(
            format!("{err}"),
            "internal compiler error in signal table: allocation after finalize"
        );
    }

    #[test]
    fn stage_display_names() {
        assert_eq!(format!("{}", Stage::Lower), "behavioral lowering");
        assert_eq!(format!("{}", Stage::Emit), "emission");
    }

    #[test]
    fn result_paths() {
        let ok: StrandResult<u32> = Ok(1);
        assert!(ok.is_ok());
        let err: StrandResult<u32> = Err(InternalError::new(Stage::Levelize, "x"));
        assert_eq!(err.unwrap_err().stage, Stage::Levelize);
    }
}
