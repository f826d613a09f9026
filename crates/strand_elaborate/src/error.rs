//! Elaboration failure modes.
//!
//! All of these are fatal: elaboration short-circuits on the first one.
//! Non-fatal findings (unconnected outputs, undriven nets) go through the
//! diagnostic sink instead.

use strand_common::InternalError;

/// A fatal elaboration error.
#[derive(Debug, thiserror::Error)]
pub enum ElabError {
    /// An instantiation names a module that does not exist.
    #[error("undefined module `{0}`")]
    UndefinedModule(String),

    /// A formal/actual width mismatch on a port connection.
    #[error(
        "width mismatch on port `{port}` of `{instance}`: expected {expected} bit(s), got {got}"
    )]
    WidthMismatch {
        /// Hierarchical instance name.
        instance: String,
        /// The formal port name.
        port: String,
        /// The formal's declared width.
        expected: u32,
        /// The actual expression's width.
        got: u32,
    },

    /// Two drivers target the same signal.
    #[error("signal `{0}` has more than one driver")]
    DuplicateDriver(String),

    /// A connection names a port the module does not declare.
    #[error("unknown port `{port}` on module `{module}`")]
    UnknownPort {
        /// The instantiated module.
        module: String,
        /// The offending port name.
        port: String,
    },

    /// An input port was left unconnected.
    #[error("input `{port}` of instance `{instance}` is unconnected")]
    UnconnectedInput {
        /// Hierarchical instance name.
        instance: String,
        /// The unconnected formal.
        port: String,
    },

    /// A net expression references a name not in scope.
    #[error("undefined net `{0}`")]
    UndefinedNet(String),

    /// A bit index or slice falls outside the net's width.
    #[error("bit index {index} out of range for `{name}` ({width} bit(s))")]
    IndexOutOfRange {
        /// The indexed net.
        name: String,
        /// The offending index.
        index: u32,
        /// The net's width.
        width: u32,
    },

    /// A structural module directly or indirectly instantiates itself.
    #[error("cyclic instantiation of module `{0}`")]
    CyclicInstantiation(String),

    /// The behavioral call graph is not a DAG.
    #[error("cyclic behavioral call involving {}", path.join(" -> "))]
    CyclicBehavioralCall {
        /// The modules on the cycle.
        path: Vec<String>,
    },

    /// A `@behavior` body failed to lower.
    #[error("in `@behavior` of `{module}`: {reason}")]
    Behavior {
        /// The module whose body failed.
        module: String,
        /// What went wrong.
        reason: String,
    },

    /// A compiler bug surfaced mid-elaboration.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_culprit() {
        let e = ElabError::UndefinedModule("alu".into());
        assert_eq!(format!("{e}"), "undefined module `alu`");

        let e = ElabError::WidthMismatch {
            instance: "top.u1".into(),
            port: "a".into(),
            expected: 8,
            got: 4,
        };
        assert!(format!("{e}").contains("expected 8"));

        let e = ElabError::CyclicBehavioralCall {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(format!("{e}"), "cyclic behavioral call involving a -> b -> a");
    }
}
