//! The lowered behavioral IR.
//!
//! Lowering resolves every name in a `@behavior` body to a *variable slot*
//! — an index into the flat list `inputs ++ outputs ++ locals` — and every
//! cross-module call to a [`BehavDefId`] plus output index. The result is
//! position-independent and evaluatable without any name lookups, which is
//! what the WebAssembly emitter needs: each slot becomes one `i32` local.
//!
//! Semantics: all arithmetic is 32-bit; writes are masked to the target's
//! declared width; shifts and comparisons are unsigned; `match` arms are
//! tested in source order and the first match wins.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};

// Operator sets are shared with the AST; lowering changes operand
// representation, not the operator algebra.
pub use strand_hdl::{BinaryOp, UnaryOp};

/// An index into a behavioral function's variable slots.
pub type VarSlot = u32;

/// An opaque ID for a lowered behavioral definition.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct BehavDefId(u32);

impl BehavDefId {
    /// Creates an ID from a raw `u32` index.
    pub const fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index.
    pub const fn as_raw(self) -> u32 {
        self.0
    }
}

impl ArenaId for BehavDefId {
    fn from_raw(index: u32) -> Self {
        Self(index)
    }

    fn as_raw(self) -> u32 {
        self.0
    }
}

/// One variable of a behavioral function: a parameter, output, or local.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehavVar {
    /// The sanitised name (portable alphabet, clash-free).
    pub name: String,
    /// The declared width in bits (1..=32).
    pub width: u32,
}

/// A lowered expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BehavExpr {
    /// A constant, already truncated to 32 bits.
    Const(u32),
    /// A variable slot read.
    Var(VarSlot),
    /// A binary operation at 32-bit precision.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<BehavExpr>,
        /// Right operand.
        rhs: Box<BehavExpr>,
    },
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<BehavExpr>,
    },
    /// `cond ? then_val : else_val`, condition tested nonzero.
    Ternary {
        /// The condition.
        cond: Box<BehavExpr>,
        /// Value when nonzero.
        then_val: Box<BehavExpr>,
        /// Value when zero.
        else_val: Box<BehavExpr>,
    },
    /// Dynamic single-bit extract: `(expr >> index) & 1`.
    Index {
        /// The value being indexed.
        expr: Box<BehavExpr>,
        /// The bit position.
        index: Box<BehavExpr>,
    },
    /// Constant slice extract: `(expr >> lo) & mask(hi - lo + 1)`.
    Slice {
        /// The value being sliced.
        expr: Box<BehavExpr>,
        /// High bit index (inclusive).
        hi: u32,
        /// Low bit index (inclusive).
        lo: u32,
    },
    /// Concatenation; element 0 occupies the lowest bits. Each element
    /// carries the width it contributes, fixed at lowering time.
    Concat(Vec<(BehavExpr, u32)>),
    /// An inlined call of another behavioral definition.
    Call {
        /// The callee; the call graph is a DAG.
        def: BehavDefId,
        /// Arguments, one per callee input in definition order.
        args: Vec<BehavExpr>,
        /// Index of the callee output this call evaluates to.
        output: u32,
    },
}

/// A lowered assignment target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BehavLhs {
    /// The whole slot.
    Var(VarSlot),
    /// One bit of the slot, possibly dynamically indexed.
    BitIndex(VarSlot, BehavExpr),
    /// A constant bit range of the slot.
    Slice(VarSlot, u32, u32),
}

/// A lowered pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehavPattern {
    /// Matches one exact value.
    Number(u32),
    /// Matches an inclusive range.
    Range(u32, u32),
    /// Matches anything.
    Wildcard,
}

/// A lowered statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BehavStmt {
    /// Initialises a local slot (the slot itself is declared in
    /// [`BehavModule::locals`]).
    Let {
        /// The local slot being initialised.
        slot: VarSlot,
        /// The initial value.
        value: BehavExpr,
    },
    /// Writes a slot (or part of one), masked to the slot's width.
    Assign {
        /// The target.
        lhs: BehavLhs,
        /// The value.
        value: BehavExpr,
    },
    /// Branch on a nonzero condition.
    If {
        /// The condition.
        cond: BehavExpr,
        /// Statements when nonzero.
        then_body: Vec<BehavStmt>,
        /// Statements when zero.
        else_body: Vec<BehavStmt>,
    },
    /// First-match-wins multi-way branch; compiled to an if/else-if chain
    /// with any wildcard arm last.
    Match {
        /// The subject, evaluated once.
        subject: BehavExpr,
        /// `(pattern, body)` arms in source order.
        arms: Vec<(BehavPattern, Vec<BehavStmt>)>,
    },
}

/// One lowered behavioral module definition.
///
/// Lowered once per definition and shared by every instance. Slot layout:
/// inputs first, then outputs, then locals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehavModule {
    /// The sanitised module name.
    pub name: String,
    /// Input parameters, slots `0..inputs.len()`.
    pub inputs: Vec<BehavVar>,
    /// Outputs, slots `inputs.len()..inputs.len()+outputs.len()`.
    pub outputs: Vec<BehavVar>,
    /// `let` locals, slots after the outputs.
    pub locals: Vec<BehavVar>,
    /// The body in execution order.
    pub body: Vec<BehavStmt>,
}

impl BehavModule {
    /// Total number of variable slots.
    pub fn slot_count(&self) -> u32 {
        (self.inputs.len() + self.outputs.len() + self.locals.len()) as u32
    }

    /// Returns the slot of output `index`.
    pub fn output_slot(&self, index: u32) -> VarSlot {
        self.inputs.len() as u32 + index
    }

    /// Returns the variable behind a slot.
    pub fn var(&self, slot: VarSlot) -> &BehavVar {
        let slot = slot as usize;
        let n_in = self.inputs.len();
        let n_out = self.outputs.len();
        if slot < n_in {
            &self.inputs[slot]
        } else if slot < n_in + n_out {
            &self.outputs[slot - n_in]
        } else {
            &self.locals[slot - n_in - n_out]
        }
    }

    /// Returns the index of the named output, if any.
    pub fn output_index(&self, name: &str) -> Option<u32> {
        self.outputs.iter().position(|o| o.name == name).map(|i| i as u32)
    }
}

/// Returns the width-`w` mask at 32-bit precision (`w` must be 1..=32).
pub fn width_mask(w: u32) -> u32 {
    if w >= 32 {
        u32::MAX
    } else {
        (1u32 << w) - 1
    }
}
