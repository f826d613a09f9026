//! Behavioral bodies: the `@behavior` imperative expression language.
//!
//! A behavioral block reads the module's input ports, may declare `let`
//! variables, and must assign every output port. All values are unsigned
//! bit-vectors evaluated at 32-bit precision; writes are masked to the
//! declared width of their target.

use serde::{Deserialize, Serialize};
use strand_source::Span;

/// A binary operator in a behavioral expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Addition (`+`), wrapping at 32 bits.
    Add,
    /// Subtraction (`-`), wrapping at 32 bits.
    Sub,
    /// Multiplication (`*`), wrapping at 32 bits.
    Mul,
    /// Unsigned division (`/`); division by zero is a lowering error.
    Div,
    /// Unsigned remainder (`%`).
    Mod,
    /// Bitwise AND (`&`).
    And,
    /// Bitwise OR (`|`).
    Or,
    /// Bitwise XOR (`^`).
    Xor,
    /// Left shift (`<<`).
    Shl,
    /// Unsigned right shift (`>>`).
    Shr,
    /// Equality (`==`), yielding 0 or 1.
    Eq,
    /// Inequality (`!=`), yielding 0 or 1.
    Ne,
    /// Unsigned less-than (`<`).
    Lt,
    /// Unsigned greater-than (`>`).
    Gt,
    /// Unsigned less-or-equal (`<=`).
    Le,
    /// Unsigned greater-or-equal (`>=`).
    Ge,
}

/// A unary operator in a behavioral expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Bitwise NOT (`~`), masked to the operand's context width at write.
    Not,
    /// Logical NOT (`!`), yielding 0 or 1.
    LogicNot,
}

/// An expression in a behavioral body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BehaviorExpr {
    /// A numeric literal.
    Number(u64),
    /// A reference to a port or `let` variable.
    Ident(String),
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<BehaviorExpr>,
        /// Right operand.
        rhs: Box<BehaviorExpr>,
    },
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<BehaviorExpr>,
    },
    /// A conditional expression (`cond ? a : b`).
    Ternary {
        /// The condition; nonzero selects `then_val`.
        cond: Box<BehaviorExpr>,
        /// Value when the condition is nonzero.
        then_val: Box<BehaviorExpr>,
        /// Value when the condition is zero.
        else_val: Box<BehaviorExpr>,
    },
    /// A single-bit index `e[i]`; the index may be dynamic.
    Index {
        /// The expression being indexed.
        expr: Box<BehaviorExpr>,
        /// The bit index expression.
        index: Box<BehaviorExpr>,
    },
    /// A constant slice `e[hi:lo]`, inclusive bounds.
    Slice {
        /// The expression being sliced.
        expr: Box<BehaviorExpr>,
        /// High bit index.
        hi: u32,
        /// Low bit index.
        lo: u32,
    },
    /// Concatenation `{e0, e1, …}`; element 0 contributes the lowest bits
    /// and each element's width is its context width.
    Concat(Vec<BehaviorExpr>),
    /// A cross-module call `modname(arg0, …)` to another behavioral module.
    ///
    /// `output: None` selects the callee's sole output; `Some(name)`
    /// selects a named output of a multi-output callee.
    Call {
        /// The callee module name.
        module: String,
        /// Argument expressions, one per callee input in declaration order.
        args: Vec<BehaviorExpr>,
        /// Which output the call evaluates to.
        output: Option<String>,
    },
}

/// The left-hand side of a behavioral assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Lhs {
    /// A whole variable or output.
    Name(String),
    /// One bit of a variable: `x[i] = v`.
    BitIndex(String, BehaviorExpr),
    /// A constant slice of a variable: `x[hi:lo] = v`.
    Slice(String, u32, u32),
}

impl Lhs {
    /// Returns the name of the variable being assigned.
    pub fn name(&self) -> &str {
        match self {
            Lhs::Name(n) | Lhs::BitIndex(n, _) => n,
            Lhs::Slice(n, _, _) => n,
        }
    }
}

/// A pattern in a `match` arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Pattern {
    /// Matches one exact value.
    Number(u64),
    /// Matches an inclusive range `lo..=hi`.
    Range(u64, u64),
    /// Matches anything; must be the last arm if present.
    Wildcard,
}

/// One arm of a `match` statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchArm {
    /// The pattern to test.
    pub pattern: Pattern,
    /// The statements to run when the pattern matches.
    pub body: Vec<BehaviorStmt>,
}

/// A statement in a behavioral body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BehaviorStmt {
    /// Declares a local variable with an explicit width and initial value.
    Let {
        /// The variable name.
        name: String,
        /// The variable width in bits.
        width: u32,
        /// The initial value expression.
        value: BehaviorExpr,
    },
    /// Assigns to an output, local, or part of one.
    Assign {
        /// The assignment target.
        lhs: Lhs,
        /// The value expression.
        value: BehaviorExpr,
    },
    /// A conditional statement.
    If {
        /// The condition; nonzero takes the `then` branch.
        cond: BehaviorExpr,
        /// Statements when the condition is nonzero.
        then_body: Vec<BehaviorStmt>,
        /// Statements when the condition is zero.
        else_body: Option<Vec<BehaviorStmt>>,
    },
    /// A multi-way branch; arms are tested in source order, first match
    /// wins.
    Match {
        /// The subject expression.
        subject: BehaviorExpr,
        /// The arms.
        arms: Vec<MatchArm>,
    },
}

/// A whole `@behavior` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorBlock {
    /// Statements in execution order.
    pub stmts: Vec<BehaviorStmt>,
    /// Source location of the block.
    #[serde(default = "Span::dummy")]
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(a: &str, b: &str) -> BehaviorExpr {
        BehaviorExpr::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(BehaviorExpr::Ident(a.into())),
            rhs: Box::new(BehaviorExpr::Ident(b.into())),
        }
    }

    #[test]
    fn adder_block_shape() {
        let block = BehaviorBlock {
            stmts: vec![BehaviorStmt::Assign {
                lhs: Lhs::Name("sum".into()),
                value: add("a", "b"),
            }],
            span: Span::DUMMY,
        };
        assert_eq!(block.stmts.len(), 1);
    }

    #[test]
    fn lhs_names() {
        assert_eq!(Lhs::Name("x".into()).name(), "x");
        assert_eq!(
            Lhs::BitIndex("y".into(), BehaviorExpr::Number(0)).name(),
            "y"
        );
        assert_eq!(Lhs::Slice("z".into(), 7, 0).name(), "z");
    }

    #[test]
    fn match_arm_patterns() {
        let arm = MatchArm {
            pattern: Pattern::Range(0, 3),
            body: vec![],
        };
        assert_eq!(arm.pattern, Pattern::Range(0, 3));
        assert_ne!(arm.pattern, Pattern::Wildcard);
    }

    #[test]
    fn serde_roundtrip() {
        let stmt = BehaviorStmt::Match {
            subject: BehaviorExpr::Ident("op".into()),
            arms: vec![
                MatchArm {
                    pattern: Pattern::Number(0),
                    body: vec![BehaviorStmt::Assign {
                        lhs: Lhs::Name("out".into()),
                        value: add("a", "b"),
                    }],
                },
                MatchArm {
                    pattern: Pattern::Wildcard,
                    body: vec![BehaviorStmt::Assign {
                        lhs: Lhs::Name("out".into()),
                        value: BehaviorExpr::Number(0),
                    }],
                },
            ],
        };
        let json = serde_json::to_string(&stmt).unwrap();
        assert_eq!(serde_json::from_str::<BehaviorStmt>(&json).unwrap(), stmt);
    }
}
