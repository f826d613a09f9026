//! The HDL abstract syntax tree.
//!
//! The lexer/parser front-end is an external collaborator: it hands the
//! compiler a [`Design`] — a database of module definitions — either
//! in-process or as serde JSON. Names in the AST are plain strings;
//! interning happens during elaboration.
//!
//! A module body is either *structural* (wires plus instances of other
//! modules and primitives) or *behavioral* (an imperative block over
//! bit-vector values). The two built-in primitives are `nand` and `dff`;
//! the derived gates `not`, `and`, `or`, `xor`, `mux`, and the multi-bit
//! `reg` are recognised by the elaborator and synthesised from them.

#![warn(missing_docs)]

mod behavior;
mod design;
mod net;

pub use behavior::{
    BehaviorBlock, BehaviorExpr, BehaviorStmt, BinaryOp, Lhs, MatchArm, Pattern, UnaryOp,
};
pub use design::{Design, Direction, Instance, ModuleBody, ModuleDef, PortDecl, WireDecl};
pub use net::NetExpr;
