//! Interned identifiers and name sanitisation for emitted code.

use lasso::{Key, Rodeo, Spur};
use serde::{Deserialize, Serialize};

/// A unique identifier for any named entity in a design.
///
/// An `Ident` is the raw index of an interned string, giving O(1)
/// equality and O(1) cloning. Hierarchical signal names
/// (`cpu.alu.sum[3]`) are interned the same way as plain names. Idents
/// are only meaningful together with the [`Interner`] that produced
/// them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Ident(u32);

/// String interner for one compile invocation.
///
/// The pipeline is specified single-threaded and synchronous, so this
/// wraps the single-threaded [`lasso::Rodeo`]: interning takes
/// `&mut self`, and a compile-context object (the signal table) owns the
/// interner outright. Parallel compilations each own their own interner
/// and stay independent.
#[derive(Debug)]
pub struct Interner {
    rodeo: Rodeo,
}

impl Interner {
    /// Creates a new empty interner.
    pub fn new() -> Self {
        Self {
            rodeo: Rodeo::new(),
        }
    }

    /// Interns a string, returning its [`Ident`]. Re-interning an existing
    /// string returns the same identifier without allocating.
    pub fn get_or_intern(&mut self, s: &str) -> Ident {
        Ident(self.rodeo.get_or_intern(s).into_usize() as u32)
    }

    /// Resolves an [`Ident`] back to its string value.
    ///
    /// # Panics
    ///
    /// Panics if the `Ident` was not created by this interner.
    pub fn resolve(&self, ident: Ident) -> &str {
        let key = Spur::try_from_usize(ident.0 as usize)
            .expect("ident index exceeds the interner key range");
        self.rodeo.resolve(&key)
    }

    /// Number of distinct strings interned so far.
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    /// Returns `true` if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

/// Rewrites a name into the portable alphabet used in emitted artifacts.
///
/// Every character outside `[A-Za-z0-9_]` becomes `_`, and a leading digit
/// gets a `_` prefix. Distinct names can collide after sanitisation; callers
/// resolve clashes by appending the entity's numeric id.
pub fn sanitize_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 1);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if i == 0 && c.is_ascii_digit() {
                out.push('_');
            }
            out.push(c);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() {
        out.push('_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_resolve_roundtrip() {
        let mut interner = Interner::new();
        let id = interner.get_or_intern("cpu.alu.sum");
        assert_eq!(interner.resolve(id), "cpu.alu.sum");
    }

    #[test]
    fn same_string_same_ident() {
        let mut interner = Interner::new();
        let a = interner.get_or_intern("clk");
        let b = interner.get_or_intern("clk");
        assert_eq!(a, b);
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn different_strings_different_idents() {
        let mut interner = Interner::new();
        let d = interner.get_or_intern("d");
        let q = interner.get_or_intern("q");
        assert_ne!(d, q);
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn starts_empty() {
        let interner = Interner::new();
        assert!(interner.is_empty());
    }

    #[test]
    fn sanitize_passthrough() {
        assert_eq!(sanitize_ident("sum_3"), "sum_3");
    }

    #[test]
    fn sanitize_hierarchical_name() {
        assert_eq!(sanitize_ident("cpu.alu.sum[3]"), "cpu_alu_sum_3_");
    }

    #[test]
    fn sanitize_leading_digit() {
        assert_eq!(sanitize_ident("8bit"), "_8bit");
    }

    #[test]
    fn sanitize_empty() {
        assert_eq!(sanitize_ident(""), "_");
    }

    #[test]
    fn serde_roundtrip() {
        let mut interner = Interner::new();
        let id = interner.get_or_intern("rst");
        let json = serde_json::to_string(&id).unwrap();
        let back: Ident = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
        assert_eq!(interner.resolve(back), "rst");
    }
}
