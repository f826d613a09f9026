//! Net expressions: the actuals of structural port connections.

use serde::{Deserialize, Serialize};

/// An expression denoting a (multi-)bit net in a structural body.
///
/// Net expressions appear as the actual side of a port connection. Each
/// form denotes an ordered list of bits, little-endian (bit 0 first), so
/// that a width-`n` formal binds to exactly `n` bit signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetExpr {
    /// A named wire or port; denotes all of its bits.
    Ref(String),
    /// One bit of a named net: `name[i]`.
    Bit(String, u32),
    /// An inclusive bit range of a named net: `name[hi:lo]`.
    Slice(String, u32, u32),
    /// Concatenation; element 0 contributes the lowest bits.
    Concat(Vec<NetExpr>),
    /// A literal constant of the given width, bound to the constant
    /// signals bit by bit.
    Const {
        /// The literal value.
        value: u64,
        /// The number of bits the literal occupies.
        width: u32,
    },
}

impl NetExpr {
    /// Returns the width of this expression when it is derivable without
    /// looking up named nets (`Const`, `Bit`, `Slice`, and concatenations
    /// of those).
    pub fn fixed_width(&self) -> Option<u32> {
        match self {
            NetExpr::Ref(_) => None,
            NetExpr::Bit(_, _) => Some(1),
            NetExpr::Slice(_, hi, lo) => Some(hi - lo + 1),
            NetExpr::Concat(parts) => parts.iter().map(NetExpr::fixed_width).sum(),
            NetExpr::Const { width, .. } => Some(*width),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_widths() {
        assert_eq!(NetExpr::Ref("a".into()).fixed_width(), None);
        assert_eq!(NetExpr::Bit("a".into(), 3).fixed_width(), Some(1));
        assert_eq!(NetExpr::Slice("a".into(), 7, 4).fixed_width(), Some(4));
        assert_eq!(
            NetExpr::Const { value: 5, width: 3 }.fixed_width(),
            Some(3)
        );
    }

    #[test]
    fn concat_width_sums() {
        let e = NetExpr::Concat(vec![
            NetExpr::Bit("a".into(), 0),
            NetExpr::Slice("b".into(), 3, 0),
        ]);
        assert_eq!(e.fixed_width(), Some(5));
    }

    #[test]
    fn concat_width_unknown_if_any_ref() {
        let e = NetExpr::Concat(vec![NetExpr::Bit("a".into(), 0), NetExpr::Ref("b".into())]);
        assert_eq!(e.fixed_width(), None);
    }

    #[test]
    fn serde_roundtrip() {
        let e = NetExpr::Concat(vec![
            NetExpr::Ref("lo".into()),
            NetExpr::Const { value: 1, width: 1 },
        ]);
        let json = serde_json::to_string(&e).unwrap();
        assert_eq!(serde_json::from_str::<NetExpr>(&json).unwrap(), e);
    }
}
