//! Net-expression evaluation: actuals to ordered bit lists.

use crate::error::ElabError;
use crate::{Elaborator, Scope};
use strand_hdl::NetExpr;
use strand_ir::SignalId;

impl Elaborator<'_> {
    /// Evaluates a net expression to its little-endian bit list.
    ///
    /// Literals bind to the constant sentinels bit by bit, so a `Const`
    /// actual never allocates signals.
    pub(crate) fn eval_net(
        &mut self,
        scope: &Scope,
        expr: &NetExpr,
    ) -> Result<Vec<SignalId>, ElabError> {
        match expr {
            NetExpr::Ref(name) => scope
                .get(name)
                .cloned()
                .ok_or_else(|| ElabError::UndefinedNet(name.clone())),
            NetExpr::Bit(name, index) => {
                let bits = scope
                    .get(name)
                    .ok_or_else(|| ElabError::UndefinedNet(name.clone()))?;
                let bit = bits.get(*index as usize).copied().ok_or_else(|| {
                    ElabError::IndexOutOfRange {
                        name: name.clone(),
                        index: *index,
                        width: bits.len() as u32,
                    }
                })?;
                Ok(vec![bit])
            }
            NetExpr::Slice(name, hi, lo) => {
                let bits = scope
                    .get(name)
                    .ok_or_else(|| ElabError::UndefinedNet(name.clone()))?;
                if hi < lo || *hi as usize >= bits.len() {
                    return Err(ElabError::IndexOutOfRange {
                        name: name.clone(),
                        index: *hi,
                        width: bits.len() as u32,
                    });
                }
                Ok(bits[*lo as usize..=*hi as usize].to_vec())
            }
            NetExpr::Concat(parts) => {
                let mut bits = Vec::new();
                for part in parts {
                    bits.extend(self.eval_net(scope, part)?);
                }
                Ok(bits)
            }
            NetExpr::Const { value, width } => Ok((0..*width)
                .map(|i| self.signals.constant((value >> i) & 1 == 1))
                .collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strand_diagnostics::DiagnosticSink;
    use strand_hdl::Design;
    use strand_ir::{SignalKind, CONST_0, CONST_1};

    fn with_scope<R>(f: impl FnOnce(&mut Elaborator<'_>, &Scope) -> R) -> R {
        let design = Design::new();
        let sink = DiagnosticSink::new();
        let mut ela = Elaborator::new(&design, &sink);
        let bits = ela.alloc_bits("", "bus", 4, SignalKind::Wire).unwrap();
        let mut scope = Scope::new();
        scope.insert("bus".into(), bits);
        f(&mut ela, &scope)
    }

    #[test]
    fn ref_returns_all_bits() {
        with_scope(|ela, scope| {
            let bits = ela.eval_net(scope, &NetExpr::Ref("bus".into())).unwrap();
            assert_eq!(bits.len(), 4);
        });
    }

    #[test]
    fn bit_and_slice() {
        with_scope(|ela, scope| {
            let bit = ela.eval_net(scope, &NetExpr::Bit("bus".into(), 2)).unwrap();
            assert_eq!(bit.len(), 1);
            let slice = ela
                .eval_net(scope, &NetExpr::Slice("bus".into(), 2, 1))
                .unwrap();
            assert_eq!(slice.len(), 2);
            // slice is little-endian: bit 1 first
            assert_eq!(slice[1], bit[0]);
        });
    }

    #[test]
    fn out_of_range_bit_fails() {
        with_scope(|ela, scope| {
            let err = ela
                .eval_net(scope, &NetExpr::Bit("bus".into(), 4))
                .unwrap_err();
            assert!(matches!(err, ElabError::IndexOutOfRange { index: 4, .. }));
        });
    }

    #[test]
    fn unknown_name_fails() {
        with_scope(|ela, scope| {
            assert!(matches!(
                ela.eval_net(scope, &NetExpr::Ref("nope".into())),
                Err(ElabError::UndefinedNet(_))
            ));
        });
    }

    #[test]
    fn const_binds_sentinels() {
        with_scope(|ela, scope| {
            let bits = ela
                .eval_net(scope, &NetExpr::Const { value: 0b101, width: 3 })
                .unwrap();
            assert_eq!(bits, vec![CONST_1, CONST_0, CONST_1]);
        });
    }

    #[test]
    fn concat_orders_low_bits_first() {
        with_scope(|ela, scope| {
            let bits = ela
                .eval_net(
                    scope,
                    &NetExpr::Concat(vec![
                        NetExpr::Bit("bus".into(), 3),
                        NetExpr::Const { value: 1, width: 1 },
                    ]),
                )
                .unwrap();
            assert_eq!(bits.len(), 2);
            assert_eq!(bits[1], CONST_1);
        });
    }
}
