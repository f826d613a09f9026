//! The signal table: dense id allocation for every wire in the circuit.

use crate::ids::SignalId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strand_common::{Ident, InternalError, Interner, Stage, StrandResult};

/// The id of the constant-zero signal, always 0.
pub const CONST_0: SignalId = SignalId::CONST_0;

/// The id of the constant-one signal, always 1.
pub const CONST_1: SignalId = SignalId::CONST_1;

/// What drives (or will drive) a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// One of the two constant sentinels.
    Const,
    /// A primary input of the top module, written by the embedder.
    Input,
    /// A primary output of the top module.
    Output,
    /// An internal net.
    Wire,
}

/// One single-bit signal in the elaborated circuit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// The dense id, equal to this signal's position.
    pub id: SignalId,
    /// The hierarchical display name, e.g. `cpu.alu.sum[3]`.
    pub name: String,
    /// What kind of signal this is.
    pub kind: SignalKind,
}

/// Allocates dense signal ids during elaboration.
///
/// Ids are contiguous from 0 in allocation order, so multi-bit port bit 0
/// is always allocated before bit 1 and two identical elaborations produce
/// identical numberings. The two constant sentinels are allocated at
/// construction: `const_0` at id 0 and `const_1` at id 1.
///
/// The table owns a string interner so repeated hierarchical prefixes are
/// stored once; display names are resolved out at [`finalize`](Self::finalize).
#[derive(Debug)]
pub struct SignalTable {
    interner: Interner,
    by_name: HashMap<Ident, SignalId>,
    names: Vec<Ident>,
    kinds: Vec<SignalKind>,
    frozen: bool,
    next_anon: u32,
}

impl SignalTable {
    /// Creates a table holding only the two constant sentinels.
    pub fn new() -> Self {
        let mut table = Self {
            interner: Interner::new(),
            by_name: HashMap::new(),
            names: Vec::new(),
            kinds: Vec::new(),
            frozen: false,
            next_anon: 0,
        };
        let c0 = table.push("const_0", SignalKind::Const);
        let c1 = table.push("const_1", SignalKind::Const);
        debug_assert_eq!(c0, CONST_0);
        debug_assert_eq!(c1, CONST_1);
        debug_assert_eq!(table.len(), SignalId::RESERVED);
        table
    }

    fn push(&mut self, name: &str, kind: SignalKind) -> SignalId {
        let id = SignalId::from_raw(self.names.len() as u32);
        let ident = self.interner.get_or_intern(name);
        self.by_name.insert(ident, id);
        self.names.push(ident);
        self.kinds.push(kind);
        id
    }

    /// Returns the id for `name`, allocating the next id if it is new.
    ///
    /// Re-interning an existing name returns the existing id; the kind of
    /// an existing signal is left untouched.
    pub fn intern(&mut self, name: &str, kind: SignalKind) -> StrandResult<SignalId> {
        self.check_not_frozen()?;
        let ident = self.interner.get_or_intern(name);
        if let Some(&id) = self.by_name.get(&ident) {
            return Ok(id);
        }
        Ok(self.push(name, kind))
    }

    /// Allocates a fresh internal net; `hint` seeds the display name.
    pub fn alloc_anonymous(&mut self, hint: &str) -> StrandResult<SignalId> {
        self.check_not_frozen()?;
        let name = format!("${hint}${}", self.next_anon);
        self.next_anon += 1;
        Ok(self.push(&name, SignalKind::Wire))
    }

    /// Returns the canonical constant signal for `bit`.
    pub fn constant(&self, bit: bool) -> SignalId {
        if bit {
            CONST_1
        } else {
            CONST_0
        }
    }

    /// Returns the number of allocated signals.
    pub fn len(&self) -> u32 {
        self.names.len() as u32
    }

    /// Returns `true` if only the constant sentinels exist.
    pub fn is_empty(&self) -> bool {
        self.names.len() <= 2
    }

    /// Returns the display name of a signal.
    pub fn name(&self, id: SignalId) -> &str {
        self.interner.resolve(self.names[id.as_raw() as usize])
    }

    /// Marks a signal as a primary input or output of the top module.
    pub fn set_kind(&mut self, id: SignalId, kind: SignalKind) {
        self.kinds[id.as_raw() as usize] = kind;
    }

    /// Freezes the table and returns the final signal list.
    ///
    /// Any later allocation is an internal error: the netlist is immutable
    /// once extraction completes.
    pub fn finalize(&mut self) -> Vec<Signal> {
        self.frozen = true;
        self.names
            .iter()
            .zip(&self.kinds)
            .enumerate()
            .map(|(i, (&name, &kind))| Signal {
                id: SignalId::from_raw(i as u32),
                name: self.interner.resolve(name).to_string(),
                kind,
            })
            .collect()
    }

    fn check_not_frozen(&self) -> StrandResult<()> {
        if self.frozen {
            Err(InternalError::new(
                Stage::SignalTable,
                "signal allocation after the table was finalized",
            ))
        } else {
            Ok(())
        }
    }
}

impl Default for SignalTable {
    fn default() -> Self {
        Self::new()
    }
}
