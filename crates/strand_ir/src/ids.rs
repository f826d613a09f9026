//! Opaque ID newtypes for netlist entities.
//!
//! Each ID wraps a `u32` index into the corresponding arena or vector and
//! debug-prints with a one-letter kind prefix (`s12`, `g3`), which keeps
//! netlist dumps readable. Gate ids double as the deterministic tie-break
//! key during levelisation: they record extraction order.
//!
//! An id space may reserve sentinel ids at the bottom: `SignalId` pins
//! `const_0` to id 0 and `const_1` to id 1, and ordinary allocation starts
//! at [`SignalId::RESERVED`]. The signal table upholds this by allocating
//! the sentinels at construction.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    // An ordinary id space.
    ($(#[$meta:meta])* $name:ident, prefix $prefix:literal) => {
        define_id!(@base $(#[$meta])* $name, $prefix);

        impl $name {
            /// Number of reserved sentinel ids; ordinary allocation
            /// starts here.
            pub const RESERVED: u32 = 0;
        }
    };
    // An id space with named sentinels pinned at the bottom.
    ($(#[$meta:meta])* $name:ident, prefix $prefix:literal,
     reserved [$($(#[$cmeta:meta])* $cname:ident = $cval:literal),+ $(,)?]) => {
        define_id!(@base $(#[$meta])* $name, $prefix);

        impl $name {
            $(
                $(#[$cmeta])*
                pub const $cname: $name = $name($cval);
            )+

            /// Number of reserved sentinel ids; ordinary allocation
            /// starts here.
            pub const RESERVED: u32 = [$($cval),+].len() as u32;
        }
    };
    (@base $(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub const fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub const fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// A single-bit signal in the elaborated circuit. Ids are dense from
    /// 0, with the two constant sentinels pinned below ordinary nets.
    SignalId, prefix "s",
    reserved [
        /// The constant-zero sentinel; its packed memory bit stays 0.
        CONST_0 = 0,
        /// The constant-one sentinel; the embedder sets its packed bit
        /// after instantiation and no gate may ever write it.
        CONST_1 = 1,
    ]
);

define_id!(
    /// A NAND gate, in extraction order.
    GateId, prefix "g"
);

define_id!(
    /// A D flip-flop, in extraction order.
    DffId, prefix "d"
);

define_id!(
    /// A behavioral module instance, in extraction order.
    BehavId, prefix "b"
);
