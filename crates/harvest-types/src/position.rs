//! Locked stake positions and their delegation preferences.

use crate::multisig::MultisigScript;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// One entry of a position's declared pool preference.
///
/// A delegation only counts toward the program whose id matches
/// `program_id`; entries for other programs are ignored wholesale.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub program_id: String,
    pub pool_ident: String,
    pub weight: u32,
}

impl Delegation {
    pub fn new(program_id: impl Into<String>, pool_ident: impl Into<String>, weight: u32) -> Self {
        Delegation {
            program_id: program_id.into(),
            pool_ident: pool_ident.into(),
            weight,
        }
    }
}

/// An owner's locked stake over a slot interval.
///
/// Invariant: when `spent_transaction` is non-empty, `slot <= spent_slot`.
/// An empty `spent_transaction` means the position is still live.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub owner_id: String,
    pub owner: MultisigScript,
    pub transaction_hash: String,
    /// Slot the position was created at.
    pub slot: u64,
    pub spent_transaction: String,
    pub spent_slot: u64,
    pub value: Value,
    /// Ordered; the order is observable through residual round-robin
    /// distribution.
    pub delegation: Vec<Delegation>,
}

impl Position {
    /// Whether the position was still locked at `slot`.
    pub fn active_at(&self, slot: u64) -> bool {
        self.spent_transaction.is_empty() || (self.slot < slot && self.spent_slot >= slot)
    }
}
