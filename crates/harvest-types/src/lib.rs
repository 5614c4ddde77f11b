//! Data model shared by the harvest calculation engine and its callers.
//!
//! Everything in this crate is plain, serializable data: asset identifiers,
//! monetary values, pool snapshots, locked stake positions, program
//! configuration and the earnings records the engine produces. No
//! calculation logic lives here.

pub mod asset;
pub mod multisig;
pub mod pool;
pub mod position;
pub mod program;
pub mod value;

pub use asset::AssetId;
pub use multisig::MultisigScript;
pub use pool::Pool;
pub use position::{Delegation, Position};
pub use program::{AssetPair, IncentiveProgram, ProgramError, YieldProgram};
pub use value::Value;

use serde::{Deserialize, Serialize};

/// Calendar dates are `YYYY-MM-DD` strings so that lexicographic ordering
/// coincides with calendar ordering.
pub type Date = String;

/// `chrono` format string matching the [`Date`] convention.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One per-owner earnings record for a single day of a program.
///
/// The list returned by the engine is sorted ascending by `owner_id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Earning {
    pub owner_id: String,
    /// The owner's script, carried through from the position for payout
    /// construction; the engine never interprets it.
    pub owner: MultisigScript,
    pub program_id: String,
    pub earned_date: Date,
    /// Set when the program configures an earning expiration.
    pub expiration_date: Option<chrono::NaiveDateTime>,
    /// Total value earned, denominated in the program's emitted asset.
    pub value: Value,
    /// Per-LP-token breakdown of `value`, for auditability. Only non-zero
    /// entries are present; empty in incentive mode.
    pub value_by_lp_token: std::collections::BTreeMap<AssetId, Value>,
}
