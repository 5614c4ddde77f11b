//! Liquidity pool snapshots.

use crate::asset::AssetId;
use serde::{Deserialize, Serialize};

/// A snapshot of one AMM liquidity pool, immutable within a calculation.
///
/// `asset_a` with an empty identifier denotes the native token side.
/// A pool with `total_lp_tokens == 0` has been deleted and is treated as
/// absent for the day.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub pool_ident: String,
    /// Protocol version the pool was created under.
    pub version: String,
    pub transaction_hash: String,
    pub slot: u64,
    pub total_lp_tokens: u64,
    /// The LP token whose holders own a share of this pool.
    pub lp_asset: AssetId,
    pub asset_a: AssetId,
    pub asset_a_quantity: u64,
    pub asset_b: AssetId,
    pub asset_b_quantity: u64,
}

impl Pool {
    /// Deleted pools keep their ident but hold no liquidity.
    pub fn is_deleted(&self) -> bool {
        self.total_lp_tokens == 0
    }
}
