//! Time-weighted LP accounting over the day.

use crate::math::mul_div_floor;
use crate::{PoolLookup, Result};
use harvest_types::{AssetId, Position};
use std::collections::BTreeMap;

/// Compute per-owner and per-asset time-weighted LP quantities over the
/// window `[min_slot, max_slot]`.
///
/// Each position's LP holdings are scaled by the fraction of the day they
/// were locked, `floor((end - start) * lp_qty / (max_slot - min_slot))`,
/// which prevents locking in the last minute of the day from earning a full
/// day of rewards. Positions wholly outside the window contribute nothing.
pub fn total_lp_days_by_owner_and_asset(
    positions: &[Position],
    lookup: &impl PoolLookup,
    min_slot: u64,
    max_slot: u64,
) -> (
    BTreeMap<String, BTreeMap<AssetId, u64>>,
    BTreeMap<AssetId, u64>,
) {
    let mut lp_days_by_owner: BTreeMap<String, BTreeMap<AssetId, u64>> = BTreeMap::new();
    let mut lp_days_by_asset: BTreeMap<AssetId, u64> = BTreeMap::new();

    for position in positions {
        for (asset_id, amount) in position.value.iter() {
            if !lookup.is_lp_token(asset_id) {
                continue;
            }
            let start = position.slot.max(min_slot);
            let end = if position.spent_transaction.is_empty() || position.spent_slot > max_slot {
                max_slot
            } else {
                position.spent_slot
            };
            if end <= start {
                continue;
            }
            let weight = mul_div_floor(end - start, amount, max_slot - min_slot);

            *lp_days_by_owner
                .entry(position.owner_id.clone())
                .or_default()
                .entry(asset_id.clone())
                .or_default() += weight;
            *lp_days_by_asset.entry(asset_id.clone()).or_default() += weight;
        }
    }

    (lp_days_by_owner, lp_days_by_asset)
}

/// Re-key a per-pool map by each pool's LP token. Zero amounts are dropped;
/// assumes the pool-ident to LP-token mapping is a bijection.
pub fn regroup_by_asset(
    by_pool: &BTreeMap<String, u64>,
    lookup: &impl PoolLookup,
) -> Result<BTreeMap<AssetId, u64>> {
    let mut by_lp_asset = BTreeMap::new();
    for (pool_ident, amount) in by_pool {
        if *amount == 0 {
            continue;
        }
        let pool = lookup.pool_by_ident(pool_ident)?;
        by_lp_asset.insert(pool.lp_asset, *amount);
    }
    Ok(by_lp_asset)
}
