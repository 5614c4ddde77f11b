//! Locked LP accounting at the day-end snapshot.

use crate::math::mul_div_floor;
use crate::{PoolLookup, Result};
use harvest_types::Position;
use std::collections::BTreeMap;
use tracing::debug;

/// Locked LP, total LP and estimated lovelace value per pool at the
/// snapshot slot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SnapshotTotals {
    pub locked_lp_by_pool: BTreeMap<String, u64>,
    pub total_lp_by_pool: BTreeMap<String, u64>,
    pub estimated_value_by_pool: BTreeMap<String, u64>,
    pub total_estimated_value: u64,
}

/// Sum the LP tokens locked per pool across positions active at `max_slot`,
/// and estimate each pool's locked lovelace value.
///
/// Only positions active at the snapshot count: this is what feeds the
/// minimum-locked pool filter, and it sidesteps pools deleted mid-day that
/// still had positions earlier (which would otherwise divide by zero in the
/// valuation). For pools whose `asset_a` is the native token the locked
/// value is estimated as twice the native side:
/// `2 * floor(lp_qty * asset_a_quantity / total_lp_tokens)`.
pub fn calculate_total_lp_at_snapshot(
    max_slot: u64,
    positions: &[Position],
    lookup: &impl PoolLookup,
) -> Result<SnapshotTotals> {
    let mut totals = SnapshotTotals::default();
    let mut pools_by_ident = BTreeMap::new();

    for position in positions {
        if !position.active_at(max_slot) {
            continue;
        }
        for (asset_id, amount) in position.value.iter() {
            if !lookup.is_lp_token(asset_id) {
                continue;
            }
            let pool = lookup.pool_by_lp_token(asset_id)?;
            *totals
                .locked_lp_by_pool
                .entry(pool.pool_ident.clone())
                .or_default() += amount;
            if pool.asset_a.is_empty() {
                let native_side = mul_div_floor(amount, pool.asset_a_quantity, pool.total_lp_tokens);
                *totals
                    .estimated_value_by_pool
                    .entry(pool.pool_ident.clone())
                    .or_default() += 2 * native_side;
                totals.total_estimated_value += 2 * native_side;
            }
            pools_by_ident.insert(pool.pool_ident.clone(), pool);
        }
    }

    for pool_ident in totals.locked_lp_by_pool.keys() {
        totals
            .total_lp_by_pool
            .insert(pool_ident.clone(), pools_by_ident[pool_ident].total_lp_tokens);
    }
    debug!(
        pools = totals.locked_lp_by_pool.len(),
        total_value = totals.total_estimated_value,
        "accounted locked LP at snapshot"
    );
    Ok(totals)
}
