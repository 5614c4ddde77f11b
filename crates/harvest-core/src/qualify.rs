//! Pool qualification: which pools are even eligible for rewards.

use crate::delegation::UNDELEGATED;
use crate::math::at_least_integer_percent;
use crate::{PoolLookup, Result};
use harvest_types::{Pool, YieldProgram};
use std::collections::BTreeMap;
use std::fmt::Write;
use tracing::debug;

/// Decide whether `pool`, with `locked` LP tokens locked at the snapshot,
/// qualifies for rewards. Returns the verdict and a human-readable reason
/// trail (empty when nothing was worth recording).
///
/// Qualification striping: if all four eligibility lists are absent every
/// pool starts qualified; otherwise a pool starts unqualified and any
/// matching eligibility list flips it qualified. Any matching
/// disqualification list flips it back. Reasons accumulate for every
/// non-matching eligibility list and every matching disqualification list.
pub fn is_pool_qualified(program: &YieldProgram, pool: &Pool, locked: u64) -> (bool, String) {
    if pool.total_lp_tokens == 0 {
        return (false, "pool has 0 lp tokens".into());
    }
    if !at_least_integer_percent(locked, pool.total_lp_tokens, program.min_lp_integer_percent) {
        return (
            false,
            format!(
                "less than {}% of LP tokens locked",
                program.min_lp_integer_percent
            ),
        );
    }

    let mut qualified = program.eligible_versions.is_none()
        && program.eligible_pools.is_none()
        && program.eligible_assets.is_none()
        && program.eligible_pairs.is_none();
    let mut reason = String::new();

    if let Some(versions) = &program.eligible_versions {
        if versions.iter().any(|version| *version == pool.version) {
            qualified = true;
        } else {
            let _ = write!(
                reason,
                "Program lists eligible versions, but doesn't list this version ({}); ",
                pool.version
            );
        }
    }
    if let Some(pools) = &program.eligible_pools {
        if pools.iter().any(|ident| *ident == pool.pool_ident) {
            qualified = true;
        } else {
            reason.push_str("Program lists eligible pools, but doesn't list this pool; ");
        }
    }
    if let Some(assets) = &program.eligible_assets {
        if assets
            .iter()
            .any(|asset| *asset == pool.asset_a || *asset == pool.asset_b)
        {
            qualified = true;
        } else {
            reason.push_str(
                "Program lists eligible assets, but doesn't list either asset from this pool; ",
            );
        }
    }
    if let Some(pairs) = &program.eligible_pairs {
        if pairs
            .iter()
            .any(|pair| pair.asset_a == pool.asset_a && pair.asset_b == pool.asset_b)
        {
            qualified = true;
        } else {
            reason.push_str(
                "Program lists eligible pairs, but doesn't list these two assets as an eligible pair; ",
            );
        }
    }

    if let Some(versions) = &program.disqualified_versions {
        if versions.iter().any(|version| *version == pool.version) {
            qualified = false;
            let _ = write!(
                reason,
                "Version ({}) is explicitly disqualified; ",
                pool.version
            );
        }
    }
    if let Some(pools) = &program.disqualified_pools {
        if pools.iter().any(|ident| *ident == pool.pool_ident) {
            qualified = false;
            reason.push_str("Pool is explicitly disqualified; ");
        }
    }
    if let Some(assets) = &program.disqualified_assets {
        if assets
            .iter()
            .any(|asset| *asset == pool.asset_a || *asset == pool.asset_b)
        {
            qualified = false;
            reason.push_str("One of the assets in this pool is explicitly disqualified; ");
        }
    }
    if let Some(pairs) = &program.disqualified_pairs {
        if pairs
            .iter()
            .any(|pair| pair.asset_a == pool.asset_a && pair.asset_b == pool.asset_b)
        {
            qualified = false;
            reason.push_str("Pair is explicitly disqualified; ");
        }
    }

    (qualified, reason)
}

/// Run the qualifier for every pool with locked LP, re-attributing the
/// delegation of non-qualifying pools to the [`UNDELEGATED`] bucket.
/// Returns the qualifying delegation per pool and the recorded reasons.
pub fn disqualify_pools(
    program: &YieldProgram,
    locked_lp_by_pool: &BTreeMap<String, u64>,
    delegation_by_pool: &BTreeMap<String, u64>,
    lookup: &impl PoolLookup,
) -> Result<(BTreeMap<String, u64>, BTreeMap<String, String>)> {
    let mut qualifying: BTreeMap<String, u64> = BTreeMap::new();
    let mut reasons = BTreeMap::new();
    for (pool_ident, locked) in locked_lp_by_pool {
        let pool = lookup.pool_by_ident(pool_ident)?;
        let delegation = delegation_by_pool.get(pool_ident).copied().unwrap_or(0);
        let (qualified, reason) = is_pool_qualified(program, &pool, *locked);
        if qualified {
            *qualifying.entry(pool_ident.clone()).or_default() += delegation;
        } else {
            if !reason.is_empty() {
                reasons.insert(pool_ident.clone(), reason);
            }
            *qualifying.entry(UNDELEGATED.to_owned()).or_default() += delegation;
        }
    }
    debug!(
        qualified = qualifying.len(),
        disqualified = reasons.len(),
        "checked pool qualification"
    );
    Ok((qualifying, reasons))
}
