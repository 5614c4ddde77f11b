//! Shared fixtures for the engine's unit tests.

use crate::{HarvestError, PoolLookup, Result};
use harvest_types::{
    AssetId, Delegation, IncentiveProgram, MultisigScript, Pool, Position, Value, YieldProgram,
};
use std::collections::BTreeMap;

/// In-memory pool lookup keyed by pool ident. Assets prefixed `LP_` are
/// recognized as LP tokens.
#[derive(Clone, Debug, Default)]
pub struct MockLookup(pub BTreeMap<String, Pool>);

impl MockLookup {
    pub fn with_pools(pools: impl IntoIterator<Item = Pool>) -> Self {
        MockLookup(
            pools
                .into_iter()
                .map(|pool| (pool.pool_ident.clone(), pool))
                .collect(),
        )
    }
}

impl PoolLookup for MockLookup {
    fn pool_by_ident(&self, pool_ident: &str) -> Result<Pool> {
        self.0
            .get(pool_ident)
            .cloned()
            .ok_or_else(|| HarvestError::PoolLookupFailed {
                target: pool_ident.to_owned(),
                detail: "pool not found".into(),
            })
    }

    fn pool_by_lp_token(&self, lp_token: &AssetId) -> Result<Pool> {
        if !self.is_lp_token(lp_token) {
            return Err(HarvestError::PoolLookupFailed {
                target: lp_token.to_string(),
                detail: "not an lp token".into(),
            });
        }
        self.0
            .values()
            .find(|pool| pool.lp_asset == *lp_token)
            .cloned()
            .ok_or_else(|| HarvestError::PoolLookupFailed {
                target: lp_token.to_string(),
                detail: "pool not found".into(),
            })
    }

    fn is_lp_token(&self, asset_id: &AssetId) -> bool {
        asset_id.as_str().starts_with("LP_")
    }

    fn lp_token_to_pool_ident(&self, lp_token: &AssetId) -> Result<String> {
        Ok(self.pool_by_lp_token(lp_token)?.pool_ident)
    }
}

pub fn sample_yield_program(daily_emission: u64) -> YieldProgram {
    YieldProgram {
        id: "Test".into(),
        first_daily_rewards: "2001-01-01".into(),
        // If this code is still in use in 2099, call the police (after
        // updating tests).
        last_daily_rewards: "2099-01-01".into(),
        staked_asset: "Staked".into(),
        emitted_asset: "Emitted".into(),
        min_lp_integer_percent: 1,
        daily_emission,
        ..YieldProgram::default()
    }
}

pub fn sample_incentive_program() -> IncentiveProgram {
    IncentiveProgram {
        id: "TestIncentive".into(),
        first_daily_rewards: "2001-01-01".into(),
        last_daily_rewards: "2099-01-01".into(),
        staked_asset: "Staked".into(),
        emitted_asset: "Emitted".into(),
        staked_reference_pool: "X".into(),
        emitted_reference_pool: "Y".into(),
    }
}

pub fn sample_position(
    owner: &str,
    staked: u64,
    delegations: impl IntoIterator<Item = Delegation>,
) -> Position {
    Position {
        owner_id: owner.to_owned(),
        owner: MultisigScript::signature(owner.as_bytes().to_vec()),
        transaction_hash: String::new(),
        slot: 0,
        spent_transaction: String::new(),
        spent_slot: 0,
        value: Value::from_coin("Staked", staked),
        delegation: delegations.into_iter().collect(),
    }
}

/// A position locked from `start` to `end`; `end == 0` leaves it unspent.
pub fn sample_timed_position(owner: &str, staked: u64, start: u64, end: u64) -> Position {
    Position {
        slot: start,
        spent_transaction: if end > 0 { "SPENT".into() } else { String::new() },
        spent_slot: end,
        ..sample_position(owner, staked, [])
    }
}

/// A delegation for the sample yield program.
pub fn delegate(pool_ident: &str, weight: u32) -> Delegation {
    Delegation::new("Test", pool_ident, weight)
}
