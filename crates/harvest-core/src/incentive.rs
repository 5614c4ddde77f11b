//! The incentive mode: time-weighted per-owner splits of a single
//! emission, without the pool-selection layer.

use crate::math::mul_div_floor;
use crate::{HarvestError, PoolLookup, Result};
use harvest_types::{
    AssetId, Date, Earning, IncentiveProgram, MultisigScript, Pool, Position, Value,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Results of one incentive calculation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IncentiveOutputs {
    pub start_date: Date,
    pub end_date: Date,
    pub total_emissions: u64,
    pub emitted_asset: AssetId,
    pub emitted_asset_lovelace_value: u64,
    pub staked_asset_lovelace_value: u64,

    pub total_delegators: u64,
    pub delegator_weights: BTreeMap<String, u64>,
    pub emissions_by_owner: BTreeMap<String, u64>,

    pub earnings: Vec<Earning>,
}

/// Collect each owner's script from their positions; later positions win.
pub fn positions_to_owners(positions: &[Position]) -> BTreeMap<String, MultisigScript> {
    let mut owners_by_id = BTreeMap::new();
    for position in positions {
        owners_by_id.insert(position.owner_id.clone(), position.owner.clone());
    }
    owners_by_id
}

/// Compute each owner's time-weighted stake over `[start_slot, end_slot]`.
///
/// Positions without any delegation are ignored. A position's staked
/// amount is its direct holdings of the program's staked asset plus the
/// staked-asset share of any LP tokens it holds, scaled by the fraction of
/// the window the position was locked:
/// `floor(staked * locked_length / window_length)`. Zero weights are
/// dropped. Returns the per-owner weights and their total.
pub fn calculate_delegation_weights(
    program: &IncentiveProgram,
    positions: &[Position],
    start_slot: u64,
    end_slot: u64,
    lookup: &impl PoolLookup,
) -> Result<(BTreeMap<String, u64>, u64)> {
    let window_length = end_slot - start_slot;
    let mut weight_by_owner: BTreeMap<String, u64> = BTreeMap::new();
    let mut total = 0u64;

    for position in positions {
        if position.delegation.is_empty() {
            continue;
        }
        let mut staked = position.value.amount_of(&program.staked_asset);
        for (asset_id, amount) in position.value.iter() {
            if !lookup.is_lp_token(asset_id) {
                continue;
            }
            let pool = lookup.pool_by_lp_token(asset_id)?;
            if pool.is_deleted() {
                continue;
            }
            if pool.asset_a == program.staked_asset {
                staked += mul_div_floor(amount, pool.asset_a_quantity, pool.total_lp_tokens);
            } else if pool.asset_b == program.staked_asset {
                staked += mul_div_floor(amount, pool.asset_b_quantity, pool.total_lp_tokens);
            }
        }

        let truncated_start = position.slot.max(start_slot);
        let truncated_end =
            if position.spent_transaction.is_empty() || position.spent_slot > end_slot {
                end_slot
            } else {
                position.spent_slot
            };
        // Positions wholly outside the window have zero locked length.
        let locked_length = truncated_end.saturating_sub(truncated_start);

        let weight = mul_div_floor(staked, locked_length, window_length);
        if weight == 0 {
            continue;
        }
        total += weight;
        *weight_by_owner.entry(position.owner_id.clone()).or_default() += weight;
    }

    Ok((weight_by_owner, total))
}

/// Split `emission` across owners in proportion to their weights, rounding
/// down, then hand the rounding deficit out one unit at a time to owners
/// ordered by allocation ascending (owner id breaking ties).
pub fn split_emission_per_owner(
    emission: u64,
    weight_by_owner: &BTreeMap<String, u64>,
    total: u64,
) -> BTreeMap<String, u64> {
    let mut emission_by_owner: BTreeMap<String, u64> = BTreeMap::new();
    if weight_by_owner.is_empty() {
        return emission_by_owner;
    }

    let mut allocated = 0u64;
    for (owner_id, weight) in weight_by_owner {
        let amount = mul_div_floor(emission, *weight, total);
        allocated += amount;
        emission_by_owner.insert(owner_id.clone(), amount);
    }
    let mut remainder = emission.checked_sub(allocated).unwrap_or_else(|| {
        panic!("allocated {allocated} of an incentive emission of {emission}")
    });

    let mut owners: Vec<String> = weight_by_owner.keys().cloned().collect();
    owners.sort_by(|a, b| {
        emission_by_owner[a]
            .cmp(&emission_by_owner[b])
            .then_with(|| a.cmp(b))
    });
    for owner_id in owners {
        if remainder == 0 {
            break;
        }
        *emission_by_owner.get_mut(&owner_id).expect("owner was allocated above") += 1;
        remainder -= 1;
    }
    emission_by_owner
}

/// Pack per-owner emissions into earnings records, sorted by owner id.
pub fn emissions_to_earnings(
    program: &IncentiveProgram,
    date: &Date,
    emissions_by_owner: &BTreeMap<String, u64>,
    owners_by_id: &BTreeMap<String, MultisigScript>,
) -> Vec<Earning> {
    emissions_by_owner
        .iter()
        .map(|(owner_id, emission)| Earning {
            owner_id: owner_id.clone(),
            owner: owners_by_id
                .get(owner_id)
                .cloned()
                .unwrap_or_else(|| panic!("no owner script recorded for {owner_id}")),
            program_id: program.id.clone(),
            earned_date: date.clone(),
            expiration_date: None,
            value: Value::from_coin(program.emitted_asset.clone(), *emission),
            value_by_lp_token: BTreeMap::new(),
        })
        .collect()
}

/// Estimate the lovelace value of `amount` of `asset` priced through the
/// given reference pool.
pub fn estimate_lovelace_value(
    amount: u64,
    asset: &AssetId,
    reference_pool_ident: &str,
    lookup: &impl PoolLookup,
) -> Result<u64> {
    let pool = lookup.pool_by_ident(reference_pool_ident)?;
    lovelace_value_in_pool(&pool, amount, asset)
}

/// Price `amount` of `asset` in lovelace using `pool`'s reserves.
///
/// The pool's `asset_a` must be the native token; lovelace itself is worth
/// its face value, and the pool's other side is priced at
/// `floor(amount * asset_a_quantity / asset_b_quantity)`. Any other asset
/// is a reference-pool misconfiguration.
pub fn lovelace_value_in_pool(pool: &Pool, amount: u64, asset: &AssetId) -> Result<u64> {
    if !pool.asset_a.is_empty() && !pool.asset_a.is_ada() {
        return Err(HarvestError::ReferencePoolInvalid {
            pool_ident: pool.pool_ident.clone(),
            asset: asset.clone(),
            detail: "reference pool must be an ADA pool".into(),
        });
    }
    if asset.is_ada() {
        Ok(amount)
    } else if *asset == pool.asset_b {
        Ok(mul_div_floor(
            amount,
            pool.asset_a_quantity,
            pool.asset_b_quantity,
        ))
    } else {
        Err(HarvestError::ReferencePoolInvalid {
            pool_ident: pool.pool_ident.clone(),
            asset: asset.clone(),
            detail: format!("pool is for the wrong asset: {}", pool.asset_b),
        })
    }
}

/// Run the incentive pipeline over `[start_slot, end_slot]`, splitting
/// `emission` across owners by time-weighted stake.
#[instrument(
    name = "calculate_incentive_earnings",
    skip_all,
    fields(program_id = %program.id, emission, positions = positions.len())
)]
pub fn calculate_earnings(
    start_date: &Date,
    end_date: &Date,
    start_slot: u64,
    end_slot: u64,
    emission: u64,
    program: &IncentiveProgram,
    positions: &[Position],
    lookup: &impl PoolLookup,
) -> Result<IncentiveOutputs> {
    let (weight_by_owner, total) =
        calculate_delegation_weights(program, positions, start_slot, end_slot, lookup)?;
    let emissions_by_owner = split_emission_per_owner(emission, &weight_by_owner, total);
    let owners_by_id = positions_to_owners(positions);
    let earnings = emissions_to_earnings(program, end_date, &emissions_by_owner, &owners_by_id);

    let emitted_asset_lovelace_value = estimate_lovelace_value(
        emission,
        &program.emitted_asset,
        &program.emitted_reference_pool,
        lookup,
    )?;
    let staked_asset_lovelace_value = estimate_lovelace_value(
        total,
        &program.staked_asset,
        &program.staked_reference_pool,
        lookup,
    )?;

    debug!(
        delegators = weight_by_owner.len(),
        total_weight = total,
        "calculated incentive earnings"
    );
    Ok(IncentiveOutputs {
        start_date: start_date.clone(),
        end_date: end_date.clone(),
        total_emissions: emission,
        emitted_asset: program.emitted_asset.clone(),
        emitted_asset_lovelace_value,
        staked_asset_lovelace_value,
        total_delegators: weight_by_owner.len() as u64,
        delegator_weights: weight_by_owner,
        emissions_by_owner,
        earnings,
    })
}
