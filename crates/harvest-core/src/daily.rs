//! The daily yield pipeline.
//!
//! `calculate_earnings` wires the stage functions together:
//! delegation aggregation and the LP snapshot feed pool qualification, the
//! qualifying delegations are summed over the sliding window, pools are
//! selected and the daily emission is split across them (fixed overrides,
//! proportional split, residuals, cap), the capped per-pool emissions are
//! re-keyed by LP token and split across owners by time-weighted holdings,
//! and the result is packed into earnings.

use crate::accrual::{regroup_by_asset, total_lp_days_by_owner_and_asset};
use crate::delegation::{calculate_total_delegations, UNDELEGATED};
use crate::earnings::emissions_by_owner_to_earnings;
use crate::emission::{distribute_emissions_to_pools, truncate_emissions};
use crate::incentive::lovelace_value_in_pool;
use crate::owners::distribute_emissions_to_owners;
use crate::qualify::disqualify_pools;
use crate::select::select_pools_for_emission;
use crate::snapshot::calculate_total_lp_at_snapshot;
use crate::window::sum_delegation_window;
use crate::{PoolLookup, Result};
use harvest_types::{Date, Earning, MultisigScript, Position, YieldProgram};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Every intermediate and final result of one daily calculation.
///
/// All fields are populated; where a stage did not apply (out-of-range
/// date, no qualified pools) the corresponding fields are empty. Callers
/// feed a subset of these outputs (`qualifying_delegation_by_pool`) back in
/// as the previous days of the delegation window.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculationOutputs {
    pub total_delegations: u64,
    pub delegation_by_pool: BTreeMap<String, u64>,

    pub qualifying_delegation_by_pool: BTreeMap<String, u64>,
    pub pool_disqualification_reasons: BTreeMap<String, String>,

    pub num_delegation_days: u32,
    pub delegation_over_window_by_pool: BTreeMap<String, u64>,

    pub pools_eligible_for_emissions: BTreeMap<String, u64>,

    pub locked_lp_by_pool: BTreeMap<String, u64>,
    pub total_lp_by_pool: BTreeMap<String, u64>,

    pub estimated_locked_lovelace: u64,
    pub estimated_locked_lovelace_by_pool: BTreeMap<String, u64>,

    pub total_emissions: u64,
    pub untruncated_emissions_by_pool: BTreeMap<String, u64>,
    pub emissions_by_pool: BTreeMap<String, u64>,

    pub emissions_by_owner: BTreeMap<String, u64>,

    pub estimated_emissions_lovelace_value: u64,
    pub estimated_emissions_lovelace_by_pool: BTreeMap<String, u64>,

    pub earnings: Vec<Earning>,
}

/// Run the full yield pipeline for one day.
///
/// `date` must fall within the program's reward period (inclusive), else
/// empty outputs are returned. `previous_results` supplies the preceding
/// days of the delegation window; `start_slot..=end_slot` is the day's slot
/// range, with `end_slot` the snapshot slot.
#[instrument(
    name = "calculate_earnings",
    skip_all,
    fields(program_id = %program.id, date = %date, positions = positions.len())
)]
pub fn calculate_earnings(
    date: &Date,
    start_slot: u64,
    end_slot: u64,
    program: &YieldProgram,
    previous_results: &[CalculationOutputs],
    positions: &[Position],
    lookup: &impl PoolLookup,
) -> Result<CalculationOutputs> {
    // Reward period bounds are inclusive; an empty last day leaves the
    // program open-ended. Dates compare lexicographically.
    if *date < program.first_daily_rewards {
        return Ok(CalculationOutputs::default());
    }
    if !program.last_daily_rewards.is_empty() && *date > program.last_daily_rewards {
        return Ok(CalculationOutputs::default());
    }

    let (delegation_by_pool, total_delegations) =
        calculate_total_delegations(program, positions, lookup)?;

    let snapshot = calculate_total_lp_at_snapshot(end_slot, positions, lookup)?;

    let (qualifying_delegation_by_pool, pool_disqualification_reasons) = disqualify_pools(
        program,
        &snapshot.locked_lp_by_pool,
        &delegation_by_pool,
        lookup,
    )?;

    let delegation_over_window_by_pool =
        sum_delegation_window(program, &qualifying_delegation_by_pool, previous_results)?;

    // No qualified pool anywhere in the window: report the delegation and
    // snapshot state, emit nothing, and let the unemitted tokens revert to
    // the treasury.
    let only_undelegated = delegation_over_window_by_pool.len() == 1
        && delegation_over_window_by_pool.contains_key(UNDELEGATED);
    if delegation_over_window_by_pool.is_empty() || only_undelegated {
        debug!("no qualified pools in the delegation window");
        return Ok(CalculationOutputs {
            total_delegations,
            delegation_by_pool,
            qualifying_delegation_by_pool,
            pool_disqualification_reasons,
            num_delegation_days: program.consecutive_delegation_window,
            delegation_over_window_by_pool,
            locked_lp_by_pool: snapshot.locked_lp_by_pool,
            total_lp_by_pool: snapshot.total_lp_by_pool,
            estimated_locked_lovelace: snapshot.total_estimated_value,
            estimated_locked_lovelace_by_pool: snapshot.estimated_value_by_pool,
            ..CalculationOutputs::default()
        });
    }

    let pools_eligible_for_emissions =
        select_pools_for_emission(program, &delegation_over_window_by_pool, lookup)?;

    let untruncated_emissions_by_pool =
        distribute_emissions_to_pools(program, &pools_eligible_for_emissions);
    let emissions_by_pool = truncate_emissions(program, &untruncated_emissions_by_pool);
    let emissions_by_asset = regroup_by_asset(&emissions_by_pool, lookup)?;

    let (lp_days_by_owner, lp_days_by_asset) =
        total_lp_days_by_owner_and_asset(positions, lookup, start_slot, end_slot);

    let emissions_by_owner_and_asset =
        distribute_emissions_to_owners(&lp_days_by_owner, &emissions_by_asset, &lp_days_by_asset);

    let mut owners_by_id: BTreeMap<String, MultisigScript> = BTreeMap::new();
    for position in positions {
        owners_by_id.insert(position.owner_id.clone(), position.owner.clone());
    }

    // Estimate the lovelace value of what was emitted, per pool, using the
    // program's reference pool for pricing.
    let mut estimated_emissions_lovelace_value = 0u64;
    let mut estimated_emissions_lovelace_by_pool: BTreeMap<String, u64> = BTreeMap::new();
    if !program.reference_pool.is_empty() {
        let reference_pool = lookup.pool_by_ident(&program.reference_pool)?;
        for (pool_ident, amount) in &emissions_by_pool {
            let lovelace =
                lovelace_value_in_pool(&reference_pool, *amount, &program.emitted_asset)?;
            estimated_emissions_lovelace_value += lovelace;
            *estimated_emissions_lovelace_by_pool
                .entry(pool_ident.clone())
                .or_default() += lovelace;
        }
    }

    let (earnings, emissions_by_owner) = emissions_by_owner_to_earnings(
        date,
        program,
        &emissions_by_owner_and_asset,
        &owners_by_id,
    );

    let total_emissions = emissions_by_owner_and_asset
        .values()
        .flat_map(|held| held.values())
        .sum();

    debug!(
        total_emissions,
        earnings = earnings.len(),
        pools = emissions_by_pool.len(),
        "calculated daily earnings"
    );
    Ok(CalculationOutputs {
        total_delegations,
        delegation_by_pool,
        qualifying_delegation_by_pool,
        pool_disqualification_reasons,
        num_delegation_days: program.consecutive_delegation_window,
        delegation_over_window_by_pool,
        pools_eligible_for_emissions,
        locked_lp_by_pool: snapshot.locked_lp_by_pool,
        total_lp_by_pool: snapshot.total_lp_by_pool,
        estimated_locked_lovelace: snapshot.total_estimated_value,
        estimated_locked_lovelace_by_pool: snapshot.estimated_value_by_pool,
        total_emissions,
        untruncated_emissions_by_pool,
        emissions_by_pool,
        emissions_by_owner,
        estimated_emissions_lovelace_value,
        estimated_emissions_lovelace_by_pool,
        earnings,
    })
}
