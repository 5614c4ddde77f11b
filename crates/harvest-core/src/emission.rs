//! Splitting the daily emission across selected pools.

use crate::math::mul_div_floor;
use harvest_types::YieldProgram;
use std::collections::BTreeMap;
use tracing::debug;

/// Split the program's daily emission among the selected pools.
///
/// Fixed-emission pools are paid their override first and are excluded from
/// the proportional split. The remaining (dynamic) emission is divided
/// among the other selected pools in proportion to their delegation weight,
/// rounding down, and the residual units are distributed one per pool
/// round-robin over the pools ordered by weight descending (ident ascending
/// on ties) until the daily emission is fully accounted for.
///
/// Panics if the program's fixed emissions exceed the daily emission or if
/// the distribution ever over-allocates; both are misconfigurations or
/// arithmetic bugs that must not produce a payout.
pub fn distribute_emissions_to_pools(
    program: &YieldProgram,
    selected_pools: &BTreeMap<String, u64>,
) -> BTreeMap<String, u64> {
    let mut emissions: BTreeMap<String, u64> = BTreeMap::new();
    let mut allocated = 0u64;

    for (pool_ident, amount) in &program.fixed_emissions {
        assert!(
            *amount <= program.daily_emission,
            "program {} is misconfigured: fixed emission of {amount} to pool \
             {pool_ident} exceeds the daily emission of {}",
            program.id,
            program.daily_emission
        );
        emissions.insert(pool_ident.clone(), *amount);
        allocated = allocated.checked_add(*amount).unwrap_or_else(|| {
            panic!("program {} fixed emissions overflow u64", program.id)
        });
    }

    let mut pool_weights: Vec<(String, u64)> = Vec::new();
    let mut total_weight = 0u64;
    for (pool_ident, weight) in selected_pools {
        if program.fixed_emissions.contains_key(pool_ident) {
            continue;
        }
        total_weight += weight;
        pool_weights.push((pool_ident.clone(), *weight));
    }

    // Nothing left to weight the dynamic split by.
    if total_weight == 0 {
        return emissions;
    }

    let dynamic = program.daily_emission.checked_sub(allocated).unwrap_or_else(|| {
        panic!(
            "program {} is misconfigured: fixed emissions total {allocated} \
             exceeds the daily emission of {}",
            program.id, program.daily_emission
        )
    });
    for (pool_ident, weight) in &pool_weights {
        let allocation = mul_div_floor(dynamic, *weight, total_weight);
        allocated += allocation;
        assert!(
            allocated <= program.daily_emission,
            "would allocate {allocated} of a daily emission of {}",
            program.daily_emission
        );
        *emissions.entry(pool_ident.clone()).or_default() += allocation;
    }

    if allocated != program.daily_emission {
        pool_weights.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let remainder = program.daily_emission - allocated;
        for step in 0..remainder {
            let (pool_ident, _) = &pool_weights[(step % pool_weights.len() as u64) as usize];
            *emissions.get_mut(pool_ident).unwrap_or_else(|| {
                panic!("residual round-robin hit unallocated pool {pool_ident}")
            }) += 1;
            allocated += 1;
        }
        assert!(
            allocated == program.daily_emission,
            "round-robin emission distribution left {allocated} of {} allocated",
            program.daily_emission
        );
    }

    debug!(
        pools = emissions.len(),
        allocated, "distributed daily emission to pools"
    );
    emissions
}

/// Truncate each non-fixed pool's emission to the program's cap.
///
/// Fixed-emission pools bypass the cap; units above the cap are forfeited,
/// not redistributed. A cap of 0 disables truncation. Applying the cap
/// twice equals applying it once.
pub fn truncate_emissions(
    program: &YieldProgram,
    emissions_by_pool: &BTreeMap<String, u64>,
) -> BTreeMap<String, u64> {
    if program.emission_cap == 0 {
        return emissions_by_pool.clone();
    }
    emissions_by_pool
        .iter()
        .map(|(pool_ident, amount)| {
            let capped = if program.fixed_emissions.contains_key(pool_ident) {
                *amount
            } else {
                (*amount).min(program.emission_cap)
            };
            (pool_ident.clone(), capped)
        })
        .collect()
}
