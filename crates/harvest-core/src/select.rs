//! Pool selection: the subset of qualified pools that receive emissions.

use crate::delegation::UNDELEGATED;
use crate::math::at_least_integer_percent;
use crate::{PoolLookup, Result};
use harvest_types::YieldProgram;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Select the pools receiving emissions from the windowed delegation map.
///
/// Candidates (every entry except the undelegated bucket) are ranked by
/// delegation descending. An exact tie prefers the pool with fewer total LP
/// tokens, under the hypothesis that less liquidity needs to attract more
/// liquidity providers, and falls back to the lexicographically smaller
/// ident. Nepotism pools are force-included first, carrying their weight;
/// the ranked walk then adds pools until either `max_pool_count` is reached
/// or the selected delegation covers `max_pool_integer_percent` of the
/// total — checked after inclusion, so the pool crossing the threshold is
/// the last one in.
pub fn select_pools_for_emission(
    program: &YieldProgram,
    delegations_by_pool: &BTreeMap<String, u64>,
    lookup: &impl PoolLookup,
) -> Result<BTreeMap<String, u64>> {
    let mut candidates: Vec<(String, u64)> = Vec::new();
    let mut total_delegation = 0u64;
    for (pool_ident, amount) in delegations_by_pool {
        if pool_ident == UNDELEGATED {
            continue;
        }
        total_delegation += amount;
        candidates.push((pool_ident.clone(), *amount));
    }

    // The comparator cannot return lookup failures, so they accumulate and
    // surface after the sort.
    let lookup_errors = RefCell::new(Vec::new());
    candidates.sort_by(|a, b| {
        if a.1 != b.1 {
            return b.1.cmp(&a.1);
        }
        let lp = |ident: &str| match lookup.pool_by_ident(ident) {
            Ok(pool) => Some(pool.total_lp_tokens),
            Err(err) => {
                lookup_errors.borrow_mut().push(err);
                None
            }
        };
        match (lp(&a.0), lp(&b.0)) {
            (Some(a_lp), Some(b_lp)) => a_lp.cmp(&b_lp).then_with(|| a.0.cmp(&b.0)),
            _ => Ordering::Equal,
        }
    });
    let mut errors = lookup_errors.into_inner();
    if !errors.is_empty() {
        warn!(
            failures = errors.len(),
            "pool lookups failed while ranking candidates"
        );
        return Err(errors.remove(0));
    }

    let mut selected: BTreeMap<String, u64> = BTreeMap::new();
    let mut selected_total = 0u64;

    for nepotism_pool in &program.nepotism_pools {
        for (pool_ident, amount) in &candidates {
            if pool_ident == nepotism_pool {
                selected.insert(pool_ident.clone(), *amount);
                selected_total += amount;
            }
        }
    }

    for (pool_ident, amount) in &candidates {
        if selected.contains_key(pool_ident) {
            continue;
        }
        selected.insert(pool_ident.clone(), *amount);
        selected_total += amount;
        if selected.len() == program.max_pool_count {
            break;
        }
        if at_least_integer_percent(
            selected_total,
            total_delegation,
            program.max_pool_integer_percent,
        ) {
            break;
        }
    }

    debug!(
        selected = selected.len(),
        candidates = candidates.len(),
        selected_total,
        total_delegation,
        "selected pools for emission"
    );
    Ok(selected)
}
