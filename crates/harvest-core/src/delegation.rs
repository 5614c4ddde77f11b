//! Delegation aggregation: positions into per-pool weighted totals.

use crate::math::mul_div_floor;
use crate::{PoolLookup, Result};
use harvest_types::{Position, YieldProgram};
use std::collections::BTreeMap;
use tracing::debug;

/// The bucket collecting staked value that is not delegated to any pool.
pub const UNDELEGATED: &str = "";

/// Compute the total amount of the staked asset delegated to each pool,
/// according to each position's declared weighting.
///
/// Each position's staked amount is its direct holdings of the program's
/// staked asset plus the staked-asset share of any LP tokens it holds
/// (priced by the pool reserves at the snapshot). The amount is divided
/// among the position's matching delegations in proportion to their
/// weights, rounding down, and leftover units are distributed one at a time
/// round-robin over the delegation list so the division is exact.
///
/// Postcondition: the per-position allocations (including the
/// [`UNDELEGATED`] bucket, after remapping) sum to the position's staked
/// amount.
pub fn calculate_total_delegations(
    program: &YieldProgram,
    positions: &[Position],
    lookup: &impl PoolLookup,
) -> Result<(BTreeMap<String, u64>, u64)> {
    let mut by_pool: BTreeMap<String, u64> = BTreeMap::new();

    // Degenerate mode: without a staked asset every eligible pool gets one
    // unit of delegation.
    if program.staked_asset.is_empty() {
        let eligible = program.eligible_pools.as_deref().unwrap_or(&[]);
        for pool_ident in eligible {
            by_pool.insert(pool_ident.clone(), 1);
        }
        return Ok((by_pool, eligible.len() as u64));
    }

    for position in positions {
        let staked = staked_amount(program, position, lookup)?;

        let total_weight: u64 = position
            .delegation
            .iter()
            .filter(|d| d.program_id == program.id)
            .map(|d| u64::from(d.weight))
            .sum();

        // A position without matching delegations excludes its stake from
        // every pool.
        if total_weight == 0 {
            *by_pool.entry(UNDELEGATED.to_owned()).or_default() += staked;
            continue;
        }

        let mut delegated = 0u64;
        for entry in &position.delegation {
            if entry.program_id != program.id {
                continue;
            }
            let allocation = mul_div_floor(staked, u64::from(entry.weight), total_weight);
            delegated += allocation;
            *by_pool
                .entry(program.remapped(&entry.pool_ident).to_owned())
                .or_default() += allocation;
        }

        // Guaranteed small by the floor-sum bound; negative means the
        // arithmetic above is broken.
        let mut remainder = staked.checked_sub(delegated).unwrap_or_else(|| {
            panic!(
                "allocated more stake ({delegated}) to pools than held by \
                 position of {} ({staked})",
                position.owner_id
            )
        });
        let mut index = 0usize;
        while remainder > 0 {
            let entry = &position.delegation[index % position.delegation.len()];
            index += 1;
            if entry.program_id != program.id {
                continue;
            }
            *by_pool
                .entry(program.remapped(&entry.pool_ident).to_owned())
                .or_default() += 1;
            delegated += 1;
            remainder -= 1;
        }
        assert!(
            delegated == staked,
            "round-robin delegation distribution left {delegated} of {staked} allocated"
        );
    }

    let total = by_pool.values().copied().sum();
    debug!(pools = by_pool.len(), total, "aggregated delegations");
    Ok((by_pool, total))
}

/// A position's staked-asset amount: direct holdings plus the staked-asset
/// share of each LP token held, `floor(lp_qty * reserve / total_lp)`.
/// Deleted pools (zero LP tokens) are skipped.
fn staked_amount(
    program: &YieldProgram,
    position: &Position,
    lookup: &impl PoolLookup,
) -> Result<u64> {
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
    Ok(staked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{delegate, sample_position, sample_yield_program, MockLookup};
    use harvest_types::{Delegation, Pool};
    use proptest::prelude::*;

    #[test]
    fn single_delegation_takes_the_full_stake() {
        let program = sample_yield_program(500_000_000_000);
        let positions = vec![sample_position("Me", 100_000, [delegate("01", 1)])];
        let (by_pool, total) =
            calculate_total_delegations(&program, &positions, &MockLookup::default()).unwrap();
        assert_eq!(by_pool["01"], 100_000);
        assert_eq!(total, 100_000);
    }

    #[test]
    fn undelegated_stake_lands_in_the_empty_bucket() {
        let program = sample_yield_program(500_000_000_000);
        let positions = vec![sample_position("Me", 100_000, [])];
        let (by_pool, total) =
            calculate_total_delegations(&program, &positions, &MockLookup::default()).unwrap();
        assert_eq!(by_pool[UNDELEGATED], 100_000);
        assert_eq!(total, 100_000);
    }

    #[test]
    fn equal_weights_split_evenly() {
        let program = sample_yield_program(500_000_000_000);
        let positions = vec![sample_position(
            "Me",
            100_000,
            [delegate("01", 1), delegate("02", 1)],
        )];
        let (by_pool, total) =
            calculate_total_delegations(&program, &positions, &MockLookup::default()).unwrap();
        assert_eq!(by_pool["01"], 50_000);
        assert_eq!(by_pool["02"], 50_000);
        assert_eq!(total, 100_000);
    }

    #[test]
    fn floor_division_residual_goes_to_the_first_entry() {
        let program = sample_yield_program(500_000_000_000);
        let positions = vec![sample_position(
            "Me",
            100_000,
            [delegate("01", 1), delegate("02", 2)],
        )];
        let (by_pool, total) =
            calculate_total_delegations(&program, &positions, &MockLookup::default()).unwrap();
        // Floor gives 33_333/66_666; the leftover unit lands on "01".
        assert_eq!(by_pool["01"], 33_334);
        assert_eq!(by_pool["02"], 66_666);
        assert_eq!(total, 100_000);
    }

    #[test]
    fn multiple_positions_accumulate() {
        let program = sample_yield_program(500_000_000_000);
        let positions = vec![
            sample_position("Me", 100_000, [delegate("01", 1), delegate("02", 1)]),
            sample_position("Me", 200_000, [delegate("02", 1), delegate("03", 1)]),
        ];
        let (by_pool, total) =
            calculate_total_delegations(&program, &positions, &MockLookup::default()).unwrap();
        assert_eq!(by_pool["01"], 50_000);
        assert_eq!(by_pool["02"], 150_000);
        assert_eq!(by_pool["03"], 100_000);
        assert_eq!(total, 300_000);
    }

    #[test]
    fn lp_tokens_price_into_the_staked_amount() {
        let program = sample_yield_program(500_000_000_000);
        let lookup = MockLookup::with_pools([Pool {
            pool_ident: "01".into(),
            total_lp_tokens: 100_000,
            lp_asset: "LP_01".into(),
            asset_a: "".into(),
            asset_b: "Staked".into(),
            asset_a_quantity: 200_000,
            asset_b_quantity: 100_000,
            ..Pool::default()
        }]);
        let mut position = sample_position("Me", 100_000, [delegate("01", 1), delegate("02", 1)]);
        position.value.add("LP_01", 50_000);
        let (by_pool, total) =
            calculate_total_delegations(&program, &[position], &lookup).unwrap();
        // Effective stake: 100_000 + floor(50_000 * 100_000 / 100_000).
        assert_eq!(by_pool["01"], 75_000);
        assert_eq!(by_pool["02"], 75_000);
        assert_eq!(total, 150_000);
    }

    #[test]
    fn deleted_pools_are_skipped_in_lp_pricing() {
        let program = sample_yield_program(500_000_000_000);
        let lookup = MockLookup::with_pools([Pool {
            pool_ident: "01".into(),
            total_lp_tokens: 0,
            lp_asset: "LP_01".into(),
            asset_b: "Staked".into(),
            ..Pool::default()
        }]);
        let mut position = sample_position("Me", 100_000, [delegate("01", 1)]);
        position.value.add("LP_01", 50_000);
        let (by_pool, total) =
            calculate_total_delegations(&program, &[position], &lookup).unwrap();
        assert_eq!(by_pool["01"], 100_000);
        assert_eq!(total, 100_000);
    }

    #[test]
    fn other_programs_delegations_are_ignored() {
        let program = sample_yield_program(500_000_000_000);
        let positions = vec![
            sample_position(
                "Me",
                100_000,
                [
                    delegate("01", 1),
                    Delegation::new("OTHER_PROGRAM", "99", 100),
                    delegate("02", 1),
                ],
            ),
            sample_position("Me", 200_000, [delegate("02", 1), delegate("03", 1)]),
        ];
        let (by_pool, total) =
            calculate_total_delegations(&program, &positions, &MockLookup::default()).unwrap();
        assert_eq!(by_pool["01"], 50_000);
        assert_eq!(by_pool["02"], 150_000);
        assert_eq!(by_pool["03"], 100_000);
        assert!(!by_pool.contains_key("99"));
        assert_eq!(total, 300_000);
    }

    #[test]
    fn remapped_pools_collect_redirected_delegation() {
        let mut program = sample_yield_program(500_000_000_000);
        program.delegation_remap.insert("01".into(), "01V3".into());
        program.delegation_remap.insert("02".into(), "02V3".into());
        let positions = vec![
            sample_position("Me", 123_000, [delegate("01", 1)]),
            sample_position("Me", 456_000, [delegate("02", 1)]),
            sample_position("Me", 222_000, [delegate("03", 1)]),
            sample_position("Me", 100_000, [delegate("02", 1), delegate("03", 1)]),
            sample_position("Me", 200_000, [delegate("01V3", 1)]),
        ];
        let (by_pool, total) =
            calculate_total_delegations(&program, &positions, &MockLookup::default()).unwrap();
        assert_eq!(by_pool["01V3"], 123_000 + 200_000);
        assert_eq!(by_pool["02V3"], 456_000 + 50_000);
        assert_eq!(by_pool["03"], 222_000 + 50_000);
        assert_eq!(by_pool.get("03V3").copied().unwrap_or(0), 0);
        assert_eq!(total, 123_000 + 456_000 + 222_000 + 100_000 + 200_000);
    }

    #[test]
    fn empty_staked_asset_gives_each_eligible_pool_one_unit() {
        let mut program = sample_yield_program(500_000_000_000);
        program.staked_asset = "".into();
        program.eligible_pools = Some(vec!["01".into(), "02".into(), "03".into()]);
        let positions = vec![sample_position("Me", 100_000, [delegate("01", 5)])];
        let (by_pool, total) =
            calculate_total_delegations(&program, &positions, &MockLookup::default()).unwrap();
        assert_eq!(by_pool["01"], 1);
        assert_eq!(by_pool["02"], 1);
        assert_eq!(by_pool["03"], 1);
        assert_eq!(total, 3);
    }

    proptest! {
        /// Delegation conservation: allocations across pools (plus the
        /// undelegated bucket) always sum to the staked amount.
        #[test]
        fn allocations_conserve_the_staked_amount(
            staked in 0u64..=u64::from(u32::MAX),
            weights in proptest::collection::vec((0usize..10, 0u32..=u32::MAX), 0..30),
        ) {
            let program = sample_yield_program(500_000_000_000);
            let delegations: Vec<Delegation> = weights
                .iter()
                .map(|(pool, weight)| delegate(&pool.to_string(), *weight))
                .collect();
            let positions = vec![sample_position("Me", staked, delegations)];
            let (by_pool, total) =
                calculate_total_delegations(&program, &positions, &MockLookup::default())
                    .unwrap();
            let sum: u64 = by_pool.values().copied().sum();
            prop_assert_eq!(sum, staked);
            prop_assert_eq!(total, staked);
        }
    }
}
