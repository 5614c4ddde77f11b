//! The sliding multi-day delegation window.

use crate::daily::CalculationOutputs;
use crate::{HarvestError, Result};
use harvest_types::YieldProgram;
use std::collections::BTreeMap;

/// Sum qualifying delegations over the current day and the supplied
/// previous days, giving each pool some sticking power against
/// instantaneous delegation changes.
///
/// An N-day window is today plus at most N-1 previous days; when a program
/// is just starting fewer days are fine. Supplying more fails with
/// [`HarvestError::WindowTooLarge`]. The previous outputs are assumed to be
/// consecutive days — the operation is commutative, so their order is not
/// inspected. The undelegated bucket, if present, is carried through the
/// sum (selection excludes it downstream).
pub fn sum_delegation_window(
    program: &YieldProgram,
    qualifying_by_pool: &BTreeMap<String, u64>,
    previous: &[CalculationOutputs],
) -> Result<BTreeMap<String, u64>> {
    if previous.len() as i64 > i64::from(program.consecutive_delegation_window) - 1 {
        return Err(HarvestError::WindowTooLarge {
            supplied: previous.len(),
            window: program.consecutive_delegation_window,
        });
    }

    let mut windowed: BTreeMap<String, u64> = BTreeMap::new();
    for snapshot in previous {
        for (pool_ident, amount) in &snapshot.qualifying_delegation_by_pool {
            *windowed.entry(pool_ident.clone()).or_default() += amount;
        }
    }
    for (pool_ident, amount) in qualifying_by_pool {
        *windowed.entry(pool_ident.clone()).or_default() += amount;
    }
    Ok(windowed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::sample_yield_program;

    fn previous_day(entries: &[(&str, u64)]) -> CalculationOutputs {
        CalculationOutputs {
            qualifying_delegation_by_pool: entries
                .iter()
                .map(|(pool, amount)| ((*pool).to_owned(), *amount))
                .collect(),
            ..CalculationOutputs::default()
        }
    }

    #[test]
    fn current_and_previous_days_sum_per_pool() {
        let mut program = sample_yield_program(500_000_000_000);
        program.consecutive_delegation_window = 1;
        let qualifying = BTreeMap::from([("A".to_owned(), 100), ("B".to_owned(), 200)]);
        let previous = vec![previous_day(&[("B", 300), ("C", 400)])];
        let windowed = sum_delegation_window(&program, &qualifying, &previous).unwrap();
        assert_eq!(windowed.len(), 3);
        assert_eq!(windowed["A"], 100);
        assert_eq!(windowed["B"], 500);
        assert_eq!(windowed["C"], 400);
    }

    #[test]
    fn too_many_previous_days_is_an_error() {
        let mut program = sample_yield_program(500_000_000_000);
        program.consecutive_delegation_window = 2;
        let previous = vec![previous_day(&[("A", 1)]), previous_day(&[("A", 2)])];
        let result = sum_delegation_window(&program, &BTreeMap::new(), &previous);
        assert!(matches!(
            result,
            Err(HarvestError::WindowTooLarge { supplied: 2, window: 2 })
        ));
    }

    #[test]
    fn zero_window_rejects_even_an_empty_history() {
        let mut program = sample_yield_program(500_000_000_000);
        program.consecutive_delegation_window = 0;
        let result = sum_delegation_window(&program, &BTreeMap::new(), &[]);
        assert!(matches!(result, Err(HarvestError::WindowTooLarge { .. })));
    }

    #[test]
    fn summation_is_commutative_across_previous_days() {
        let mut program = sample_yield_program(500_000_000_000);
        program.consecutive_delegation_window = 3;
        let qualifying = BTreeMap::from([("A".to_owned(), 7u64)]);
        let day1 = previous_day(&[("A", 10), ("B", 20)]);
        let day2 = previous_day(&[("B", 30), ("C", 40)]);
        let forward =
            sum_delegation_window(&program, &qualifying, &[day1.clone(), day2.clone()]).unwrap();
        let backward = sum_delegation_window(&program, &qualifying, &[day2, day1]).unwrap();
        assert_eq!(forward, backward);
    }
}
