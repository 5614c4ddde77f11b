//! Program configuration records.
//!
//! A program is the complete configuration for one daily calculation. The
//! engine trusts these records; [`YieldProgram::validate`] offers a
//! fail-closed structural check callers can run when loading configuration,
//! before any calculation is attempted.

use crate::asset::AssetId;
use crate::{Date, DATE_FORMAT};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// An ordered pair of pool sides, used by the pair eligibility lists.
/// Matching is order-sensitive: `(asset_a, asset_b)` must equal the pool's
/// sides as given.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPair {
    pub asset_a: AssetId,
    pub asset_b: AssetId,
}

/// Structural configuration errors reported by [`YieldProgram::validate`].
#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("program id must not be empty")]
    MissingId,

    #[error("invalid {field} date {value:?}: expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },

    #[error("fixed emissions total {fixed_total} exceeds daily emission {daily_emission}")]
    FixedEmissionsExceedDaily {
        fixed_total: u64,
        daily_emission: u64,
    },

    #[error("{field} is {value} but integer percents must be in 0..=100")]
    PercentOutOfRange { field: &'static str, value: u32 },
}

/// Configuration for one daily yield calculation.
///
/// The four eligibility lists and four disqualification lists each have
/// three states: `None` (no constraint), `Some(vec![])` (never matches) and
/// `Some(non_empty)` (checked). This distinction is observable in pool
/// qualification, so they are optional collections rather than possibly
/// empty ones.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct YieldProgram {
    pub id: String,

    /// First and last calendar days (inclusive) on which rewards are
    /// emitted. An empty `last_daily_rewards` leaves the program open-ended.
    pub first_daily_rewards: Date,
    pub last_daily_rewards: Date,

    /// The quantity of `emitted_asset` distributed each day, in diminutive
    /// units.
    pub daily_emission: u64,
    pub emitted_asset: AssetId,
    /// The asset whose locked holdings drive delegation weight. Empty
    /// selects the degenerate mode where each eligible pool receives one
    /// unit of delegation.
    pub staked_asset: AssetId,
    /// Pool used to estimate the lovelace value of emissions; empty
    /// disables the estimate.
    pub reference_pool: String,

    /// Number of consecutive days (including the current one) summed into
    /// the delegation window.
    pub consecutive_delegation_window: u32,

    /// Per-pool overrides paid before (and excluded from) the proportional
    /// split.
    pub fixed_emissions: BTreeMap<String, u64>,

    /// Ceiling applied to each non-fixed pool's emission; 0 disables the
    /// cap. Units above the cap are forfeited, not redistributed.
    pub emission_cap: u64,

    pub eligible_versions: Option<Vec<String>>,
    pub eligible_pools: Option<Vec<String>>,
    pub eligible_assets: Option<Vec<AssetId>>,
    pub eligible_pairs: Option<Vec<AssetPair>>,

    pub disqualified_versions: Option<Vec<String>>,
    pub disqualified_pools: Option<Vec<String>>,
    pub disqualified_assets: Option<Vec<AssetId>>,
    pub disqualified_pairs: Option<Vec<AssetPair>>,

    /// Pools unconditionally selected for emissions regardless of ranking.
    pub nepotism_pools: Vec<String>,

    /// Redirects incoming delegations: delegation to a key counts as
    /// delegation to its value.
    pub delegation_remap: BTreeMap<String, String>,

    /// Minimum integer percent of a pool's LP tokens that must be locked
    /// for the pool to qualify.
    pub min_lp_integer_percent: u32,
    /// Stop selecting pools once this many are selected; 0 disables the
    /// count limit.
    pub max_pool_count: usize,
    /// Stop selecting pools once the selected delegation reaches this
    /// integer percent of the total.
    pub max_pool_integer_percent: u32,

    /// How long earnings remain claimable; `None` means they never expire.
    pub earning_expiration: Option<Duration>,
}

impl YieldProgram {
    /// Resolve a delegated pool ident through the remap table.
    pub fn remapped<'a>(&'a self, pool_ident: &'a str) -> &'a str {
        self.delegation_remap
            .get(pool_ident)
            .map(String::as_str)
            .unwrap_or(pool_ident)
    }

    /// Fail-closed structural validation of the configuration.
    pub fn validate(&self) -> Result<(), ProgramError> {
        if self.id.is_empty() {
            return Err(ProgramError::MissingId);
        }
        parse_date("first_daily_rewards", &self.first_daily_rewards)?;
        if !self.last_daily_rewards.is_empty() {
            parse_date("last_daily_rewards", &self.last_daily_rewards)?;
        }
        let fixed_total = self
            .fixed_emissions
            .values()
            .try_fold(0u64, |total, amount| total.checked_add(*amount))
            .unwrap_or(u64::MAX);
        if fixed_total > self.daily_emission {
            return Err(ProgramError::FixedEmissionsExceedDaily {
                fixed_total,
                daily_emission: self.daily_emission,
            });
        }
        for (field, value) in [
            ("min_lp_integer_percent", self.min_lp_integer_percent),
            ("max_pool_integer_percent", self.max_pool_integer_percent),
        ] {
            if value > 100 {
                return Err(ProgramError::PercentOutOfRange { field, value });
            }
        }
        Ok(())
    }
}

/// Configuration for the incentive mode: a time-weighted per-owner split of
/// a single emission, without the pool-selection layer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IncentiveProgram {
    pub id: String,
    pub first_daily_rewards: Date,
    pub last_daily_rewards: Date,
    pub staked_asset: AssetId,
    pub emitted_asset: AssetId,
    /// Reference pools used to estimate lovelace values of the staked and
    /// emitted assets.
    pub staked_reference_pool: String,
    pub emitted_reference_pool: String,
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ProgramError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| ProgramError::InvalidDate {
        field,
        value: value.to_owned(),
    })
}
