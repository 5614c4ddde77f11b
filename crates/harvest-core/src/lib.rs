//! Deterministic daily emission calculation engine.
//!
//! The engine turns (positions, pools, program parameters, previous-day
//! outputs) into a fully reconciled emissions result where every diminutive
//! unit of the emitted asset is accounted for. Two entry points exist:
//!
//! - [`daily::calculate_earnings`] — the full yield pipeline: delegation
//!   aggregation, pool qualification, windowing, selection, pool and owner
//!   emission distribution, and earnings assembly.
//! - [`incentive::calculate_earnings`] — the incentive mode: a
//!   time-weighted per-owner split without the pool-selection layer.
//!
//! # Determinism
//!
//! For fixed inputs every entry point returns bit-identical outputs.
//! All integer division rounds down with `u128` intermediates (never
//! floating point), and every iteration whose order is observable —
//! residual round-robin, candidate ranking, owner ordering — happens over
//! explicitly sorted data.
//!
//! # Failure model
//!
//! Recoverable conditions (pool lookups, window sizing, reference-pool
//! validation) surface as [`HarvestError`]. Misconfiguration and arithmetic
//! invariant violations are bugs in the caller or the engine and panic with
//! a diagnostic rather than producing a partially wrong emissions result.

use harvest_types::{AssetId, Pool};
use thiserror::Error;

pub mod accrual;
pub mod daily;
pub mod delegation;
pub mod earnings;
pub mod emission;
pub mod incentive;
pub mod math;
pub mod owners;
pub mod qualify;
pub mod select;
pub mod snapshot;
pub mod window;

#[cfg(test)]
pub(crate) mod testutil;

pub use daily::{calculate_earnings, CalculationOutputs};
pub use incentive::IncentiveOutputs;

/// Unified error type for engine operations.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// A pool lookup returned not-found or failed outright. The pipeline
    /// aborts; `target` names the ident or LP-token asset that was asked
    /// for.
    #[error("pool lookup failed for {target}: {detail}")]
    PoolLookupFailed { target: String, detail: String },

    /// More previous-day outputs were supplied than the delegation window
    /// admits.
    #[error(
        "too many historical snapshots: {supplied} previous days exceeds \
         a consecutive delegation window of {window}"
    )]
    WindowTooLarge { supplied: usize, window: u32 },

    /// The reference pool cannot price the requested asset: its `asset_a`
    /// is not the native token, or the asset is not one of the pool's
    /// sides.
    #[error("reference pool {pool_ident} cannot price {asset}: {detail}")]
    ReferencePoolInvalid {
        pool_ident: String,
        asset: AssetId,
        detail: String,
    },

    /// Structural program validation failed.
    #[error("invalid program configuration: {0}")]
    InvalidProgram(#[from] harvest_types::ProgramError),
}

pub type Result<T> = std::result::Result<T, HarvestError>;

/// Read-only capability supplying pool records.
///
/// Implementations may perform I/O and their operations are allowed to
/// fail; failures propagate synchronously out of the pipeline. The engine
/// never mutates pools.
///
/// Postconditions:
/// - `pool_by_lp_token(t)` succeeds only when `is_lp_token(t)` is true.
/// - `lp_token_to_pool_ident(t)` agrees with `pool_by_lp_token(t)?.pool_ident`.
pub trait PoolLookup {
    fn pool_by_ident(&self, pool_ident: &str) -> Result<Pool>;
    fn pool_by_lp_token(&self, lp_token: &AssetId) -> Result<Pool>;
    fn is_lp_token(&self, asset_id: &AssetId) -> bool;
    fn lp_token_to_pool_ident(&self, lp_token: &AssetId) -> Result<String>;
}
