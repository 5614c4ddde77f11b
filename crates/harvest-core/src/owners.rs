//! Splitting per-asset emissions across LP-token owners.

use harvest_types::AssetId;
use std::collections::BTreeMap;

use crate::math::mul_div_floor;

/// Split each LP asset's emission among its owners in proportion to their
/// time-weighted LP holdings.
///
/// Owners are processed in ascending `owner_id` order so the residual
/// round-robin is deterministic. Per owner and asset the allocation is
/// `floor(emission * owner_lp_days / total_lp_days)`; zero allocations are
/// dropped. Each asset's rounding deficit is then handed out one unit at a
/// time, walking the owner list from the top: the unit is credited to the
/// owner's smallest-ident LP asset among those they already hold
/// allocations for and that have an emission. Owners with no such asset are
/// skipped.
///
/// Note: the outer residual loop is keyed by asset, but the unit goes to
/// the owner's minimum-ident asset — which may differ from the asset whose
/// deficit is being repaid. The totals per owner still reconcile, and the
/// behavior is deliberately kept for bit-exact compatibility with prior
/// calculations; emissions for an asset with no allocated owner are
/// silently forfeited.
pub fn distribute_emissions_to_owners(
    lp_days_by_owner: &BTreeMap<String, BTreeMap<AssetId, u64>>,
    emissions_by_asset: &BTreeMap<AssetId, u64>,
    lp_days_by_asset: &BTreeMap<AssetId, u64>,
) -> BTreeMap<String, BTreeMap<AssetId, u64>> {
    // BTreeMap iteration gives the canonical owner order for the
    // round-robin below.
    let owners: Vec<&String> = lp_days_by_owner.keys().collect();

    let mut emissions_by_owner: BTreeMap<String, BTreeMap<AssetId, u64>> = BTreeMap::new();
    let mut allocated_by_asset: BTreeMap<AssetId, u64> = BTreeMap::new();
    for (owner_id, holdings) in lp_days_by_owner {
        for (asset_id, lp_days) in holdings {
            let emission = emissions_by_asset.get(asset_id).copied().unwrap_or(0);
            let total_lp_days = lp_days_by_asset.get(asset_id).copied().unwrap_or(0);
            if total_lp_days == 0 {
                continue;
            }
            let allocation = mul_div_floor(emission, *lp_days, total_lp_days);
            if allocation == 0 {
                continue;
            }
            *emissions_by_owner
                .entry(owner_id.clone())
                .or_default()
                .entry(asset_id.clone())
                .or_default() += allocation;
            *allocated_by_asset.entry(asset_id.clone()).or_default() += allocation;
        }
    }

    for (asset_id, allocated) in &allocated_by_asset {
        let emission = emissions_by_asset.get(asset_id).copied().unwrap_or(0);
        let mut remainder = emission.checked_sub(*allocated).unwrap_or_else(|| {
            panic!(
                "allocated {allocated} of {asset_id} to owners but only \
                 {emission} was emitted"
            )
        });
        let mut index = 0usize;
        let mut skipped = 0usize;
        while remainder > 0 {
            let owner_id = owners[index % owners.len()];
            index += 1;
            // The smallest-ident qualified asset this owner holds
            // allocations for; owners with none are skipped entirely.
            let min_lp = emissions_by_owner.get(owner_id).and_then(|held| {
                held.keys()
                    .find(|asset| emissions_by_asset.contains_key(*asset))
                    .cloned()
            });
            let Some(min_lp) = min_lp else {
                skipped += 1;
                assert!(
                    skipped < owners.len(),
                    "no owner is qualified to absorb the residual {remainder} \
                     units of {asset_id}"
                );
                continue;
            };
            skipped = 0;
            *emissions_by_owner
                .get_mut(owner_id)
                .expect("owner with a qualified asset has an allocation map")
                .get_mut(&min_lp)
                .expect("qualified asset has an allocation entry") += 1;
            remainder -= 1;
        }
    }

    emissions_by_owner
}
