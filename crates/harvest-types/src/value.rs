//! Monetary values: multi-asset token bags.

use crate::asset::AssetId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A mapping from asset identifier to a non-negative quantity.
///
/// Backed by a `BTreeMap` so iteration (and serialization) is
/// deterministic. A zero quantity is equivalent to the asset being absent;
/// [`Value::amount_of`] returns 0 for absent assets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Value(BTreeMap<AssetId, u64>);

impl Value {
    pub fn new() -> Self {
        Value(BTreeMap::new())
    }

    /// A value holding a single asset.
    pub fn from_coin(asset: impl Into<AssetId>, amount: u64) -> Self {
        let mut value = Value::new();
        value.add(asset, amount);
        value
    }

    /// The quantity of `asset` held, 0 if absent.
    pub fn amount_of(&self, asset: &AssetId) -> u64 {
        self.0.get(asset).copied().unwrap_or(0)
    }

    /// Add `amount` of `asset`, merging with any existing quantity.
    pub fn add(&mut self, asset: impl Into<AssetId>, amount: u64) {
        *self.0.entry(asset.into()).or_insert(0) += amount;
    }

    /// Iterate over `(asset, quantity)` pairs in asset order.
    pub fn iter(&self) -> impl Iterator<Item = (&AssetId, u64)> {
        self.0.iter().map(|(asset, amount)| (asset, *amount))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(AssetId, u64)> for Value {
    fn from_iter<I: IntoIterator<Item = (AssetId, u64)>>(iter: I) -> Self {
        let mut value = Value::new();
        for (asset, amount) in iter {
            value.add(asset, amount);
        }
        value
    }
}
