//! Asset identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for a fungible token.
///
/// Two identifiers are conventional: [`AssetId::ada`] names the native
/// lovelace in monetary values, and the empty string denotes the native
/// side of a pool's asset pair (see [`AssetId::is_empty`]). LP tokens are
/// recognized through the pool lookup capability, not by inspecting the
/// identifier.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    /// The conventional identifier for the native lovelace.
    pub const ADA_NAME: &'static str = "ada";

    pub fn new(id: impl Into<String>) -> Self {
        AssetId(id.into())
    }

    pub fn ada() -> Self {
        AssetId(Self::ADA_NAME.to_owned())
    }

    pub fn is_ada(&self) -> bool {
        self.0 == Self::ADA_NAME
    }

    /// The empty identifier, used by pools whose `asset_a` is the native
    /// token.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        AssetId(id.to_owned())
    }
}

impl From<String> for AssetId {
    fn from(id: String) -> Self {
        AssetId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ada_and_native_are_distinct_conventions() {
        assert!(AssetId::ada().is_ada());
        assert!(!AssetId::ada().is_empty());
        assert!(AssetId::default().is_empty());
        assert!(!AssetId::default().is_ada());
    }

    #[test]
    fn ordering_is_lexicographic() {
        assert!(AssetId::from("LP_X") < AssetId::from("LP_Y"));
        assert!(AssetId::default() < AssetId::from("a"));
    }
}
