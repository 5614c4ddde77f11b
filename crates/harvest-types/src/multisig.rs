//! Owner scripts.
//!
//! A position's owner is described by a small script language (single
//! signature, conjunction, disjunction, threshold, and time bounds). The
//! engine treats these as opaque data, carrying them from positions into
//! earnings; decoding from and encoding to the on-chain representation is
//! an external collaborator's concern.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MultisigScript {
    /// Satisfied by a signature from the named key hash.
    Signature { key_hash: Vec<u8> },
    /// Satisfied when every sub-script is satisfied.
    AllOf { scripts: Vec<MultisigScript> },
    /// Satisfied when any sub-script is satisfied.
    AnyOf { scripts: Vec<MultisigScript> },
    /// Satisfied when at least `required` sub-scripts are satisfied.
    AtLeast {
        required: u32,
        scripts: Vec<MultisigScript>,
    },
    /// Satisfied strictly before the given time.
    Before { time: NaiveDateTime },
    /// Satisfied at or after the given time.
    After { time: NaiveDateTime },
}

impl MultisigScript {
    /// Shorthand for the common single-signature case.
    pub fn signature(key_hash: impl Into<Vec<u8>>) -> Self {
        MultisigScript::Signature {
            key_hash: key_hash.into(),
        }
    }
}
