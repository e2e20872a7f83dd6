use std::fmt;

use serde::{Deserialize, Serialize};

/// Key of a person in the reference store.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct IdentityId(pub u64);

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One reference-store hit for a face. Smaller distance = more similar.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IdentityCandidate {
    pub identity_id: IdentityId,
    pub distance: f64,
}

impl IdentityCandidate {
    pub fn new(identity_id: IdentityId, distance: f64) -> Self {
        Self {
            identity_id,
            distance,
        }
    }
}
