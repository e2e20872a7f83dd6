use std::collections::BTreeMap;

use serde::Serialize;

use crate::matching::domain::identity::{IdentityCandidate, IdentityId};

/// Every distance observed per identity across one batch.
///
/// Ordered by identity id so any scan over it is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Scoreboard {
    distances: BTreeMap<IdentityId, Vec<f64>>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the candidate's distance to its identity's list.
    ///
    /// Negative and non-finite distances are refused; returns whether the
    /// sample was kept.
    pub fn record(&mut self, candidate: &IdentityCandidate) -> bool {
        if !candidate.distance.is_finite() || candidate.distance < 0.0 {
            return false;
        }
        self.distances
            .entry(candidate.identity_id)
            .or_default()
            .push(candidate.distance);
        true
    }

    pub fn distances(&self, id: IdentityId) -> Option<&[f64]> {
        self.distances.get(&id).map(|v| v.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (IdentityId, &[f64])> {
        self.distances.iter().map(|(id, d)| (*id, d.as_slice()))
    }

    pub fn identity_count(&self) -> usize {
        self.distances.len()
    }

    pub fn sample_count(&self) -> usize {
        self.distances.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }
}
