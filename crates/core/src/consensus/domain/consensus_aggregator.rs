//! Fuses per-face match candidates into one identity decision.
//!
//! An identity needs at least `min_evidence` distance samples to be
//! considered at all; its score is the mean of its lowest `trim_count`
//! samples. The lowest score wins.

use serde::Serialize;

use crate::consensus::domain::scoreboard::Scoreboard;
use crate::matching::domain::identity::{IdentityCandidate, IdentityId};
use crate::shared::constants::{DEFAULT_MIN_EVIDENCE, DEFAULT_TRIM_COUNT};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConsensusDecision {
    NoMatch,
    Match { identity_id: IdentityId, score: f64 },
}

impl ConsensusDecision {
    pub fn identity(&self) -> Option<IdentityId> {
        match self {
            ConsensusDecision::NoMatch => None,
            ConsensusDecision::Match { identity_id, .. } => Some(*identity_id),
        }
    }
}

/// Evidence gate plus trimmed-mean scoring.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConsensusRule {
    pub min_evidence: usize,
    pub trim_count: usize,
}

impl Default for ConsensusRule {
    fn default() -> Self {
        Self {
            min_evidence: DEFAULT_MIN_EVIDENCE,
            trim_count: DEFAULT_TRIM_COUNT,
        }
    }
}

impl ConsensusRule {
    pub fn new(min_evidence: usize, trim_count: usize) -> Self {
        Self {
            min_evidence,
            trim_count,
        }
    }

    /// Mean of the lowest `trim_count` distances, or `None` when fewer
    /// than `min_evidence` samples exist.
    pub fn score(&self, distances: &[f64]) -> Option<f64> {
        if distances.is_empty() || distances.len() < self.min_evidence {
            return None;
        }
        let mut sorted = distances.to_vec();
        sorted.sort_by(f64::total_cmp);
        let take = sorted.len().min(self.trim_count.max(1));
        Some(sorted[..take].iter().sum::<f64>() / take as f64)
    }
}

/// Score of one identity that passed the evidence gate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct IdentityScore {
    pub identity_id: IdentityId,
    pub score: f64,
    pub samples: usize,
}

/// Everything the aggregation phase produced.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConsensusOutcome {
    pub decision: ConsensusDecision,
    pub standings: Vec<IdentityScore>,
    pub scoreboard: Scoreboard,
    pub rejected_candidates: usize,
}

/// Accumulates candidates for one batch, then decides once.
///
/// `decide` consumes the aggregator, so a decided instance can never
/// take more candidates or be reused for another batch.
pub struct ConsensusAggregator {
    rule: ConsensusRule,
    scoreboard: Scoreboard,
    rejected: usize,
}

impl ConsensusAggregator {
    pub fn new(rule: ConsensusRule) -> Self {
        Self {
            rule,
            scoreboard: Scoreboard::new(),
            rejected: 0,
        }
    }

    pub fn record(&mut self, candidates: &[IdentityCandidate]) {
        for candidate in candidates {
            if !self.scoreboard.record(candidate) {
                log::warn!(
                    "Discarding candidate {} with invalid distance {}",
                    candidate.identity_id,
                    candidate.distance
                );
                self.rejected += 1;
            }
        }
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    pub fn decide(self) -> ConsensusOutcome {
        let standings: Vec<IdentityScore> = self
            .scoreboard
            .iter()
            .filter_map(|(identity_id, distances)| {
                self.rule.score(distances).map(|score| IdentityScore {
                    identity_id,
                    score,
                    samples: distances.len(),
                })
            })
            .collect();

        let mut best: Option<IdentityScore> = None;
        for standing in &standings {
            log::debug!(
                "Identity {} scored {:.4} over {} samples",
                standing.identity_id,
                standing.score,
                standing.samples
            );
            if best.map_or(true, |b| standing.score < b.score) {
                best = Some(*standing);
            }
        }

        let decision = match best {
            Some(b) => ConsensusDecision::Match {
                identity_id: b.identity_id,
                score: b.score,
            },
            None => ConsensusDecision::NoMatch,
        };

        ConsensusOutcome {
            decision,
            standings,
            scoreboard: self.scoreboard,
            rejected_candidates: self.rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn candidates(id: u64, distances: &[f64]) -> Vec<IdentityCandidate> {
        distances
            .iter()
            .map(|d| IdentityCandidate::new(IdentityId(id), *d))
            .collect()
    }

    fn aggregate(inputs: &[(u64, &[f64])]) -> ConsensusOutcome {
        let mut aggregator = ConsensusAggregator::new(ConsensusRule::default());
        for (id, distances) in inputs {
            aggregator.record(&candidates(*id, distances));
        }
        aggregator.decide()
    }

    #[rstest]
    #[case::three_samples_qualify(&[0.1, 0.2, 0.3], Some(0.2))]
    #[case::two_samples_do_not(&[0.1, 0.2], None)]
    #[case::four_samples_all_used(&[0.4, 0.1, 0.3, 0.2], Some(0.25))]
    #[case::lowest_four_of_five(&[0.1, 0.15, 0.2, 0.25, 0.9], Some(0.175))]
    #[case::empty(&[], None)]
    fn test_rule_score(#[case] distances: &[f64], #[case] expected: Option<f64>) {
        let score = ConsensusRule::default().score(distances);
        match expected {
            Some(e) => assert_relative_eq!(score.unwrap(), e, epsilon = 1e-12),
            None => assert!(score.is_none()),
        }
    }

    #[test]
    fn test_trimmed_mean_beats_tighter_but_worse_identity() {
        let outcome = aggregate(&[
            (1, &[0.1, 0.15, 0.2, 0.25, 0.9]),
            (2, &[0.18, 0.19, 0.21]),
        ]);

        match outcome.decision {
            ConsensusDecision::Match { identity_id, score } => {
                assert_eq!(identity_id, IdentityId(1));
                assert_relative_eq!(score, 0.175, epsilon = 1e-12);
            }
            ConsensusDecision::NoMatch => panic!("expected a match"),
        }
        let b = outcome
            .standings
            .iter()
            .find(|s| s.identity_id == IdentityId(2))
            .unwrap();
        assert_relative_eq!(b.score, 0.58 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_single_lucky_frame_cannot_win() {
        let outcome = aggregate(&[(1, &[0.01]), (2, &[0.4, 0.5, 0.6])]);
        assert_eq!(outcome.decision.identity(), Some(IdentityId(2)));
    }

    #[test]
    fn test_no_qualifying_identity_is_no_match() {
        let outcome = aggregate(&[(1, &[0.01, 0.02]), (2, &[0.03])]);
        assert_eq!(outcome.decision, ConsensusDecision::NoMatch);
        assert!(outcome.standings.is_empty());
        assert_eq!(outcome.scoreboard.sample_count(), 3);
    }

    #[test]
    fn test_no_candidates_is_no_match() {
        let outcome = ConsensusAggregator::new(ConsensusRule::default()).decide();
        assert_eq!(outcome.decision, ConsensusDecision::NoMatch);
    }

    #[test]
    fn test_tie_resolves_to_lowest_identity() {
        let outcome = aggregate(&[(7, &[0.2, 0.2, 0.2]), (3, &[0.2, 0.2, 0.2])]);
        assert_eq!(outcome.decision.identity(), Some(IdentityId(3)));
    }

    #[test]
    fn test_samples_accumulate_across_faces() {
        let mut aggregator = ConsensusAggregator::new(ConsensusRule::default());
        aggregator.record(&candidates(5, &[0.3]));
        aggregator.record(&candidates(5, &[0.2]));
        aggregator.record(&candidates(5, &[0.1]));
        assert_eq!(aggregator.scoreboard().sample_count(), 3);

        let outcome = aggregator.decide();
        assert_eq!(outcome.decision.identity(), Some(IdentityId(5)));
    }

    #[test]
    fn test_invalid_distances_are_counted_not_scored() {
        let mut aggregator = ConsensusAggregator::new(ConsensusRule::default());
        aggregator.record(&candidates(1, &[0.1, -1.0, f64::NAN, 0.2]));
        let outcome = aggregator.decide();
        assert_eq!(outcome.rejected_candidates, 2);
        assert_eq!(outcome.decision, ConsensusDecision::NoMatch);
    }

    #[test]
    fn test_same_input_same_winner() {
        let inputs: &[(u64, &[f64])] = &[
            (11, &[0.31, 0.29, 0.35, 0.4]),
            (12, &[0.3, 0.33, 0.28]),
            (13, &[0.05]),
        ];
        let first = aggregate(inputs);
        for _ in 0..5 {
            assert_eq!(aggregate(inputs).decision, first.decision);
        }
    }

    #[test]
    fn test_custom_rule_changes_gate() {
        let mut aggregator = ConsensusAggregator::new(ConsensusRule::new(1, 1));
        aggregator.record(&candidates(4, &[0.5, 0.05]));
        match aggregator.decide().decision {
            ConsensusDecision::Match { score, .. } => assert_relative_eq!(score, 0.05),
            ConsensusDecision::NoMatch => panic!("expected a match"),
        }
    }

    #[test]
    fn test_decision_serializes_with_outcome_tag() {
        let json = serde_json::to_string(&ConsensusDecision::NoMatch).unwrap();
        assert_eq!(json, r#"{"outcome":"no_match"}"#);
    }
}
