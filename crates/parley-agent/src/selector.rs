//! Opponent-aware selection among equally good bids.
//!
//! Given bids the agent values about the same, prefer the one the opponent
//! model rates highest, scored as
//! `w * own_utility + (1 - w) * opponent_estimate`. Bids whose opponent
//! estimate does not clear the reservation threshold are ignored; if none
//! clears it the model carries no usable signal and the bid with the best
//! own utility is returned instead.

use parley_core::BidDetails;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::{ReservationMode, SelectorParams};
use crate::opponent_model::OpponentModel;
use crate::AgentError;

/// Stateless bid selection policy over an opponent model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentAwareBidSelector {
    params: SelectorParams,
}

impl OpponentAwareBidSelector {
    /// Creates a selector.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Configuration` if `params` is invalid.
    pub fn new(params: SelectorParams) -> Result<Self, AgentError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Returns the selector parameters.
    #[must_use]
    pub const fn params(&self) -> &SelectorParams {
        &self.params
    }

    /// Opponent reservation threshold at time `t`.
    #[must_use]
    pub fn reservation(&self, t: f64) -> f64 {
        let r = self.params.opponent_reservation;
        match self.params.reservation_mode {
            ReservationMode::TimeAdjusted => t.mul_add(1.0 - r, r),
            ReservationMode::Constant => r,
        }
    }

    /// Whether the opponent model may still be updated at time `t`.
    #[must_use]
    pub fn can_update(&self, t: f64) -> bool {
        t < self.params.update_threshold
    }

    /// Picks one bid out of `candidates`.
    ///
    /// Ties go to the earliest candidate, so callers must pass candidates in
    /// a stable order.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::DegenerateInput` if `candidates` is empty.
    pub fn select<'a>(
        &self,
        candidates: &'a [BidDetails],
        model: &dyn OpponentModel,
        t: f64,
    ) -> Result<&'a BidDetails, AgentError> {
        let [first, rest @ ..] = candidates else {
            return Err(AgentError::DegenerateInput(
                "no candidate bids to select from".to_string(),
            ));
        };
        if rest.is_empty() {
            return Ok(first);
        }

        let threshold = self.reservation(t);
        let w = self.params.agent_weight;
        let mut best: Option<(&BidDetails, f64)> = None;

        for bid in candidates {
            let opponent = model.evaluate(&bid.outcome);
            if opponent <= threshold {
                continue;
            }
            let score = w.mul_add(bid.my_utility, (1.0 - w) * opponent);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((bid, score));
            }
        }

        match best {
            Some((bid, score)) => {
                trace!(
                    score,
                    threshold,
                    candidates = candidates.len(),
                    "selected bid by opponent model"
                );
                Ok(bid)
            }
            None => {
                trace!(threshold, model = model.name(), "no candidate above opponent reservation");
                Ok(Self::best_for_self(candidates).unwrap_or(first))
            }
        }
    }

    fn best_for_self(candidates: &[BidDetails]) -> Option<&BidDetails> {
        candidates
            .iter()
            .reduce(|best, b| if b.my_utility > best.my_utility { b } else { best })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use parley_core::{BidHistory, IssueId, Outcome, Value};
    use proptest::prelude::*;

    use super::*;

    /// Rates outcomes by a fixed table keyed on issue 1.
    #[derive(Debug)]
    struct TableModel(BTreeMap<String, f64>);

    impl TableModel {
        fn new(rows: &[(&str, f64)]) -> Self {
            Self(rows.iter().map(|(k, v)| ((*k).to_string(), *v)).collect())
        }
    }

    impl OpponentModel for TableModel {
        fn update(&mut self, _history: &BidHistory, _time: f64) {}

        fn evaluate(&self, outcome: &Outcome) -> f64 {
            outcome
                .value(IssueId(1))
                .and_then(|v| self.0.get(v.as_str()))
                .copied()
                .unwrap_or(0.0)
        }

        fn name(&self) -> &'static str {
            "table"
        }
    }

    fn bid(label: &str, utility: f64) -> BidDetails {
        let mut values = BTreeMap::new();
        values.insert(IssueId(1), Value::from(label));
        BidDetails::new(Outcome::new(values), utility, 0.0)
    }

    fn label(b: &BidDetails) -> &str {
        b.outcome.value(IssueId(1)).map_or("", Value::as_str)
    }

    fn selector() -> OpponentAwareBidSelector {
        OpponentAwareBidSelector::new(SelectorParams::default()).unwrap()
    }

    #[test]
    fn empty_candidates_are_rejected() {
        let model = TableModel::new(&[]);
        let result = selector().select(&[], &model, 0.0);
        assert!(matches!(result, Err(AgentError::DegenerateInput(_))));
    }

    #[test]
    fn singleton_is_returned_regardless_of_model() {
        let model = TableModel::new(&[("a", 0.0)]);
        let candidates = [bid("a", 0.7)];
        let chosen = selector().select(&candidates, &model, 0.99).unwrap();
        assert_eq!(label(chosen), "a");
    }

    #[test]
    fn prefers_bid_the_opponent_likes() {
        let model = TableModel::new(&[("a", 0.2), ("b", 0.9), ("c", 0.5)]);
        let candidates = [bid("a", 0.81), bid("b", 0.80), bid("c", 0.80)];
        let chosen = selector().select(&candidates, &model, 0.0).unwrap();
        assert_eq!(label(chosen), "b");
    }

    #[test]
    fn falls_back_to_own_utility_when_model_is_silent() {
        let model = TableModel::new(&[]);
        let candidates = [bid("a", 0.80), bid("b", 0.82), bid("c", 0.81)];
        let chosen = selector().select(&candidates, &model, 0.0).unwrap();
        assert_eq!(label(chosen), "b");
    }

    #[test]
    fn ignores_candidates_below_reservation() {
        // at t = 0.5 the threshold is 0.1 + 0.5 * 0.9 = 0.55
        let model = TableModel::new(&[("a", 0.5), ("b", 0.6)]);
        let candidates = [bid("a", 0.9), bid("b", 0.8)];
        let chosen = selector().select(&candidates, &model, 0.5).unwrap();
        assert_eq!(label(chosen), "b");
    }

    #[test]
    fn ties_go_to_first_candidate() {
        let model = TableModel::new(&[("a", 0.6), ("b", 0.6)]);
        let candidates = [bid("a", 0.8), bid("b", 0.8)];
        let chosen = selector().select(&candidates, &model, 0.0).unwrap();
        assert_eq!(label(chosen), "a");
    }

    #[test]
    fn reservation_grows_with_time() {
        let s = selector();
        assert!((s.reservation(0.0) - 0.1).abs() < 1e-12);
        assert!((s.reservation(0.5) - 0.55).abs() < 1e-12);
        assert!((s.reservation(1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_reservation_mode() {
        let params = SelectorParams {
            reservation_mode: ReservationMode::Constant,
            ..SelectorParams::default()
        };
        let s = OpponentAwareBidSelector::new(params).unwrap();
        assert_eq!(s.reservation(0.9), 0.1);

        // both clear 0.1 even late in the session
        let model = TableModel::new(&[("a", 0.2), ("b", 0.6)]);
        let candidates = [bid("a", 0.9), bid("b", 0.8)];
        let chosen = s.select(&candidates, &model, 0.9).unwrap();
        assert_eq!(label(chosen), "b");

        // time-adjusted threshold is 0.91 here, so nothing clears it
        let chosen = selector().select(&candidates, &model, 0.9).unwrap();
        assert_eq!(label(chosen), "a");
    }

    #[test]
    fn update_gate_uses_threshold() {
        let s = selector();
        assert!(s.can_update(0.99));
        assert!(s.can_update(1.0));

        let strict = OpponentAwareBidSelector::new(SelectorParams {
            update_threshold: 0.5,
            ..SelectorParams::default()
        })
        .unwrap();
        assert!(strict.can_update(0.49));
        assert!(!strict.can_update(0.5));
    }

    proptest! {
        #[test]
        fn silent_model_matches_utility_maximizer(
            utilities in proptest::collection::vec(0.0f64..=1.0, 1..30),
            t in 0.0f64..=1.0,
        ) {
            let model = TableModel::new(&[]);
            let candidates: Vec<BidDetails> = utilities
                .iter()
                .enumerate()
                .map(|(i, u)| bid(&format!("c{i}"), *u))
                .collect();
            let chosen = selector().select(&candidates, &model, t).unwrap();
            let best = candidates.iter().map(|b| b.my_utility).fold(f64::MIN, f64::max);
            prop_assert_eq!(chosen.my_utility, best);
        }
    }
}
