//! Opponent preference modeling.
//!
//! - [`OpponentModel`] - Trait for learned approximations of the counterpart's utility
//! - [`FrequencyModel`] - Weighted-issue model learned from offer frequencies
//!
//! The frequency model assumes a counterpart that concedes on the issues it
//! cares little about while holding the important ones fixed. Issues whose
//! value stays the same between the latest offer and recent earlier offers
//! gain weight; values that keep reappearing gain score.

use std::collections::BTreeMap;
use std::fmt;

use parley_core::{BidHistory, Domain, IssueId, Outcome, Value};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::config::ModelParams;
use crate::AgentError;

#[cfg(test)]
mod tests;

/// A learned estimate of the counterpart's preferences.
pub trait OpponentModel: fmt::Debug + Send + Sync {
    /// Learns from the opponent's offer history after a new offer arrived.
    ///
    /// Never fails: lookup problems are logged and the affected cells keep
    /// their previous state.
    fn update(&mut self, history: &BidHistory, time: f64);

    /// Estimated opponent utility of `outcome`, in `[0, 1]`.
    fn evaluate(&self, outcome: &Outcome) -> f64;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Frequency-based opponent model.
///
/// Issue weights always sum to 1. Value scores are raw counts (starting at
/// 1) and are normalized within their issue only when evaluating.
///
/// Deserialized snapshots are validated like freshly built models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ModelSnapshot")]
pub struct FrequencyModel {
    params: ModelParams,
    golden_value: f64,
    weights: BTreeMap<IssueId, f64>,
    scores: BTreeMap<IssueId, BTreeMap<Value, u64>>,
    updates: u64,
}

/// Unvalidated wire form of [`FrequencyModel`].
#[derive(Deserialize)]
struct ModelSnapshot {
    params: ModelParams,
    golden_value: f64,
    weights: BTreeMap<IssueId, f64>,
    scores: BTreeMap<IssueId, BTreeMap<Value, u64>>,
    updates: u64,
}

impl TryFrom<ModelSnapshot> for FrequencyModel {
    type Error = AgentError;

    fn try_from(snapshot: ModelSnapshot) -> Result<Self, Self::Error> {
        snapshot.params.validate()?;
        if !snapshot.golden_value.is_finite() || snapshot.weights.values().any(|w| !w.is_finite()) {
            return Err(AgentError::Configuration(
                "model snapshot holds non-finite weights".to_string(),
            ));
        }
        Ok(Self {
            params: snapshot.params,
            golden_value: snapshot.golden_value,
            weights: snapshot.weights,
            scores: snapshot.scores,
            updates: snapshot.updates,
        })
    }
}

impl FrequencyModel {
    /// Creates a model with uniform issue weights and flat value scores.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Configuration` if `params` is invalid.
    pub fn new(domain: &Domain, params: ModelParams) -> Result<Self, AgentError> {
        params.validate()?;
        let issue_count = domain.issue_count() as f64;
        let weights = domain
            .issues()
            .iter()
            .map(|issue| (issue.id(), 1.0 / issue_count))
            .collect();
        let scores = domain
            .issues()
            .iter()
            .map(|issue| (issue.id(), issue.values().iter().map(|v| (v.clone(), 1)).collect()))
            .collect();
        Ok(Self {
            params,
            golden_value: params.learning_coefficient / issue_count,
            weights,
            scores,
            updates: 0,
        })
    }

    /// Returns the learned issue weights.
    #[must_use]
    pub const fn weights(&self) -> &BTreeMap<IssueId, f64> {
        &self.weights
    }

    /// Returns the learned weight of one issue.
    #[must_use]
    pub fn weight(&self, issue: IssueId) -> Option<f64> {
        self.weights.get(&issue).copied()
    }

    /// Returns the raw score of one value.
    #[must_use]
    pub fn value_score(&self, issue: IssueId, value: &Value) -> Option<u64> {
        self.scores.get(&issue)?.get(value).copied()
    }

    /// Weight added to an unchanged issue per observed pair.
    #[must_use]
    pub const fn golden_value(&self) -> f64 {
        self.golden_value
    }

    /// Number of updates that actually changed the model.
    #[must_use]
    pub const fn update_count(&self) -> u64 {
        self.updates
    }

    /// Per-issue change indicators between two offers (`true` = changed).
    ///
    /// Issues missing from either offer are logged and left out.
    fn difference(&self, earlier: &Outcome, latest: &Outcome) -> Vec<(IssueId, bool)> {
        self.weights
            .keys()
            .filter_map(|&issue| match (earlier.value(issue), latest.value(issue)) {
                (Some(a), Some(b)) => Some((issue, a != b)),
                _ => {
                    warn!(%issue, "opponent offer lacks issue, skipping difference cell");
                    None
                }
            })
            .collect()
    }

    fn update_weights(&mut self, history: &BidHistory) {
        let size = history.len();
        let Some(latest) = history.last() else {
            return;
        };

        let mut diffs = Vec::new();
        for i in 1..self.params.number_of_rounds {
            // index 0 is never paired
            let earlier = (size - 1)
                .checked_sub(i)
                .filter(|&j| j > 0)
                .and_then(|j| history.get(j));
            let Some(earlier) = earlier else {
                break;
            };
            diffs.push(self.difference(&earlier.outcome, &latest.outcome));
        }

        let unchanged = diffs.iter().flatten().filter(|(_, changed)| !changed).count();
        let total = self.golden_value.mul_add(unchanged as f64, 1.0);

        for &(issue, changed) in diffs.iter().flatten() {
            let reward = if changed { 0.0 } else { self.golden_value };
            if let Some(weight) = self.weights.get_mut(&issue) {
                *weight = (*weight + reward) / total;
            }
        }
        self.normalize_weights();

        debug!(pairs = diffs.len(), unchanged, "updated opponent issue weights");
    }

    fn update_scores(&mut self, history: &BidHistory) {
        let window = self.params.number_of_rounds.saturating_sub(1);
        let recent: Vec<&Outcome> = history.recent(window).map(|b| &b.outcome).collect();

        for outcome in &recent {
            for (issue, value) in outcome.iter() {
                if let Err(e) = self.lookup(issue, value) {
                    warn!(error = %e, "opponent offer not covered by model, skipping value");
                }
            }
        }

        let addition = self.params.value_addition;
        for (&issue, values) in &mut self.scores {
            for (value, score) in values.iter_mut() {
                let seen = recent.iter().filter(|o| o.value(issue) == Some(value)).count() as u64;
                *score = score.saturating_add(addition.saturating_mul(seen));
            }
        }
    }

    fn normalize_weights(&mut self) {
        let sum: f64 = self.weights.values().sum();
        if sum > 0.0 {
            self.weights.values_mut().for_each(|w| *w /= sum);
        }
    }

    /// Normalized score of `value` on `issue` together with the issue weight.
    fn lookup(&self, issue: IssueId, value: &Value) -> Result<(f64, f64), AgentError> {
        let weight = self
            .weights
            .get(&issue)
            .ok_or_else(|| AgentError::EvaluationLookup(format!("issue {issue} is not modeled")))?;
        let values = self
            .scores
            .get(&issue)
            .ok_or_else(|| AgentError::EvaluationLookup(format!("issue {issue} has no scores")))?;
        let score = values.get(value).ok_or_else(|| {
            AgentError::EvaluationLookup(format!("value {value} of issue {issue} is not modeled"))
        })?;
        let best = values.values().copied().max().unwrap_or(1).max(1);
        Ok((*weight, *score as f64 / best as f64))
    }
}

impl OpponentModel for FrequencyModel {
    fn update(&mut self, history: &BidHistory, time: f64) {
        if history.len() < self.params.round_to_update {
            trace!(
                offers = history.len(),
                needed = self.params.round_to_update,
                "not enough opponent offers to learn from"
            );
            return;
        }
        self.update_weights(history);
        self.update_scores(history);
        self.updates += 1;
        trace!(time, updates = self.updates, "opponent model updated");
    }

    fn evaluate(&self, outcome: &Outcome) -> f64 {
        let mut total = 0.0;
        for &issue in self.weights.keys() {
            let Some(value) = outcome.value(issue) else {
                warn!(%issue, "outcome lacks issue, skipping in opponent evaluation");
                continue;
            };
            match self.lookup(issue, value) {
                Ok((weight, score)) => total += weight * score,
                Err(e) => warn!(error = %e, "skipping opponent evaluation cell"),
            }
        }
        total.clamp(0.0, 1.0)
    }

    fn name(&self) -> &'static str {
        "frequency"
    }
}
