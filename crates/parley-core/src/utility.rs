//! Utility functions over outcomes.
//!
//! [`AdditiveUtilitySpace`] is the standard weighted-issue utility: every
//! issue carries a weight (weights sum to 1) and every value of an issue an
//! evaluation. Evaluations are normalized by the best evaluation of their
//! issue when computing utility, not when stored.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{Domain, IssueId, Outcome, Value};
use crate::CoreError;

/// Maps an outcome to a scalar desirability in [0, 1] for one party.
pub trait UtilityFunction: fmt::Debug + Send + Sync {
    /// Evaluates `outcome`.
    ///
    /// # Errors
    ///
    /// Returns an error if the outcome refers to issues or values the
    /// function does not know.
    fn utility(&self, outcome: &Outcome) -> Result<f64, CoreError>;
}

/// A weighted-issue additive utility function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditiveUtilitySpace {
    weights: BTreeMap<IssueId, f64>,
    evaluations: BTreeMap<IssueId, BTreeMap<Value, f64>>,
}

impl AdditiveUtilitySpace {
    /// Starts building a utility space for `domain`.
    #[must_use]
    pub fn builder(domain: &Domain) -> AdditiveUtilitySpaceBuilder {
        AdditiveUtilitySpaceBuilder::new(domain)
    }

    /// Creates a utility space with uniform weights and flat evaluations.
    #[must_use]
    pub fn flat(domain: &Domain) -> Self {
        let weight = 1.0 / domain.issue_count() as f64;
        Self {
            weights: domain.issues().iter().map(|i| (i.id(), weight)).collect(),
            evaluations: domain
                .issues()
                .iter()
                .map(|i| (i.id(), i.values().iter().map(|v| (v.clone(), 1.0)).collect()))
                .collect(),
        }
    }

    /// Returns the normalized weight of `issue`.
    #[must_use]
    pub fn weight(&self, issue: IssueId) -> Option<f64> {
        self.weights.get(&issue).copied()
    }

    /// Returns the raw (unnormalized) evaluation of `value` on `issue`.
    #[must_use]
    pub fn evaluation(&self, issue: IssueId, value: &Value) -> Option<f64> {
        self.evaluations.get(&issue)?.get(value).copied()
    }
}

impl UtilityFunction for AdditiveUtilitySpace {
    fn utility(&self, outcome: &Outcome) -> Result<f64, CoreError> {
        if let Some((issue, _)) = outcome.iter().find(|(id, _)| !self.weights.contains_key(id)) {
            return Err(CoreError::UnknownIssue(issue));
        }

        let mut total = 0.0;
        for (&issue, &weight) in &self.weights {
            let value = outcome.value(issue).ok_or(CoreError::MissingIssue(issue))?;
            let evals = self
                .evaluations
                .get(&issue)
                .ok_or(CoreError::UnknownIssue(issue))?;
            let eval = evals.get(value).ok_or_else(|| CoreError::UnknownValue {
                issue,
                value: value.clone(),
            })?;
            let best = evals.values().copied().fold(0.0_f64, f64::max);
            if best > 0.0 {
                total += weight * eval / best;
            }
        }
        Ok(total.clamp(0.0, 1.0))
    }
}

/// Builder for [`AdditiveUtilitySpace`].
///
/// Unset weights default to `1 / issue_count` before normalization; unset
/// evaluations default to 1.
#[derive(Debug, Clone)]
pub struct AdditiveUtilitySpaceBuilder {
    domain: Domain,
    weights: BTreeMap<IssueId, f64>,
    evaluations: BTreeMap<IssueId, BTreeMap<Value, f64>>,
    error: Option<CoreError>,
}

impl AdditiveUtilitySpaceBuilder {
    fn new(domain: &Domain) -> Self {
        Self {
            domain: domain.clone(),
            weights: BTreeMap::new(),
            evaluations: BTreeMap::new(),
            error: None,
        }
    }

    fn record(&mut self, error: CoreError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Sets the weight of an issue.
    #[must_use]
    pub fn weight(mut self, issue: u32, weight: f64) -> Self {
        let id = IssueId(issue);
        if self.domain.issue(id).is_none() {
            self.record(CoreError::UnknownIssue(id));
        } else if !weight.is_finite() || weight < 0.0 {
            self.record(CoreError::InvalidUtility(format!(
                "weight of issue {id} must be finite and non-negative, got {weight}"
            )));
        } else {
            self.weights.insert(id, weight);
        }
        self
    }

    /// Sets the evaluation of one value of an issue.
    #[must_use]
    pub fn evaluation(mut self, issue: u32, value: impl Into<Value>, evaluation: f64) -> Self {
        let id = IssueId(issue);
        let value = value.into();
        match self.domain.issue(id) {
            None => self.record(CoreError::UnknownIssue(id)),
            Some(known) if !known.contains(&value) => {
                self.record(CoreError::UnknownValue { issue: id, value });
            }
            Some(_) if !evaluation.is_finite() || evaluation < 0.0 => {
                self.record(CoreError::InvalidUtility(format!(
                    "evaluation of {value} on issue {id} must be finite and non-negative, got {evaluation}"
                )));
            }
            Some(_) => {
                self.evaluations.entry(id).or_default().insert(value, evaluation);
            }
        }
        self
    }

    /// Builds the utility space, normalizing weights to sum to 1.
    ///
    /// # Errors
    ///
    /// Returns the first error recorded by a setter, or
    /// `CoreError::InvalidUtility` if all weights are zero.
    pub fn build(self) -> Result<AdditiveUtilitySpace, CoreError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let default_weight = 1.0 / self.domain.issue_count() as f64;
        let mut weights: BTreeMap<IssueId, f64> = self
            .domain
            .issues()
            .iter()
            .map(|i| (i.id(), self.weights.get(&i.id()).copied().unwrap_or(default_weight)))
            .collect();
        let sum: f64 = weights.values().sum();
        if sum <= 0.0 {
            return Err(CoreError::InvalidUtility("issue weights sum to zero".to_string()));
        }
        weights.values_mut().for_each(|w| *w /= sum);

        let evaluations = self
            .domain
            .issues()
            .iter()
            .map(|issue| {
                let set = self.evaluations.get(&issue.id());
                let evals = issue
                    .values()
                    .iter()
                    .map(|v| (v.clone(), set.and_then(|s| s.get(v)).copied().unwrap_or(1.0)))
                    .collect();
                (issue.id(), evals)
            })
            .collect();

        Ok(AdditiveUtilitySpace {
            weights,
            evaluations,
        })
    }
}
