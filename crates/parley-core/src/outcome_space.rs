//! Outcome catalogs sorted by own utility.
//!
//! The decision engine never enumerates outcomes itself; it asks an
//! [`OutcomeCatalog`] for the bid nearest a target utility or for every bid
//! inside a utility band.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Domain, Outcome};
use crate::utility::UtilityFunction;
use crate::CoreError;

/// Largest outcome space [`SortedOutcomeSpace::new`] will enumerate.
pub const MAX_OUTCOMES: usize = 1_000_000;

/// An outcome together with its utility for the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidDetails {
    /// The offered outcome.
    pub outcome: Outcome,
    /// Own (undiscounted) utility of the outcome.
    pub my_utility: f64,
    /// Normalized time at which the bid was made (0 for catalog entries).
    pub time: f64,
}

impl BidDetails {
    /// Creates a new bid.
    #[must_use]
    pub const fn new(outcome: Outcome, my_utility: f64, time: f64) -> Self {
        Self {
            outcome,
            my_utility,
            time,
        }
    }
}

/// Read-only catalog of outcomes sorted by the agent's own utility.
///
/// Implementors return [`bids`](Self::bids) in descending utility order;
/// the provided methods rely on it.
pub trait OutcomeCatalog: fmt::Debug + Send + Sync {
    /// All bids, best first.
    fn bids(&self) -> &[BidDetails];

    /// The bid with the highest own utility.
    fn max_bid(&self) -> Option<&BidDetails> {
        self.bids().first()
    }

    /// The bid with the lowest own utility.
    fn min_bid(&self) -> Option<&BidDetails> {
        self.bids().last()
    }

    /// The bid whose utility is nearest to `utility`.
    ///
    /// On equal distance the higher-utility bid wins; within a group of equal
    /// utility the first bid in catalog order wins.
    fn bid_near_utility(&self, utility: f64) -> Option<&BidDetails> {
        let bids = self.bids();
        let split = bids.partition_point(|b| b.my_utility > utility);
        let above = split.checked_sub(1).and_then(|i| bids.get(i));
        let below = bids.get(split);

        let chosen = match (above, below) {
            (Some(a), Some(b)) if a.my_utility - utility <= utility - b.my_utility => a,
            (_, Some(b)) => return Some(b),
            (Some(a), None) => a,
            (None, None) => return None,
        };
        let first = bids.partition_point(|b| b.my_utility > chosen.my_utility);
        bids.get(first)
    }

    /// All bids with utility in `[lower, upper]`, in catalog order.
    fn bids_in_range(&self, lower: f64, upper: f64) -> &[BidDetails] {
        let bids = self.bids();
        let start = bids.partition_point(|b| b.my_utility > upper);
        let end = bids.partition_point(|b| b.my_utility >= lower);
        if start >= end {
            return &[];
        }
        &bids[start..end]
    }

    /// All bids with utility in `[utility - delta, utility + delta]`.
    fn bids_within(&self, utility: f64, delta: f64) -> &[BidDetails] {
        self.bids_in_range(utility - delta, utility + delta)
    }
}

/// In-memory outcome catalog built by enumerating a domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortedOutcomeSpace {
    bids: Vec<BidDetails>,
}

impl SortedOutcomeSpace {
    /// Enumerates `domain` and sorts every outcome by `utility`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidOutcomeSpace` if the domain has more than
    /// [`MAX_OUTCOMES`] outcomes, or any error the utility function reports.
    pub fn new(domain: &Domain, utility: &(impl UtilityFunction + ?Sized)) -> Result<Self, CoreError> {
        let count = domain.outcome_count().unwrap_or(usize::MAX);
        if count > MAX_OUTCOMES {
            return Err(CoreError::InvalidOutcomeSpace(format!(
                "domain has {count} outcomes, limit is {MAX_OUTCOMES}"
            )));
        }

        let bids = domain
            .outcomes()
            .into_iter()
            .map(|outcome| {
                let u = utility.utility(&outcome)?;
                Ok(BidDetails::new(outcome, u, 0.0))
            })
            .collect::<Result<Vec<_>, CoreError>>()?;

        let space = Self::from_bids(bids)?;
        debug!(
            outcomes = space.bids.len(),
            max = space.bids.first().map(|b| b.my_utility),
            min = space.bids.last().map(|b| b.my_utility),
            "built sorted outcome space"
        );
        Ok(space)
    }

    /// Builds a catalog from pre-evaluated bids.
    ///
    /// The sort is stable, so bids of equal utility keep their input order.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidOutcomeSpace` if `bids` is empty or a
    /// utility is not finite.
    pub fn from_bids(mut bids: Vec<BidDetails>) -> Result<Self, CoreError> {
        if bids.is_empty() {
            return Err(CoreError::InvalidOutcomeSpace("no outcomes".to_string()));
        }
        if let Some(bad) = bids.iter().find(|b| !b.my_utility.is_finite()) {
            return Err(CoreError::InvalidOutcomeSpace(format!(
                "outcome {} has non-finite utility",
                bad.outcome
            )));
        }
        bids.sort_by(|a, b| b.my_utility.total_cmp(&a.my_utility));
        Ok(Self { bids })
    }
}

impl OutcomeCatalog for SortedOutcomeSpace {
    fn bids(&self) -> &[BidDetails] {
        &self.bids
    }
}
