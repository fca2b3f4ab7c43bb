//! Offering policy: the concrete bid to propose each round.

use std::sync::Arc;

use parley_core::{BidDetails, OutcomeCatalog};
use tracing::{debug, warn};

use crate::concession::ConcessionCurve;
use crate::config::{OfferingParams, StrategyConfig};
use crate::opponent_model::OpponentModel;
use crate::selector::OpponentAwareBidSelector;
use crate::AgentError;

/// Upper bound past which the candidate band is no longer widened.
const BAND_CEILING: f64 = 1.01;

/// Combines the concession curve with the outcome catalog and, when an
/// opponent model is available, the opponent-aware selector.
#[derive(Debug)]
pub struct OfferingPolicy {
    curve: ConcessionCurve,
    catalog: Arc<dyn OutcomeCatalog>,
    selector: OpponentAwareBidSelector,
    params: OfferingParams,
}

impl OfferingPolicy {
    /// Creates the policy for one session.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Configuration` for invalid parameters and
    /// `AgentError::DegenerateInput` for an empty catalog.
    pub fn new(catalog: Arc<dyn OutcomeCatalog>, config: &StrategyConfig) -> Result<Self, AgentError> {
        config.offering.validate()?;
        let curve = ConcessionCurve::from_catalog(&config.concession, catalog.as_ref())?;
        let selector = OpponentAwareBidSelector::new(config.selector)?;
        Ok(Self {
            curve,
            catalog,
            selector,
            params: config.offering,
        })
    }

    /// The concession curve offers are generated from.
    #[must_use]
    pub const fn curve(&self) -> &ConcessionCurve {
        &self.curve
    }

    /// The bid selector consulted when an opponent model is available.
    #[must_use]
    pub const fn selector(&self) -> &OpponentAwareBidSelector {
        &self.selector
    }

    /// The outcome catalog bids are drawn from.
    #[must_use]
    pub fn catalog(&self) -> &dyn OutcomeCatalog {
        self.catalog.as_ref()
    }

    /// Returns the offering parameters.
    #[must_use]
    pub const fn params(&self) -> &OfferingParams {
        &self.params
    }

    /// The bid to propose at time `t`, stamped with `t`.
    ///
    /// Without an opponent model this is the catalog bid nearest the
    /// concession target. With one, every bid in the band just above the
    /// target is a candidate and the selector picks among them.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::DegenerateInput` if the catalog has no bids.
    pub fn next_bid(
        &self,
        t: f64,
        model: Option<&dyn OpponentModel>,
    ) -> Result<BidDetails, AgentError> {
        let target = self.curve.target(t);
        let model = model.filter(|_| self.params.use_opponent_model);

        let chosen = match model {
            None => self.nearest(target)?,
            Some(model) => {
                let candidates = self.band(target);
                match self.selector.select(candidates, model, t) {
                    Ok(bid) => bid,
                    Err(AgentError::DegenerateInput(reason)) => {
                        warn!(target, %reason, "candidate band empty, using nearest bid");
                        self.nearest(target)?
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        debug!(
            t,
            target,
            utility = chosen.my_utility,
            outcome = %chosen.outcome,
            "planned next bid"
        );
        Ok(BidDetails::new(chosen.outcome.clone(), chosen.my_utility, t))
    }

    /// The bid offered in the first round.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::DegenerateInput` if the catalog has no bids.
    pub fn opening_bid(&self) -> Result<BidDetails, AgentError> {
        self.next_bid(0.0, None)
    }

    fn nearest(&self, target: f64) -> Result<&BidDetails, AgentError> {
        self.catalog
            .bid_near_utility(target)
            .ok_or_else(|| AgentError::DegenerateInput("outcome catalog is empty".to_string()))
    }

    /// Bids in `[target, target + band_width]`, with the upper bound widened
    /// while the band is empty.
    fn band(&self, target: f64) -> &[BidDetails] {
        let mut upper = target + self.params.band_width;
        loop {
            let candidates = self.catalog.bids_in_range(target, upper);
            if !candidates.is_empty() || upper > BAND_CEILING {
                return candidates;
            }
            upper += self.params.band_step;
        }
    }
}
