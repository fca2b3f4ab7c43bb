//! Acceptance policy.
//!
//! Decides each round whether to take the opponent's latest offer. The rules
//! are checked in order and the first match wins:
//!
//! 1. past the surrender time `T`, accept anything
//! 2. accept if `a * their + b` is at least the utility of the bid we would
//!    otherwise propose
//! 3. accept if `their` clears the concession target
//! 4. reject

use std::fmt;
use std::sync::Arc;

use parley_core::BidDetails;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AcceptanceParams;
use crate::offering::OfferingPolicy;
use crate::opponent_model::OpponentModel;
use crate::AgentError;

/// Accept or reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    /// Take the opponent's offer.
    Accept,
    /// Keep negotiating.
    Reject,
}

impl Decision {
    /// Returns true for [`Decision::Accept`].
    #[must_use]
    pub const fn is_accept(self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// The rule that produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AcceptanceRule {
    /// Time ran past the surrender threshold.
    SurrenderDeadline,
    /// The offer is at least as good as our planned next bid.
    BeatsNextBid,
    /// The offer clears the concession target.
    ClearsTarget,
    /// None of the above.
    BelowTarget,
}

impl fmt::Display for AcceptanceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SurrenderDeadline => write!(f, "surrender_deadline"),
            Self::BeatsNextBid => write!(f, "beats_next_bid"),
            Self::ClearsTarget => write!(f, "clears_target"),
            Self::BelowTarget => write!(f, "below_target"),
        }
    }
}

/// Outcome of one acceptance check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Accept or reject.
    pub decision: Decision,
    /// Which rule decided.
    pub rule: AcceptanceRule,
    /// The bid we would propose instead. Not computed when surrendering.
    pub planned: Option<BidDetails>,
    /// Concession target at the time of the decision.
    pub target: f64,
}

/// Acceptance policy bound to the offering policy whose bids it compares
/// against.
#[derive(Debug, Clone)]
pub struct AcceptancePolicy {
    offering: Arc<OfferingPolicy>,
    params: AcceptanceParams,
}

impl AcceptancePolicy {
    /// Creates a policy comparing against `offering`.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Configuration` if `params` is invalid.
    pub fn new(offering: Arc<OfferingPolicy>, params: AcceptanceParams) -> Result<Self, AgentError> {
        params.validate()?;
        Ok(Self { offering, params })
    }

    /// The offering policy this policy is bound to.
    #[must_use]
    pub const fn offering(&self) -> &Arc<OfferingPolicy> {
        &self.offering
    }

    /// Returns the acceptance parameters.
    #[must_use]
    pub const fn params(&self) -> &AcceptanceParams {
        &self.params
    }

    /// Decides on `incoming` at time `t`.
    ///
    /// `incoming.my_utility` must already hold our own utility of the offer.
    ///
    /// # Errors
    ///
    /// Propagates failures of the offering policy while planning the next bid.
    pub fn decide(
        &self,
        incoming: &BidDetails,
        t: f64,
        model: Option<&dyn OpponentModel>,
    ) -> Result<Verdict, AgentError> {
        let target = self.offering.curve().target(t);
        let their = incoming.my_utility;

        if t > self.params.surrender_time {
            debug!(
                t,
                their,
                surrender_time = self.params.surrender_time,
                "accepting past surrender time"
            );
            return Ok(Verdict {
                decision: Decision::Accept,
                rule: AcceptanceRule::SurrenderDeadline,
                planned: None,
                target,
            });
        }

        let planned = self.offering.next_bid(t, model)?;
        let offered = self.params.a.mul_add(their, self.params.b);
        let (decision, rule) = if planned.my_utility - offered <= 0.0 {
            (Decision::Accept, AcceptanceRule::BeatsNextBid)
        } else if their >= target {
            (Decision::Accept, AcceptanceRule::ClearsTarget)
        } else {
            (Decision::Reject, AcceptanceRule::BelowTarget)
        };

        debug!(
            t,
            their,
            planned = planned.my_utility,
            target,
            %rule,
            accept = decision.is_accept(),
            "acceptance decision"
        );
        Ok(Verdict {
            decision,
            rule,
            planned: Some(planned),
            target,
        })
    }
}
