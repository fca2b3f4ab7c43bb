//! Per-round decision engine.
//!
//! [`NegotiationEngine`] owns everything one session needs: the offering and
//! acceptance policies (sharing one concession curve), the opponent model
//! and the session state. The protocol runtime drives it:
//!
//! ```text
//! opening_bid()                      first round, if we start
//! receive_offer(outcome, t)          each time the opponent offers
//! respond(t) -> Accept | Offer       each time it is our turn
//! confirm_agreement()                when the opponent accepts our offer
//! ```
//!
//! A fatal error aborts the session; every later call returns
//! [`AgentError::SessionClosed`].

use std::sync::Arc;

use parley_core::{
    AdditiveUtilitySpace, BidDetails, Domain, Outcome, OutcomeCatalog, SortedOutcomeSpace,
    UtilityFunction,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::acceptance::AcceptancePolicy;
use crate::config::StrategyConfig;
use crate::offering::OfferingPolicy;
use crate::opponent_model::{FrequencyModel, OpponentModel};
use crate::session::NegotiationSession;
use crate::AgentError;

/// What the agent does this round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Accept the opponent's latest offer.
    Accept(BidDetails),
    /// Propose a new bid.
    Offer(BidDetails),
}

impl Action {
    /// Returns true for [`Action::Accept`].
    #[must_use]
    pub const fn is_accept(&self) -> bool {
        matches!(self, Self::Accept(_))
    }

    /// The bid accepted or offered.
    #[must_use]
    pub const fn bid(&self) -> &BidDetails {
        match self {
            Self::Accept(bid) | Self::Offer(bid) => bid,
        }
    }
}

/// Decision engine for one negotiation session.
#[derive(Debug)]
pub struct NegotiationEngine {
    domain: Arc<Domain>,
    utility: Arc<dyn UtilityFunction>,
    config: StrategyConfig,
    offering: Arc<OfferingPolicy>,
    acceptance: AcceptancePolicy,
    model: Option<Box<dyn OpponentModel>>,
    session: NegotiationSession,
}

impl NegotiationEngine {
    /// Creates an engine with a fresh frequency opponent model.
    ///
    /// `catalog` must hold the outcomes of `domain` evaluated with `utility`.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Configuration` for an invalid configuration and
    /// `AgentError::DegenerateInput` for an empty catalog.
    pub fn new(
        domain: Arc<Domain>,
        utility: Arc<dyn UtilityFunction>,
        catalog: Arc<dyn OutcomeCatalog>,
        config: &StrategyConfig,
    ) -> Result<Self, AgentError> {
        config.validate()?;
        let offering = Arc::new(OfferingPolicy::new(catalog, config)?);
        let acceptance = AcceptancePolicy::new(Arc::clone(&offering), config.acceptance)?;
        let model = FrequencyModel::new(&domain, config.model)?;
        let session = NegotiationSession::new();

        info!(
            session = %session.id,
            issues = domain.issue_count(),
            outcomes = offering.catalog().bids().len(),
            "negotiation engine created"
        );
        Ok(Self {
            domain,
            utility,
            config: *config,
            offering,
            acceptance,
            model: Some(Box::new(model)),
            session,
        })
    }

    /// Creates an engine over an additive utility space, enumerating and
    /// sorting the whole domain.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Core` if the domain is too large to enumerate,
    /// otherwise the errors of [`NegotiationEngine::new`].
    pub fn with_sorted_space(
        domain: Domain,
        utility: AdditiveUtilitySpace,
        config: &StrategyConfig,
    ) -> Result<Self, AgentError> {
        let catalog = SortedOutcomeSpace::new(&domain, &utility)?;
        Self::new(Arc::new(domain), Arc::new(utility), Arc::new(catalog), config)
    }

    /// Replaces the opponent model. `None` disables opponent modeling.
    #[must_use]
    pub fn with_opponent_model(mut self, model: Option<Box<dyn OpponentModel>>) -> Self {
        self.model = model;
        self
    }

    /// The negotiation domain.
    #[must_use]
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// The configuration the engine was built with.
    #[must_use]
    pub const fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Session state.
    #[must_use]
    pub const fn session(&self) -> &NegotiationSession {
        &self.session
    }

    /// The offering policy.
    #[must_use]
    pub fn offering(&self) -> &OfferingPolicy {
        &self.offering
    }

    /// The acceptance policy.
    #[must_use]
    pub const fn acceptance(&self) -> &AcceptancePolicy {
        &self.acceptance
    }

    /// The opponent model, if modeling is enabled.
    #[must_use]
    pub fn opponent_model(&self) -> Option<&dyn OpponentModel> {
        self.model.as_deref()
    }

    /// Own utility of `outcome`.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Core` if the outcome does not fit the domain.
    pub fn utility_of(&self, outcome: &Outcome) -> Result<f64, AgentError> {
        Ok(self.utility.utility(outcome)?)
    }

    /// Proposes the opening bid and records it.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::SessionClosed` once the session ended.
    pub fn opening_bid(&mut self) -> Result<BidDetails, AgentError> {
        self.guarded(|engine| {
            let bid = engine.offering.opening_bid()?;
            engine.session.record_own_offer(bid.clone())?;
            debug!(utility = bid.my_utility, outcome = %bid.outcome, "opening bid");
            Ok(bid)
        })
    }

    /// Records an opponent offer made at time `t` and lets the opponent
    /// model learn from it.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::InvalidTime` if `t` runs backwards and
    /// `AgentError::Core` if the outcome does not fit the domain. Both abort
    /// the session.
    pub fn receive_offer(&mut self, outcome: Outcome, t: f64) -> Result<(), AgentError> {
        self.guarded(|engine| {
            engine.session.advance_to(t)?;
            let my_utility = engine.utility.utility(&outcome)?;
            engine
                .session
                .record_opponent_offer(BidDetails::new(outcome, my_utility, t))?;

            if engine.offering.selector().can_update(t) {
                if let Some(model) = engine.model.as_deref_mut() {
                    model.update(engine.session.opponent_history(), t);
                }
            }
            debug!(
                t,
                utility = my_utility,
                offers = engine.session.opponent_history().len(),
                "received opponent offer"
            );
            Ok(())
        })
    }

    /// Chooses this round's action at time `t`.
    ///
    /// Without an opponent offer to consider, the planned bid is offered.
    /// Otherwise the acceptance policy decides; on rejection the bid it
    /// compared against is offered.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::SessionClosed` once the session ended, or any
    /// fatal error raised while deciding (which aborts the session).
    pub fn respond(&mut self, t: f64) -> Result<Action, AgentError> {
        self.guarded(|engine| {
            engine.session.advance_to(t)?;
            let model = engine.model.as_deref();

            let Some(incoming) = engine.session.opponent_history().last().cloned() else {
                let bid = engine.offering.next_bid(t, model)?;
                engine.session.record_own_offer(bid.clone())?;
                return Ok(Action::Offer(bid));
            };

            let verdict = engine.acceptance.decide(&incoming, t, model)?;
            if verdict.decision.is_accept() {
                engine.session.agree(incoming.clone())?;
                info!(
                    session = %engine.session.id,
                    t,
                    utility = incoming.my_utility,
                    rule = %verdict.rule,
                    "accepted opponent offer"
                );
                return Ok(Action::Accept(incoming));
            }

            let bid = match verdict.planned {
                Some(bid) => bid,
                None => engine.offering.next_bid(t, model)?,
            };
            engine.session.record_own_offer(bid.clone())?;
            Ok(Action::Offer(bid))
        })
    }

    /// Closes the session on the opponent accepting our latest offer.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::DegenerateInput` if we never made an offer.
    pub fn confirm_agreement(&mut self) -> Result<BidDetails, AgentError> {
        self.guarded(|engine| {
            let Some(bid) = engine.session.own_history().last().cloned() else {
                return Err(AgentError::DegenerateInput(
                    "opponent accepted before any offer was made".to_string(),
                ));
            };
            engine.session.agree(bid.clone())?;
            info!(
                session = %engine.session.id,
                utility = bid.my_utility,
                "opponent accepted our offer"
            );
            Ok(bid)
        })
    }

    /// Runs `op` on an active session, aborting the session if it fails
    /// fatally.
    fn guarded<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, AgentError>,
    ) -> Result<T, AgentError> {
        if !self.session.is_active() {
            return Err(AgentError::SessionClosed);
        }
        let result = op(self);
        if let Err(error) = &result {
            if error.is_fatal() && self.session.is_active() {
                warn!(session = %self.session.id, %error, "aborting negotiation session");
                self.session.abort();
            }
        }
        result
    }
}
