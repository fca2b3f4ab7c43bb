//! # parley-agent
//!
//! Per-round decision engine for a bilateral negotiation agent.
//!
//! This crate provides:
//!
//! - **Concession curve** - [`ConcessionCurve`] mapping elapsed time to a target utility
//! - **Opponent model** - [`FrequencyModel`] learning the counterpart's preferences from its offers
//! - **Bid selection** - [`OpponentAwareBidSelector`] choosing among equally good bids
//! - **Offering** - [`OfferingPolicy`] producing the next concrete offer
//! - **Acceptance** - [`AcceptancePolicy`] deciding whether to take the opponent's offer
//! - **Engine** - [`NegotiationEngine`] wiring the above into one session
//!
//! ## Example
//!
//! ```rust
//! use parley_agent::{Action, NegotiationEngine, StrategyConfig};
//! use parley_core::{AdditiveUtilitySpace, Domain, Issue};
//!
//! let domain = Domain::new(vec![
//!     Issue::new(1, "price", ["low", "mid", "high"]).unwrap(),
//!     Issue::new(2, "delivery", ["fast", "slow"]).unwrap(),
//! ])
//! .unwrap();
//! let utility = AdditiveUtilitySpace::builder(&domain)
//!     .evaluation(1, "low", 1.0)
//!     .evaluation(1, "mid", 0.5)
//!     .evaluation(1, "high", 0.0)
//!     .evaluation(2, "slow", 0.0)
//!     .build()
//!     .unwrap();
//! let offer = domain.outcome([(1, "high"), (2, "slow")]).unwrap();
//!
//! let mut engine =
//!     NegotiationEngine::with_sorted_space(domain, utility, &StrategyConfig::default()).unwrap();
//! engine.opening_bid().unwrap();
//!
//! // the opponent's first offer is worthless to us
//! engine.receive_offer(offer, 0.1).unwrap();
//! assert!(matches!(engine.respond(0.1).unwrap(), Action::Offer(_)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod acceptance;
pub mod concession;
pub mod config;
pub mod engine;
pub mod error;
pub mod offering;
pub mod opponent_model;
pub mod selector;
pub mod session;

pub use error::AgentError;

// Re-exports for convenience
pub use acceptance::{AcceptancePolicy, AcceptanceRule, Decision, Verdict};
pub use concession::{ConcessionCurve, TurningPoint};
pub use config::{AcceptanceParams, ConcessionParams, ModelParams, OfferingParams, Parameters};
pub use config::{ReservationMode, SelectorParams, StrategyConfig};
pub use engine::{Action, NegotiationEngine};
pub use offering::OfferingPolicy;
pub use opponent_model::{FrequencyModel, OpponentModel};
pub use selector::OpponentAwareBidSelector;
pub use session::{NegotiationSession, SessionId, SessionPhase};
