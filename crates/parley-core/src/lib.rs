//! # parley-core
//!
//! Negotiation primitives shared by the Parley decision engine.
//!
//! This crate provides:
//!
//! - [`Domain`] - Discrete multi-issue negotiation domain
//! - [`Outcome`] - One complete assignment of values to issues (a bid)
//! - [`AdditiveUtilitySpace`] - Weighted-issue utility function
//! - [`SortedOutcomeSpace`] - Outcome catalog sorted by own utility
//! - [`BidHistory`] - Append-only log of offers made in a session
//!
//! ## Example
//!
//! ```rust
//! use parley_core::{AdditiveUtilitySpace, Domain, Issue, OutcomeCatalog, SortedOutcomeSpace};
//!
//! let domain = Domain::new(vec![
//!     Issue::new(1, "price", ["low", "high"]).unwrap(),
//!     Issue::new(2, "delivery", ["fast", "slow"]).unwrap(),
//! ])
//! .unwrap();
//!
//! let utility = AdditiveUtilitySpace::builder(&domain)
//!     .weight(1, 0.6)
//!     .evaluation(1, "low", 1.0)
//!     .evaluation(1, "high", 0.0)
//!     .build()
//!     .unwrap();
//!
//! let space = SortedOutcomeSpace::new(&domain, &utility).unwrap();
//! assert_eq!(space.bids().len(), 4);
//! let best = space.max_bid().map(|b| b.my_utility);
//! assert!(best.is_some_and(|u| (u - 1.0).abs() < 1e-9));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod domain;
pub mod error;
pub mod history;
pub mod outcome_space;
pub mod utility;

pub use domain::{Domain, Issue, IssueId, Outcome, Value};
pub use error::CoreError;
pub use history::BidHistory;
pub use outcome_space::{BidDetails, OutcomeCatalog, SortedOutcomeSpace, MAX_OUTCOMES};
pub use utility::{AdditiveUtilitySpace, AdditiveUtilitySpaceBuilder, UtilityFunction};
