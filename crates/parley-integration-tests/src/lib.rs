//! Integration test crate for the Parley negotiation engine.
//!
//! This crate exists solely to run tests that span parley-core and
//! parley-agent, including full self-play sessions between two engines.
//! It has no public API - all functionality is in the test modules.

#![forbid(unsafe_code)]
