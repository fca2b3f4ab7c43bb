//! Per-session negotiation state.

use chrono::{DateTime, Utc};
use parley_core::{BidDetails, BidHistory};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AgentError;

/// Unique identifier for a negotiation session.
pub type SessionId = Uuid;

/// Phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Offers are still being exchanged.
    Negotiating,
    /// An offer was accepted.
    Agreed,
    /// The session ended on a fatal error.
    Aborted,
}

/// State of one bilateral negotiation as seen by this agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationSession {
    /// Session ID.
    pub id: SessionId,
    /// When the session started.
    pub started_at: DateTime<Utc>,
    time: f64,
    opponent: BidHistory,
    own: BidHistory,
    phase: SessionPhase,
    agreement: Option<BidDetails>,
}

impl Default for NegotiationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl NegotiationSession {
    /// Starts a new session at time 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            time: 0.0,
            opponent: BidHistory::new(),
            own: BidHistory::new(),
            phase: SessionPhase::Negotiating,
            agreement: None,
        }
    }

    /// Current normalized time.
    #[must_use]
    pub const fn time(&self) -> f64 {
        self.time
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Offers received from the opponent, oldest first.
    #[must_use]
    pub const fn opponent_history(&self) -> &BidHistory {
        &self.opponent
    }

    /// Offers this agent made, oldest first.
    #[must_use]
    pub const fn own_history(&self) -> &BidHistory {
        &self.own
    }

    /// The agreed outcome, once there is one.
    #[must_use]
    pub const fn agreement(&self) -> Option<&BidDetails> {
        self.agreement.as_ref()
    }

    /// Returns true while offers are still being exchanged.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Negotiating
    }

    /// Moves the clock to `t`.
    ///
    /// Time may stay put (several events per round) and may run past 1.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::SessionClosed` if the session ended and
    /// `AgentError::InvalidTime` if `t` is not finite, negative, or earlier
    /// than the current time.
    pub fn advance_to(&mut self, t: f64) -> Result<(), AgentError> {
        self.ensure_active()?;
        if !t.is_finite() || t < 0.0 || t < self.time {
            return Err(AgentError::InvalidTime(t));
        }
        self.time = t;
        Ok(())
    }

    /// Records an offer received from the opponent.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::SessionClosed` if the session ended.
    pub fn record_opponent_offer(&mut self, bid: BidDetails) -> Result<(), AgentError> {
        self.ensure_active()?;
        self.opponent.push(bid);
        Ok(())
    }

    /// Records an offer this agent made.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::SessionClosed` if the session ended.
    pub fn record_own_offer(&mut self, bid: BidDetails) -> Result<(), AgentError> {
        self.ensure_active()?;
        self.own.push(bid);
        Ok(())
    }

    /// Ends the session in agreement on `bid`.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::SessionClosed` if the session already ended.
    pub fn agree(&mut self, bid: BidDetails) -> Result<(), AgentError> {
        self.ensure_active()?;
        self.agreement = Some(bid);
        self.phase = SessionPhase::Agreed;
        Ok(())
    }

    /// Ends the session without agreement. Has no effect once agreed.
    pub fn abort(&mut self) {
        if self.phase == SessionPhase::Negotiating {
            self.phase = SessionPhase::Aborted;
        }
    }

    fn ensure_active(&self) -> Result<(), AgentError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(AgentError::SessionClosed)
        }
    }
}
