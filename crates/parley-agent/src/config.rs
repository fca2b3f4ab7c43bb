//! Strategy configuration.
//!
//! Every option has a default, so [`StrategyConfig::default`] is a runnable
//! agent. Components can also be configured from flat parameter maps
//! (`"e" → 0.2`, `"roundToUpdate" → 4.0`, ...); in that form the concession
//! parameters `e` and `alpha`/`a` are mandatory.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::AgentError;

/// Flat parameter map for one component.
pub type Parameters = BTreeMap<String, f64>;

fn param(params: &Parameters, key: &str) -> Option<f64> {
    params.get(key).copied()
}

fn count_param(params: &Parameters, key: &str, default: usize) -> Result<usize, AgentError> {
    match param(params, key) {
        None => Ok(default),
        Some(v) if v.is_finite() && v >= 0.0 => Ok(v.trunc() as usize),
        Some(v) => Err(AgentError::Configuration(format!(
            "{key} must be a non-negative count, got {v}"
        ))),
    }
}

fn check_unit(name: &str, value: f64) -> Result<(), AgentError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(AgentError::Configuration(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

fn check_finite(name: &str, value: f64) -> Result<(), AgentError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(AgentError::Configuration(format!("{name} must be finite, got {value}")))
    }
}

/// Parameters of the time-dependent concession curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcessionParams {
    /// Initial concession offset, `f(0) = k`.
    pub k: f64,
    /// Concession speed exponent. `0` means never concede.
    pub e: f64,
    /// Share of the utility range conceded on the final linear segment.
    pub alpha: f64,
    /// Overrides the minimum self utility of the catalog.
    pub min: Option<f64>,
    /// Overrides the maximum self utility of the catalog.
    pub max: Option<f64>,
}

impl Default for ConcessionParams {
    fn default() -> Self {
        Self {
            k: 0.2,
            e: 0.2,
            alpha: 0.3,
            min: None,
            max: None,
        }
    }
}

impl ConcessionParams {
    /// Reads concession parameters from a flat map.
    ///
    /// `e` and one of `alpha`/`a` are required; `k` defaults to 0.2.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Configuration` if a required key is missing or
    /// a value is out of range.
    pub fn from_parameters(params: &Parameters) -> Result<Self, AgentError> {
        let (Some(e), Some(alpha)) = (
            param(params, "e"),
            param(params, "alpha").or_else(|| param(params, "a")),
        ) else {
            return Err(AgentError::Configuration(
                "concession speed \"e\" and turning point \"alpha\" (or \"a\") must be set"
                    .to_string(),
            ));
        };
        let parsed = Self {
            k: param(params, "k").unwrap_or(0.2),
            e,
            alpha,
            min: param(params, "min"),
            max: param(params, "max"),
        };
        parsed.validate()?;
        Ok(parsed)
    }

    /// Checks parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Configuration` describing the first bad value.
    pub fn validate(&self) -> Result<(), AgentError> {
        check_unit("k", self.k)?;
        check_unit("alpha", self.alpha)?;
        check_finite("e", self.e)?;
        if self.e < 0.0 {
            return Err(AgentError::Configuration(format!(
                "e must be non-negative, got {}",
                self.e
            )));
        }
        if let Some(min) = self.min {
            check_unit("min", min)?;
        }
        if let Some(max) = self.max {
            check_unit("max", max)?;
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(AgentError::Configuration(format!(
                    "min ({min}) exceeds max ({max})"
                )));
            }
        }
        Ok(())
    }
}

/// Parameters of the acceptance condition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceptanceParams {
    /// Multiplier applied to the opponent offer's utility.
    pub a: f64,
    /// Offset added to the opponent offer's utility.
    pub b: f64,
    /// Time after which any offer is accepted.
    #[serde(alias = "T")]
    pub surrender_time: f64,
}

impl Default for AcceptanceParams {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            surrender_time: 1.0,
        }
    }
}

impl AcceptanceParams {
    /// Reads acceptance parameters (`a`, `b`, `T`) from a flat map.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Configuration` on a non-finite value.
    pub fn from_parameters(params: &Parameters) -> Result<Self, AgentError> {
        let defaults = Self::default();
        let parsed = Self {
            a: param(params, "a").unwrap_or(defaults.a),
            b: param(params, "b").unwrap_or(defaults.b),
            surrender_time: param(params, "T").unwrap_or(defaults.surrender_time),
        };
        parsed.validate()?;
        Ok(parsed)
    }

    /// Checks parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Configuration` on a non-finite value.
    pub fn validate(&self) -> Result<(), AgentError> {
        check_finite("a", self.a)?;
        check_finite("b", self.b)?;
        check_finite("T", self.surrender_time)
    }
}

/// Parameters of the frequency opponent model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Weight shared out to unchanged issues on every update.
    #[serde(alias = "l")]
    pub learning_coefficient: f64,
    /// Score added to a value each time it is observed.
    pub value_addition: u64,
    /// Number of opponent offers required before learning starts.
    #[serde(alias = "roundToUpdate")]
    pub round_to_update: usize,
    /// Number of most recent opponent offers to learn from.
    #[serde(alias = "numberOfRounds")]
    pub number_of_rounds: usize,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            learning_coefficient: 0.2,
            value_addition: 1,
            round_to_update: 4,
            number_of_rounds: 3,
        }
    }
}

impl ModelParams {
    /// Settings that reproduce the classic single-pair frequency model.
    #[must_use]
    pub fn hard_headed() -> Self {
        Self {
            round_to_update: 3,
            number_of_rounds: 2,
            ..Self::default()
        }
    }

    /// Reads model parameters (`l`, `roundToUpdate`, `numberOfRounds`) from
    /// a flat map. Counts are truncated to integers.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Configuration` on a negative or out-of-range value.
    pub fn from_parameters(params: &Parameters) -> Result<Self, AgentError> {
        let defaults = Self::default();
        let parsed = Self {
            learning_coefficient: param(params, "l").unwrap_or(defaults.learning_coefficient),
            value_addition: defaults.value_addition,
            round_to_update: count_param(params, "roundToUpdate", defaults.round_to_update)?,
            number_of_rounds: count_param(params, "numberOfRounds", defaults.number_of_rounds)?,
        };
        parsed.validate()?;
        Ok(parsed)
    }

    /// Checks parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Configuration` describing the first bad value.
    pub fn validate(&self) -> Result<(), AgentError> {
        check_unit("l", self.learning_coefficient)?;
        if self.round_to_update < 1 {
            return Err(AgentError::Configuration(
                "roundToUpdate must be at least 1".to_string(),
            ));
        }
        if self.number_of_rounds < 2 {
            return Err(AgentError::Configuration(format!(
                "numberOfRounds must be at least 2, got {}",
                self.number_of_rounds
            )));
        }
        Ok(())
    }
}

/// How the opponent reservation threshold evolves over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReservationMode {
    /// `r(t) = r0 + t * (1 - r0)`.
    #[default]
    TimeAdjusted,
    /// `r(t) = r0`.
    Constant,
}

/// Parameters of the opponent-aware bid selector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorParams {
    /// The opponent model is only updated while `t < update_threshold`.
    #[serde(alias = "t")]
    pub update_threshold: f64,
    /// Weight of own utility in the combined score.
    #[serde(alias = "w")]
    pub agent_weight: f64,
    /// Base opponent reservation value `r0`.
    #[serde(alias = "r")]
    pub opponent_reservation: f64,
    /// Whether `r0` grows with time.
    pub reservation_mode: ReservationMode,
}

impl Default for SelectorParams {
    fn default() -> Self {
        Self {
            update_threshold: 1.1,
            agent_weight: 0.5,
            opponent_reservation: 0.1,
            reservation_mode: ReservationMode::TimeAdjusted,
        }
    }
}

impl SelectorParams {
    /// The lenient profile: no base reservation value.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            opponent_reservation: 0.0,
            ..Self::default()
        }
    }

    /// Reads selector parameters (`t`, `w`, `r`) from a flat map.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Configuration` on an out-of-range value.
    pub fn from_parameters(params: &Parameters) -> Result<Self, AgentError> {
        let defaults = Self::default();
        let parsed = Self {
            update_threshold: param(params, "t").unwrap_or(defaults.update_threshold),
            agent_weight: param(params, "w").unwrap_or(defaults.agent_weight),
            opponent_reservation: param(params, "r").unwrap_or(defaults.opponent_reservation),
            reservation_mode: defaults.reservation_mode,
        };
        parsed.validate()?;
        Ok(parsed)
    }

    /// Checks parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Configuration` describing the first bad value.
    pub fn validate(&self) -> Result<(), AgentError> {
        check_finite("t", self.update_threshold)?;
        check_unit("w", self.agent_weight)?;
        check_unit("r", self.opponent_reservation)
    }
}

/// Parameters of the offering policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferingParams {
    /// Initial width of the candidate band above the target utility.
    pub band_width: f64,
    /// Amount the band's upper bound grows while it is empty.
    pub band_step: f64,
    /// Consult the opponent model when choosing among candidates.
    pub use_opponent_model: bool,
}

impl Default for OfferingParams {
    fn default() -> Self {
        Self {
            band_width: 0.02,
            band_step: 0.01,
            use_opponent_model: true,
        }
    }
}

impl OfferingParams {
    /// Checks parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Configuration` if a band parameter is not positive.
    pub fn validate(&self) -> Result<(), AgentError> {
        for (name, value) in [("band_width", self.band_width), ("band_step", self.band_step)] {
            check_finite(name, value)?;
            if value <= 0.0 {
                return Err(AgentError::Configuration(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Complete configuration of one negotiation engine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Concession curve parameters.
    pub concession: ConcessionParams,
    /// Acceptance condition parameters.
    pub acceptance: AcceptanceParams,
    /// Opponent model parameters.
    pub model: ModelParams,
    /// Bid selector parameters.
    pub selector: SelectorParams,
    /// Offering policy parameters.
    pub offering: OfferingParams,
}

impl StrategyConfig {
    /// Parses and validates a JSON configuration. Missing fields take their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Configuration` on malformed JSON or invalid values.
    pub fn from_json(json: &str) -> Result<Self, AgentError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| AgentError::Configuration(format!("malformed configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Builds a configuration from one flat parameter map per component.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Configuration` if the concession map lacks `e` or
    /// `alpha`/`a`, or any value is out of range.
    pub fn from_component_parameters(
        offering: &Parameters,
        acceptance: &Parameters,
        model: &Parameters,
        selector: &Parameters,
    ) -> Result<Self, AgentError> {
        Ok(Self {
            concession: ConcessionParams::from_parameters(offering)?,
            acceptance: AcceptanceParams::from_parameters(acceptance)?,
            model: ModelParams::from_parameters(model)?,
            selector: SelectorParams::from_parameters(selector)?,
            offering: OfferingParams::default(),
        })
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns the first `AgentError::Configuration` found.
    pub fn validate(&self) -> Result<(), AgentError> {
        self.concession.validate()?;
        self.acceptance.validate()?;
        self.model.validate()?;
        self.selector.validate()?;
        self.offering.validate()
    }
}
