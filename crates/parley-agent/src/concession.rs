//! Time-dependent concession curve.
//!
//! The curve maps normalized time `t ∈ [0, 1]` to a concession fraction
//! `f(t)`, and from there to the self utility the agent aims for:
//!
//! ```text
//! f(t)      = k + (1 - k) * t^(1/e)                  before the turning point
//! f(t)      = linear from (t_a, f(t_a)) to (1, 1)    after it
//! target(t) = Pmin + (Pmax - Pmin) * (1 - f(t))
//! ```
//!
//! The turning point `t_a` is where the power segment first reaches
//! `1 - alpha`. It is computed once from the parameters, so the linear
//! segment is the same line in every round.

use parley_core::OutcomeCatalog;
use serde::{Deserialize, Serialize};

use crate::config::ConcessionParams;
use crate::AgentError;

/// Start of the linear segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurningPoint {
    /// Time at which the linear segment starts.
    pub time: f64,
    /// Concession fraction at that time.
    pub shape: f64,
}

/// Concession curve of one negotiation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcessionCurve {
    k: f64,
    e: f64,
    alpha: f64,
    p_min: f64,
    p_max: f64,
    turning_point: Option<TurningPoint>,
}

impl ConcessionCurve {
    /// Creates a curve over the utility range `[p_min, p_max]`.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Configuration` if the parameters are out of range
    /// or `p_min > p_max`.
    pub fn new(params: &ConcessionParams, p_min: f64, p_max: f64) -> Result<Self, AgentError> {
        params.validate()?;
        if !(p_min.is_finite() && p_max.is_finite()) || p_min > p_max {
            return Err(AgentError::Configuration(format!(
                "invalid utility range [{p_min}, {p_max}]"
            )));
        }
        Ok(Self {
            k: params.k,
            e: params.e,
            alpha: params.alpha,
            p_min,
            p_max,
            turning_point: Self::turning_point_for(params.k, params.e, params.alpha),
        })
    }

    /// Creates a curve whose utility range spans the catalog, unless
    /// `min`/`max` override it.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::DegenerateInput` for an empty catalog and
    /// `AgentError::Configuration` for invalid parameters.
    pub fn from_catalog(
        params: &ConcessionParams,
        catalog: &dyn OutcomeCatalog,
    ) -> Result<Self, AgentError> {
        let (Some(best), Some(worst)) = (catalog.max_bid(), catalog.min_bid()) else {
            return Err(AgentError::DegenerateInput("outcome catalog is empty".to_string()));
        };
        let p_min = params.min.unwrap_or(worst.my_utility);
        let p_max = params.max.unwrap_or(best.my_utility);
        Self::new(params, p_min, p_max)
    }

    fn turning_point_for(k: f64, e: f64, alpha: f64) -> Option<TurningPoint> {
        if e == 0.0 || alpha <= 0.0 {
            return None;
        }
        let threshold = 1.0 - alpha;
        if k >= threshold {
            return Some(TurningPoint { time: 0.0, shape: k });
        }
        // invert k + (1 - k) * t^(1/e) = threshold
        let time = ((threshold - k) / (1.0 - k)).powf(e);
        if time >= 1.0 {
            return None;
        }
        if time <= 0.0 {
            return Some(TurningPoint { time: 0.0, shape: k });
        }
        Some(TurningPoint {
            time,
            shape: threshold,
        })
    }

    /// Concession fraction at time `t` (clamped into `[0, 1]`).
    #[must_use]
    pub fn shape(&self, t: f64) -> f64 {
        if self.e == 0.0 {
            return self.k;
        }
        let t = t.clamp(0.0, 1.0);
        match self.turning_point {
            Some(tp) if t >= tp.time => tp.shape + (1.0 - tp.shape) * (t - tp.time) / (1.0 - tp.time),
            _ => self.k + (1.0 - self.k) * t.powf(1.0 / self.e),
        }
    }

    /// Self utility the agent aims for at time `t`.
    #[must_use]
    pub fn target(&self, t: f64) -> f64 {
        self.p_min + (self.p_max - self.p_min) * (1.0 - self.shape(t))
    }

    /// Where the linear finish starts, if the curve has one.
    #[must_use]
    pub const fn turning_point(&self) -> Option<TurningPoint> {
        self.turning_point
    }

    /// Minimum self utility of the range.
    #[must_use]
    pub const fn p_min(&self) -> f64 {
        self.p_min
    }

    /// Maximum self utility of the range.
    #[must_use]
    pub const fn p_max(&self) -> f64 {
        self.p_max
    }
}
