//! Run configuration and cost-model selection.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

/// Default memory budget handed to the engines, in megabytes.
pub const DEFAULT_MEMORY_MB: usize = 500;

/// Coefficients of the walking-energy cost model.
///
/// `a` weights horizontal distance, `b` uphill climb, `c` moderate descent and
/// `d` steep descent. Descents steeper than `slope_factor` (rise over run) count
/// as steep. `lambda` scales the friction cost added to the walking time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WalkingCoefficients {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub lambda: f64,
    pub slope_factor: f64,
}

impl Default for WalkingCoefficients {
    fn default() -> Self {
        Self {
            a: 0.72,
            b: 6.0,
            c: 1.9998,
            d: -1.9998,
            lambda: 1.0,
            slope_factor: -0.2125,
        }
    }
}

impl WalkingCoefficients {
    fn validate(&self) -> Result<()> {
        let values = [
            ("a", self.a),
            ("b", self.b),
            ("c", self.c),
            ("d", self.d),
            ("lambda", self.lambda),
            ("slope_factor", self.slope_factor),
        ];
        for (name, value) in values {
            if !value.is_finite() {
                return Err(Error::InvalidConfiguration {
                    message: format!("walking coefficient {name} must be finite, got {value}"),
                });
            }
        }
        Ok(())
    }
}

/// Cost model actually used by the cost-field engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum CostModel {
    /// Friction-only, direction-independent accumulation.
    Isotropic,
    /// Anisotropic walking energy over an elevation model.
    Walking(WalkingCoefficients),
}

impl CostModel {
    pub fn is_walking(&self) -> bool {
        matches!(self, CostModel::Walking(_))
    }
}

impl fmt::Display for CostModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            CostModel::Isotropic => "cost",
            CostModel::Walking(_) => "walk",
        };
        f.write_str(value)
    }
}

/// Non-fatal conditions surfaced alongside a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunWarning {
    /// The walking model was requested without an elevation raster; the run
    /// fell back to the plain cost model.
    WalkingModelWithoutElevation,
}

impl fmt::Display for RunWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunWarning::WalkingModelWithoutElevation => f.write_str(
                "no elevation raster map (DEM) supplied for the walking model; using the plain cost model",
            ),
        }
    }
}

/// Parameters shared by every iteration of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfig {
    /// Cost cutoff; `0` leaves accumulation unbounded.
    pub max_cost: u64,
    /// Memory budget for the engines in megabytes.
    pub memory_mb: usize,
    /// Slower, more accurate propagation using knight's moves.
    pub knight_moves: bool,
    /// Use the walking-energy model when elevation is available.
    pub walking: bool,
    pub coefficients: WalkingCoefficients,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_cost: 0,
            memory_mb: DEFAULT_MEMORY_MB,
            knight_moves: false,
            walking: false,
            coefficients: WalkingCoefficients::default(),
        }
    }
}

impl RunConfig {
    /// Validate the configuration once, before any engine is invoked.
    pub fn validate(&self) -> Result<()> {
        if self.memory_mb == 0 {
            return Err(Error::InvalidConfiguration {
                message: "memory budget must be at least 1 MB".to_string(),
            });
        }
        if self.walking {
            self.coefficients.validate()?;
        }
        Ok(())
    }

    /// Cost cutoff as an optional limit.
    pub fn cost_limit(&self) -> Option<f64> {
        (self.max_cost > 0).then_some(self.max_cost as f64)
    }

    /// Pick the cost model, falling back to the plain model (with a warning)
    /// when walking was requested but no elevation raster is available.
    pub fn resolve_model(&self, has_elevation: bool) -> (CostModel, Option<RunWarning>) {
        match (self.walking, has_elevation) {
            (true, true) => (CostModel::Walking(self.coefficients), None),
            (true, false) => (
                CostModel::Isotropic,
                Some(RunWarning::WalkingModelWithoutElevation),
            ),
            (false, _) => (CostModel::Isotropic, None),
        }
    }
}
