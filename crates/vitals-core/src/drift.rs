use crate::error::CoreError;
use rand::RngCore;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Volatility and clamp range for one bounded random walk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftParams {
    pub volatility: f64,
    pub clamp_min: f64,
    pub clamp_max: f64,
}

impl DriftParams {
    /// Walk clamped symmetrically to `[-bound, bound]`.
    pub const fn symmetric(volatility: f64, bound: f64) -> Self {
        Self {
            volatility,
            clamp_min: -bound,
            clamp_max: bound,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.volatility.is_finite() || self.volatility < 0.0 {
            return Err(CoreError::InvalidDrift(format!(
                "volatility must be finite and >= 0, got {}",
                self.volatility
            )));
        }
        if !self.clamp_min.is_finite() || !self.clamp_max.is_finite() {
            return Err(CoreError::InvalidDrift("clamp bounds must be finite".into()));
        }
        // The walk starts at 0.0, so the range has to contain it.
        if self.clamp_min > 0.0 || self.clamp_max < 0.0 {
            return Err(CoreError::InvalidDrift(format!(
                "clamp range [{}, {}] must contain 0",
                self.clamp_min, self.clamp_max
            )));
        }
        Ok(())
    }
}

/// Bounded Gaussian random walk owned by a single (patient, channel) pair.
#[derive(Debug, Clone)]
pub struct DriftGenerator {
    params: DriftParams,
    noise: Normal<f64>,
    state: f64,
}

impl DriftGenerator {
    pub fn new(params: DriftParams) -> Result<Self, CoreError> {
        params.validate()?;
        let noise = Normal::new(0.0, params.volatility)
            .map_err(|e| CoreError::InvalidDrift(e.to_string()))?;
        Ok(Self {
            params,
            noise,
            state: 0.0,
        })
    }

    /// Draw one perturbation and advance the walk.
    pub fn step(&mut self, rng: &mut dyn RngCore) -> f64 {
        let perturbation = self.noise.sample(rng);
        self.step_by(perturbation)
    }

    /// Advance the walk by an explicit perturbation, clamping the result.
    pub fn step_by(&mut self, perturbation: f64) -> f64 {
        let next = self.state + perturbation;
        self.state = if next.is_nan() {
            self.state
        } else {
            next.clamp(self.params.clamp_min, self.params.clamp_max)
        };
        self.state
    }

    pub fn value(&self) -> f64 {
        self.state
    }

    pub fn params(&self) -> &DriftParams {
        &self.params
    }
}
