//! Engine configuration

use crate::error::{OptimizerError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use std::time::Duration;

/// Annual ISA subscription limit
pub const DEFAULT_ISA_ANNUAL_ALLOWANCE: f64 = 20_000.0;

/// Objective weight per pound of unused ISA allowance
pub const DEFAULT_ISA_HEADROOM_WEIGHT: f64 = 2e-7;

/// Solved amounts at or below this are treated as numerical noise
pub const DEFAULT_ALLOCATION_TOLERANCE: f64 = 1e-6;

/// Upper bound on how far the headroom tie-break may move the objective.
///
/// The term contributes at most `isa_headroom_weight * isa_annual_allowance`,
/// which has to stay below half a penny so it can only separate allocations
/// whose real interest is identical.
pub const MAX_TIE_BREAK_DISTORTION: f64 = 0.005;

/// Tunables for a single optimizer instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// ISA subscription cap for the tax year
    pub isa_annual_allowance: f64,

    /// Tie-break weight on remaining ISA allowance (epsilon in the objective).
    /// Positive weights favour leaving ISA allowance unused when returns tie.
    pub isa_headroom_weight: f64,

    /// Floor below which a solved amount is dropped from the allocation
    pub allocation_tolerance: f64,

    /// Optional deadline for the solver call, in milliseconds
    pub solve_timeout_ms: Option<u64>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            isa_annual_allowance: DEFAULT_ISA_ANNUAL_ALLOWANCE,
            isa_headroom_weight: DEFAULT_ISA_HEADROOM_WEIGHT,
            allocation_tolerance: DEFAULT_ALLOCATION_TOLERANCE,
            solve_timeout_ms: None,
        }
    }
}

impl OptimizerConfig {
    /// Load a config from a JSON file; missing fields take their defaults
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the solver deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.solve_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn solve_timeout(&self) -> Option<Duration> {
        self.solve_timeout_ms.map(Duration::from_millis)
    }

    /// Largest change the tie-break term can make to the objective
    pub fn max_tie_break_distortion(&self) -> f64 {
        self.isa_headroom_weight * self.isa_annual_allowance
    }

    pub fn validate(&self) -> Result<()> {
        if !self.isa_annual_allowance.is_finite() || self.isa_annual_allowance < 0.0 {
            return Err(OptimizerError::InvalidConfig(format!(
                "isa_annual_allowance must be a non-negative amount, got {}",
                self.isa_annual_allowance
            )));
        }
        if !self.isa_headroom_weight.is_finite() || self.isa_headroom_weight < 0.0 {
            return Err(OptimizerError::InvalidConfig(format!(
                "isa_headroom_weight must be >= 0, got {}",
                self.isa_headroom_weight
            )));
        }
        if self.max_tie_break_distortion() > MAX_TIE_BREAK_DISTORTION {
            return Err(OptimizerError::InvalidConfig(format!(
                "isa_headroom_weight {} can move the objective by {:.6}, limit is {}",
                self.isa_headroom_weight,
                self.max_tie_break_distortion(),
                MAX_TIE_BREAK_DISTORTION
            )));
        }
        if !self.allocation_tolerance.is_finite() || self.allocation_tolerance < 0.0 {
            return Err(OptimizerError::InvalidConfig(format!(
                "allocation_tolerance must be >= 0, got {}",
                self.allocation_tolerance
            )));
        }
        if self.solve_timeout_ms == Some(0) {
            return Err(OptimizerError::InvalidConfig(
                "solve_timeout_ms must be > 0 when set".to_string(),
            ));
        }
        Ok(())
    }
}
