use crate::parameter_space::ParameterSpace;
use crate::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Best point found by an optimiser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Best point, in the units of the parameter space
    pub x: Vec<f64>,
    /// Objective value at `x`
    pub value: f64,
    /// Number of objective evaluations
    pub evaluations: usize,
    /// Iterations or generations completed
    pub iterations: usize,
    /// Whether the convergence criterion was met before the budget ran out
    pub converged: bool,
    pub message: String,
}

impl OptimizationResult {
    /// The best point as named coefficient overrides.
    pub fn named(&self, space: &ParameterSpace) -> Result<IndexMap<String, f64>> {
        space.to_overrides(&self.x)
    }
}
