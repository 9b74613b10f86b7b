//! Exhaustive search on a regular grid

use crate::objective::Objective;
use crate::optimum::OptimizationResult;
use crate::parameter_space::ParameterSpace;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Largest grid that will be evaluated.
const MAX_GRID_POINTS: usize = 1_000_000;

/// Evaluate the objective at every node of a regular grid over the bounds.
///
/// Nodes include both bounds of every dimension. With one point per
/// dimension the grid is the midpoint of the space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSearch {
    /// default: 5
    pub points_per_dimension: usize,
}

impl Default for GridSearch {
    fn default() -> Self {
        Self {
            points_per_dimension: 5,
        }
    }
}

impl GridSearch {
    pub fn new(points_per_dimension: usize) -> Self {
        Self { points_per_dimension }
    }

    fn axis(&self, lower: f64, upper: f64) -> Vec<f64> {
        let n = self.points_per_dimension;
        if n == 1 {
            return vec![0.5 * (lower + upper)];
        }
        (0..n)
            .map(|i| lower + (upper - lower) * i as f64 / (n - 1) as f64)
            .collect()
    }

    /// All grid nodes, with the last dimension varying fastest.
    pub fn nodes(&self, space: &ParameterSpace) -> Result<Vec<Vec<f64>>> {
        if self.points_per_dimension == 0 {
            return Err(Error::InvalidParameter(
                "points_per_dimension must be at least 1".to_string(),
            ));
        }
        if space.is_empty() {
            return Err(Error::EmptyProblem("parameters to search".to_string()));
        }
        let total = u32::try_from(space.len())
            .ok()
            .and_then(|d| self.points_per_dimension.checked_pow(d))
            .filter(|total| *total <= MAX_GRID_POINTS)
            .ok_or_else(|| {
                Error::InvalidParameter(format!(
                    "grid of {}^{} points exceeds {}",
                    self.points_per_dimension,
                    space.len(),
                    MAX_GRID_POINTS
                ))
            })?;

        let axes: Vec<Vec<f64>> = space
            .bounds()
            .iter()
            .map(|b| self.axis(b.lower, b.upper))
            .collect();

        let mut nodes = Vec::with_capacity(total);
        for mut index in 0..total {
            let mut node = vec![0.0; axes.len()];
            for (j, axis) in axes.iter().enumerate().rev() {
                node[j] = axis[index % axis.len()];
                index /= axis.len();
            }
            nodes.push(node);
        }
        Ok(nodes)
    }

    pub fn minimize<O: Objective>(&self, objective: &O, space: &ParameterSpace) -> Result<OptimizationResult> {
        if objective.dimension() != space.len() {
            return Err(Error::DimensionMismatch {
                expected: objective.dimension(),
                got: space.len(),
            });
        }
        let nodes = self.nodes(space)?;
        info!(points = nodes.len(), "Grid search started");
        let values = objective.evaluate_batch(&nodes);

        // first node wins ties
        let (best, value) = values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
                Some((_, bv)) if bv <= v => best,
                _ => Some((i, v)),
            })
            .ok_or(Error::NoFiniteObjective(nodes.len()))?;

        info!(evaluations = nodes.len(), best = value, "Grid search complete");
        Ok(OptimizationResult {
            x: nodes[best].clone(),
            value,
            evaluations: nodes.len(),
            iterations: 1,
            converged: true,
            message: format!("evaluated {} grid points", nodes.len()),
        })
    }
}
