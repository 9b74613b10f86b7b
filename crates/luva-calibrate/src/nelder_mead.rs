//! Bounded Nelder–Mead simplex search
//!
//! The simplex lives in the unit cube of the parameter space, so tolerances
//! are fractions of each bound's width. Trial points outside the cube are
//! clamped back onto it.

use crate::objective::Objective;
use crate::optimum::OptimizationResult;
use crate::parameter_space::ParameterSpace;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NelderMead {
    /// default: 200 × dimension
    pub max_iterations: Option<usize>,
    /// default: 200 × dimension
    pub max_evaluations: Option<usize>,
    /// Largest vertex distance from the best vertex at convergence, in unit-cube coordinates
    /// default: 1e-4
    pub xatol: f64,
    /// Largest objective difference from the best vertex at convergence
    /// default: 1e-4
    pub fatol: f64,
    /// Edge length of the initial simplex, in unit-cube coordinates
    /// default: 0.05
    pub initial_step: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iterations: None,
            max_evaluations: None,
            xatol: 1e-4,
            fatol: 1e-4,
            initial_step: 0.05,
        }
    }
}

fn clamp_unit(u: &mut [f64]) {
    for v in u.iter_mut() {
        *v = v.clamp(0.0, 1.0);
    }
}

/// `a + t (b - a)`, clamped to the unit cube.
fn along(a: &[f64], b: &[f64], t: f64) -> Vec<f64> {
    let mut point: Vec<f64> = a.iter().zip(b).map(|(a, b)| a + t * (b - a)).collect();
    clamp_unit(&mut point);
    point
}

impl NelderMead {
    fn check(&self) -> Result<()> {
        if !(self.xatol >= 0.0 && self.fatol >= 0.0) {
            return Err(Error::InvalidParameter("tolerances must be non-negative".to_string()));
        }
        if !(self.initial_step > 0.0 && self.initial_step <= 1.0) {
            return Err(Error::InvalidParameter(format!(
                "initial_step must be in (0, 1], got {}",
                self.initial_step
            )));
        }
        Ok(())
    }

    /// Minimise `objective` starting from `x0`.
    ///
    /// `x0` is clipped to the bounds.
    pub fn minimize<O: Objective>(
        &self,
        objective: &O,
        space: &ParameterSpace,
        x0: &[f64],
    ) -> Result<OptimizationResult> {
        self.check()?;
        space.check_dimension(x0)?;
        if objective.dimension() != space.len() {
            return Err(Error::DimensionMismatch {
                expected: objective.dimension(),
                got: space.len(),
            });
        }
        if space.is_empty() {
            return Err(Error::EmptyProblem("parameters to search".to_string()));
        }

        let n = space.len();
        let max_iterations = self.max_iterations.unwrap_or(200 * n);
        let max_evaluations = self.max_evaluations.unwrap_or(200 * n);
        let f = |u: &[f64]| objective.evaluate(&space.from_unit(u));

        // Initial simplex: step away from the start along each axis, stepping
        // inwards when the start sits on the upper bound.
        let start = space.to_unit(&space.clip(x0));
        let mut simplex: Vec<Vec<f64>> = vec![start.clone()];
        for i in 0..n {
            let mut vertex = start.clone();
            vertex[i] = if vertex[i] + self.initial_step <= 1.0 {
                vertex[i] + self.initial_step
            } else {
                vertex[i] - self.initial_step
            };
            simplex.push(vertex);
        }
        let mut values = objective.evaluate_batch(
            &simplex.iter().map(|u| space.from_unit(u)).collect::<Vec<_>>(),
        );
        let mut evaluations = n + 1;
        info!(dimension = n, start = ?x0, "Nelder-Mead started");
        let mut iterations = 0;
        let mut converged = false;

        loop {
            // sort vertices by value, best first
            let mut order: Vec<usize> = (0..=n).collect();
            order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
            simplex = order.iter().map(|&i| simplex[i].clone()).collect();
            values = order.iter().map(|&i| values[i]).collect();

            let x_spread = simplex[1..]
                .iter()
                .flat_map(|v| v.iter().zip(&simplex[0]).map(|(a, b)| (a - b).abs()))
                .fold(0.0, f64::max);
            let f_spread = values[1..].iter().map(|v| (v - values[0]).abs()).fold(0.0, f64::max);
            if x_spread <= self.xatol && f_spread <= self.fatol {
                converged = true;
                break;
            }
            if iterations >= max_iterations || evaluations >= max_evaluations {
                break;
            }
            iterations += 1;

            let centroid: Vec<f64> = (0..n)
                .map(|j| simplex[..n].iter().map(|v| v[j]).sum::<f64>() / n as f64)
                .collect();
            let worst = simplex[n].clone();

            let reflected = along(&centroid, &worst, -REFLECTION);
            let f_reflected = f(&reflected);
            evaluations += 1;

            if f_reflected < values[0] {
                let expanded = along(&centroid, &worst, -REFLECTION * EXPANSION);
                let f_expanded = f(&expanded);
                evaluations += 1;
                if f_expanded < f_reflected {
                    simplex[n] = expanded;
                    values[n] = f_expanded;
                } else {
                    simplex[n] = reflected;
                    values[n] = f_reflected;
                }
                continue;
            }
            if f_reflected < values[n - 1] {
                simplex[n] = reflected;
                values[n] = f_reflected;
                continue;
            }

            // contract towards the better of the reflected and worst points
            let (contracted, accept_below) = if f_reflected < values[n] {
                (along(&centroid, &worst, -REFLECTION * CONTRACTION), f_reflected)
            } else {
                (along(&centroid, &worst, CONTRACTION), values[n])
            };
            let f_contracted = f(&contracted);
            evaluations += 1;
            if f_contracted <= accept_below {
                simplex[n] = contracted;
                values[n] = f_contracted;
                continue;
            }

            let best = simplex[0].clone();
            for vertex in simplex.iter_mut().skip(1) {
                *vertex = along(&best, vertex, SHRINK);
            }
            let shrunk = objective.evaluate_batch(
                &simplex[1..].iter().map(|u| space.from_unit(u)).collect::<Vec<_>>(),
            );
            values[1..].copy_from_slice(&shrunk);
            evaluations += n;
            debug!(iteration = iterations, best = values[0], "Simplex shrunk");
        }

        let message = if converged {
            "simplex converged".to_string()
        } else if iterations >= max_iterations {
            "maximum iterations reached".to_string()
        } else {
            "maximum evaluations reached".to_string()
        };
        info!(iterations, evaluations, best = values[0], converged, "Nelder-Mead finished");

        Ok(OptimizationResult {
            x: space.from_unit(&simplex[0]),
            value: values[0],
            evaluations,
            iterations,
            converged,
            message,
        })
    }
}
