//! Initial value problem support.
//!
//! Models implement [`IVP`] to expose their right-hand side. [`IVPBuilder`]
//! adapts such a model to [`ode_solvers::System`] and drives the adaptive
//! Dormand–Prince RK 4(5) scheme over a time window. The maximum step is the
//! only mechanism used to resolve discontinuous forcing (lights and UV-A
//! switching on and off); no event detection is performed.

use crate::errors::{LuvaError, LuvaResult};
use crate::{FloatValue, Time};
use is_close::is_close;
use nalgebra::SVector;
use ode_solvers::dopri5::Dopri5;
use ode_solvers::dop_shared::OutputType;
use ode_solvers::System;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Right-hand side of an ODE system.
pub trait IVP<T, S> {
    /// Write the time derivative of `y` at time `t` into `dy_dt`.
    fn calculate_dy_dt(&self, t: T, y: &S, dy_dt: &mut S);
}

/// Options forwarded to the adaptive solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Relative tolerance
    /// default: 1e-3
    pub rtol: FloatValue,

    /// Absolute tolerance
    /// default: 1e-9
    pub atol: FloatValue,

    /// Largest step the solver may take
    /// unit: s
    /// default: 60
    pub max_step: FloatValue,

    /// Initial step. Zero lets the solver pick one.
    /// unit: s
    /// default: 0
    pub initial_step: FloatValue,

    /// Maximum number of steps before the run is abandoned
    /// default: 500000
    pub max_steps: u32,

    /// Number of accepted steps between stiffness checks
    /// default: 1000
    pub stiffness_check_interval: u32,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            rtol: 1e-3,
            atol: 1e-9,
            max_step: 60.0,
            initial_step: 0.0,
            max_steps: 500_000,
            stiffness_check_interval: 1000,
        }
    }
}

impl SolverOptions {
    pub fn validate(&self) -> LuvaResult<()> {
        if !(self.rtol > 0.0 && self.atol > 0.0) {
            return Err(LuvaError::InvalidParameter(format!(
                "solver tolerances must be positive (rtol={}, atol={})",
                self.rtol, self.atol
            )));
        }
        if !(self.max_step > 0.0) || !self.max_step.is_finite() {
            return Err(LuvaError::InvalidParameter(format!(
                "solver max_step must be positive and finite, got {}",
                self.max_step
            )));
        }
        if self.initial_step < 0.0 {
            return Err(LuvaError::InvalidParameter(format!(
                "solver initial_step must not be negative, got {}",
                self.initial_step
            )));
        }
        if self.max_steps == 0 {
            return Err(LuvaError::InvalidParameter(
                "solver max_steps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Work counters reported by the solver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverStats {
    pub evaluations: u32,
    pub accepted_steps: u32,
    pub rejected_steps: u32,
}

/// Accepted solver steps over a window.
#[derive(Debug, Clone)]
pub struct Solution<const N: usize> {
    /// Times of the accepted steps, ending at the window end
    pub times: Vec<Time>,
    /// State at each time in `times`
    pub states: Vec<SVector<FloatValue, N>>,
    pub stats: SolverStats,
}

impl<const N: usize> Solution<N> {
    /// State at the end of the window.
    ///
    /// Fails if the solver stopped short of `t_expected`.
    pub fn last_step(&self, t_expected: Time) -> LuvaResult<&SVector<FloatValue, N>> {
        match (self.times.last(), self.states.last()) {
            (Some(&t), Some(state)) if is_close!(t, t_expected) => Ok(state),
            (Some(&t), Some(_)) => Err(LuvaError::Error(format!(
                "solver stopped at t={} s, expected t={} s",
                t, t_expected
            ))),
            _ => Err(LuvaError::Error("solver produced no output".to_string())),
        }
    }
}

/// Adapts an [`IVP`] to the solver.
pub struct IVPBuilder<C, S> {
    component: Arc<C>,
    y0: S,
}

impl<C, const N: usize> System<Time, SVector<FloatValue, N>> for IVPBuilder<C, SVector<FloatValue, N>>
where
    C: IVP<Time, SVector<FloatValue, N>>,
{
    fn system(&self, t: Time, y: &SVector<FloatValue, N>, dy: &mut SVector<FloatValue, N>) {
        self.component.calculate_dy_dt(t, y, dy);
    }
}

impl<C, const N: usize> IVPBuilder<C, SVector<FloatValue, N>>
where
    C: IVP<Time, SVector<FloatValue, N>>,
{
    pub fn new(component: Arc<C>, y0: SVector<FloatValue, N>) -> Self {
        Self { component, y0 }
    }

    /// Integrate from `t0` to `t1` with the Dormand–Prince scheme.
    ///
    /// Every accepted step is recorded. Solver failures (step budget
    /// exhausted, step size collapse, stiffness) are returned as
    /// [`LuvaError::IntegrationFailed`] rather than panicking so callers can
    /// treat them as "no result".
    pub fn solve(self, t0: Time, t1: Time, options: &SolverOptions) -> LuvaResult<Solution<N>> {
        options.validate()?;
        if !(t1 > t0) {
            return Err(LuvaError::Error(format!(
                "integration window is empty: t0={} s, t1={} s",
                t0, t1
            )));
        }
        if self.y0.iter().any(|v| !v.is_finite()) {
            return Err(LuvaError::InvalidState(format!(
                "initial state is not finite: {:?}",
                self.y0.as_slice()
            )));
        }

        let y0 = self.y0;
        let mut stepper = Dopri5::from_param(
            self,
            t0,
            t1,
            0.0,
            y0,
            options.rtol,
            options.atol,
            0.9,
            0.04,
            0.2,
            10.0,
            options.max_step,
            options.initial_step,
            options.max_steps,
            options.stiffness_check_interval,
            OutputType::Sparse,
        );

        let stats = stepper
            .integrate()
            .map_err(|e| LuvaError::IntegrationFailed {
                t_start: t0,
                t_end: t1,
                reason: e.to_string(),
            })?;
        let stats = SolverStats {
            evaluations: stats.num_eval,
            accepted_steps: stats.accepted_steps,
            rejected_steps: stats.rejected_steps,
        };
        debug!(
            t_start = t0,
            t_end = t1,
            evaluations = stats.evaluations,
            accepted = stats.accepted_steps,
            rejected = stats.rejected_steps,
            "Integration finished"
        );

        let (times, states) = stepper.results().get();
        Ok(Solution {
            times: times.clone(),
            states: states.clone(),
            stats,
        })
    }
}
