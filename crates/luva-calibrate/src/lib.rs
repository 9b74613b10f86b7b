//! Calibration of the luva model against observed treatments
//!
//! A [`CalibrationProblem`] turns a vector of coefficients into a scalar
//! objective by simulating every observed treatment and comparing final fresh
//! weight and anthocyanin concentration with their targets. Any [`Objective`]
//! can then be minimised with:
//!
//! - [`GridSearch`]: exhaustive search on a regular grid
//! - [`NelderMead`]: bounded local simplex search
//! - [`DifferentialEvolution`]: global population-based search
//!
//! [`SensitivityAnalysis`] perturbs one coefficient at a time and reports the
//! normalised response of each treatment. [`ScheduleSearch`] compares UV-A
//! schedules ending at harvest against an untreated control.
//!
//! Model evaluations are independent and run in parallel with rayon.

use luva_core::errors::LuvaError;
use thiserror::Error;

pub mod differential_evolution;
pub mod grid;
pub mod nelder_mead;
pub mod objective;
pub mod optimum;
pub mod parameter_space;
pub mod report;
pub mod sensitivity;
pub mod strategy;

pub use differential_evolution::{DifferentialEvolution, InitialPopulation, Mutation};
pub use grid::GridSearch;
pub use nelder_mead::NelderMead;
pub use objective::{CalibrationProblem, FnObjective, Objective, ObjectiveWeights, Observation};
pub use optimum::OptimizationResult;
pub use parameter_space::{Bound, ParameterSpace};
pub use report::{CalibrationReport, TreatmentOutcome, TreatmentReport};
pub use sensitivity::{SensitivityAnalysis, SensitivityEntry, SensitivityReport};
pub use strategy::{ControlOutcome, ScheduleOutcome, ScheduleReport, ScheduleSearch};

/// Errors raised while setting up or running a calibration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Model(#[from] LuvaError),

    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Expected a vector of length {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Calibration problem has no {0}")]
    EmptyProblem(String),

    #[error("None of the {0} evaluated points gave a finite objective")]
    NoFiniteObjective(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
