//! Lettuce growth under supplemental UV-A
//!
//! This crate couples a carbon-buffer lettuce growth model with a lumped UV-A
//! damage/repair Stress state, an optional ROS state and anthocyanin synthesis,
//! and integrates the system over a growth period for a given treatment.
//!
//! # Module Organisation
//!
//! - `environment`: Chamber climate and UV-A delivery at any simulated time
//! - `growth`: Unstressed photosynthesis, respiration and carbon allocation
//! - `stress`: Damage and repair of the Stress state, and ROS dynamics
//! - `modulation`: Stress effects on growth and dry matter content
//! - `pigment`: Anthocyanin synthesis and degradation
//! - `model`: The assembled right-hand side of the ODE system
//! - `simulation`: Running a treatment and deriving per-plant outputs
//! - `catalogue`: Reference treatments and observed targets
//! - `config`: TOML configuration
//!
//! # Parameters
//!
//! Every coefficient lives in a named field of [`parameters::ParameterSet`],
//! grouped by mechanism, with defaults matching the calibrated model.

pub mod catalogue;
pub mod config;
pub mod environment;
pub mod growth;
pub mod model;
pub mod modulation;
pub mod parameters;
pub mod pigment;
pub mod simulation;
pub mod stress;
pub mod treatment;
