//! Core types and numerical plumbing shared by the luva crates.
//!
//! This crate is deliberately small. It holds the error taxonomy, the numeric
//! aliases used throughout the model, unit conversion constants and a thin
//! initial value problem (IVP) layer on top of the Dormand–Prince solver from
//! [`ode_solvers`].

pub mod errors;
pub mod ivp;
pub mod units;

/// Floating point type used for every state variable and parameter.
pub type FloatValue = f64;

/// Simulated time in seconds since sowing.
pub type Time = f64;
