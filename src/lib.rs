//! Lettuce UV-A stress and anthocyanin model
//!
//! Re-exports the workspace crates under one name:
//!
//! - [`core`]: shared types, units, errors and the ODE solver adapter
//! - [`model`]: the coupled growth, Stress, ROS and pigment model
//! - [`calibrate`]: objective functions, optimisers and sensitivity analysis

pub use luva_calibrate as calibrate;
pub use luva_core as core;
pub use luva_model as model;
