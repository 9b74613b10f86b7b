//! TOML configuration for a set of runs
//!
//! Every section is optional and falls back to the built-in defaults:
//!
//! ```toml
//! [environment]
//! par_day = 60.0
//!
//! [simulation]
//! duration_days = 21
//!
//! [solver]
//! rtol = 1e-4
//!
//! [parameters.stress]
//! damage_coefficient = 7e-7
//!
//! [parameters.mechanisms]
//! intraday = "gompertz_hours"
//!
//! [[treatments]]
//! name = "L6D6"
//! intensity = 11.0
//! start_day = 29
//! end_day = 35
//! hour_on = 10.0
//! hour_off = 16.0
//! ```

use crate::environment::Environment;
use crate::parameters::ParameterSet;
use crate::simulation::{Simulation, SimulationWindow};
use crate::treatment::Treatment;
use luva_core::errors::{LuvaError, LuvaResult};
use luva_core::ivp::SolverOptions;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    pub environment: Environment,
    pub simulation: SimulationWindow,
    pub solver: SolverOptions,
    pub parameters: ParameterSet,
    pub treatments: Vec<Treatment>,
}

impl ModelConfig {
    /// Parse and validate a configuration document.
    pub fn from_toml_str(document: &str) -> LuvaResult<Self> {
        let config: Self = toml::from_str(document).map_err(|e| LuvaError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> LuvaResult<String> {
        toml::to_string(self).map_err(|e| LuvaError::Config(e.to_string()))
    }

    pub fn validate(&self) -> LuvaResult<()> {
        self.solver.validate()?;
        self.parameters.validate()?;
        for treatment in &self.treatments {
            treatment.validate()?;
        }
        let mut names: Vec<&str> = self.treatments.iter().map(|t| t.name.as_str()).collect();
        names.sort_unstable();
        if let Some(pair) = names.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(LuvaError::Config(format!("duplicate treatment name {:?}", pair[0])));
        }
        Ok(())
    }

    pub fn simulation(&self) -> Simulation {
        Simulation::new(self.parameters.clone())
            .with_environment(self.environment.clone())
            .with_window(self.simulation.clone())
            .with_solver_options(self.solver)
    }
}
