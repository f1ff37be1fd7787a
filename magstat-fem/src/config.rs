//! Problem configuration loaded from JSON
//!
//! Every field has a default, so partial documents are accepted:
//!
//! ```json
//! {
//!   "solver": { "solver_type": "LosLlt", "tolerance": 1e-12 },
//!   "nonlinear": { "max_iter": 50, "relaxation": 0.7 }
//! }
//! ```

use crate::error::ConfigError;
use crate::problem::NonlinearConfig;
use crate::solver::SolverConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Linear solver and outer loop settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemConfig {
    pub solver: SolverConfig,
    pub nonlinear: NonlinearConfig,
}

impl ProblemConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.solver.validate()?;
        self.nonlinear.validate()
    }
}
