//! Linear solvers for the assembled magnetostatic system
//!
//! Both variants run the LOS iteration from the `magstat-solvers` crate and
//! differ only in the factorization used as preconditioner.
//!
//! # Solver Types
//!
//! - **LosLu**: LOS with ILU(0) (default, any nonsingular pivots)
//! - **LosLlt**: LOS with IC(0); requires a numerically SPD matrix

use crate::error::ConfigError;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use solvers::{
    Factorization, FactorizationError, IluPreconditioner, LltPreconditioner, LosConfig,
    SymmetricSparseMatrix, los,
};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Type of solver to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SolverType {
    /// LOS with incomplete LU preconditioning
    #[default]
    LosLu,
    /// LOS with incomplete Cholesky preconditioning
    LosLlt,
}

/// Solver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub solver_type: SolverType,
    /// Iteration budget of the Krylov loop
    pub max_iterations: usize,
    /// Relative tolerance on the preconditioned residual
    pub tolerance: f64,
    /// Log progress every N iterations (0 = quiet)
    pub print_interval: usize,
    /// Wall-clock budget per solve, in seconds
    pub time_limit_secs: Option<f64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        let los = LosConfig::default();
        Self {
            solver_type: SolverType::LosLu,
            max_iterations: los.max_iterations,
            tolerance: los.tolerance,
            print_interval: los.print_interval,
            time_limit_secs: None,
        }
    }
}

impl SolverConfig {
    pub fn with_solver_type(mut self, solver_type: SolverType) -> Self {
        self.solver_type = solver_type;
        self
    }

    /// Reject parameters the LOS loop cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "solver max_iterations must be positive".into(),
            ));
        }
        if !(self.tolerance > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "solver tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        parse_time_limit("solver", self.time_limit_secs).map(|_| ())
    }

    /// Iteration parameters for the LOS loop
    pub fn los_config(&self) -> Result<LosConfig<f64>, ConfigError> {
        Ok(LosConfig {
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
            print_interval: self.print_interval,
            time_limit: parse_time_limit("solver", self.time_limit_secs)?,
        })
    }
}

/// Solution result from the solver
#[derive(Debug, Clone)]
pub struct Solution {
    /// Nodal values of the vector potential
    pub values: Array1<f64>,
    pub iterations: usize,
    /// Final relative preconditioned residual
    pub residual: f64,
    pub converged: bool,
}

/// Solver errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    #[error("Solver failed to converge after {iterations} iterations (residual: {residual:.3e})")]
    Divergence { iterations: usize, residual: f64 },
    #[error("Preconditioner setup failed: {0}")]
    Factorization(#[from] FactorizationError),
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Invalid solver configuration: {0}")]
    InvalidConfig(String),
}

/// A linear solver for the symmetric sparse system
pub trait LinearSolver {
    fn solver_type(&self) -> SolverType;

    /// Solve `matrix * x = rhs`, starting from `x0` when given
    fn solve(
        &self,
        matrix: &SymmetricSparseMatrix<f64>,
        rhs: &Array1<f64>,
        x0: Option<&Array1<f64>>,
    ) -> Result<Solution, SolverError>;
}

/// LOS preconditioned by ILU(0)
#[derive(Debug, Clone)]
pub struct LosLu {
    config: SolverConfig,
}

impl LosLu {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }
}

impl LinearSolver for LosLu {
    fn solver_type(&self) -> SolverType {
        SolverType::LosLu
    }

    fn solve(
        &self,
        matrix: &SymmetricSparseMatrix<f64>,
        rhs: &Array1<f64>,
        x0: Option<&Array1<f64>>,
    ) -> Result<Solution, SolverError> {
        check_dimensions(matrix, rhs, x0)?;
        let factorization = IluPreconditioner::from_symmetric(matrix)?;
        run_los(matrix, &factorization, rhs, x0, &self.config)
    }
}

/// LOS preconditioned by IC(0)
#[derive(Debug, Clone)]
pub struct LosLlt {
    config: SolverConfig,
}

impl LosLlt {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }
}

impl LinearSolver for LosLlt {
    fn solver_type(&self) -> SolverType {
        SolverType::LosLlt
    }

    fn solve(
        &self,
        matrix: &SymmetricSparseMatrix<f64>,
        rhs: &Array1<f64>,
        x0: Option<&Array1<f64>>,
    ) -> Result<Solution, SolverError> {
        check_dimensions(matrix, rhs, x0)?;
        let factorization = LltPreconditioner::from_symmetric(matrix)?;
        run_los(matrix, &factorization, rhs, x0, &self.config)
    }
}

/// Create the solver selected by `config.solver_type`
pub fn create_solver(config: &SolverConfig) -> Box<dyn LinearSolver + Send + Sync> {
    match config.solver_type {
        SolverType::LosLu => Box::new(LosLu::new(config.clone())),
        SolverType::LosLlt => Box::new(LosLlt::new(config.clone())),
    }
}

/// Solve a system once with the configured solver
pub fn solve(
    matrix: &SymmetricSparseMatrix<f64>,
    rhs: &Array1<f64>,
    config: &SolverConfig,
) -> Result<Solution, SolverError> {
    create_solver(config).solve(matrix, rhs, None)
}

/// Convert a time limit in seconds, rejecting values a `Duration` cannot hold
pub(crate) fn parse_time_limit(owner: &str, secs: Option<f64>) -> Result<Option<Duration>, ConfigError> {
    secs.map(|s| {
        Duration::try_from_secs_f64(s).map_err(|_| {
            ConfigError::Invalid(format!(
                "{owner} time limit must be a non-negative, representable number of seconds, got {s}"
            ))
        })
    })
    .transpose()
}

fn check_dimensions(
    matrix: &SymmetricSparseMatrix<f64>,
    rhs: &Array1<f64>,
    x0: Option<&Array1<f64>>,
) -> Result<(), SolverError> {
    let expected = matrix.dim();
    for actual in std::iter::once(rhs.len()).chain(x0.map(|x| x.len())) {
        if actual != expected {
            return Err(SolverError::DimensionMismatch { expected, actual });
        }
    }
    Ok(())
}

fn run_los<F: Factorization<f64>>(
    matrix: &SymmetricSparseMatrix<f64>,
    factorization: &F,
    rhs: &Array1<f64>,
    x0: Option<&Array1<f64>>,
    config: &SolverConfig,
) -> Result<Solution, SolverError> {
    let los_config = config
        .los_config()
        .map_err(|err| SolverError::InvalidConfig(err.to_string()))?;
    let start = Instant::now();
    let result = los(matrix, factorization, rhs, x0, &los_config);

    log::debug!(
        "{:?}: {} DOFs, {} nnz, {} iterations, residual {:.2e}, {:.1}ms",
        config.solver_type,
        matrix.dim(),
        matrix.dim() + 2 * matrix.portrait().nnz_lower(),
        result.iterations,
        result.residual,
        start.elapsed().as_secs_f64() * 1000.0
    );

    if !result.converged {
        return Err(SolverError::Divergence {
            iterations: result.iterations,
            residual: result.residual,
        });
    }

    Ok(Solution {
        values: result.x,
        iterations: result.iterations,
        residual: result.residual,
        converged: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn spd() -> SymmetricSparseMatrix<f64> {
        let dense = array![
            [4.0, -1.0, -1.0, 0.0],
            [-1.0, 4.0, 0.0, -1.0],
            [-1.0, 0.0, 4.0, -1.0],
            [0.0, -1.0, -1.0, 4.0]
        ];
        SymmetricSparseMatrix::from_dense(&dense, 1e-15)
    }

    #[test]
    fn test_both_variants_agree() {
        let a = spd();
        let b = array![1.0, 2.0, 3.0, 4.0];
        let lu = solve(&a, &b, &SolverConfig::default()).unwrap();
        let llt = solve(
            &a,
            &b,
            &SolverConfig::default().with_solver_type(SolverType::LosLlt),
        )
        .unwrap();
        assert!(lu.converged && llt.converged);
        for i in 0..4 {
            assert_relative_eq!(lu.values[i], llt.values[i], epsilon = 1e-10);
        }
        let check = a.matvec(&lu.values);
        for i in 0..4 {
            assert_relative_eq!(check[i], b[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_create_solver_selects_variant() {
        let config = SolverConfig::default();
        assert_eq!(create_solver(&config).solver_type(), SolverType::LosLu);
        let config = config.with_solver_type(SolverType::LosLlt);
        assert_eq!(create_solver(&config).solver_type(), SolverType::LosLlt);
    }

    #[test]
    fn test_divergence_is_reported() {
        let b = Array1::from_elem(4, 1.0);
        let config = SolverConfig {
            max_iterations: 0,
            ..Default::default()
        };
        let err = solve(&spd(), &b, &config).unwrap_err();
        assert!(matches!(err, SolverError::Divergence { iterations: 0, .. }));
    }

    #[test]
    fn test_llt_rejects_indefinite() {
        let a = SymmetricSparseMatrix::from_dense(&array![[1.0, 2.0], [2.0, 1.0]], 1e-15);
        let config = SolverConfig::default().with_solver_type(SolverType::LosLlt);
        let err = solve(&a, &array![1.0, 1.0], &config).unwrap_err();
        assert!(matches!(err, SolverError::Factorization(_)));
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = solve(&spd(), &array![1.0, 2.0], &SolverConfig::default()).unwrap_err();
        assert_eq!(
            err,
            SolverError::DimensionMismatch {
                expected: 4,
                actual: 2
            }
        );
    }

    #[test]
    fn test_config_serde_defaults() {
        let config: SolverConfig = serde_json::from_str(r#"{"solver_type": "LosLlt"}"#).unwrap();
        assert_eq!(config.solver_type, SolverType::LosLlt);
        assert_eq!(config.max_iterations, 10_000);
        assert!(config.los_config().unwrap().time_limit.is_none());

        let config = SolverConfig {
            time_limit_secs: Some(2.5),
            ..Default::default()
        };
        assert_eq!(config.los_config().unwrap().time_limit, Some(Duration::from_millis(2500)));
    }

    #[test]
    fn test_unrepresentable_time_limit() {
        for secs in [-1.0, f64::NAN, f64::INFINITY, 1e30] {
            let config = SolverConfig {
                time_limit_secs: Some(secs),
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{secs} should be rejected");
            assert!(config.los_config().is_err());
            let err = solve(&spd(), &Array1::from_elem(4, 1.0), &config).unwrap_err();
            assert!(matches!(err, SolverError::InvalidConfig(_)));
        }
    }
}
