//! Nonlinear magnetostatic problem
//!
//! Fixed-point iteration on the material reluctivity with under-relaxation:
//!
//! 1. assemble K(Q) with the current estimate and solve for Q'
//! 2. relax: Q = W * Q' + (1 - W) * Q_prev
//! 3. reassemble K(Q) and measure Diff = |K(Q) Q - F| / |F|
//!
//! The estimate is seeded from a linear solve on a (possibly different)
//! bootstrap mesh.

use super::field::Field;
use super::linear::Problem;
use crate::assembly::{NonlinearSlaeBuilder, PortraitBuilder};
use crate::error::{ConfigError, FemError, Result};
use crate::mesh::{Mesh, Point};
use crate::solver::{LinearSolver, SolverConfig, SolverType, create_solver, parse_time_limit};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use solvers::SymmetricSparseMatrix;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outer iteration parameters
///
/// With relaxation W the residual ratio shrinks by roughly W per iteration on
/// mildly nonlinear materials. The defaults (W = 0.5, 30 iterations) reach
/// about 1e-9, short of `eps = 1e-12`, so such runs usually end in
/// [`NonlinearState::MaxIterReached`]; raise `max_iter` or `eps` when
/// convergence is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NonlinearConfig {
    /// Convergence threshold on the residual ratio
    pub eps: f64,
    /// Iteration cap
    pub max_iter: usize,
    /// Under-relaxation weight W in (0, 1]
    pub relaxation: f64,
    /// Wall-clock budget for the outer loop, in seconds
    pub time_limit_secs: Option<f64>,
}

impl Default for NonlinearConfig {
    fn default() -> Self {
        Self {
            eps: 1e-12,
            max_iter: 30,
            relaxation: 0.5,
            time_limit_secs: None,
        }
    }
}

impl NonlinearConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !(self.relaxation > 0.0 && self.relaxation <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "relaxation must lie in (0, 1], got {}",
                self.relaxation
            )));
        }
        if !(self.eps > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "eps must be positive, got {}",
                self.eps
            )));
        }
        if self.max_iter == 0 {
            return Err(ConfigError::Invalid("max_iter must be positive".into()));
        }
        parse_time_limit("nonlinear", self.time_limit_secs).map(|_| ())
    }

    fn time_limit(&self) -> std::result::Result<Option<Duration>, ConfigError> {
        parse_time_limit("nonlinear", self.time_limit_secs)
    }
}

/// Lifecycle of a [`NonlinearProblem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NonlinearState {
    Initialized,
    LinearBootstrap,
    Iterating,
    Converged,
    MaxIterReached,
    TimeLimitReached,
}

impl NonlinearState {
    /// True once the outer loop has stopped
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NonlinearState::Converged
                | NonlinearState::MaxIterReached
                | NonlinearState::TimeLimitReached
        )
    }
}

/// Diagnostics of one outer iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationReport {
    /// Completed iterations, starting at 1
    pub iteration: usize,
    /// Residual ratio Diff after this iteration
    pub residual: f64,
    /// Krylov iterations of the inner solve
    pub linear_iterations: usize,
    pub elapsed: Duration,
}

/// Result of the outer loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonlinearOutcome {
    pub state: NonlinearState,
    pub iterations: usize,
    pub residual: f64,
}

impl NonlinearOutcome {
    pub fn is_converged(&self) -> bool {
        self.state == NonlinearState::Converged
    }

    /// Turn a stop without convergence into an error
    pub fn ensure_converged(self) -> Result<Self> {
        if self.is_converged() {
            Ok(self)
        } else {
            Err(FemError::NonlinearNonConvergence {
                iterations: self.iterations,
                residual: self.residual,
            })
        }
    }
}

/// Magnetostatic problem with flux-dependent materials
pub struct NonlinearProblem {
    linear_mesh: Arc<Mesh>,
    mesh: Arc<Mesh>,
    solver_config: SolverConfig,
    config: NonlinearConfig,
    builder: NonlinearSlaeBuilder,
    solver: Box<dyn LinearSolver + Send + Sync>,
    state: NonlinearState,
    q: Option<Array1<f64>>,
    iteration: usize,
    diff: f64,
}

impl std::fmt::Debug for NonlinearProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonlinearProblem")
            .field("num_nodes", &self.mesh.num_nodes())
            .field("solver_type", &self.solver.solver_type())
            .field("config", &self.config)
            .field("state", &self.state)
            .field("iteration", &self.iteration)
            .field("diff", &self.diff)
            .finish()
    }
}

impl NonlinearProblem {
    /// Problem on `mesh`, bootstrapped from a linear solve on `linear_mesh`
    pub fn new(
        linear_mesh: Mesh,
        mesh: Mesh,
        solver_config: SolverConfig,
        config: NonlinearConfig,
    ) -> Result<Self> {
        Self::from_shared(Arc::new(linear_mesh), Arc::new(mesh), solver_config, config)
    }

    /// Problem bootstrapped from the same mesh with linearized materials
    pub fn from_mesh(mesh: Mesh, solver_config: SolverConfig, config: NonlinearConfig) -> Result<Self> {
        let linear_mesh = mesh.linearized();
        Self::new(linear_mesh, mesh, solver_config, config)
    }

    pub fn from_shared(
        linear_mesh: Arc<Mesh>,
        mesh: Arc<Mesh>,
        solver_config: SolverConfig,
        config: NonlinearConfig,
    ) -> Result<Self> {
        linear_mesh.validate()?;
        mesh.validate()?;
        solver_config.validate()?;
        config.validate()?;
        Ok(Self {
            builder: NonlinearSlaeBuilder::new(Arc::clone(&mesh)),
            solver: create_solver(&solver_config),
            linear_mesh,
            mesh,
            solver_config,
            config,
            state: NonlinearState::Initialized,
            q: None,
            iteration: 0,
            diff: 1.0,
        })
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn linear_mesh(&self) -> &Mesh {
        &self.linear_mesh
    }

    pub fn config(&self) -> &NonlinearConfig {
        &self.config
    }

    pub fn solver_type(&self) -> SolverType {
        self.solver.solver_type()
    }

    pub fn state(&self) -> NonlinearState {
        self.state
    }

    /// Completed outer iterations
    pub fn current_iteration(&self) -> usize {
        self.iteration
    }

    /// Last residual ratio Diff
    pub fn residual(&self) -> f64 {
        self.diff
    }

    /// Run the outer loop, logging each iteration
    pub fn solve(&mut self) -> Result<NonlinearOutcome> {
        self.solve_with_observer(|_| {})
    }

    /// Run the outer loop, reporting every iteration to `observer`
    ///
    /// Stopping on the iteration cap or the time limit is not an error: the
    /// returned outcome carries the terminal state and the last estimate is
    /// kept. Linear solver failures abort the loop with an error.
    pub fn solve_with_observer<F>(&mut self, mut observer: F) -> Result<NonlinearOutcome>
    where
        F: FnMut(&IterationReport),
    {
        let start = Instant::now();
        let time_limit = self.config.time_limit()?;
        let w = self.config.relaxation;

        self.state = NonlinearState::LinearBootstrap;
        self.iteration = 0;
        self.diff = 1.0;
        let mut q = self.bootstrap()?;

        let portrait = Arc::new(PortraitBuilder::new(&self.mesh).build());
        let mut matrix = SymmetricSparseMatrix::new(portrait);
        let mut rhs = Array1::zeros(self.mesh.num_nodes());

        self.state = NonlinearState::Iterating;
        let mut timed_out = false;
        while self.iteration < self.config.max_iter && self.diff >= self.config.eps {
            if time_limit.is_some_and(|limit| start.elapsed() >= limit) {
                timed_out = true;
                break;
            }

            self.builder.build(&mut matrix, &mut rhs, &q);
            let solution = match self.solver.solve(&matrix, &rhs, Some(&q)) {
                Ok(solution) => solution,
                Err(err) => {
                    log::warn!(
                        "linear solve failed at outer iteration {}: {}",
                        self.iteration + 1,
                        err
                    );
                    self.q = Some(q);
                    return Err(err.into());
                }
            };

            let q_prev = q;
            q = &solution.values * w + &q_prev * (1.0 - w);

            self.builder.build(&mut matrix, &mut rhs, &q);
            self.diff = residual_ratio(&matrix, &q, &rhs);
            self.iteration += 1;

            let report = IterationReport {
                iteration: self.iteration,
                residual: self.diff,
                linear_iterations: solution.iterations,
                elapsed: start.elapsed(),
            };
            log::info!("Iter: {}, Diff: {:.6e}", report.iteration, report.residual);
            observer(&report);
        }

        self.state = if self.diff < self.config.eps {
            NonlinearState::Converged
        } else if timed_out {
            NonlinearState::TimeLimitReached
        } else {
            NonlinearState::MaxIterReached
        };
        if self.state != NonlinearState::Converged {
            log::warn!(
                "nonlinear iteration stopped in state {:?} after {} iterations (Diff = {:.3e})",
                self.state,
                self.iteration,
                self.diff
            );
        }
        self.q = Some(q);

        Ok(NonlinearOutcome {
            state: self.state,
            iterations: self.iteration,
            residual: self.diff,
        })
    }

    /// Linear solve on the bootstrap mesh, transferred to this mesh's nodes
    fn bootstrap(&self) -> Result<Array1<f64>> {
        let mut linear = Problem::from_shared(Arc::clone(&self.linear_mesh), self.solver_config.clone())?;
        linear.solve()?;

        if self.linear_mesh.nodes == self.mesh.nodes {
            if let Some(q) = linear.solution() {
                return Ok(q.clone());
            }
        }

        let field = linear.field()?;
        let mut outside = 0usize;
        let mut q = Array1::zeros(self.mesh.num_nodes());
        for (node, p) in self.mesh.nodes.iter().enumerate() {
            match field.value_a(p) {
                Ok(value) => q[node] = value,
                Err(FemError::ElementNotFound { .. }) => outside += 1,
                Err(err) => return Err(err),
            }
        }
        if outside > 0 {
            log::debug!("bootstrap: {outside} nodes outside the linear mesh start at 0");
        }
        Ok(q)
    }

    /// Nodal values of the last estimate
    pub fn solution(&self) -> Option<&Array1<f64>> {
        self.q.as_ref()
    }

    pub fn field(&self) -> Result<Field<'_>> {
        let q = self.q.as_ref().ok_or(FemError::NotSolved)?;
        Ok(Field::new(&self.mesh, q))
    }

    /// Vector potential at `p`
    pub fn value_a(&self, p: Point) -> Result<f64> {
        self.field()?.value_a(&p)
    }

    /// Flux density magnitude at `p`
    pub fn value_b(&self, p: Point) -> Result<f64> {
        self.field()?.value_b(&p)
    }

    /// Flux density magnitude of element `index`, `None` past the last element
    pub fn flux_at_element(&self, index: usize) -> Result<Option<f64>> {
        Ok(self.field()?.flux_at_element(index))
    }
}

/// |A q - b| / |b|, or |A q - b| for a zero RHS
fn residual_ratio(matrix: &SymmetricSparseMatrix<f64>, q: &Array1<f64>, rhs: &Array1<f64>) -> f64 {
    let residual = matrix.matvec(q) - rhs;
    let r_norm = residual.dot(&residual).sqrt();
    let b_norm = rhs.dot(rhs).sqrt();
    if b_norm > 0.0 { r_norm / b_norm } else { r_norm }
}
