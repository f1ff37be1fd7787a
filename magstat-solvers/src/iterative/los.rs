//! LOS (locally optimal scheme) solver
//!
//! A Krylov method for symmetric systems with split preconditioning
//! M = L * U. Each step minimises the preconditioned residual
//! r = L^(-1) (b - A x) along the current search direction, so the residual
//! norm never grows.

use crate::traits::{Factorization, LinearOperator, RealField, dot, norm};
use ndarray::Array1;
use num_traits::ToPrimitive;
use std::time::{Duration, Instant};

/// LOS solver configuration
#[derive(Debug, Clone)]
pub struct LosConfig<R> {
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Relative tolerance on the preconditioned residual
    pub tolerance: R,
    /// Log progress every N iterations (0 = no output)
    pub print_interval: usize,
    /// Wall-clock budget; exceeding it stops the iteration unconverged
    pub time_limit: Option<Duration>,
}

impl Default for LosConfig<f64> {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            tolerance: 1e-13,
            print_interval: 0,
            time_limit: None,
        }
    }
}

/// LOS solver result
#[derive(Debug, Clone)]
pub struct LosSolution<T: RealField> {
    /// Solution vector
    pub x: Array1<T>,
    /// Number of iterations
    pub iterations: usize,
    /// Final relative preconditioned residual
    pub residual: T,
    /// Whether convergence was achieved
    pub converged: bool,
}

/// Solve Ax = b with the preconditioned LOS method
///
/// `x0` is an optional initial guess (zero when `None`). The iteration is
/// fully sequential, so identical inputs give bit-identical results.
///
/// # Panics
///
/// Panics if the operator, the factorization, `b` and `x0` disagree in size.
pub fn los<T, A, F>(
    operator: &A,
    factorization: &F,
    b: &Array1<T>,
    x0: Option<&Array1<T>>,
    config: &LosConfig<T>,
) -> LosSolution<T>
where
    T: RealField,
    A: LinearOperator<T>,
    F: Factorization<T>,
{
    let n = b.len();
    assert_eq!(operator.num_rows(), n, "Operator size mismatch");
    assert_eq!(factorization.dim(), n, "Factorization size mismatch");

    let start = Instant::now();
    let mut x = match x0 {
        Some(guess) => {
            assert_eq!(guess.len(), n, "Initial guess size mismatch");
            guess.clone()
        }
        None => Array1::from_elem(n, T::zero()),
    };

    let b_norm = norm(&factorization.forward(b));
    if b_norm <= T::zero() {
        return LosSolution {
            x: Array1::from_elem(n, T::zero()),
            iterations: 0,
            residual: T::zero(),
            converged: true,
        };
    }

    // r = L^-1 (b - A x), z = U^-1 r, p = L^-1 A z
    let mut r = factorization.forward(&(b - &operator.apply(&x)));
    let mut z = factorization.backward(&r);
    let mut p = factorization.forward(&operator.apply(&z));

    let mut rel_residual = norm(&r) / b_norm;
    if rel_residual < config.tolerance {
        return LosSolution {
            x,
            iterations: 0,
            residual: rel_residual,
            converged: true,
        };
    }

    for iter in 0..config.max_iterations {
        let pp = dot(&p, &p);
        if pp <= T::zero() {
            log::warn!("LOS breakdown at iteration {}: (p, p) vanished", iter);
            return LosSolution {
                x,
                iterations: iter,
                residual: rel_residual,
                converged: false,
            };
        }

        let alpha = dot(&p, &r) / pp;
        x.scaled_add(alpha, &z);
        r.scaled_add(-alpha, &p);

        rel_residual = norm(&r) / b_norm;

        if config.print_interval > 0 && (iter + 1) % config.print_interval == 0 {
            log::info!(
                "LOS iteration {}: relative residual = {:.6e}",
                iter + 1,
                rel_residual.to_f64().unwrap_or(0.0)
            );
        }

        if rel_residual < config.tolerance {
            return LosSolution {
                x,
                iterations: iter + 1,
                residual: rel_residual,
                converged: true,
            };
        }

        if config
            .time_limit
            .is_some_and(|limit| start.elapsed() >= limit)
        {
            log::warn!(
                "LOS stopped by time limit after {} iterations (residual {:.3e})",
                iter + 1,
                rel_residual.to_f64().unwrap_or(0.0)
            );
            return LosSolution {
                x,
                iterations: iter + 1,
                residual: rel_residual,
                converged: false,
            };
        }

        let ur = factorization.backward(&r);
        let tmp = factorization.forward(&operator.apply(&ur));
        let beta = -dot(&p, &tmp) / pp;

        // z = U^-1 r + beta z, p = L^-1 A U^-1 r + beta p
        z = &ur + &z.mapv(|zi| zi * beta);
        p = &tmp + &p.mapv(|pi| pi * beta);
    }

    LosSolution {
        x,
        iterations: config.max_iterations,
        residual: rel_residual,
        converged: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preconditioners::{IdentityPreconditioner, IluPreconditioner, LltPreconditioner};
    use crate::sparse::{MatrixPortrait, SymmetricSparseMatrix};
    use ndarray::array;

    fn laplacian_1d(n: usize) -> SymmetricSparseMatrix<f64> {
        let pairs: Vec<[usize; 2]> = (1..n).map(|i| [i - 1, i]).collect();
        let mut a = SymmetricSparseMatrix::from_portrait(MatrixPortrait::from_connectivity(n, pairs));
        for i in 0..n {
            a.add_at(i, i, 2.0);
            if i > 0 {
                a.add_at(i, i - 1, -1.0);
            }
        }
        a
    }

    fn residual_norm(a: &SymmetricSparseMatrix<f64>, x: &Array1<f64>, b: &Array1<f64>) -> f64 {
        (&a.matvec(x) - b).iter().map(|e| e * e).sum::<f64>().sqrt()
    }

    #[test]
    fn test_los_spd_small() {
        let dense = array![[4.0_f64, 1.0], [1.0, 3.0]];
        let a = SymmetricSparseMatrix::from_dense(&dense, 1e-15);
        let b = array![1.0_f64, 2.0];
        let precond = IdentityPreconditioner::new(2);

        let solution = los(&a, &precond, &b, None, &LosConfig::default());

        assert!(solution.converged, "LOS should converge for SPD matrix");
        assert!(residual_norm(&a, &solution.x, &b) < 1e-10);
    }

    #[test]
    fn test_los_ilu_and_llt() {
        let n = 50;
        let a = laplacian_1d(n);
        let b = Array1::from_iter((0..n).map(|i| ((i as f64) * 0.3).sin()));
        let config = LosConfig::default();

        let ilu = IluPreconditioner::from_symmetric(&a).unwrap();
        let llt = LltPreconditioner::from_symmetric(&a).unwrap();
        let sol_ilu = los(&a, &ilu, &b, None, &config);
        let sol_llt = los(&a, &llt, &b, None, &config);

        assert!(sol_ilu.converged);
        assert!(sol_llt.converged);
        // Tridiagonal factorizations are exact, so one step suffices
        assert!(sol_ilu.iterations <= 2);
        assert!(residual_norm(&a, &sol_ilu.x, &b) < 1e-9);
        assert!(residual_norm(&a, &sol_llt.x, &b) < 1e-9);
    }

    #[test]
    fn test_los_zero_rhs() {
        let a = laplacian_1d(4);
        let b = Array1::zeros(4);
        let solution = los(&a, &IdentityPreconditioner::new(4), &b, None, &LosConfig::default());
        assert!(solution.converged);
        assert_eq!(solution.iterations, 0);
        assert!(solution.x.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_los_iteration_budget() {
        let n = 200;
        let a = laplacian_1d(n);
        let b = Array1::from_elem(n, 1.0);
        let config = LosConfig {
            max_iterations: 3,
            ..Default::default()
        };
        let solution = los(&a, &IdentityPreconditioner::new(n), &b, None, &config);
        assert!(!solution.converged);
        assert_eq!(solution.iterations, 3);
    }

    #[test]
    fn test_los_is_deterministic() {
        let n = 30;
        let a = laplacian_1d(n);
        let b = Array1::from_iter((0..n).map(|i| i as f64));
        let ilu = IluPreconditioner::from_symmetric(&a).unwrap();
        let config = LosConfig::default();
        let first = los(&a, &ilu, &b, None, &config);
        let second = los(&a, &ilu, &b, None, &config);
        assert_eq!(first.x, second.x);
        assert_eq!(first.iterations, second.iterations);
    }

    #[test]
    fn test_los_initial_guess() {
        let a = laplacian_1d(5);
        let exact = array![1.0, 2.0, 3.0, 4.0, 5.0];
        let b = a.matvec(&exact);
        let solution = los(
            &a,
            &IdentityPreconditioner::new(5),
            &b,
            Some(&exact),
            &LosConfig::default(),
        );
        assert!(solution.converged);
        assert_eq!(solution.iterations, 0);
    }
}
