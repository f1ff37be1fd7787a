//! Error types for the magnetostatic FEM pipeline.

use crate::solver::SolverError;
use thiserror::Error;

/// Errors raised when a mesh violates the data-model invariants, or when a
/// structured grid cannot be generated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    /// An element or boundary edge references a node that does not exist.
    #[error("node index {index} out of range ({num_nodes} nodes)")]
    InvalidNodeIndex { index: usize, num_nodes: usize },

    /// An element references a material that does not exist.
    #[error("element {element} uses unknown material {material}")]
    UnknownMaterial { element: usize, material: usize },

    /// An element's material has an unusable permeability or source.
    #[error("element {element} uses invalid material {material}")]
    InvalidMaterial { element: usize, material: usize },

    /// An element has zero or negative width or height.
    #[error("element {element} is degenerate (hx = {hx}, hy = {hy})")]
    DegenerateElement { element: usize, hx: f64, hy: f64 },

    /// The four vertices do not form an axis-aligned rectangle in the
    /// expected order (v0 bottom-left, v1 bottom-right, v2 top-left, v3 top-right).
    #[error("element {element} is not an axis-aligned rectangle")]
    NotAxisAligned { element: usize },

    /// Grid coordinates must be strictly increasing with at least two values.
    #[error("grid coordinates must be strictly increasing ({count} values)")]
    InvalidCoordinates { count: usize },

    /// Geometric grading needs a positive first step and ratio.
    #[error("invalid grading: first step {step}, ratio {ratio}")]
    InvalidGrading { step: f64, ratio: f64 },

    /// The split point lies beyond the last radial coordinate.
    #[error("split point {split} is beyond the grid (last coordinate {last})")]
    SplitPointUnreachable { split: f64, last: f64 },
}

/// Errors raised while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level error of the FEM crate.
#[derive(Debug, Error)]
pub enum FemError {
    /// A field query point lies outside every element.
    #[error("no finite element contains point ({x}, {y})")]
    ElementNotFound { x: f64, y: f64 },

    /// A field query was made before a successful solve.
    #[error("problem has not been solved yet")]
    NotSolved,

    /// The outer relaxation loop ended without meeting its tolerance.
    #[error(
        "nonlinear iteration did not converge after {iterations} iterations (residual ratio {residual:.3e})"
    )]
    NonlinearNonConvergence { iterations: usize, residual: f64 },

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A specialized `Result` type for FEM operations.
pub type Result<T> = std::result::Result<T, FemError>;

impl FemError {
    /// Returns `true` for numerical failures the caller may retry with
    /// different parameters.
    pub fn is_numerical(&self) -> bool {
        match self {
            FemError::Solver(SolverError::InvalidConfig(_)) => false,
            FemError::Solver(_) | FemError::NonlinearNonConvergence { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_not_found_display() {
        let err = FemError::ElementNotFound { x: 1.5, y: -2.0 };
        assert_eq!(err.to_string(), "no finite element contains point (1.5, -2)");
        assert!(!err.is_numerical());
    }

    #[test]
    fn test_numerical_errors() {
        let err = FemError::from(SolverError::Divergence {
            iterations: 10,
            residual: 0.5,
        });
        assert!(err.is_numerical());
        let err = FemError::NonlinearNonConvergence {
            iterations: 30,
            residual: 1e-3,
        };
        assert!(err.is_numerical());
        assert!(err.to_string().contains("30 iterations"));
    }

    #[test]
    fn test_mesh_error_conversion() {
        let err: FemError = MeshError::SplitPointUnreachable {
            split: 5.0,
            last: 4.0,
        }
        .into();
        assert!(matches!(err, FemError::Mesh(_)));
        assert!(err.to_string().contains("split point 5"));
    }
}
