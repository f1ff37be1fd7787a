//! End-to-end checks of the linear assemble + solve pipeline
//!
//! Covers portrait structure, accumulation under clear/rebuild, symmetric
//! multiply, Dirichlet enforcement, exactness on affine fields and point
//! queries.

use approx::assert_relative_eq;
use magstat_fem::assembly::{PortraitBuilder, SlaeBuilder};
use magstat_fem::mesh::{
    Grading, LayeredDomain, Mesh, Side, SideCondition, SplitCondition, layered_mesh,
    rectangular_mesh,
};
use magstat_fem::{FemError, MU0, Material, Point, Problem, SolverConfig, SolverType};
use ndarray::{Array1, Array2};
use solvers::SymmetricSparseMatrix;
use std::collections::BTreeSet;
use std::sync::Arc;

fn layered_domain() -> LayeredDomain {
    LayeredDomain {
        r0: 0.0,
        r1: 0.2,
        z0: 0.0,
        layer_heights: [0.05, 0.1],
        r_grading: Grading {
            first_step: 0.01,
            ratio: 1.2,
        },
        z_grading: Grading {
            first_step: 0.005,
            ratio: 1.15,
        },
        materials: [
            Material::linear(1000.0).with_current_density(1.0e4),
            Material::air(),
        ],
        left: SideCondition::natural(),
        right: SideCondition::zero(),
        bottom: SideCondition::natural(),
        top: SideCondition::zero(),
        split: None,
    }
}

fn assembled(mesh: Mesh) -> (SymmetricSparseMatrix<f64>, Array1<f64>) {
    let portrait = PortraitBuilder::new(&mesh).build();
    let n = mesh.num_nodes();
    let mut matrix = SymmetricSparseMatrix::from_portrait(portrait);
    let mut rhs = Array1::zeros(n);
    SlaeBuilder::new(Arc::new(mesh)).build(&mut matrix, &mut rhs);
    (matrix, rhs)
}

#[test]
fn test_portrait_holds_each_pair_once() {
    let (mesh, _) = layered_mesh(&layered_domain()).unwrap();
    let portrait = PortraitBuilder::new(&mesh).build();

    let mut pairs = BTreeSet::new();
    for element in &mesh.elements {
        for &a in &element.vertices {
            for &b in &element.vertices {
                if a != b {
                    pairs.insert((a.max(b), a.min(b)));
                }
            }
        }
    }

    assert_eq!(portrait.nnz_lower(), pairs.len());
    let stored: BTreeSet<(usize, usize)> = portrait.lower_entries().collect();
    assert_eq!(stored, pairs);
    for row in 0..portrait.num_rows() {
        assert!(portrait.row(row).windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn test_rebuild_after_clear_is_bit_identical() {
    let (mesh, _) = layered_mesh(&layered_domain()).unwrap();
    let portrait = PortraitBuilder::new(&mesh).build();
    let n = mesh.num_nodes();
    let builder = SlaeBuilder::new(Arc::new(mesh));

    let mut matrix = SymmetricSparseMatrix::from_portrait(portrait);
    let mut rhs = Array1::zeros(n);
    builder.build(&mut matrix, &mut rhs);
    let diag = matrix.diagonal().to_vec();
    let lower = matrix.lower_values().to_vec();
    let b = rhs.clone();

    matrix.clear();
    rhs.fill(0.0);
    builder.build(&mut matrix, &mut rhs);
    assert_eq!(matrix.diagonal(), diag.as_slice());
    assert_eq!(matrix.lower_values(), lower.as_slice());
    assert_eq!(rhs, b);
}

#[test]
fn test_multiply_matches_analytic_stiffness() {
    // One 2 x 1 element with nu = 1: K = (G_X / 2 + 2 G_Y) / 6
    let (mesh, _) = rectangular_mesh((0.0, 2.0), (0.0, 1.0), 1, 1, Material::linear(1.0 / MU0)).unwrap();
    let (matrix, _) = assembled(mesh);

    let expected = Array2::from_shape_vec(
        (4, 4),
        vec![
            5.0, 1.0, -3.5, -2.5, //
            1.0, 5.0, -2.5, -3.5, //
            -3.5, -2.5, 5.0, 1.0, //
            -2.5, -3.5, 1.0, 5.0,
        ],
    )
    .unwrap()
        / 6.0;

    let dense = matrix.to_dense();
    for i in 0..4 {
        for j in 0..4 {
            assert_relative_eq!(dense[[i, j]], expected[[i, j]], epsilon = 1e-12);
        }
    }

    let x = Array1::from(vec![1.0, -2.0, 0.5, 3.0]);
    let mut y = Array1::zeros(4);
    matrix.multiply(&x, &mut y);
    let reference = expected.dot(&x);
    for i in 0..4 {
        assert_relative_eq!(y[i], reference[i], epsilon = 1e-12);
    }
}

#[test]
fn test_dirichlet_values_are_enforced() {
    let mut domain = layered_domain();
    domain.right = SideCondition::first_kind(|_, z| 1.0e-3 * z);
    domain.top = SideCondition::first_kind(|r, z| 1.0e-3 * (r + z));
    let (mesh, _) = layered_mesh(&domain).unwrap();
    let prescribed = mesh.first_kind_values();

    let mut problem = Problem::new(mesh, SolverConfig::default()).unwrap();
    problem.solve().unwrap();
    let q = problem.solution().unwrap();

    assert!(!prescribed.is_empty());
    for (&node, &g) in &prescribed {
        assert_relative_eq!(q[node], g, epsilon = 1e-12);
    }
}

#[test]
fn test_affine_solution_is_reproduced() {
    // A = 2r + 1 satisfies the natural condition on the bottom and top sides
    let (mut mesh, grid) = rectangular_mesh((0.0, 3.0), (0.0, 1.0), 3, 1, Material::linear(10.0)).unwrap();
    for side in [Side::Left, Side::Right] {
        for (a, b) in grid.side_edges(side) {
            mesh.add_first_kind(a, b, |r, _| 2.0 * r + 1.0);
        }
    }

    for solver_type in [SolverType::LosLu, SolverType::LosLlt] {
        let config = SolverConfig::default().with_solver_type(solver_type);
        let mut problem = Problem::new(mesh.clone(), config).unwrap();
        problem.solve().unwrap();
        let q = problem.solution().unwrap();
        for (node, p) in mesh.nodes.iter().enumerate() {
            assert_relative_eq!(q[node], 2.0 * p.x + 1.0, epsilon = 1e-9);
        }
        assert_relative_eq!(problem.value_b(Point::new(1.5, 0.5)).unwrap(), 2.0, epsilon = 1e-8);
    }
}

#[test]
fn test_value_a_at_nodes_is_exact() {
    let (mesh, _) = layered_mesh(&layered_domain()).unwrap();
    let mut problem = Problem::new(mesh, SolverConfig::default()).unwrap();
    problem.solve().unwrap();

    let q = problem.solution().unwrap();
    for (node, p) in problem.mesh().nodes.iter().enumerate() {
        assert_eq!(problem.value_a(*p).unwrap(), q[node]);
    }
}

#[test]
fn test_query_outside_mesh() {
    let (mesh, _) = layered_mesh(&layered_domain()).unwrap();
    let mut problem = Problem::new(mesh, SolverConfig::default()).unwrap();
    problem.solve().unwrap();

    let err = problem.value_a(Point::new(0.3, 0.01)).unwrap_err();
    assert!(matches!(err, FemError::ElementNotFound { .. }));
    assert!(problem.value_b(Point::new(0.1, -0.01)).is_err());

    // Solver state is untouched by the failed query
    assert!(problem.value_a(Point::new(0.1, 0.01)).is_ok());
}

#[test]
fn test_solver_variants_agree_and_repeat() {
    let (mesh, _) = layered_mesh(&layered_domain()).unwrap();

    let mut lu = Problem::new(mesh.clone(), SolverConfig::default()).unwrap();
    let mut llt = Problem::new(mesh.clone(), SolverConfig::default().with_solver_type(SolverType::LosLlt)).unwrap();
    lu.solve().unwrap();
    llt.solve().unwrap();

    let q_lu = lu.solution().unwrap().clone();
    let q_llt = llt.solution().unwrap();
    let scale = q_lu.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    assert!(scale > 0.0);
    for (a, b) in q_lu.iter().zip(q_llt.iter()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-9 * scale);
    }

    let mut again = Problem::new(mesh, SolverConfig::default()).unwrap();
    again.solve().unwrap();
    assert_eq!(again.solution().unwrap(), &q_lu);
}

#[test]
fn test_second_kind_flux_drives_field() {
    let mut domain = layered_domain();
    domain.materials[0].current_density = 0.0;
    domain.split = Some(SplitCondition {
        point: 0.05,
        inner: SideCondition::SecondKind(1.0),
    });
    let (mesh, _) = layered_mesh(&domain).unwrap();
    assert!(mesh.second_kind.iter().any(|e| e.flux != 0.0));

    let mut problem = Problem::new(mesh, SolverConfig::default()).unwrap();
    problem.solve().unwrap();
    assert!(problem.value_a(Point::new(0.0, 0.0)).unwrap() > 0.0);
    assert!(problem.value_b(Point::new(0.01, 0.001)).unwrap() > 0.0);
}
