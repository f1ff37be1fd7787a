//! Two-layer axisymmetric core with a saturating steel layer
//!
//! Solves the nonlinear problem, prints the outer iteration history and
//! samples A and |B| along the mid-height of the steel layer.
//!
//! Run with:
//!   RUST_LOG=info cargo run -p magstat-fem --example layered_core --release
//!
//! Pass a JSON file to override solver settings:
//!   cargo run -p magstat-fem --example layered_core -- config.json

use magstat_fem::mesh::{Grading, LayeredDomain, SideCondition, SplitCondition, layered_mesh};
use magstat_fem::{BhCurve, Material, NonlinearProblem, Point, ProblemConfig};
use std::time::Instant;

fn steel_curve() -> BhCurve {
    // (B [T], mu_r)
    BhCurve::new(vec![
        (0.0, 4000.0),
        (0.5, 3800.0),
        (1.0, 3000.0),
        (1.4, 1500.0),
        (1.8, 300.0),
        (2.2, 40.0),
    ])
    .expect("curve has samples")
}

fn main() {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => ProblemConfig::from_file(&path).unwrap_or_else(|e| {
            eprintln!("cannot load {path}: {e}");
            std::process::exit(1);
        }),
        None => ProblemConfig::default(),
    };

    println!();
    println!("=== Layered core, nonlinear magnetostatics ===");
    println!();

    let domain = LayeredDomain {
        r0: 0.0,
        r1: 0.2,
        z0: 0.0,
        layer_heights: [0.05, 0.15],
        r_grading: Grading {
            first_step: 0.002,
            ratio: 1.08,
        },
        z_grading: Grading {
            first_step: 0.001,
            ratio: 1.1,
        },
        materials: [
            Material::nonlinear(steel_curve()).with_current_density(2.0e5),
            Material::air(),
        ],
        left: SideCondition::natural(),
        right: SideCondition::zero(),
        bottom: SideCondition::zero(),
        top: SideCondition::zero(),
        split: Some(SplitCondition {
            point: 0.05,
            inner: SideCondition::natural(),
        }),
    };

    let start = Instant::now();
    let (mesh, grid) = layered_mesh(&domain).expect("valid domain");
    println!(
        "Mesh: {} x {} cells, {} nodes ({:.1} ms)",
        grid.nr() - 1,
        grid.nz() - 1,
        mesh.num_nodes(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    let mut problem = NonlinearProblem::from_mesh(mesh, config.solver, config.nonlinear)
        .expect("valid problem");

    println!();
    println!("{:>6} {:>14} {:>10} {:>10}", "Iter", "Diff", "LOS its", "Time (s)");
    println!("{}", "-".repeat(44));
    let outcome = problem
        .solve_with_observer(|report| {
            println!(
                "{:>6} {:>14.6e} {:>10} {:>10.3}",
                report.iteration,
                report.residual,
                report.linear_iterations,
                report.elapsed.as_secs_f64()
            );
        })
        .expect("linear solves succeed");

    println!();
    println!(
        "Finished in state {:?} after {} iterations (Diff = {:.3e})",
        outcome.state, outcome.iterations, outcome.residual
    );

    println!();
    println!("{:>10} {:>16} {:>12}", "r (m)", "A (Wb/m)", "|B| (T)");
    println!("{}", "-".repeat(40));
    let z = 0.025;
    for i in 0..=10 {
        let r = 0.02 * i as f64;
        let p = Point::new(r.min(0.2), z);
        match (problem.value_a(p), problem.value_b(p)) {
            (Ok(a), Ok(b)) => println!("{:>10.3} {:>16.6e} {:>12.4}", p.r(), a, b),
            (Err(e), _) | (_, Err(e)) => println!("{:>10.3} {}", p.r(), e),
        }
    }
}
