//! Bilinear basis on an axis-aligned rectangle
//!
//! Local numbering follows the element vertex layout:
//! psi_0 at (x1, y1), psi_1 at (x2, y1), psi_2 at (x1, y2), psi_3 at (x2, y2).
//!
//! The stiffness integrals of grad(psi_i) . grad(psi_j) reduce to two
//! integer templates: `(hy / hx * G_X + hx / hy * G_Y) / 6`.

use crate::mesh::{Point, Rectangle};

/// Number of local basis functions
pub const BASIS_SIZE: usize = 4;

/// Template of the x-derivative integrals (scaled by hy / hx)
pub const G_X: [[f64; 4]; 4] = [
    [2.0, -2.0, 1.0, -1.0],
    [-2.0, 2.0, -1.0, 1.0],
    [1.0, -1.0, 2.0, -2.0],
    [-1.0, 1.0, -2.0, 2.0],
];

/// Template of the y-derivative integrals (scaled by hx / hy)
pub const G_Y: [[f64; 4]; 4] = [
    [2.0, 1.0, -2.0, -1.0],
    [1.0, 2.0, -1.0, -2.0],
    [-2.0, -1.0, 2.0, 1.0],
    [-1.0, -2.0, 1.0, 2.0],
];

/// Local stiffness matrix with coefficient `nu`
pub fn local_stiffness(rect: &Rectangle, nu: f64) -> [[f64; 4]; 4] {
    let hx = rect.width();
    let hy = rect.height();
    let sx = nu * hy / hx / 6.0;
    let sy = nu * hx / hy / 6.0;

    let mut g = [[0.0; 4]; 4];
    for i in 0..BASIS_SIZE {
        for j in 0..BASIS_SIZE {
            g[i][j] = sx * G_X[i][j] + sy * G_Y[i][j];
        }
    }
    g
}

/// Local load vector of a constant source density
///
/// Each basis function integrates to a quarter of the element area.
pub fn local_load(rect: &Rectangle, density: f64) -> [f64; 4] {
    [density * rect.area() / 4.0; 4]
}

/// Values of the four basis functions at `p`
pub fn shape_values(rect: &Rectangle, p: &Point) -> [f64; 4] {
    let Rectangle { x1, y1, x2, y2 } = *rect;
    let mes = rect.area();
    [
        (x2 - p.x) * (y2 - p.y) / mes,
        (p.x - x1) * (y2 - p.y) / mes,
        (x2 - p.x) * (p.y - y1) / mes,
        (p.x - x1) * (p.y - y1) / mes,
    ]
}

/// Interpolate nodal values `q` at `p`
pub fn interpolate(rect: &Rectangle, q: &[f64; 4], p: &Point) -> f64 {
    shape_values(rect, p)
        .iter()
        .zip(q.iter())
        .map(|(psi, qi)| psi * qi)
        .sum()
}

/// Element-averaged flux density magnitude
///
/// |B| = sqrt(q^T G q / (hx * hy)), with G the unit-coefficient local
/// stiffness: the root mean square of |grad A| over the element.
pub fn flux_density(rect: &Rectangle, q: &[f64; 4]) -> f64 {
    let g = local_stiffness(rect, 1.0);
    let mut energy = 0.0;
    for i in 0..BASIS_SIZE {
        for j in 0..BASIS_SIZE {
            energy += g[i][j] * q[i] * q[j];
        }
    }
    // round-off can push a vanishing quadratic form slightly negative
    (energy.max(0.0) / rect.area()).sqrt()
}
