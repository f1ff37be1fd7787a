//! Structured mesh generators
//!
//! Tensor-product grids of rectangles over (R, Z) with uniform or
//! geometrically graded coordinates, plus a two-layer domain builder with
//! per-side boundary conditions.

use super::types::{BoundaryFn, FirstKindEdge, Mesh, Point};
use crate::error::MeshError;
use crate::material::Material;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Side of a rectangular domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// r = r_min
    Left,
    /// r = r_max
    Right,
    /// z = z_min
    Bottom,
    /// z = z_max
    Top,
}

/// Boundary condition applied along a side
#[derive(Clone)]
pub enum SideCondition {
    /// Prescribed potential g(r, z)
    FirstKind(BoundaryFn),
    /// Prescribed constant flux (zero is the natural condition)
    SecondKind(f64),
}

impl SideCondition {
    pub fn first_kind<F>(value: F) -> Self
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        SideCondition::FirstKind(Arc::new(value))
    }

    /// Homogeneous first-kind condition A = 0
    pub fn zero() -> Self {
        Self::first_kind(|_, _| 0.0)
    }

    /// Homogeneous natural condition
    pub fn natural() -> Self {
        SideCondition::SecondKind(0.0)
    }
}

impl Default for SideCondition {
    fn default() -> Self {
        Self::natural()
    }
}

impl fmt::Debug for SideCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SideCondition::FirstKind(_) => f.write_str("FirstKind(..)"),
            SideCondition::SecondKind(flux) => f.debug_tuple("SecondKind").field(flux).finish(),
        }
    }
}

/// Geometric step grading: first step `first_step`, each next step
/// multiplied by `ratio`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grading {
    pub first_step: f64,
    pub ratio: f64,
}

impl Grading {
    pub fn uniform(step: f64) -> Self {
        Self {
            first_step: step,
            ratio: 1.0,
        }
    }
}

/// `count` equally spaced coordinates from `start` to `end` inclusive
pub fn uniform_coordinates(start: f64, end: f64, count: usize) -> Result<Vec<f64>, MeshError> {
    if count < 2 || !(end > start) {
        return Err(MeshError::InvalidCoordinates { count });
    }
    let step = (end - start) / (count - 1) as f64;
    let mut coords: Vec<f64> = (0..count - 1).map(|i| start + i as f64 * step).collect();
    coords.push(end);
    Ok(coords)
}

/// Geometrically graded coordinates from `start` to `end` inclusive
///
/// The last coordinate is clamped to `end`; a final step shorter than a
/// billionth of the range is merged into the previous one.
pub fn graded_coordinates(start: f64, end: f64, grading: Grading) -> Result<Vec<f64>, MeshError> {
    graded_segment(start, end, grading).map(|(coords, _)| coords)
}

/// Upper bound on the nodes of one graded axis
pub const MAX_GRADED_NODES: usize = 1_000_000;

/// Graded coordinates plus the step the grading would take next
fn graded_segment(start: f64, end: f64, grading: Grading) -> Result<(Vec<f64>, f64), MeshError> {
    let Grading { first_step, ratio } = grading;
    if !(first_step > 0.0) || !(ratio > 0.0) {
        return Err(MeshError::InvalidGrading {
            step: first_step,
            ratio,
        });
    }
    if !(end > start) {
        return Err(MeshError::InvalidCoordinates { count: 1 });
    }
    let tol = 1e-9 * (end - start);
    let invalid = MeshError::InvalidGrading {
        step: first_step,
        ratio,
    };
    // A shrinking step must reach past end - tol, not just approach it
    if ratio < 1.0 && first_step / (1.0 - ratio) <= end - start - tol {
        return Err(invalid);
    }

    let mut coords = vec![start];
    let mut c = start;
    let mut step = first_step;
    loop {
        c += step;
        step *= ratio;
        if c >= end - tol {
            break;
        }
        if coords.len() >= MAX_GRADED_NODES {
            return Err(invalid);
        }
        coords.push(c);
    }
    coords.push(end);
    Ok((coords, step))
}

fn check_increasing(coords: &[f64]) -> Result<(), MeshError> {
    let increasing = coords.windows(2).all(|w| w[1] > w[0]);
    if coords.len() < 2 || !increasing {
        return Err(MeshError::InvalidCoordinates {
            count: coords.len(),
        });
    }
    Ok(())
}

/// Tensor-product grid of rectangles
///
/// Nodes are numbered row-major: all radial coordinates of the first axial
/// row, then the next row, so node `(i, j)` has index `j * nr + i`.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorGrid {
    r: Vec<f64>,
    z: Vec<f64>,
}

impl TensorGrid {
    pub fn new(r: Vec<f64>, z: Vec<f64>) -> Result<Self, MeshError> {
        check_increasing(&r)?;
        check_increasing(&z)?;
        Ok(Self { r, z })
    }

    /// Uniform grid with `nr x nz` cells
    pub fn uniform(
        r_range: (f64, f64),
        z_range: (f64, f64),
        nr: usize,
        nz: usize,
    ) -> Result<Self, MeshError> {
        Self::new(
            uniform_coordinates(r_range.0, r_range.1, nr + 1)?,
            uniform_coordinates(z_range.0, z_range.1, nz + 1)?,
        )
    }

    pub fn r(&self) -> &[f64] {
        &self.r
    }

    pub fn z(&self) -> &[f64] {
        &self.z
    }

    pub fn nr(&self) -> usize {
        self.r.len()
    }

    pub fn nz(&self) -> usize {
        self.z.len()
    }

    pub fn num_nodes(&self) -> usize {
        self.r.len() * self.z.len()
    }

    pub fn num_cells(&self) -> usize {
        (self.r.len() - 1) * (self.z.len() - 1)
    }

    /// Global index of node (radial i, axial j)
    pub fn node_index(&self, i: usize, j: usize) -> usize {
        j * self.r.len() + i
    }

    pub fn point(&self, i: usize, j: usize) -> Point {
        Point::new(self.r[i], self.z[j])
    }

    /// Node indices along a side, in increasing coordinate order
    pub fn side_nodes(&self, side: Side) -> Vec<usize> {
        let (nr, nz) = (self.nr(), self.nz());
        match side {
            Side::Left => (0..nz).map(|j| self.node_index(0, j)).collect(),
            Side::Right => (0..nz).map(|j| self.node_index(nr - 1, j)).collect(),
            Side::Bottom => (0..nr).map(|i| self.node_index(i, 0)).collect(),
            Side::Top => (0..nr).map(|i| self.node_index(i, nz - 1)).collect(),
        }
    }

    /// Consecutive node pairs along a side
    pub fn side_edges(&self, side: Side) -> Vec<(usize, usize)> {
        self.side_nodes(side).windows(2).map(|w| (w[0], w[1])).collect()
    }

    /// Index of the largest radial coordinate not greater than `split`
    ///
    /// Splits at or before the first coordinate give index 0.
    pub fn split_index(&self, split: f64) -> Result<usize, MeshError> {
        let last = self.r[self.r.len() - 1];
        if split > last {
            return Err(MeshError::SplitPointUnreachable { split, last });
        }
        let above = self.r.partition_point(|&r| r <= split);
        Ok(above.saturating_sub(1))
    }

    /// Build nodes and elements; `material_of(j)` picks the material of the
    /// cell row between axial coordinates `j` and `j + 1`
    pub fn build_mesh<F>(&self, materials: Vec<Material>, material_of: F) -> Mesh
    where
        F: Fn(usize) -> usize,
    {
        let mut mesh = Mesh::new();
        mesh.nodes.reserve(self.num_nodes());
        for j in 0..self.nz() {
            for i in 0..self.nr() {
                mesh.add_node(self.point(i, j));
            }
        }
        mesh.materials = materials;

        mesh.elements.reserve(self.num_cells());
        for j in 0..self.nz() - 1 {
            let material = material_of(j);
            for i in 0..self.nr() - 1 {
                let n00 = self.node_index(i, j);
                let n10 = n00 + 1;
                let n01 = self.node_index(i, j + 1);
                let n11 = n01 + 1;
                mesh.add_element([n00, n10, n01, n11], material);
            }
        }
        mesh
    }

    /// Attach a condition to the given side edges
    pub fn apply_condition(
        &self,
        mesh: &mut Mesh,
        edges: &[(usize, usize)],
        condition: &SideCondition,
    ) {
        for &(a, b) in edges {
            match condition {
                SideCondition::FirstKind(g) => mesh
                    .first_kind
                    .push(FirstKindEdge::from_shared(a, b, Arc::clone(g))),
                SideCondition::SecondKind(flux) => mesh.add_second_kind(a, b, *flux),
            }
        }
    }
}

/// Uniform single-material rectangle mesh without boundary conditions
pub fn rectangular_mesh(
    x_range: (f64, f64),
    y_range: (f64, f64),
    nx: usize,
    ny: usize,
    material: Material,
) -> Result<(Mesh, TensorGrid), MeshError> {
    let grid = TensorGrid::uniform(x_range, y_range, nx, ny)?;
    let mesh = grid.build_mesh(vec![material], |_| 0);
    Ok((mesh, grid))
}

/// Condition on the part of the bottom side left of a split point
#[derive(Debug, Clone)]
pub struct SplitCondition {
    pub point: f64,
    pub inner: SideCondition,
}

/// Two stacked material layers over `[r0, r1]`
///
/// Layer 0 spans `[z0, z0 + h0]`, layer 1 spans `[z0 + h0, z0 + h0 + h1]`.
/// The axial grading continues across the interface.
#[derive(Debug, Clone)]
pub struct LayeredDomain {
    pub r0: f64,
    pub r1: f64,
    pub z0: f64,
    pub layer_heights: [f64; 2],
    pub r_grading: Grading,
    pub z_grading: Grading,
    pub materials: [Material; 2],
    pub left: SideCondition,
    pub right: SideCondition,
    pub bottom: SideCondition,
    pub top: SideCondition,
    /// Optional split of the bottom side: edges left of the split take
    /// `inner`, the rest take `bottom`
    pub split: Option<SplitCondition>,
}

/// Build the mesh of a two-layer domain
pub fn layered_mesh(domain: &LayeredDomain) -> Result<(Mesh, TensorGrid), MeshError> {
    let r = graded_coordinates(domain.r0, domain.r1, domain.r_grading)?;

    let interface = domain.z0 + domain.layer_heights[0];
    let (mut z, next_step) = graded_segment(domain.z0, interface, domain.z_grading)?;
    let upper = Grading {
        first_step: next_step,
        ratio: domain.z_grading.ratio,
    };
    let (z_upper, _) = graded_segment(interface, interface + domain.layer_heights[1], upper)?;
    z.extend_from_slice(&z_upper[1..]);

    let grid = TensorGrid::new(r, z)?;
    let split_index = domain
        .split
        .as_ref()
        .map(|split| grid.split_index(split.point))
        .transpose()?;

    let z_coords = grid.z().to_vec();
    let tol = 1e-9 * domain.layer_heights[0];
    let mut mesh = grid.build_mesh(domain.materials.to_vec(), |j| {
        usize::from(z_coords[j] >= interface - tol)
    });

    let bottom = grid.side_edges(Side::Bottom);
    match (&domain.split, split_index) {
        (Some(split), Some(k)) => {
            grid.apply_condition(&mut mesh, &bottom[..k], &split.inner);
            grid.apply_condition(&mut mesh, &bottom[k..], &domain.bottom);
        }
        _ => grid.apply_condition(&mut mesh, &bottom, &domain.bottom),
    }
    grid.apply_condition(&mut mesh, &grid.side_edges(Side::Top), &domain.top);
    grid.apply_condition(&mut mesh, &grid.side_edges(Side::Left), &domain.left);
    grid.apply_condition(&mut mesh, &grid.side_edges(Side::Right), &domain.right);

    log::debug!(
        "layered mesh: {} x {} nodes, {} elements, {} first-kind edges, {} second-kind edges",
        grid.nr(),
        grid.nz(),
        mesh.num_elements(),
        mesh.first_kind.len(),
        mesh.second_kind.len()
    );

    Ok((mesh, grid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn domain() -> LayeredDomain {
        LayeredDomain {
            r0: 0.0,
            r1: 1.0,
            z0: 0.0,
            layer_heights: [0.5, 0.5],
            r_grading: Grading::uniform(0.25),
            z_grading: Grading::uniform(0.25),
            materials: [Material::linear(1000.0), Material::air()],
            left: SideCondition::natural(),
            right: SideCondition::zero(),
            bottom: SideCondition::natural(),
            top: SideCondition::zero(),
            split: None,
        }
    }

    #[test]
    fn test_uniform_coordinates() {
        let c = uniform_coordinates(1.0, 2.0, 5).unwrap();
        assert_eq!(c.len(), 5);
        assert_relative_eq!(c[1], 1.25);
        assert_eq!(c[4], 2.0);
        assert!(uniform_coordinates(0.0, 1.0, 1).is_err());
        assert!(uniform_coordinates(1.0, 0.0, 3).is_err());
    }

    #[test]
    fn test_graded_coordinates() {
        let c = graded_coordinates(0.0, 7.0, Grading { first_step: 1.0, ratio: 2.0 }).unwrap();
        assert_eq!(c, vec![0.0, 1.0, 3.0, 7.0]);

        // Last step is clamped to the end
        let c = graded_coordinates(0.0, 5.0, Grading { first_step: 1.0, ratio: 2.0 }).unwrap();
        assert_eq!(c, vec![0.0, 1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_graded_coordinates_invalid() {
        assert!(matches!(
            graded_coordinates(0.0, 1.0, Grading { first_step: 0.0, ratio: 1.0 }),
            Err(MeshError::InvalidGrading { .. })
        ));
        // 0.1 / (1 - 0.5) = 0.2 never reaches 1.0
        assert!(matches!(
            graded_coordinates(0.0, 1.0, Grading { first_step: 0.1, ratio: 0.5 }),
            Err(MeshError::InvalidGrading { .. })
        ));
    }

    #[test]
    fn test_graded_coordinates_terminate() {
        // Limit of the geometric series lands exactly on end - tol
        let first_step = (1.0 - 1e-9) * 0.5;
        assert!(matches!(
            graded_coordinates(0.0, 1.0, Grading { first_step, ratio: 0.5 }),
            Err(MeshError::InvalidGrading { .. })
        ));

        // Covers the range only after far too many nodes
        assert!(matches!(
            graded_coordinates(0.0, 1.0, Grading { first_step: 1e-12, ratio: 1.0 }),
            Err(MeshError::InvalidGrading { .. })
        ));

        let c = graded_coordinates(0.0, 1.0, Grading { first_step: 0.6, ratio: 0.5 }).unwrap();
        assert_eq!(c.first(), Some(&0.0));
        assert_eq!(c.last(), Some(&1.0));
    }

    #[test]
    fn test_tensor_grid_numbering() {
        let grid = TensorGrid::uniform((0.0, 2.0), (0.0, 1.0), 2, 1).unwrap();
        assert_eq!(grid.num_nodes(), 6);
        assert_eq!(grid.node_index(2, 1), 5);
        assert_eq!(grid.side_nodes(Side::Left), vec![0, 3]);
        assert_eq!(grid.side_nodes(Side::Right), vec![2, 5]);
        assert_eq!(grid.side_edges(Side::Top), vec![(3, 4), (4, 5)]);
        assert_eq!(grid.side_edges(Side::Bottom), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_tensor_grid_rejects_unsorted() {
        assert!(TensorGrid::new(vec![0.0, 1.0, 1.0], vec![0.0, 1.0]).is_err());
        assert!(TensorGrid::new(vec![0.0], vec![0.0, 1.0]).is_err());
    }

    #[test]
    fn test_split_index() {
        let grid = TensorGrid::new(vec![0.0, 1.0, 3.0, 7.0], vec![0.0, 1.0]).unwrap();
        assert_eq!(grid.split_index(2.0).unwrap(), 1);
        assert_eq!(grid.split_index(3.0).unwrap(), 2);
        assert_eq!(grid.split_index(-1.0).unwrap(), 0);
        assert_eq!(
            grid.split_index(8.0),
            Err(MeshError::SplitPointUnreachable {
                split: 8.0,
                last: 7.0
            })
        );
    }

    #[test]
    fn test_rectangular_mesh_is_valid() {
        let (mesh, grid) = rectangular_mesh((0.0, 1.0), (0.0, 2.0), 3, 4, Material::air()).unwrap();
        assert_eq!(mesh.num_nodes(), grid.num_nodes());
        assert_eq!(mesh.num_elements(), 12);
        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.elements[0].vertices, [0, 1, 4, 5]);
    }

    #[test]
    fn test_layered_mesh() {
        let (mesh, grid) = layered_mesh(&domain()).unwrap();
        assert!(mesh.validate().is_ok());
        assert_eq!(grid.nr(), 5);
        assert_eq!(grid.nz(), 5);

        // Lower two cell rows use layer 0, upper two use layer 1
        assert_eq!(mesh.elements[0].material, 0);
        assert_eq!(mesh.elements[7].material, 0);
        assert_eq!(mesh.elements[8].material, 1);
        assert_eq!(mesh.elements[15].material, 1);

        // right + top first kind, left + bottom natural
        assert_eq!(mesh.first_kind.len(), 8);
        assert_eq!(mesh.second_kind.len(), 8);
    }

    #[test]
    fn test_layered_mesh_split() {
        let mut d = domain();
        d.bottom = SideCondition::zero();
        d.split = Some(SplitCondition {
            point: 0.6,
            inner: SideCondition::SecondKind(1.0),
        });
        let (mesh, _) = layered_mesh(&d).unwrap();
        // split index 2: edges (0,1), (1,2) second kind with flux 1
        let with_flux: Vec<_> = mesh
            .second_kind
            .iter()
            .filter(|e| e.flux == 1.0)
            .map(|e| e.nodes)
            .collect();
        assert_eq!(with_flux, vec![(0, 1), (1, 2)]);
        assert_eq!(mesh.first_kind.len(), 2 + 4 + 4);

        d.split = Some(SplitCondition {
            point: 2.0,
            inner: SideCondition::natural(),
        });
        assert!(matches!(
            layered_mesh(&d),
            Err(MeshError::SplitPointUnreachable { .. })
        ));
    }
}
