//! Mesh types for axisymmetric rectangular finite elements
//!
//! Coordinates are (R, Z): `x` is the radial and `y` the axial coordinate.

use crate::error::MeshError;
use crate::material::Material;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Boundary value function g(x, y)
pub type BoundaryFn = Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>;

/// A point in the (R, Z) half-plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Radial coordinate
    pub fn r(&self) -> f64 {
        self.x
    }

    /// Axial coordinate
    pub fn z(&self) -> f64 {
        self.y
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<(f64, f64)> for Point {
    fn from(p: (f64, f64)) -> Self {
        Point::new(p.0, p.1)
    }
}

/// Axis-aligned bounds of an element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Rectangle {
    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).abs()
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).abs()
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Closed containment test, boundaries included
    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.x1 && p.x <= self.x2 && p.y >= self.y1 && p.y <= self.y2
    }

    pub fn center(&self) -> Point {
        Point::new(0.5 * (self.x1 + self.x2), 0.5 * (self.y1 + self.y2))
    }
}

/// Bilinear rectangular element
///
/// Vertex layout: `v0 = (x1, y1)`, `v1 = (x2, y1)`, `v2 = (x1, y2)`,
/// `v3 = (x2, y2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiniteElement {
    /// Global node indices
    pub vertices: [usize; 4],
    /// Index into [`Mesh::materials`]
    pub material: usize,
}

impl FiniteElement {
    pub fn new(vertices: [usize; 4], material: usize) -> Self {
        Self { vertices, material }
    }

    /// Nodal values of `q` at the four vertices
    pub fn gather(&self, q: &Array1<f64>) -> [f64; 4] {
        self.vertices.map(|v| q[v])
    }
}

impl std::ops::Index<usize> for FiniteElement {
    type Output = usize;

    fn index(&self, local: usize) -> &usize {
        &self.vertices[local]
    }
}

/// First-kind (Dirichlet) edge: A = g(x, y) at both endpoints
#[derive(Clone)]
pub struct FirstKindEdge {
    pub nodes: (usize, usize),
    value: BoundaryFn,
}

impl FirstKindEdge {
    pub fn new<F>(a: usize, b: usize, value: F) -> Self
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        Self {
            nodes: (a, b),
            value: Arc::new(value),
        }
    }

    /// Build from an already shared boundary function
    pub fn from_shared(a: usize, b: usize, value: BoundaryFn) -> Self {
        Self { nodes: (a, b), value }
    }

    /// Evaluate the boundary value at a point
    pub fn value(&self, x: f64, y: f64) -> f64 {
        (self.value)(x, y)
    }
}

impl fmt::Debug for FirstKindEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirstKindEdge")
            .field("nodes", &self.nodes)
            .finish_non_exhaustive()
    }
}

/// Second-kind (Neumann) edge with a constant normal flux
///
/// Zero flux is the homogeneous natural condition and adds nothing to the
/// system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SecondKindEdge {
    pub nodes: (usize, usize),
    pub flux: f64,
}

impl SecondKindEdge {
    pub fn new(a: usize, b: usize, flux: f64) -> Self {
        Self { nodes: (a, b), flux }
    }
}

/// Finite element mesh
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Node coordinates; the index is the global degree of freedom
    pub nodes: Vec<Point>,
    pub elements: Vec<FiniteElement>,
    pub materials: Vec<Material>,
    pub first_kind: Vec<FirstKindEdge>,
    pub second_kind: Vec<SecondKindEdge>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    /// Add a node and return its index
    pub fn add_node(&mut self, point: Point) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(point);
        idx
    }

    /// Add a material and return its index
    pub fn add_material(&mut self, material: Material) -> usize {
        let idx = self.materials.len();
        self.materials.push(material);
        idx
    }

    /// Add an element and return its index
    pub fn add_element(&mut self, vertices: [usize; 4], material: usize) -> usize {
        let idx = self.elements.len();
        self.elements.push(FiniteElement::new(vertices, material));
        idx
    }

    pub fn add_first_kind<F>(&mut self, a: usize, b: usize, value: F)
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        self.first_kind.push(FirstKindEdge::new(a, b, value));
    }

    pub fn add_second_kind(&mut self, a: usize, b: usize, flux: f64) {
        self.second_kind.push(SecondKindEdge::new(a, b, flux));
    }

    /// Bounds of an element, read from vertices 0, 1 and 2
    pub fn element_bounds(&self, element: &FiniteElement) -> Rectangle {
        let p0 = self.nodes[element[0]];
        let p1 = self.nodes[element[1]];
        let p2 = self.nodes[element[2]];
        Rectangle {
            x1: p0.x,
            y1: p0.y,
            x2: p1.x,
            y2: p2.y,
        }
    }

    /// Material of an element
    pub fn material_of(&self, element: &FiniteElement) -> &Material {
        &self.materials[element.material]
    }

    /// True when any material depends on the flux density
    pub fn is_nonlinear(&self) -> bool {
        self.materials.iter().any(Material::is_nonlinear)
    }

    /// Same mesh with every material frozen at its B = 0 permeability
    pub fn linearized(&self) -> Mesh {
        Mesh {
            materials: self.materials.iter().map(Material::linearized).collect(),
            ..self.clone()
        }
    }

    /// Prescribed values of all first-kind nodes
    ///
    /// A node shared by several edges keeps the value of the first edge
    /// listing it.
    pub fn first_kind_values(&self) -> BTreeMap<usize, f64> {
        let mut values = BTreeMap::new();
        for edge in &self.first_kind {
            for node in [edge.nodes.0, edge.nodes.1] {
                values.entry(node).or_insert_with(|| {
                    let p = self.nodes[node];
                    edge.value(p.x, p.y)
                });
            }
        }
        values
    }

    /// Check the data-model invariants
    pub fn validate(&self) -> Result<(), MeshError> {
        let num_nodes = self.num_nodes();
        let check_node = |index: usize| {
            if index < num_nodes {
                Ok(())
            } else {
                Err(MeshError::InvalidNodeIndex { index, num_nodes })
            }
        };

        for (idx, element) in self.elements.iter().enumerate() {
            for &v in &element.vertices {
                check_node(v)?;
            }
            if element.material >= self.materials.len() {
                return Err(MeshError::UnknownMaterial {
                    element: idx,
                    material: element.material,
                });
            }
            if !self.materials[element.material].is_valid() {
                return Err(MeshError::InvalidMaterial {
                    element: idx,
                    material: element.material,
                });
            }

            let bounds = self.element_bounds(element);
            let hx = bounds.x2 - bounds.x1;
            let hy = bounds.y2 - bounds.y1;
            if !(hx > 0.0 && hy > 0.0) {
                return Err(MeshError::DegenerateElement {
                    element: idx,
                    hx,
                    hy,
                });
            }

            let tol = 1e-12 * (hx + hy);
            let p1 = self.nodes[element[1]];
            let p2 = self.nodes[element[2]];
            let p3 = self.nodes[element[3]];
            let aligned = (p1.y - bounds.y1).abs() <= tol
                && (p2.x - bounds.x1).abs() <= tol
                && (p3.x - bounds.x2).abs() <= tol
                && (p3.y - bounds.y2).abs() <= tol;
            if !aligned {
                return Err(MeshError::NotAxisAligned { element: idx });
            }
        }

        for edge in &self.first_kind {
            check_node(edge.nodes.0)?;
            check_node(edge.nodes.1)?;
        }
        for edge in &self.second_kind {
            check_node(edge.nodes.0)?;
            check_node(edge.nodes.1)?;
        }

        Ok(())
    }
}
