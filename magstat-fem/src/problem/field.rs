//! Point queries on a solved field

use crate::basis::{flux_density, interpolate};
use crate::error::{FemError, Result};
use crate::mesh::{FiniteElement, Mesh, Point};
use ndarray::Array1;

/// Read-only view of nodal values on a mesh
#[derive(Debug, Clone, Copy)]
pub struct Field<'a> {
    mesh: &'a Mesh,
    values: &'a Array1<f64>,
}

impl<'a> Field<'a> {
    /// # Panics
    ///
    /// Panics if `values` does not have one entry per mesh node.
    pub fn new(mesh: &'a Mesh, values: &'a Array1<f64>) -> Self {
        assert_eq!(values.len(), mesh.num_nodes(), "Field size mismatch");
        Self { mesh, values }
    }

    pub fn values(&self) -> &'a Array1<f64> {
        self.values
    }

    /// Index of the first element whose closed rectangle contains `p`
    ///
    /// Points on a shared edge belong to the element listed first.
    pub fn locate(&self, p: &Point) -> Option<usize> {
        self.mesh
            .elements
            .iter()
            .position(|e| self.mesh.element_bounds(e).contains(p))
    }

    fn element_at(&self, p: &Point) -> Result<&'a FiniteElement> {
        self.locate(p)
            .map(|idx| &self.mesh.elements[idx])
            .ok_or(FemError::ElementNotFound { x: p.x, y: p.y })
    }

    /// Vector potential at `p` by bilinear interpolation
    pub fn value_a(&self, p: &Point) -> Result<f64> {
        let element = self.element_at(p)?;
        let rect = self.mesh.element_bounds(element);
        Ok(interpolate(&rect, &element.gather(self.values), p))
    }

    /// Flux density magnitude |B| of the element containing `p`
    pub fn value_b(&self, p: &Point) -> Result<f64> {
        let element = self.element_at(p)?;
        Ok(self.element_flux(element))
    }

    /// Flux density magnitude of element `index`
    pub fn flux_at_element(&self, index: usize) -> Option<f64> {
        self.mesh.elements.get(index).map(|e| self.element_flux(e))
    }

    fn element_flux(&self, element: &FiniteElement) -> f64 {
        let rect = self.mesh.element_bounds(element);
        flux_density(&rect, &element.gather(self.values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use crate::mesh::rectangular_mesh;
    use approx::assert_relative_eq;

    #[test]
    fn test_locate_first_match() {
        let (mesh, _) = rectangular_mesh((0.0, 2.0), (0.0, 1.0), 2, 1, Material::air()).unwrap();
        let values = Array1::zeros(mesh.num_nodes());
        let field = Field::new(&mesh, &values);
        assert_eq!(field.locate(&Point::new(0.5, 0.5)), Some(0));
        assert_eq!(field.locate(&Point::new(1.5, 0.5)), Some(1));
        // Shared edge x = 1
        assert_eq!(field.locate(&Point::new(1.0, 0.5)), Some(0));
        assert_eq!(field.locate(&Point::new(2.5, 0.5)), None);
    }

    #[test]
    fn test_values_of_linear_field() {
        let (mesh, _) = rectangular_mesh((0.0, 2.0), (0.0, 1.0), 2, 2, Material::air()).unwrap();
        let values = Array1::from_iter(mesh.nodes.iter().map(|p| 3.0 * p.x + 4.0 * p.y));
        let field = Field::new(&mesh, &values);

        assert_relative_eq!(field.value_a(&Point::new(0.3, 0.7)).unwrap(), 3.7, epsilon = 1e-12);
        assert_relative_eq!(field.value_b(&Point::new(1.2, 0.2)).unwrap(), 5.0, epsilon = 1e-12);
        assert_relative_eq!(field.flux_at_element(3).unwrap(), 5.0, epsilon = 1e-12);
        assert!(field.flux_at_element(4).is_none());
    }

    #[test]
    fn test_outside_point() {
        let (mesh, _) = rectangular_mesh((0.0, 1.0), (0.0, 1.0), 1, 1, Material::air()).unwrap();
        let values = Array1::zeros(4);
        let field = Field::new(&mesh, &values);
        let err = field.value_a(&Point::new(0.5, -0.1)).unwrap_err();
        assert!(matches!(err, FemError::ElementNotFound { x, y } if x == 0.5 && y == -0.1));
        assert!(field.value_b(&Point::new(1.5, 0.5)).is_err());
    }
}
