//! Magnetic materials
//!
//! A material carries a relative permeability, either constant or given as a
//! tabulated curve of the flux density magnitude |B|, and an optional
//! azimuthal current density acting as the source term.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Vacuum permeability (H/m)
pub const MU0: f64 = 4.0 * PI * 1e-7;

/// Tabulated relative permeability mu_r(|B|)
///
/// Samples are sorted by flux; lookups interpolate linearly and clamp to the
/// first or last sample outside the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BhCurveSamples")]
pub struct BhCurve {
    samples: Vec<(f64, f64)>,
}

/// Unchecked serialized form of a [`BhCurve`]
#[derive(Deserialize)]
struct BhCurveSamples {
    samples: Vec<(f64, f64)>,
}

impl TryFrom<BhCurveSamples> for BhCurve {
    type Error = String;

    fn try_from(raw: BhCurveSamples) -> Result<Self, Self::Error> {
        Self::new(raw.samples).ok_or_else(|| {
            "B-H table must be non-empty with finite flux and finite positive mu_r".to_string()
        })
    }
}

impl BhCurve {
    /// Build from `(flux, mu_r)` samples in any order
    ///
    /// Returns `None` for an empty table or a sample that is not finite with
    /// positive permeability.
    pub fn new(mut samples: Vec<(f64, f64)>) -> Option<Self> {
        if samples.is_empty() || samples.iter().any(|&(b, mu)| !b.is_finite() || !is_valid_mu(mu)) {
            return None;
        }
        samples.sort_by(|a, b| a.0.total_cmp(&b.0));
        Some(Self { samples })
    }

    pub fn samples(&self) -> &[(f64, f64)] {
        &self.samples
    }

    /// Relative permeability at flux density `b`
    pub fn mu_r(&self, b: f64) -> f64 {
        let first = self.samples[0];
        let last = self.samples[self.samples.len() - 1];
        if b <= first.0 {
            return first.1;
        }
        if b >= last.0 {
            return last.1;
        }
        // first index with flux > b; always in 1..len here
        let k = self.samples.partition_point(|&(flux, _)| flux <= b);
        let (b0, mu0) = self.samples[k - 1];
        let (b1, mu1) = self.samples[k];
        mu0 + (mu1 - mu0) * (b - b0) / (b1 - b0)
    }
}

fn is_valid_mu(mu: f64) -> bool {
    mu.is_finite() && mu > 0.0
}

/// Relative permeability law
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Permeability {
    Constant(f64),
    Table(BhCurve),
}

/// Material of a mesh region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub permeability: Permeability,
    /// Azimuthal current density (A/m^2)
    #[serde(default)]
    pub current_density: f64,
}

impl Material {
    /// Linear material with constant relative permeability
    pub fn linear(mu_r: f64) -> Self {
        Self {
            permeability: Permeability::Constant(mu_r),
            current_density: 0.0,
        }
    }

    /// Nonmagnetic, source-free material
    pub fn air() -> Self {
        Self::linear(1.0)
    }

    /// Material with a tabulated permeability curve
    pub fn nonlinear(curve: BhCurve) -> Self {
        Self {
            permeability: Permeability::Table(curve),
            current_density: 0.0,
        }
    }

    /// Set the source current density
    pub fn with_current_density(mut self, current_density: f64) -> Self {
        self.current_density = current_density;
        self
    }

    /// Finite positive permeability and finite current density
    ///
    /// Tables are checked when they are built or deserialized.
    pub fn is_valid(&self) -> bool {
        let permeability = match &self.permeability {
            Permeability::Constant(mu_r) => is_valid_mu(*mu_r),
            Permeability::Table(_) => true,
        };
        permeability && self.current_density.is_finite()
    }

    pub fn is_nonlinear(&self) -> bool {
        matches!(self.permeability, Permeability::Table(_))
    }

    /// Relative permeability at flux density `b`
    pub fn mu_r(&self, b: f64) -> f64 {
        match &self.permeability {
            Permeability::Constant(mu_r) => *mu_r,
            Permeability::Table(curve) => curve.mu_r(b),
        }
    }

    /// Reluctivity nu = 1 / (mu0 * mu_r(|B|))
    pub fn reluctivity(&self, b: f64) -> f64 {
        1.0 / (MU0 * self.mu_r(b))
    }

    /// Reluctivity used by the linear assembly (the curve's value at B = 0)
    pub fn initial_reluctivity(&self) -> f64 {
        self.reluctivity(0.0)
    }

    /// Same material with the permeability frozen at B = 0
    pub fn linearized(&self) -> Self {
        Self {
            permeability: Permeability::Constant(self.mu_r(0.0)),
            current_density: self.current_density,
        }
    }
}
