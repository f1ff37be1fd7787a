//! Finite element basis functions
//!
//! Bilinear (Q1) functions on axis-aligned rectangles.

mod bilinear;

pub use bilinear::*;
