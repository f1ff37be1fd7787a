//! Mesh data model and structured grid generators

pub mod generators;
pub mod types;

pub use generators::*;
pub use types::*;
