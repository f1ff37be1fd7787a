//! Problem orchestration
//!
//! [`Problem`] runs one linear assemble + solve pass; [`NonlinearProblem`]
//! wraps it in an under-relaxed fixed-point loop. Both answer point queries
//! through a [`Field`].

mod field;
mod linear;
mod nonlinear;

pub use field::Field;
pub use linear::Problem;
pub use nonlinear::{
    IterationReport, NonlinearConfig, NonlinearOutcome, NonlinearProblem, NonlinearState,
};
