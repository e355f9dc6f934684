//! Numerical primitives for comparing asymptotic and exact Bayes factors.

pub mod math;

pub use math::stable::*;
pub use math::normal::*;
pub use math::optimize;
pub use math::quadrature;
