//! Core math modules.

pub mod stable;
pub mod normal;
pub mod optimize;
pub mod quadrature;
