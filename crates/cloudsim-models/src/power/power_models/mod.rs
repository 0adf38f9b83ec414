//! A collection of power models.

pub mod constant;
pub mod cubic;
pub mod empirical;
pub mod linear;
pub mod sqrt;
pub mod square;
