//! Common utilities for physics simulations
//!
//! This crate provides shared window/GPU setup and the 2D camera used by the
//! simulation binaries.

pub mod graphics;
pub mod camera;

pub use graphics::*;
pub use camera::*;

/// Physical constants used in simulations
pub mod constants {
    /// Newtonian gravitational constant in m³·kg⁻¹·s⁻²
    pub const G: f64 = 6.674_30e-11;
}
