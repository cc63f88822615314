//! Newtonian N-body gravity with a fixed-step semi-implicit Euler integrator.
//!
//! The [`physics`] module is the simulation core. Everything else supports the
//! windowed driver in `main.rs`: scenario files, built-in presets and the
//! terminal telemetry printed each frame.

pub mod config;
pub mod error;
pub mod physics;
pub mod presets;
pub mod telemetry;

pub use config::{BodyConfig, DisplayConfig, ScenarioConfig, TelemetryConfig};
pub use error::{ConfigError, SimulationError};
pub use physics::{gravitational_force, Body, Simulation, Trail};
