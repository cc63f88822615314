//! Error types for the simulation core and scenario loading.

use std::fmt;

/// Errors raised while configuring a [`Simulation`](crate::physics::Simulation).
///
/// Once a simulation has been built from valid values, stepping it cannot fail.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// A body was given a zero, negative or non-finite mass.
    InvalidMass { name: String, mass: f64 },
    /// A body was given a non-finite position or velocity.
    NonFiniteState { name: String },
    /// The time step must be finite and strictly positive.
    InvalidTimeStep(f64),
    /// The gravitational constant must be finite.
    InvalidGravitationalConstant(f64),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::InvalidMass { name, mass } => {
                write!(f, "invalid body `{}`: mass must be positive (got {})", name, mass)
            }
            SimulationError::NonFiniteState { name } => {
                write!(f, "invalid body `{}`: position and velocity must be finite", name)
            }
            SimulationError::InvalidTimeStep(dt) => {
                write!(f, "time step must be finite and positive (got {})", dt)
            }
            SimulationError::InvalidGravitationalConstant(g) => {
                write!(f, "gravitational constant must be finite (got {})", g)
            }
        }
    }
}

impl std::error::Error for SimulationError {}

/// Errors that can occur while loading, saving or building a scenario.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read or write the scenario file.
    Io(std::io::Error),
    /// The scenario file is not valid JSON for a scenario.
    Parse(serde_json::Error),
    /// The scenario describes a simulation that cannot be built.
    Invalid(SimulationError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to access scenario file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse scenario: {}", e),
            ConfigError::Invalid(e) => write!(f, "Invalid scenario: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<SimulationError> for ConfigError {
    fn from(e: SimulationError) -> Self {
        ConfigError::Invalid(e)
    }
}
