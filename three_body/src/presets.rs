//! Built-in initial conditions

use crate::config::{BodyConfig, ScenarioConfig};
use crate::physics::DEFAULT_TRAIL_LENGTH;

/// Chenciner-Montgomery figure-eight orbit: three equal masses chasing each
/// other along a single figure-eight curve (G = 1).
pub fn figure_eight() -> ScenarioConfig {
    let body = |name: &str, position: [f64; 2], velocity: [f64; 2], color: [u8; 3]| BodyConfig {
        name: name.to_string(),
        mass: 1.0,
        position,
        velocity,
        color,
        radius: 10.0,
        trail: Some(DEFAULT_TRAIL_LENGTH),
    };

    ScenarioConfig {
        gravitational_constant: 1.0,
        time_step: 0.005,
        bodies: vec![
            body(
                "Body 1",
                [0.97000436, -0.24308753],
                [0.46620368, 0.43236573],
                [100, 100, 100],
            ),
            body(
                "Body 2",
                [-0.97000436, 0.24308753],
                [0.46620368, 0.43236573],
                [82, 196, 113],
            ),
            body(
                "Body 3",
                [0.0, 0.0],
                [-0.93240736, -0.86473146],
                [82, 158, 196],
            ),
        ],
    }
}
