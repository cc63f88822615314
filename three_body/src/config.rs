//! Scenario and display configuration.
//!
//! A scenario is the physical setup: the constants and the initial state of
//! every body. It can be stored as JSON:
//!
//! ```json
//! {
//!   "gravitational_constant": 1.0,
//!   "time_step": 0.005,
//!   "bodies": [
//!     {
//!       "name": "Body 1",
//!       "mass": 1.0,
//!       "position": [0.97000436, -0.24308753],
//!       "velocity": [0.46620368, 0.43236573],
//!       "color": [100, 100, 100],
//!       "radius": 10.0,
//!       "trail": 500
//!     }
//!   ]
//! }
//! ```
//!
//! [`DisplayConfig`] holds everything the driver needs that the core never
//! sees (window size, scale, pacing, terminal output).

use std::fs;
use std::path::Path;

use glam::DVec2;
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::physics::{Body, Simulation};

fn default_color() -> [u8; 3] {
    [255, 255, 255]
}

fn default_radius() -> f32 {
    10.0
}

/// Initial state of a single body
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BodyConfig {
    pub name: String,
    pub mass: f64,
    pub position: [f64; 2],
    pub velocity: [f64; 2],
    #[serde(default = "default_color")]
    pub color: [u8; 3],
    #[serde(default = "default_radius")]
    pub radius: f32,
    /// Maximum trail length, `None` disables the trail
    #[serde(default)]
    pub trail: Option<usize>,
}

impl BodyConfig {
    pub fn to_body(&self) -> Body {
        let body = Body::new(
            &self.name,
            self.mass,
            DVec2::from_array(self.position),
            DVec2::from_array(self.velocity),
        )
        .with_color(self.color)
        .with_radius(self.radius);

        match self.trail {
            Some(len) => body.with_trail(len),
            None => body,
        }
    }
}

/// Physical setup of a simulation run
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    pub gravitational_constant: f64,
    pub time_step: f64,
    pub bodies: Vec<BodyConfig>,
}

impl ScenarioConfig {
    /// Load a scenario from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path.as_ref())?;
        let scenario: Self = serde_json::from_str(&json)?;
        info!(
            "Loaded scenario with {} bodies from {}",
            scenario.bodies.len(),
            path.as_ref().display()
        );
        Ok(scenario)
    }

    /// Save the scenario to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Build a simulation, validating the constants and every body.
    pub fn build(&self) -> Result<Simulation, ConfigError> {
        let mut simulation = Simulation::new(self.time_step, self.gravitational_constant)?;
        for body in &self.bodies {
            simulation.add_body(body.to_body())?;
        }
        Ok(simulation)
    }
}

/// Terminal telemetry settings
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryConfig {
    pub enabled: bool,
    /// Width of the dashed line printed after each frame
    pub separator_width: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            separator_width: 80,
        }
    }
}

/// Window and run-loop settings for the driver
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Pixels per world unit
    pub scale: f64,
    pub frame_rate: u32,
    /// Number of steps to run, 0 runs until the window is closed
    pub runs: u64,
    pub telemetry: TelemetryConfig,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: "3 Body Simulation".to_string(),
            width: 1500,
            height: 700,
            scale: 100.0,
            frame_rate: 60,
            runs: 0,
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl DisplayConfig {
    /// Whether the run budget allows another step after `completed` steps.
    pub fn allows_step(&self, completed: u64) -> bool {
        self.runs == 0 || completed < self.runs
    }

    /// World units visible from the center to the top edge of the window.
    pub fn half_height_world(&self) -> f64 {
        self.height as f64 / (2.0 * self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets;

    #[test]
    fn body_config_defaults() {
        let json = r#"{
            "name": "moon",
            "mass": 2.0,
            "position": [1.0, 2.0],
            "velocity": [0.0, -1.0]
        }"#;
        let body: BodyConfig = serde_json::from_str(json).unwrap();
        assert_eq!(body.color, [255, 255, 255]);
        assert_eq!(body.radius, 10.0);
        assert_eq!(body.trail, None);
        assert!(body.to_body().trail.is_none());
    }

    #[test]
    fn trail_length_is_applied() {
        let mut config = presets::figure_eight().bodies[0].clone();
        config.trail = Some(12);
        let body = config.to_body();
        assert_eq!(body.trail.map(|t| t.max_len()), Some(12));
    }

    #[test]
    fn build_rejects_invalid_body() {
        let mut scenario = presets::figure_eight();
        scenario.bodies[1].mass = -1.0;
        assert!(matches!(scenario.build(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn save_then_load() {
        let scenario = presets::figure_eight();
        let path = std::env::temp_dir().join(format!(
            "three_body_scenario_{}.json",
            std::process::id()
        ));
        scenario.save(&path).unwrap();
        let loaded = ScenarioConfig::load(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(loaded, scenario);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ScenarioConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn run_budget() {
        let mut display = DisplayConfig::default();
        assert!(display.allows_step(u64::MAX - 1));
        display.runs = 3;
        assert!(display.allows_step(2));
        assert!(!display.allows_step(3));
    }

    #[test]
    fn default_view_height() {
        let display = DisplayConfig::default();
        assert!((display.half_height_world() - 3.5).abs() < 1e-12);
    }
}
