//! N-body gravitational physics simulation

use std::collections::VecDeque;

use glam::DVec2;
use log::trace;

use crate::error::SimulationError;

/// Default number of positions kept by a body's trail
pub const DEFAULT_TRAIL_LENGTH: usize = 500;

/// Bounded history of past positions, oldest first
#[derive(Debug, Clone, PartialEq)]
pub struct Trail {
    points: VecDeque<DVec2>,
    max_len: usize,
}

impl Trail {
    pub fn new(max_len: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(max_len + 1),
            max_len,
        }
    }

    /// Append a position, dropping the oldest entries so at most `max_len` remain.
    pub fn record(&mut self, position: DVec2) {
        self.points.push_back(position);
        while self.points.len() > self.max_len {
            self.points.pop_front();
        }
    }

    pub fn points(&self) -> impl ExactSizeIterator<Item = &DVec2> + '_ {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn oldest(&self) -> Option<DVec2> {
        self.points.front().copied()
    }

    pub fn newest(&self) -> Option<DVec2> {
        self.points.back().copied()
    }
}

/// A point mass with rendering attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub name: String,
    pub mass: f64,
    pub position: DVec2,
    pub velocity: DVec2,
    /// RGB, only used for drawing
    pub color: [u8; 3],
    /// Screen-space radius in pixels
    pub radius: f32,
    pub trail: Option<Trail>,
}

impl Body {
    pub fn new(name: &str, mass: f64, position: DVec2, velocity: DVec2) -> Self {
        Self {
            name: name.to_string(),
            mass,
            position,
            velocity,
            color: [255, 255, 255],
            radius: 10.0,
            trail: None,
        }
    }

    pub fn with_color(mut self, color: [u8; 3]) -> Self {
        self.color = color;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_trail(mut self, max_len: usize) -> Self {
        self.trail = Some(Trail::new(max_len));
        self
    }

    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    pub fn momentum(&self) -> DVec2 {
        self.velocity * self.mass
    }

    fn validate(&self) -> Result<(), SimulationError> {
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(SimulationError::InvalidMass {
                name: self.name.clone(),
                mass: self.mass,
            });
        }
        if !(self.position.is_finite() && self.velocity.is_finite()) {
            return Err(SimulationError::NonFiniteState {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// Force exerted on `on` by `from`.
///
/// Coincident bodies exert no force on each other.
pub fn gravitational_force(g: f64, on: &Body, from: &Body) -> DVec2 {
    let r = from.position - on.position;
    let distance = r.length();
    if distance == 0.0 {
        return DVec2::ZERO;
    }

    let magnitude = g * on.mass * from.mass / (distance * distance);
    r / distance * magnitude
}

/// The physics simulation state
#[derive(Debug, Clone)]
pub struct Simulation {
    bodies: Vec<Body>,
    time_step: f64,
    gravitational_constant: f64,
    steps: u64,
    elapsed: f64,
}

impl Simulation {
    pub fn new(time_step: f64, gravitational_constant: f64) -> Result<Self, SimulationError> {
        if !(time_step.is_finite() && time_step > 0.0) {
            return Err(SimulationError::InvalidTimeStep(time_step));
        }
        if !gravitational_constant.is_finite() {
            return Err(SimulationError::InvalidGravitationalConstant(
                gravitational_constant,
            ));
        }

        Ok(Self {
            bodies: Vec::new(),
            time_step,
            gravitational_constant,
            steps: 0,
            elapsed: 0.0,
        })
    }

    /// Add a body to the end of the collection.
    ///
    /// Intended for setup before the first [`step`](Self::step).
    pub fn add_body(&mut self, body: Body) -> Result<(), SimulationError> {
        body.validate()?;
        self.bodies.push(body);
        Ok(())
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    pub fn gravitational_constant(&self) -> f64 {
        self.gravitational_constant
    }

    /// Number of completed steps
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Simulated time since construction
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Net force on every body, in collection order, from the current positions.
    pub fn net_forces(&self) -> Vec<DVec2> {
        self.bodies
            .iter()
            .enumerate()
            .map(|(i, body)| {
                self.bodies
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .fold(DVec2::ZERO, |net, (_, other)| {
                        net + gravitational_force(self.gravitational_constant, body, other)
                    })
            })
            .collect()
    }

    /// Advance the simulation by one time step.
    ///
    /// All forces are evaluated before any body moves. Velocity is updated
    /// first and the new velocity moves the position (semi-implicit Euler).
    pub fn step(&mut self) {
        let forces = self.net_forces();
        let dt = self.time_step;

        for (body, force) in self.bodies.iter_mut().zip(forces) {
            let acceleration = force / body.mass;
            body.velocity += acceleration * dt;
            body.position += body.velocity * dt;

            if let Some(trail) = &mut body.trail {
                trail.record(body.position);
            }
        }

        self.steps += 1;
        self.elapsed += dt;
        trace!("step {} complete, t = {:.6}", self.steps, self.elapsed);
    }

    /// Get the center of mass of all bodies
    pub fn center_of_mass(&self) -> DVec2 {
        let mut total_mass = 0.0;
        let mut com = DVec2::ZERO;

        for body in &self.bodies {
            com += body.position * body.mass;
            total_mass += body.mass;
        }

        if total_mass > 0.0 {
            com / total_mass
        } else {
            DVec2::ZERO
        }
    }

    pub fn total_momentum(&self) -> DVec2 {
        self.bodies.iter().map(Body::momentum).sum()
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.bodies
            .iter()
            .map(|b| 0.5 * b.mass * b.velocity.length_squared())
            .sum()
    }

    /// Pairwise potential energy. Coincident pairs contribute nothing.
    pub fn potential_energy(&self) -> f64 {
        let mut energy = 0.0;
        for (i, a) in self.bodies.iter().enumerate() {
            for b in &self.bodies[i + 1..] {
                let distance = a.position.distance(b.position);
                if distance > 0.0 {
                    energy -= self.gravitational_constant * a.mass * b.mass / distance;
                }
            }
        }
        energy
    }

    pub fn total_energy(&self) -> f64 {
        self.kinetic_energy() + self.potential_energy()
    }
}
