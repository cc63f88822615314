//! Per-frame terminal diagnostics.
//!
//! Each body is printed in its own 24-bit color, followed by a dashed
//! separator whose width comes from [`TelemetryConfig`].

use crate::config::TelemetryConfig;
use crate::physics::Body;

const RESET: &str = "\x1b[0m";

fn ansi_color(color: [u8; 3]) -> String {
    format!("\x1b[38;2;{};{};{}m", color[0], color[1], color[2])
}

/// Diagnostic text for one body.
pub fn body_report(body: &Body) -> String {
    let color = ansi_color(body.color);
    format!(
        "{color}{name}{RESET}\n\
         {color}Position: ({px}, {py}) meters,\n\
         Velocity: {speed} m/s, x Velocity: {vx} m/s, y Velocity: {vy} m/s{RESET}\n",
        name = body.name,
        px = body.position.x,
        py = body.position.y,
        speed = body.speed(),
        vx = body.velocity.x,
        vy = body.velocity.y,
    )
}

/// Full report for one frame: every body followed by the separator line.
pub fn frame_report(bodies: &[Body], config: &TelemetryConfig) -> String {
    let mut out = String::new();
    for body in bodies {
        out.push_str(&body_report(body));
        out.push('\n');
    }
    out.push_str(&"-".repeat(config.separator_width));
    out.push('\n');
    out
}
