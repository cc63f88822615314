//! Equations and body readout sidebar
//!
//! Displays the integrator's equations and the live state of each body using egui.

use egui::{Color32, Context, RichText};
use three_body::physics::{Body, Simulation};

/// An equation with its name and formula
pub struct Equation {
    pub name: &'static str,
    pub formula: &'static str,
    pub description: &'static str,
}

fn body_color32(body: &Body) -> Color32 {
    let [r, g, b] = body.color;
    Color32::from_rgb(r, g, b)
}

/// Draw the equations sidebar
pub fn draw_equations_sidebar(
    ctx: &Context,
    title: &str,
    equations: &[Equation],
    variables: &[(&str, &str)],
    simulation: &Simulation,
) {
    egui::SidePanel::right("equations_panel")
        .resizable(true)
        .default_width(280.0)
        .show(ctx, |ui| {
            ui.heading(RichText::new(title).color(Color32::LIGHT_BLUE));
            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.collapsing(RichText::new("Bodies").strong(), |ui| {
                    for body in simulation.bodies() {
                        ui.group(|ui| {
                            ui.label(RichText::new(&body.name).strong().color(body_color32(body)));
                            ui.label(
                                RichText::new(format!(
                                    "x = ({:+.4}, {:+.4})",
                                    body.position.x, body.position.y
                                ))
                                .monospace(),
                            );
                            ui.label(
                                RichText::new(format!(
                                    "v = ({:+.4}, {:+.4})  |v| = {:.4}",
                                    body.velocity.x,
                                    body.velocity.y,
                                    body.speed()
                                ))
                                .monospace(),
                            );
                        });
                    }
                });

                ui.add_space(8.0);

                ui.collapsing(RichText::new("Equations").strong(), |ui| {
                    for eq in equations {
                        ui.group(|ui| {
                            ui.label(RichText::new(eq.name).strong().color(Color32::YELLOW));
                            ui.label(RichText::new(eq.formula).monospace().color(Color32::WHITE));
                            ui.label(RichText::new(eq.description).small().italics());
                        });
                        ui.add_space(4.0);
                    }
                });

                ui.add_space(8.0);

                ui.collapsing(RichText::new("Variables").strong(), |ui| {
                    egui::Grid::new("variables_grid")
                        .num_columns(2)
                        .spacing([10.0, 4.0])
                        .show(ui, |ui| {
                            for (symbol, meaning) in variables {
                                ui.label(RichText::new(*symbol).monospace().color(Color32::LIGHT_GREEN));
                                ui.label(*meaning);
                                ui.end_row();
                            }
                        });
                });
            });
        });
}

/// Draw the status bar along the top of the window
pub fn draw_status_bar(ctx: &Context, simulation: &Simulation, paused: bool, finished: bool) {
    egui::TopBottomPanel::top("status").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.label(format!("Bodies: {}", simulation.bodies().len()));
            ui.separator();
            ui.label(format!("Step: {}", simulation.steps()));
            ui.separator();
            ui.label(format!("t = {:.3}", simulation.elapsed()));
            ui.separator();
            ui.label(format!("E = {:.6}", simulation.total_energy()));
            ui.separator();
            ui.label(format!("|p| = {:.2e}", simulation.total_momentum().length()));
            ui.separator();
            if finished {
                ui.label(RichText::new("DONE").color(Color32::LIGHT_BLUE));
            } else if paused {
                ui.label(RichText::new("PAUSED").color(Color32::YELLOW));
            } else {
                ui.label(RichText::new("RUNNING").color(Color32::GREEN));
            }
        });
    });
}

pub const GRAVITY_EQUATIONS: &[Equation] = &[
    Equation {
        name: "Newton's Law of Gravitation",
        formula: "F = G·m₁·m₂ / r²",
        description: "Force between two masses",
    },
    Equation {
        name: "Net Force",
        formula: "F⃗ᵢ = Σⱼ≠ᵢ G·mᵢ·mⱼ·(r⃗ⱼ-r⃗ᵢ) / |r⃗ⱼ-r⃗ᵢ|³",
        description: "Sum over every other body",
    },
    Equation {
        name: "Velocity Update",
        formula: "v⃗ₙ₊₁ = v⃗ₙ + (F⃗ᵢ / mᵢ)·Δt",
        description: "Explicit in the current forces",
    },
    Equation {
        name: "Position Update",
        formula: "r⃗ₙ₊₁ = r⃗ₙ + v⃗ₙ₊₁·Δt",
        description: "Uses the new velocity (semi-implicit Euler)",
    },
    Equation {
        name: "Total Energy",
        formula: "E = Σ ½·m·v² - Σ G·mᵢ·mⱼ / r",
        description: "Drifts slowly, never corrected",
    },
    Equation {
        name: "Total Momentum",
        formula: "p⃗ = Σ m·v⃗",
        description: "Conserved by pairwise forces",
    },
];

pub const GRAVITY_VARIABLES: &[(&str, &str)] = &[
    ("G", "Gravitational constant"),
    ("m", "Mass of a body"),
    ("r⃗", "Position vector"),
    ("v⃗", "Velocity vector"),
    ("F⃗", "Net gravitational force"),
    ("Δt", "Time step"),
    ("E", "Total energy"),
    ("p⃗", "Total momentum"),
];
