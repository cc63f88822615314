//! 2D N-body Gravity Simulation
//!
//! Real-time gravitational simulation of a handful of bodies, rendered with
//! wgpu. By default it runs the figure-eight three-body orbit.
//!
//! Every simulated step also prints each body's position and velocity to the
//! terminal in the body's color (disable with `--quiet`).
//!
//! Controls:
//! - Scroll: Zoom in/out
//! - Space: Pause/resume simulation
//! - T: Toggle trails
//! - R: Restart from the initial conditions
//! - Escape: Quit

mod equations_ui;
mod renderer;

use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use common::{Camera2D, GraphicsContext};
use equations_ui::{draw_equations_sidebar, draw_status_bar, GRAVITY_EQUATIONS, GRAVITY_VARIABLES};
use log::{debug, info, warn};
use renderer::Renderer;
use three_body::{presets, telemetry, DisplayConfig, ScenarioConfig, Simulation, TelemetryConfig};
use winit::{
    event::{ElementState, Event, KeyEvent, MouseScrollDelta, WindowEvent},
    event_loop::ControlFlow,
    keyboard::{KeyCode, PhysicalKey},
};

/// How often (in steps) energy drift is written to the debug log
const ENERGY_LOG_INTERVAL: u64 = 600;

#[derive(Parser, Debug)]
#[command(version, about = "Real-time N-body gravity simulation")]
struct Args {
    /// Scenario file (JSON); defaults to the figure-eight orbit
    #[arg(short, long, value_name = "FILE")]
    scenario: Option<PathBuf>,

    /// Number of steps to run, 0 runs until the window is closed
    #[arg(short, long, default_value_t = 0)]
    runs: u64,

    /// Window width in pixels
    #[arg(long, default_value_t = 1500, value_parser = clap::value_parser!(u32).range(1..))]
    width: u32,

    /// Window height in pixels
    #[arg(long, default_value_t = 700, value_parser = clap::value_parser!(u32).range(1..))]
    height: u32,

    /// Pixels per world unit
    #[arg(long, default_value_t = 100.0, value_parser = positive_scale)]
    scale: f64,

    /// Frames (and steps) per second
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    fps: u32,

    /// Override the scenario's gravitational constant
    #[arg(short = 'g', long, conflicts_with = "si_gravity")]
    gravitational_constant: Option<f64>,

    /// Use the SI gravitational constant (6.6743e-11)
    #[arg(long)]
    si_gravity: bool,

    /// Override the scenario's time step
    #[arg(long)]
    time_step: Option<f64>,

    /// Don't print per-body telemetry to the terminal
    #[arg(short, long)]
    quiet: bool,

    /// Width of the separator line printed after each frame's telemetry
    #[arg(long, default_value_t = 80)]
    separator_width: usize,

    /// Write the active scenario as JSON and exit
    #[arg(long, value_name = "FILE")]
    dump_scenario: Option<PathBuf>,
}

fn positive_scale(s: &str) -> Result<f64, String> {
    let scale: f64 = s.parse().map_err(|_| format!("`{}` is not a number", s))?;
    if scale.is_finite() && scale > 0.0 {
        Ok(scale)
    } else {
        Err(format!("scale must be positive and finite (got {})", scale))
    }
}

impl Args {
    fn scenario(&self) -> Result<ScenarioConfig> {
        let mut scenario = match &self.scenario {
            Some(path) => ScenarioConfig::load(path)
                .with_context(|| format!("failed to load scenario {}", path.display()))?,
            None => presets::figure_eight(),
        };

        if let Some(g) = self.gravitational_constant {
            scenario.gravitational_constant = g;
        } else if self.si_gravity {
            scenario.gravitational_constant = common::constants::G;
        }
        if let Some(dt) = self.time_step {
            scenario.time_step = dt;
        }

        Ok(scenario)
    }

    fn display(&self) -> DisplayConfig {
        DisplayConfig {
            width: self.width,
            height: self.height,
            scale: self.scale,
            frame_rate: self.fps,
            runs: self.runs,
            telemetry: TelemetryConfig {
                enabled: !self.quiet,
                separator_width: self.separator_width,
            },
            ..DisplayConfig::default()
        }
    }
}

/// Fixed-rate frame clock
struct FramePacer {
    period: Duration,
    next_frame: Instant,
}

impl FramePacer {
    fn new(frame_rate: u32, now: Instant) -> Self {
        Self {
            period: Duration::from_secs_f64(1.0 / frame_rate as f64),
            next_frame: now,
        }
    }

    /// Returns true when a frame is due, scheduling the one after it.
    fn tick(&mut self, now: Instant) -> bool {
        if now < self.next_frame {
            return false;
        }
        self.next_frame += self.period;
        // Don't try to catch up after a stall
        if self.next_frame < now {
            self.next_frame = now + self.period;
        }
        true
    }

    fn next_frame(&self) -> Instant {
        self.next_frame
    }
}

struct EguiState {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

struct App {
    ctx: GraphicsContext,
    renderer: Renderer,
    initial: Simulation,
    simulation: Simulation,
    display: DisplayConfig,
    camera: Camera2D,
    initial_energy: f64,
    runs_done: u64,
    frame_due: bool,
    paused: bool,
    show_trails: bool,
    egui: EguiState,
}

impl App {
    fn new(ctx: GraphicsContext, simulation: Simulation, display: DisplayConfig) -> Self {
        let max_trail_vertices = simulation
            .bodies()
            .iter()
            .filter_map(|b| b.trail.as_ref().map(|t| t.max_len()))
            .sum();
        let renderer = Renderer::new(&ctx, simulation.bodies().len(), max_trail_vertices);

        let mut camera = Camera2D::new(ctx.aspect_ratio());
        camera.zoom = display.half_height_world() as f32;

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &ctx.window,
            Some(ctx.window.scale_factor() as f32),
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&ctx.device, ctx.config.format, None, 1);

        Self {
            ctx,
            renderer,
            initial: simulation.clone(),
            initial_energy: simulation.total_energy(),
            simulation,
            display,
            camera,
            runs_done: 0,
            frame_due: false,
            paused: false,
            show_trails: true,
            egui: EguiState {
                ctx: egui_ctx,
                state: egui_state,
                renderer: egui_renderer,
            },
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.ctx.resize(new_size);
        self.camera.update_aspect_ratio(self.ctx.aspect_ratio());
    }

    fn finished(&self) -> bool {
        !self.display.allows_step(self.runs_done)
    }

    /// Step once if the frame clock has asked for a new frame.
    fn update(&mut self) {
        if !std::mem::take(&mut self.frame_due) || self.paused || self.finished() {
            return;
        }

        self.simulation.step();
        self.runs_done += 1;

        if self.simulation.steps() % ENERGY_LOG_INTERVAL == 0 {
            let energy = self.simulation.total_energy();
            debug!(
                "step {}: E = {:.9} (drift {:+.3e}), |p| = {:.3e}",
                self.simulation.steps(),
                energy,
                energy - self.initial_energy,
                self.simulation.total_momentum().length()
            );
        }

        if self.display.telemetry.enabled {
            let report = telemetry::frame_report(self.simulation.bodies(), &self.display.telemetry);
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout.write_all(report.as_bytes()) {
                warn!("Disabling telemetry, stdout is unavailable: {}", e);
                self.display.telemetry.enabled = false;
            }
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.update_camera(&self.ctx.queue, &self.camera);
        let frame = self.renderer.update_bodies(
            &self.ctx.queue,
            self.simulation.bodies(),
            self.camera.world_per_pixel(self.ctx.size.height),
            self.show_trails,
        );

        // Build egui UI
        let raw_input = self.egui.state.take_egui_input(&self.ctx.window);
        let finished = self.finished();
        let full_output = self.egui.ctx.run(raw_input, |ctx| {
            draw_status_bar(ctx, &self.simulation, self.paused, finished);
            draw_equations_sidebar(
                ctx,
                "N-Body Gravity",
                GRAVITY_EQUATIONS,
                GRAVITY_VARIABLES,
                &self.simulation,
            );
        });

        self.egui
            .state
            .handle_platform_output(&self.ctx.window, full_output.platform_output);
        let tris = self
            .egui
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui
                .renderer
                .update_texture(&self.ctx.device, &self.ctx.queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.ctx.size.width, self.ctx.size.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.renderer.render(&mut encoder, &view, &frame);

        self.egui.renderer.update_buffers(
            &self.ctx.device,
            &self.ctx.queue,
            &mut encoder,
            &tris,
            &screen_descriptor,
        );
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.egui
                .renderer
                .render(&mut render_pass, &tris, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui.renderer.free_texture(id);
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    fn restart(&mut self) {
        info!("Restarting from initial conditions");
        self.simulation = self.initial.clone();
        self.runs_done = 0;
    }

    /// Returns false if the key asks to quit.
    fn handle_key(&mut self, key: KeyCode, state: ElementState) -> bool {
        if state != ElementState::Pressed {
            return true;
        }

        match key {
            KeyCode::Escape => return false,
            KeyCode::Space => self.paused = !self.paused,
            KeyCode::KeyT => self.show_trails = !self.show_trails,
            KeyCode::KeyR => self.restart(),
            _ => {}
        }
        true
    }

    fn handle_scroll(&mut self, delta: f32) {
        let base = self.display.half_height_world() as f32;
        self.camera.zoom *= 1.0 - delta * 0.1;
        self.camera.zoom = self.camera.zoom.clamp(base * 0.05, base * 20.0);
    }

    fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        self.egui.state.on_window_event(&self.ctx.window, event).consumed
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let scenario = args.scenario()?;

    if let Some(path) = &args.dump_scenario {
        scenario
            .save(path)
            .with_context(|| format!("failed to write scenario to {}", path.display()))?;
        info!("Wrote scenario to {}", path.display());
        return Ok(());
    }

    let simulation = scenario.build().context("invalid scenario")?;
    let display = args.display();
    info!(
        "Simulating {} bodies (G = {}, dt = {}), {}",
        simulation.bodies().len(),
        simulation.gravitational_constant(),
        simulation.time_step(),
        match display.runs {
            0 => "until the window is closed".to_string(),
            n => format!("for {} steps", n),
        }
    );

    let (ctx, event_loop) = pollster::block_on(GraphicsContext::new(
        &display.title,
        display.width,
        display.height,
    ))
    .context("graphics initialisation failed")?;

    let mut pacer = FramePacer::new(display.frame_rate, Instant::now());
    let mut app = App::new(ctx, simulation, display);

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { ref event, .. } => {
                if app.handle_window_event(event) {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::Resized(size) => app.resize(*size),
                    WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                physical_key: PhysicalKey::Code(key),
                                state,
                                ..
                            },
                        ..
                    } => {
                        if !app.handle_key(*key, *state) {
                            elwt.exit();
                        }
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        let scroll = match delta {
                            MouseScrollDelta::LineDelta(_, y) => *y,
                            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                        };
                        app.handle_scroll(scroll);
                    }
                    WindowEvent::RedrawRequested => {
                        app.update();
                        match app.render() {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost) => {
                                warn!("Surface lost, reconfiguring");
                                app.resize(app.ctx.size);
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                            Err(e) => warn!("Render error: {:?}", e),
                        }

                        if app.finished() {
                            info!("Completed {} steps", app.runs_done);
                            elwt.exit();
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                if pacer.tick(Instant::now()) {
                    app.frame_due = true;
                    app.ctx.window.request_redraw();
                }
                elwt.set_control_flow(ControlFlow::WaitUntil(pacer.next_frame()));
            }
            _ => {}
        })
        .context("event loop error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_args_run_figure_eight_forever() {
        let args = Args::try_parse_from(["three_body"]).unwrap();
        let scenario = args.scenario().unwrap();
        assert_eq!(scenario, presets::figure_eight());

        let display = args.display();
        assert_eq!(display.runs, 0);
        assert_eq!((display.width, display.height), (1500, 700));
        assert_eq!(display.frame_rate, 60);
        assert!(display.telemetry.enabled);
    }

    #[test]
    fn overrides_are_applied() {
        let args = Args::try_parse_from([
            "three_body",
            "--runs",
            "120",
            "-g",
            "2.5",
            "--time-step",
            "0.001",
            "--quiet",
            "--separator-width",
            "40",
        ])
        .unwrap();
        let scenario = args.scenario().unwrap();
        assert_eq!(scenario.gravitational_constant, 2.5);
        assert_eq!(scenario.time_step, 0.001);

        let display = args.display();
        assert_eq!(display.runs, 120);
        assert!(!display.telemetry.enabled);
        assert_eq!(display.telemetry.separator_width, 40);
    }

    #[test]
    fn si_gravity_uses_physical_constant() {
        let args = Args::try_parse_from(["three_body", "--si-gravity"]).unwrap();
        let scenario = args.scenario().unwrap();
        assert_eq!(scenario.gravitational_constant, common::constants::G);
    }

    #[test]
    fn zero_fps_is_rejected() {
        assert!(Args::try_parse_from(["three_body", "--fps", "0"]).is_err());
    }

    #[test]
    fn zero_window_size_is_rejected() {
        assert!(Args::try_parse_from(["three_body", "--width", "0"]).is_err());
        assert!(Args::try_parse_from(["three_body", "--height", "0"]).is_err());
        assert!(Args::try_parse_from(["three_body", "--width", "1", "--height", "1"]).is_ok());
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        for bad in ["--scale=0", "--scale=-5", "--scale=nan", "--scale=inf", "--scale=wide"] {
            assert!(Args::try_parse_from(["three_body", bad]).is_err(), "{} accepted", bad);
        }
        let args = Args::try_parse_from(["three_body", "--scale=2.5"]).unwrap();
        assert_eq!(args.display().scale, 2.5);
    }

    #[test]
    fn graphics_errors_keep_their_source() {
        let err = anyhow::Error::from(common::GraphicsError::NoAdapter)
            .context("graphics initialisation failed");
        assert_eq!(err.to_string(), "graphics initialisation failed");
        assert!(err
            .chain()
            .any(|cause| cause.to_string() == common::GraphicsError::NoAdapter.to_string()));
    }

    #[test]
    fn pacer_waits_for_next_frame() {
        let start = Instant::now();
        let mut pacer = FramePacer::new(50, start);
        assert!(pacer.tick(start));
        assert!(!pacer.tick(start + Duration::from_millis(5)));
        assert!(pacer.tick(start + Duration::from_millis(20)));
        assert_eq!(pacer.next_frame(), start + Duration::from_millis(40));
    }

    #[test]
    fn pacer_skips_missed_frames() {
        let start = Instant::now();
        let mut pacer = FramePacer::new(50, start);
        pacer.tick(start);
        let late = start + Duration::from_secs(1);
        assert!(pacer.tick(late));
        assert_eq!(pacer.next_frame(), late + Duration::from_millis(20));
    }
}
