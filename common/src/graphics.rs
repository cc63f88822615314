//! Graphics initialization

use std::fmt;
use std::sync::Arc;

use log::info;
use winit::{
    dpi::PhysicalSize,
    error::{EventLoopError, OsError},
    event_loop::EventLoop,
    window::{Window, WindowBuilder},
};

/// Errors that can occur while setting up the window and GPU.
#[derive(Debug)]
pub enum GraphicsError {
    /// The platform event loop could not be created.
    EventLoop(EventLoopError),
    /// The window could not be created.
    Window(OsError),
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            GraphicsError::Window(e) => write!(f, "Failed to create window: {}", e),
            GraphicsError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GraphicsError::NoAdapter => write!(f, "No compatible GPU adapter found"),
            GraphicsError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
        }
    }
}

impl std::error::Error for GraphicsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GraphicsError::EventLoop(e) => Some(e),
            GraphicsError::Window(e) => Some(e),
            GraphicsError::SurfaceCreation(e) => Some(e),
            GraphicsError::DeviceCreation(e) => Some(e),
            GraphicsError::NoAdapter => None,
        }
    }
}

impl From<EventLoopError> for GraphicsError {
    fn from(e: EventLoopError) -> Self {
        GraphicsError::EventLoop(e)
    }
}

impl From<OsError> for GraphicsError {
    fn from(e: OsError) -> Self {
        GraphicsError::Window(e)
    }
}

impl From<wgpu::CreateSurfaceError> for GraphicsError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GraphicsError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GraphicsError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GraphicsError::DeviceCreation(e)
    }
}

/// Holds all GPU resources needed for rendering
pub struct GraphicsContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
    pub window: Arc<Window>,
}

impl GraphicsContext {
    /// Create a new graphics context with an associated window
    pub async fn new(
        title: &str,
        width: u32,
        height: u32,
    ) -> Result<(Self, EventLoop<()>), GraphicsError> {
        let event_loop = EventLoop::new()?;
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(title)
                .with_inner_size(PhysicalSize::new(width, height))
                .with_resizable(false)
                .build(&event_loop)?,
        );

        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GraphicsError::NoAdapter)?;
        info!("Using GPU adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    label: None,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        // Frame pacing is done by the caller, so don't block on vsync.
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::AutoNoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok((
            Self {
                surface,
                device,
                queue,
                config,
                size,
                window,
            },
            event_loop,
        ))
    }

    /// Resize the rendering surface
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Get the aspect ratio of the window
    pub fn aspect_ratio(&self) -> f32 {
        self.size.width as f32 / self.size.height as f32
    }
}
