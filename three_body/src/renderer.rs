//! Rendering system for the gravity simulation

use common::{Camera2D, CameraUniform, GraphicsContext};
use wgpu::util::DeviceExt;

use three_body::physics::Body;

/// Instance data for GPU rendering
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BodyInstance {
    pub position: [f32; 3],
    pub radius: f32,
    pub color: [f32; 4],
}

impl BodyInstance {
    const ATTRIBS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        2 => Float32x3,
        3 => Float32,
        4 => Float32x4,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BodyInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Quad vertex for instanced rendering
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
}

impl QuadVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Trail vertex
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TrailVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl TrailVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x4,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<TrailVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

// Unit quad vertices
const QUAD_VERTICES: &[QuadVertex] = &[
    QuadVertex { position: [-1.0, -1.0] },
    QuadVertex { position: [1.0, -1.0] },
    QuadVertex { position: [1.0, 1.0] },
    QuadVertex { position: [-1.0, -1.0] },
    QuadVertex { position: [1.0, 1.0] },
    QuadVertex { position: [-1.0, 1.0] },
];

/// Alpha of the newest trail point; older points fade to transparent.
const TRAIL_ALPHA: f32 = 0.8;

/// Convert an 8-bit sRGB channel to the linear value an sRGB surface expects.
fn srgb_to_linear(c: u8) -> f32 {
    let c = c as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn body_color(color: [u8; 3], linear: bool) -> [f32; 3] {
    if linear {
        color.map(srgb_to_linear)
    } else {
        color.map(|c| c as f32 / 255.0)
    }
}

/// Build one instance per body. `world_per_pixel` converts pixel radii to world units.
pub fn body_instances(bodies: &[Body], world_per_pixel: f32, linear: bool) -> Vec<BodyInstance> {
    bodies
        .iter()
        .map(|body| {
            let [r, g, b] = body_color(body.color, linear);
            BodyInstance {
                position: [body.position.x as f32, body.position.y as f32, 0.0],
                radius: body.radius * world_per_pixel,
                color: [r, g, b, 1.0],
            }
        })
        .collect()
}

/// Flatten every trail into one vertex list, returning `(first, count)`
/// ranges for each line strip.
pub fn trail_vertices(bodies: &[Body], linear: bool) -> (Vec<TrailVertex>, Vec<(u32, u32)>) {
    let mut vertices = Vec::new();
    let mut ranges = Vec::new();

    for body in bodies {
        let Some(trail) = &body.trail else {
            continue;
        };
        if trail.len() < 2 {
            continue;
        }

        let [r, g, b] = body_color(body.color, linear);
        let start = vertices.len() as u32;
        let len = trail.len();
        for (i, pos) in trail.points().enumerate() {
            let alpha = (i + 1) as f32 / len as f32 * TRAIL_ALPHA;
            vertices.push(TrailVertex {
                position: [pos.x as f32, pos.y as f32, 0.0],
                color: [r, g, b, alpha],
            });
        }
        ranges.push((start, len as u32));
    }

    (vertices, ranges)
}

/// What the next [`Renderer::render`] call should draw
pub struct FrameData {
    pub num_instances: u32,
    pub trail_ranges: Vec<(u32, u32)>,
}

pub struct Renderer {
    body_pipeline: wgpu::RenderPipeline,
    trail_pipeline: wgpu::RenderPipeline,
    quad_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    trail_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    max_instances: usize,
    max_trail_vertices: usize,
    linear_output: bool,
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    label: &str,
    entry_points: (&str, &str),
    buffers: &[wgpu::VertexBufferLayout],
    topology: wgpu::PrimitiveTopology,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: entry_points.0,
            buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: entry_points.1,
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}

impl Renderer {
    pub fn new(ctx: &GraphicsContext, max_instances: usize, max_trail_vertices: usize) -> Self {
        let device = &ctx.device;
        let max_instances = max_instances.max(1);
        let max_trail_vertices = max_trail_vertices.max(2);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Body Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/body.wgsl").into()),
        });

        // Camera uniform buffer
        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let body_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            ctx.config.format,
            "Body Pipeline",
            ("vs_body", "fs_body"),
            &[QuadVertex::layout(), BodyInstance::layout()],
            wgpu::PrimitiveTopology::TriangleList,
        );

        let trail_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            ctx.config.format,
            "Trail Pipeline",
            ("vs_trail", "fs_trail"),
            &[TrailVertex::layout()],
            wgpu::PrimitiveTopology::LineStrip,
        );

        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Buffer"),
            contents: bytemuck::cast_slice(QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Instance Buffer"),
            size: (std::mem::size_of::<BodyInstance>() * max_instances) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let trail_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Trail Buffer"),
            size: (std::mem::size_of::<TrailVertex>() * max_trail_vertices) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            body_pipeline,
            trail_pipeline,
            quad_buffer,
            instance_buffer,
            trail_buffer,
            camera_buffer,
            camera_bind_group,
            max_instances,
            max_trail_vertices,
            linear_output: ctx.config.format.is_srgb(),
        }
    }

    pub fn update_camera(&self, queue: &wgpu::Queue, camera: &Camera2D) {
        let uniform = CameraUniform::from_camera_2d(camera);
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    /// Upload body instances and trails for the current state.
    pub fn update_bodies(
        &self,
        queue: &wgpu::Queue,
        bodies: &[Body],
        world_per_pixel: f32,
        show_trails: bool,
    ) -> FrameData {
        let mut instances = body_instances(bodies, world_per_pixel, self.linear_output);
        instances.truncate(self.max_instances);
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let mut trail_ranges = Vec::new();
        if show_trails {
            let (vertices, ranges) = trail_vertices(bodies, self.linear_output);
            trail_ranges = ranges
                .into_iter()
                .filter(|(start, count)| (start + count) as usize <= self.max_trail_vertices)
                .collect();
            let used = vertices.len().min(self.max_trail_vertices);
            if used > 0 {
                queue.write_buffer(
                    &self.trail_buffer,
                    0,
                    bytemuck::cast_slice(&vertices[..used]),
                );
            }
        }

        FrameData {
            num_instances: instances.len() as u32,
            trail_ranges,
        }
    }

    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        frame: &FrameData,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

        if !frame.trail_ranges.is_empty() {
            render_pass.set_pipeline(&self.trail_pipeline);
            render_pass.set_vertex_buffer(0, self.trail_buffer.slice(..));
            for (start, count) in &frame.trail_ranges {
                render_pass.draw(*start..(*start + *count), 0..1);
            }
        }

        if frame.num_instances > 0 {
            render_pass.set_pipeline(&self.body_pipeline);
            render_pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            render_pass.draw(0..6, 0..frame.num_instances);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;

    fn traced(len: usize, steps: usize) -> Body {
        let mut body = Body::new("traced", 1.0, DVec2::ZERO, DVec2::ZERO)
            .with_color([255, 0, 0])
            .with_radius(10.0)
            .with_trail(len);
        if let Some(trail) = &mut body.trail {
            for i in 0..steps {
                trail.record(DVec2::new(i as f64, 0.0));
            }
        }
        body
    }

    #[test]
    fn radius_is_converted_to_world_units() {
        let instances = body_instances(&[traced(4, 0)], 0.01, false);
        assert_eq!(instances.len(), 1);
        assert!((instances[0].radius - 0.1).abs() < 1e-6);
        assert_eq!(instances[0].color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn srgb_endpoints() {
        assert_eq!(srgb_to_linear(0), 0.0);
        assert!((srgb_to_linear(255) - 1.0).abs() < 1e-6);
        assert!(srgb_to_linear(128) < 128.0 / 255.0);
    }

    #[test]
    fn trails_fade_toward_oldest_point() {
        let bodies = [traced(4, 10), traced(4, 1), Body::new("plain", 1.0, DVec2::ZERO, DVec2::ZERO)];
        let (vertices, ranges) = trail_vertices(&bodies, false);

        // Single-point trails and bodies without trails draw nothing
        assert_eq!(ranges, vec![(0, 4)]);
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[0].position, [6.0, 0.0, 0.0]);
        assert!(vertices[0].color[3] < vertices[3].color[3]);
        assert!((vertices[3].color[3] - TRAIL_ALPHA).abs() < 1e-6);
    }
}
