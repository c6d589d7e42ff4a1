//! GPU-backed 2D canvas
//!
//! Frames are drawn into a persistent offscreen "trail" texture that is never
//! cleared between frames, so a translucent full-screen fill leaves fading
//! trails behind moving particles. Each frame the trail texture is then copied
//! to the swapchain image.

use crate::batch::{BatchKind, FrameBatch};
use crate::instance::{
    CircleInstance, Globals, LineVertex, RectInstance, QUAD_VERTEX_LAYOUT,
};
use particle_physics::{Bounds, BACKGROUND};
use wgpu::util::DeviceExt;

const INITIAL_RECT_CAPACITY: usize = 16;
const INITIAL_CIRCLE_CAPACITY: usize = 1024;
const INITIAL_LINE_VERTEX_CAPACITY: usize = 4096;

/// Vertex buffer that grows to fit whatever is uploaded into it
struct GrowableBuffer {
    label: &'static str,
    buffer: wgpu::Buffer,
    capacity: usize,
    stride: usize,
}

impl GrowableBuffer {
    fn new(device: &wgpu::Device, label: &'static str, stride: usize, capacity: usize) -> Self {
        Self {
            label,
            buffer: Self::allocate(device, label, stride, capacity),
            capacity,
            stride,
        }
    }

    fn allocate(
        device: &wgpu::Device,
        label: &'static str,
        stride: usize,
        capacity: usize,
    ) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (capacity * stride) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn upload<T: bytemuck::Pod>(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[T]) {
        if data.is_empty() {
            return;
        }
        if data.len() > self.capacity {
            self.capacity = (data.len() * 2).next_power_of_two();
            self.buffer = Self::allocate(device, self.label, self.stride, self.capacity);
            log::debug!("{} grown to {} entries", self.label, self.capacity);
        }
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(data));
    }
}

pub struct Canvas {
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,

    frame: FrameBatch,
    // Trail texture must be cleared once after (re)creation
    needs_clear: bool,

    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,

    _trail_texture: wgpu::Texture,
    trail_view: wgpu::TextureView,
    trail_sampler: wgpu::Sampler,
    present_layout: wgpu::BindGroupLayout,
    present_bind_group: wgpu::BindGroup,

    rect_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    circle_pipeline: wgpu::RenderPipeline,
    present_pipeline: wgpu::RenderPipeline,

    quad_vertex_buffer: wgpu::Buffer,
    quad_index_buffer: wgpu::Buffer,
    rect_buffer: GrowableBuffer,
    circle_buffer: GrowableBuffer,
    line_buffer: GrowableBuffer,
}

impl Canvas {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);

        // Globals (screen size)
        let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Canvas Globals Buffer"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Canvas Globals Bind Group Layout"),
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

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Canvas Globals Bind Group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let draw_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Canvas Draw Pipeline Layout"),
            bind_group_layouts: &[&globals_layout],
            push_constant_ranges: &[],
        });

        // Trail texture + present pass resources
        let (trail_texture, trail_view) = Self::create_trail_texture(device, format, width, height);
        let trail_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Canvas Trail Sampler"),
            ..Default::default()
        });

        let present_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Canvas Present Bind Group Layout"),
            entries: &[
                // Trail texture - Binding 0
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Sampler - Binding 1
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let present_bind_group =
            Self::create_present_bind_group(device, &present_layout, &trail_view, &trail_sampler);

        let present_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Canvas Present Pipeline Layout"),
                bind_group_layouts: &[&present_layout],
                push_constant_ranges: &[],
            });

        // Shaders
        let rect_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Canvas Rect Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/rect.wgsl").into()),
        });
        let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Canvas Line Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/line.wgsl").into()),
        });
        let circle_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Canvas Circle Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/circle.wgsl").into()),
        });
        let present_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Canvas Present Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/present.wgsl").into()),
        });

        let rect_pipeline = create_pipeline(
            device,
            "Canvas Rect Pipeline",
            &draw_layout,
            &rect_shader,
            &[QUAD_VERTEX_LAYOUT, RectInstance::desc()],
            wgpu::PrimitiveTopology::TriangleList,
            format,
            Some(wgpu::BlendState::ALPHA_BLENDING),
        );
        let line_pipeline = create_pipeline(
            device,
            "Canvas Line Pipeline",
            &draw_layout,
            &line_shader,
            &[LineVertex::desc()],
            wgpu::PrimitiveTopology::LineList,
            format,
            Some(wgpu::BlendState::ALPHA_BLENDING),
        );
        let circle_pipeline = create_pipeline(
            device,
            "Canvas Circle Pipeline",
            &draw_layout,
            &circle_shader,
            &[QUAD_VERTEX_LAYOUT, CircleInstance::desc()],
            wgpu::PrimitiveTopology::TriangleList,
            format,
            Some(wgpu::BlendState::ALPHA_BLENDING),
        );
        let present_pipeline = create_pipeline(
            device,
            "Canvas Present Pipeline",
            &present_pipeline_layout,
            &present_shader,
            &[],
            wgpu::PrimitiveTopology::TriangleList,
            format,
            None,
        );

        // Unit quad vertices: [-1, -1] to [1, 1]
        let quad_vertices: &[[f32; 2]] = &[[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];
        let quad_indices: &[u32] = &[0, 1, 2, 0, 2, 3];

        let quad_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Canvas Quad Vertex Buffer"),
            contents: bytemuck::cast_slice(quad_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let quad_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Canvas Quad Index Buffer"),
            contents: bytemuck::cast_slice(quad_indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let rect_buffer = GrowableBuffer::new(
            device,
            "Canvas Rect Instance Buffer",
            std::mem::size_of::<RectInstance>(),
            INITIAL_RECT_CAPACITY,
        );
        let circle_buffer = GrowableBuffer::new(
            device,
            "Canvas Circle Instance Buffer",
            std::mem::size_of::<CircleInstance>(),
            INITIAL_CIRCLE_CAPACITY,
        );
        let line_buffer = GrowableBuffer::new(
            device,
            "Canvas Line Vertex Buffer",
            std::mem::size_of::<LineVertex>(),
            INITIAL_LINE_VERTEX_CAPACITY,
        );

        Self {
            width,
            height,
            format,
            frame: FrameBatch::new(Bounds::from_size(width, height)),
            needs_clear: true,
            globals_buffer,
            globals_bind_group,
            _trail_texture: trail_texture,
            trail_view,
            trail_sampler,
            present_layout,
            present_bind_group,
            rect_pipeline,
            line_pipeline,
            circle_pipeline,
            present_pipeline,
            quad_vertex_buffer,
            quad_index_buffer,
            rect_buffer,
            circle_buffer,
            line_buffer,
        }
    }

    fn create_trail_texture(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Canvas Trail Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    fn create_present_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Canvas Present Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    pub fn size(&self) -> Bounds {
        Bounds::from_size(self.width, self.height)
    }

    /// Start recording a new frame
    pub fn begin_frame(&mut self) -> &mut FrameBatch {
        self.frame.clear();
        &mut self.frame
    }

    /// Resize the canvas; like an HTML canvas, this wipes its contents
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.width = width;
        self.height = height;

        let (texture, view) = Self::create_trail_texture(device, self.format, width, height);
        self.present_bind_group = Self::create_present_bind_group(
            device,
            &self.present_layout,
            &view,
            &self.trail_sampler,
        );
        self._trail_texture = texture;
        self.trail_view = view;
        self.frame.resize(Bounds::from_size(width, height));
        self.needs_clear = true;
    }

    /// Replay the recorded frame onto the trail texture and present it to `target`
    pub fn render(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, target: &wgpu::TextureView) {
        queue.write_buffer(
            &self.globals_buffer,
            0,
            bytemuck::cast_slice(&[Globals {
                screen_size: [self.width as f32, self.height as f32],
                _padding: [0.0; 2],
            }]),
        );
        self.rect_buffer.upload(device, queue, self.frame.rects());
        self.circle_buffer.upload(device, queue, self.frame.circles());
        self.line_buffer.upload(device, queue, self.frame.line_vertices());

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Canvas Encoder"),
        });

        {
            let load = if self.needs_clear {
                wgpu::LoadOp::Clear(background_clear_color())
            } else {
                wgpu::LoadOp::Load
            };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Canvas Trail Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.trail_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.globals_bind_group, &[]);

            for batch in self.frame.batches() {
                match batch.kind {
                    BatchKind::Rects => {
                        render_pass.set_pipeline(&self.rect_pipeline);
                        render_pass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));
                        render_pass.set_vertex_buffer(1, self.rect_buffer.buffer.slice(..));
                        render_pass.set_index_buffer(
                            self.quad_index_buffer.slice(..),
                            wgpu::IndexFormat::Uint32,
                        );
                        render_pass.draw_indexed(0..6, 0, batch.start..batch.end);
                    }
                    BatchKind::Circles => {
                        render_pass.set_pipeline(&self.circle_pipeline);
                        render_pass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));
                        render_pass.set_vertex_buffer(1, self.circle_buffer.buffer.slice(..));
                        render_pass.set_index_buffer(
                            self.quad_index_buffer.slice(..),
                            wgpu::IndexFormat::Uint32,
                        );
                        render_pass.draw_indexed(0..6, 0, batch.start..batch.end);
                    }
                    BatchKind::Lines => {
                        render_pass.set_pipeline(&self.line_pipeline);
                        render_pass.set_vertex_buffer(0, self.line_buffer.buffer.slice(..));
                        render_pass.draw(batch.start..batch.end, 0..1);
                    }
                }
            }
        }
        self.needs_clear = false;

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Canvas Present Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.present_pipeline);
            render_pass.set_bind_group(0, &self.present_bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}

fn background_clear_color() -> wgpu::Color {
    let [r, g, b, _] = BACKGROUND.to_linear();
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: 1.0,
    }
}

#[allow(clippy::too_many_arguments)]
fn create_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    buffers: &[wgpu::VertexBufferLayout],
    topology: wgpu::PrimitiveTopology,
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
