//! Window surface, device and the canvas the engine draws on

use particle_physics::Bounds;
use particle_renderer::{Canvas, RenderError};
use particle_simulation::ParticleSystem;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use winit::window::Window;

const FRAME_TIME_WINDOW: usize = 100;

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    canvas: Canvas,

    frame_times: VecDeque<f32>,
    last_frame_time: Instant,
}

impl GpuState {
    pub async fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(RenderError::ZeroSized {
                width: size.width,
                height: size.height,
            });
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        log::info!("✓ Using GPU: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        // Canvas colors are specified in sRGB, so prefer an sRGB target
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(RenderError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let canvas = Canvas::new(&device, surface_format, size.width, size.height);
        log::info!("✓ Canvas initialized ({}x{})", size.width, size.height);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            canvas,
            frame_times: VecDeque::with_capacity(FRAME_TIME_WINDOW),
            last_frame_time: Instant::now(),
        })
    }

    pub fn size(&self) -> Bounds {
        self.canvas.size()
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.canvas
                .resize(&self.device, new_size.width, new_size.height);
        }
    }

    /// Run one engine tick onto the canvas and present it
    ///
    /// Returns the average FPS over the recent frame window.
    pub fn render(&mut self, engine: &mut ParticleSystem) -> Result<f32, wgpu::SurfaceError> {
        let now = Instant::now();
        let frame_time = (now - self.last_frame_time).as_secs_f32() * 1000.0;
        self.last_frame_time = now;

        self.frame_times.push_back(frame_time);
        if self.frame_times.len() > FRAME_TIME_WINDOW {
            self.frame_times.pop_front();
        }
        let avg_frame_time = self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
        let fps = if avg_frame_time > 0.0 {
            1000.0 / avg_frame_time
        } else {
            0.0
        };

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        engine.tick(self.canvas.begin_frame());
        self.canvas.render(&self.device, &self.queue, &view);

        output.present();
        Ok(fps)
    }
}
