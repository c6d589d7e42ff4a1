//! Interactive particle canvas
//!
//! Glowing particles fall, bounce and fade across a full-window canvas. The
//! pointer pushes them away, a right click releases a burst, and the
//! population is saved so a restart carries on where it left off.

mod config;
mod gpu;

use config::Settings;
use glam::Vec2;
use gpu::GpuState;
use particle_simulation::{CursorStyle, ParticleSystem};
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorIcon, Window, WindowId},
};

struct App {
    settings: Settings,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    engine: Option<ParticleSystem>,
}

impl App {
    fn new(settings: Settings) -> Self {
        Self {
            settings,
            window: None,
            gpu_state: None,
            engine: None,
        }
    }
}

/// Save the population and stop animating, then leave the event loop
fn shut_down(engine: &mut ParticleSystem, event_loop: &ActiveEventLoop) {
    engine.save_or_warn();
    engine.stop();
    event_loop.exit();
}

fn cursor_icon(style: CursorStyle) -> CursorIcon {
    match style {
        CursorStyle::Default => CursorIcon::Default,
        CursorStyle::Grab => CursorIcon::Grab,
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title("Particle Canvas")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let gpu_state = match pollster::block_on(GpuState::new(window.clone())) {
            Ok(gpu_state) => gpu_state,
            Err(e) => {
                log::error!("Canvas unavailable, not starting: {}", e);
                event_loop.exit();
                return;
            }
        };

        let engine = ParticleSystem::new(
            self.settings.engine_params(),
            gpu_state.size(),
            Box::new(self.settings.store()),
        );

        window.request_redraw();
        self.window = Some(window);
        self.gpu_state = Some(gpu_state);
        self.engine = Some(engine);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let (Some(window), Some(gpu_state), Some(engine)) =
            (&self.window, &mut self.gpu_state, &mut self.engine)
        else {
            return;
        };

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => shut_down(engine, event_loop),

            WindowEvent::CursorMoved { position, .. } => {
                engine
                    .pointer_mut()
                    .moved(Vec2::new(position.x as f32, position.y as f32));
            }

            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let style = match state {
                    ElementState::Pressed => engine.pointer_mut().primary_pressed(),
                    ElementState::Released => engine.pointer_mut().primary_released(),
                };
                window.set_cursor(cursor_icon(style));
            }

            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Right,
                ..
            } => {
                if let Some(at) = engine.pointer().state().position {
                    let added = engine.spawn_burst(at);
                    log::debug!("Burst at ({:.0}, {:.0}): {} particles", at.x, at.y, added);
                }
            }

            WindowEvent::Resized(physical_size) => {
                gpu_state.resize(physical_size);
                engine.resize(gpu_state.size());
            }

            // Hidden or minimized: the process may not come back
            WindowEvent::Occluded(true) => engine.save_or_warn(),

            WindowEvent::RedrawRequested => {
                if !engine.is_running() {
                    return;
                }
                match gpu_state.render(engine) {
                    Ok(fps) => {
                        window.set_title(&format!(
                            "Particle Canvas - {:.0} FPS - {} particles",
                            fps,
                            engine.particle_count()
                        ));
                    }
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        gpu_state.resize(window.inner_size())
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => shut_down(engine, event_loop),
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        let (Some(window), Some(engine)) = (&self.window, &mut self.engine) else {
            return;
        };

        if engine.is_running() {
            engine.autosave(Instant::now());
            window.request_redraw();
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logger (RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting particle canvas...");

    let settings = Settings::from_env();

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(settings);
    event_loop.run_app(&mut app)?;

    Ok(())
}
