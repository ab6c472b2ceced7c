use glutin::config::{ ConfigTemplateBuilder, GlConfig };
use glutin::context::{ ContextApi, ContextAttributesBuilder, PossiblyCurrentContext, Version };
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{ Surface, SurfaceAttributesBuilder, WindowSurface };
use glutin_winit::DisplayBuilder;
use raw_window_handle::HasWindowHandle;
use std::ffi::CString;
use std::num::NonZeroU32;
use std::time::Instant;
use tokio::runtime::Handle;
use winit::application::ApplicationHandler;
use winit::dpi::{ LogicalSize, PhysicalPosition };
use winit::event::{ ElementState, KeyEvent, MouseButton, WindowEvent };
use winit::event_loop::{ ActiveEventLoop, EventLoop };
use winit::keyboard::{ KeyCode, PhysicalKey };
use winit::window::{ Window, WindowId };

use scene_viewer::engine::logging::{ init_logging, LoggingConfig };
use scene_viewer::engine::rendering::GlDevice;
use scene_viewer::engine::systems::{ FrameAction, Viewer, Zoom };
use scene_viewer::engine::{ RenderError, RenderResult, ViewerConfig };

struct App {
    config: ViewerConfig,
    runtime: Handle,
    window: Option<Window>,
    gl_context: Option<PossiblyCurrentContext>,
    gl_surface: Option<Surface<WindowSurface>>,
    viewer: Option<Viewer<GlDevice>>,
    cursor: PhysicalPosition<f64>,
}

fn context_error(e: impl std::fmt::Display) -> RenderError {
    RenderError::Context(e.to_string())
}

/// Unwind payload for a config picker that was handed nothing to pick.
struct NoGlConfig;

fn most_samples<C>(configs: impl Iterator<Item = C>, samples: impl Fn(&C) -> u8) -> Option<C> {
    configs.reduce(|best, c| if samples(&c) > samples(&best) { c } else { best })
}

/// The display builder wants a config back from its picker, so an empty list
/// unwinds out of it without running the panic hook.
fn pick_or_unwind<C>(configs: impl Iterator<Item = C>, samples: impl Fn(&C) -> u8) -> C {
    match most_samples(configs, samples) {
        Some(config) => config,
        None => std::panic::resume_unwind(Box::new(NoGlConfig)),
    }
}

fn catch_no_config<T>(build: impl FnOnce() -> T) -> RenderResult<T> {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(build)) {
        Ok(built) => Ok(built),
        Err(payload) if payload.is::<NoGlConfig>() => Err(context_error("no GL configs offered")),
        Err(payload) => std::panic::resume_unwind(payload),
    }
}

impl App {
    fn new(config: ViewerConfig, runtime: Handle) -> Self {
        Self {
            config,
            runtime,
            window: None,
            gl_context: None,
            gl_surface: None,
            viewer: None,
            cursor: PhysicalPosition::new(0.0, 0.0),
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> RenderResult<()> {
        let window_config = &self.config.window;
        let attributes = Window::default_attributes()
            .with_title(window_config.title.clone())
            .with_inner_size(LogicalSize::new(window_config.width, window_config.height));

        let (window, gl_config) = catch_no_config(|| {
            DisplayBuilder::new()
                .with_window_attributes(Some(attributes))
                .build(event_loop, ConfigTemplateBuilder::new().with_depth_size(24), |configs| {
                    pick_or_unwind(configs, |c| c.num_samples())
                })
        })?.map_err(context_error)?;
        let window = window.ok_or_else(|| context_error("window was not created"))?;
        let raw_handle = window.window_handle().map_err(context_error)?.as_raw();

        let display = gl_config.display();
        let ctx_attrs = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .build(Some(raw_handle));
        let not_current = unsafe { display.create_context(&gl_config, &ctx_attrs).map_err(context_error)? };

        let size = window.inner_size();
        let attrs = SurfaceAttributesBuilder::<WindowSurface>
            ::new()
            .build(
                raw_handle,
                NonZeroU32::new(size.width.max(1)).unwrap_or(NonZeroU32::MIN),
                NonZeroU32::new(size.height.max(1)).unwrap_or(NonZeroU32::MIN)
            );
        let surface = unsafe { display.create_window_surface(&gl_config, &attrs).map_err(context_error)? };
        let ctx = not_current.make_current(&surface).map_err(context_error)?;

        let gl = unsafe {
            glow::Context::from_loader_function(|s| {
                match CString::new(s) {
                    Ok(name) => display.get_proc_address(&name) as *const _,
                    Err(_) => std::ptr::null(),
                }
            })
        };

        let device = GlDevice::new(gl)?;
        let viewer = Viewer::new(device, &self.config, self.runtime.clone())?;

        window.request_redraw();

        self.window = Some(window);
        self.gl_context = Some(ctx);
        self.gl_surface = Some(surface);
        self.viewer = Some(viewer);
        Ok(())
    }

    fn handle_key(&mut self, event: &KeyEvent, event_loop: &ActiveEventLoop) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let pressed = event.state == ElementState::Pressed;
        let Some(viewer) = &mut self.viewer else {
            return;
        };

        match code {
            KeyCode::Space if pressed && !event.repeat => {
                let animating = viewer.toggle_animation();
                log::info!("animation {}", if animating { "on" } else { "off" });
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            KeyCode::ArrowLeft => viewer.set_zoom(Zoom::In, pressed),
            KeyCode::ArrowRight => viewer.set_zoom(Zoom::Out, pressed),
            KeyCode::Escape if pressed => event_loop.exit(),
            _ => {}
        }
    }

    fn redraw(&mut self) {
        let (Some(window), Some(surface), Some(ctx), Some(viewer)) = (
            &self.window,
            &self.gl_surface,
            &self.gl_context,
            &mut self.viewer,
        ) else {
            return;
        };

        let size = window.inner_size();
        match viewer.frame(Instant::now(), size.width, size.height) {
            FrameAction::Render { .. } => {
                if let Err(e) = surface.swap_buffers(ctx) {
                    log::error!("swap_buffers failed: {}", e);
                }
                window.request_redraw();
            }
            FrameAction::Skip => window.request_redraw(),
            // Redraws resume when animation is toggled back on.
            FrameAction::Paused => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            log::error!("initialisation failed: {}", e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::RedrawRequested => self.redraw(),

            WindowEvent::Resized(size) => {
                if let (Some(surface), Some(ctx)) = (&self.gl_surface, &self.gl_context) {
                    if let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) {
                        surface.resize(ctx, w, h);
                    }
                }
                if let Some(w) = &self.window {
                    w.request_redraw();
                }
            }

            WindowEvent::KeyboardInput { event, .. } => self.handle_key(&event, event_loop),

            WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => {
                if let Some(viewer) = &mut self.viewer {
                    match state {
                        ElementState::Pressed => viewer.begin_drag(self.cursor.x, self.cursor.y),
                        ElementState::Released => viewer.end_drag(),
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = position;
                if let Some(viewer) = &mut self.viewer {
                    viewer.drag_to(position.x, position.y);
                }
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(viewer) = self.viewer.take() {
            let device = viewer.shutdown();
            device.cleanup();
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ViewerConfig::from_args(std::env::args().skip(1))?;
    init_logging(LoggingConfig {
        env_filter: config.log_filter.clone(),
        ..Default::default()
    });

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, runtime.handle().clone());
    event_loop.run_app(&mut app)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picker_prefers_most_samples() {
        let picked = most_samples([0u8, 4, 2, 4].into_iter().enumerate(), |&(_, samples)| samples);
        assert_eq!(picked, Some((1, 4)));
    }

    #[test]
    fn empty_config_list_becomes_a_context_error() {
        let result = catch_no_config(|| pick_or_unwind(std::iter::empty::<u8>(), |&c| c));
        assert!(matches!(result, Err(RenderError::Context(msg)) if msg.contains("no GL configs")));
    }

    #[test]
    fn other_panics_are_not_swallowed() {
        let outer = std::panic::catch_unwind(|| catch_no_config(|| -> u8 { panic!("boom") }));
        assert!(outer.is_err());
    }
}
