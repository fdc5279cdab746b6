use anyhow::{Context, Result};
use clap::Parser;
use glam::DVec2;
use quadshade_common::{Resolution, ShellConfig};
use quadshade_input::{EventQueue, InputEvent, Key, KeyState};
use quadshade_render_wgpu::WgpuBackend;
use quadshade_shell::{Application, Phase};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

#[derive(Parser)]
#[command(name = "quadshade-desktop", about = "Render a full-screen GLSL shader with a fly camera")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Vertex shader path (overrides config)
    #[arg(long)]
    vertex: Option<PathBuf>,

    /// Fragment shader path (overrides config)
    #[arg(long)]
    fragment: Option<PathBuf>,
}

impl Cli {
    fn shell_config(&self) -> Result<ShellConfig> {
        let mut config = match &self.config {
            Some(path) => ShellConfig::load(path)?,
            None => ShellConfig::default(),
        };
        if let Some(vertex) = &self.vertex {
            config.shaders.vertex = vertex.clone();
        }
        if let Some(fragment) = &self.fragment {
            config.shaders.fragment = fragment.clone();
        }
        Ok(config)
    }
}

/// winit front end: owns the window and forwards OS events to the shell.
struct DesktopApp {
    shell: Application<WgpuBackend>,
    window: Option<Arc<Window>>,
    events: EventQueue,
    cursor: VirtualCursor,
    init_error: Option<anyhow::Error>,
    runtime_error: Option<anyhow::Error>,
}

impl DesktopApp {
    fn new(config: ShellConfig) -> Self {
        Self {
            shell: Application::new(config),
            window: None,
            events: EventQueue::new(),
            cursor: VirtualCursor::default(),
            init_error: None,
            runtime_error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_config = &self.shell.config().window;
        let attrs = Window::default_attributes()
            .with_title(window_config.title.clone())
            .with_inner_size(PhysicalSize::new(window_config.width, window_config.height))
            .with_resizable(true);
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );
        capture_cursor(&window);

        let inner = window.inner_size();
        let backend = WgpuBackend::new(window.clone(), Resolution::new(inner.width, inner.height))
            .context("failed to initialize GPU")?;
        self.shell.initialize(backend)?;

        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        match self.shell.frame(&mut self.events) {
            Ok(Phase::Running) => {}
            Ok(_) => event_loop.exit(),
            Err(e) => {
                tracing::error!("{e}");
                self.shell.shutdown();
                self.runtime_error = Some(e.into());
                event_loop.exit();
            }
        }
    }
}

impl ApplicationHandler for DesktopApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.init_error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.events.push(InputEvent::CloseRequested),
            WindowEvent::Resized(size) => self.events.push(InputEvent::Resized {
                width: size.width,
                height: size.height,
            }),
            WindowEvent::Focused(false) => {
                self.cursor.focused = false;
                self.events.push(InputEvent::FocusLost);
            }
            WindowEvent::Focused(true) => {
                self.cursor.focused = true;
                if let Some(window) = &self.window {
                    capture_cursor(window);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => {
                if let Some(key) = map_key(code) {
                    let state = match state {
                        ElementState::Pressed => KeyState::Pressed,
                        ElementState::Released => KeyState::Released,
                    };
                    self.events.push(InputEvent::Key { key, state });
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if let Some(moved) = self.cursor.motion(delta.0, delta.1) {
                self.events.push(moved);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // GPU resources go before the window they render into
        self.shell.shutdown();
        self.window = None;
    }
}

/// Raw mouse deltas summed into an unbounded position, since the real cursor
/// is grabbed. Raw motion arriving while the window is unfocused is dropped.
#[derive(Debug)]
struct VirtualCursor {
    position: DVec2,
    focused: bool,
}

impl Default for VirtualCursor {
    fn default() -> Self {
        Self {
            position: DVec2::ZERO,
            focused: true,
        }
    }
}

impl VirtualCursor {
    fn motion(&mut self, dx: f64, dy: f64) -> Option<InputEvent> {
        if !self.focused {
            return None;
        }
        self.position += DVec2::new(dx, dy);
        Some(InputEvent::PointerMoved {
            x: self.position.x,
            y: self.position.y,
        })
    }
}

/// Grab and hide the cursor so mouse motion drives the camera.
fn capture_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(e) = grabbed {
        tracing::warn!("cursor grab unavailable: {e}");
    }
    window.set_cursor_visible(false);
}

fn map_key(code: KeyCode) -> Option<Key> {
    Some(match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::Digit0 | KeyCode::Numpad0 => Key::Digit0,
        KeyCode::KeyW => Key::KeyW,
        KeyCode::KeyA => Key::KeyA,
        KeyCode::KeyS => Key::KeyS,
        KeyCode::KeyD => Key::KeyD,
        KeyCode::Space => Key::Space,
        KeyCode::ControlLeft => Key::ControlLeft,
        KeyCode::ShiftLeft => Key::ShiftLeft,
        _ => return None,
    })
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.shell_config()?;
    tracing::info!("quadshade-desktop starting");

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            tracing::error!("failed to create event loop: {e}");
            std::process::exit(-1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = DesktopApp::new(config);
    event_loop.run_app(&mut app)?;

    if let Some(e) = app.init_error {
        tracing::error!("{e:#}");
        std::process::exit(-1);
    }
    if let Some(e) = app.runtime_error {
        return Err(e);
    }
    tracing::info!("quadshade-desktop exited");
    Ok(())
}
