#![deny(unsafe_code)]
//! Windowed IBFV renderer.
//!
//! Opens a 512×512 window with an OpenGL 3.3 core context and animates the
//! swirl flow until ESC is pressed or the window is closed. The average
//! frame rate is printed to stdout every five seconds; diagnostics go to
//! stderr through `RUST_LOG`.

mod error;

use clap::Parser;
use error::CliError;
use glutin::config::{ConfigTemplateBuilder, GlConfig};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContext, PossiblyCurrentContext,
    Version,
};
use glutin::display::{Display, DisplayApiPreference, GlDisplay};
use glutin::surface::{GlSurface, Surface, WindowSurface};
use glutin_winit::GlWindow;
use ibfv_core::render::gl::{GlContext, Presenter};
use ibfv_core::render::Viewport;
use ibfv_core::{IbfvCompositor, IbfvConfig, Xorshift64};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawWindowHandle};
use std::num::NonZeroU32;
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

const WINDOW_TITLE: &str = "IBFV";
const WINDOW_SIZE: u32 = 512;

#[derive(Parser)]
#[command(name = "ibfv", about = "Image-based flow visualization of a pulsing swirl")]
struct Cli {
    /// Renderer parameters as a JSON object (e.g. '{"alpha": 0.2}').
    #[arg(long, default_value = "{}")]
    params: String,

    /// PRNG seed for a reproducible noise bank. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,
}

/// Swaps the window's buffers for [`GlContext::present`].
struct WindowPresenter {
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
}

impl WindowPresenter {
    fn resize(&self, width: u32, height: u32) {
        if let (Some(w), Some(h)) = (NonZeroU32::new(width), NonZeroU32::new(height)) {
            self.surface.resize(&self.context, w, h);
        }
    }
}

impl Presenter for WindowPresenter {
    fn swap_buffers(&mut self) -> Result<(), String> {
        self.surface
            .swap_buffers(&self.context)
            .map_err(|e| e.to_string())
    }
}

type WindowContext = GlContext<WindowPresenter>;

/// The platform's native GL display API. WGL needs the window up front.
fn display_preference(window: RawWindowHandle) -> DisplayApiPreference {
    #[cfg(target_os = "macos")]
    {
        let _ = window;
        DisplayApiPreference::Cgl
    }
    #[cfg(target_os = "windows")]
    {
        DisplayApiPreference::Wgl(Some(window))
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        let _ = window;
        DisplayApiPreference::Egl
    }
}

/// Picks the matching config with the fewest multisample buffers, since
/// the pipeline copies surfaces texel for texel.
fn fewest_samples<C: GlConfig>(configs: impl Iterator<Item = C>) -> Result<C, CliError> {
    configs
        .min_by_key(|c| c.num_samples())
        .ok_or_else(|| CliError::Window("no GL config matches the window".into()))
}

/// Everything that exists once the window is up. Field order is drop order:
/// GL state goes before the window it renders into.
struct Renderer {
    compositor: IbfvCompositor<WindowContext>,
    ctx: WindowContext,
    window: Window,
}

impl Renderer {
    #[allow(unsafe_code)]
    fn create(
        event_loop: &ActiveEventLoop,
        config: IbfvConfig,
        rng: &mut Xorshift64,
    ) -> Result<Self, CliError> {
        let window_attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(WINDOW_SIZE, WINDOW_SIZE));

        let window = event_loop
            .create_window(window_attributes)
            .map_err(|e| CliError::Window(format!("window creation failed: {e}")))?;
        let raw_window_handle = window
            .window_handle()
            .map_err(|e| CliError::Window(e.to_string()))?
            .as_raw();
        let raw_display_handle = event_loop
            .display_handle()
            .map_err(|e| CliError::Window(e.to_string()))?
            .as_raw();

        // SAFETY: the display handle comes from the live event loop.
        let gl_display =
            unsafe { Display::new(raw_display_handle, display_preference(raw_window_handle)) }
                .map_err(|e| CliError::Window(format!("no GL display: {e}")))?;
        let template = ConfigTemplateBuilder::new()
            .compatible_with_native_window(raw_window_handle)
            .build();
        // SAFETY: the template only references the window created above.
        let configs = unsafe { gl_display.find_configs(template) }
            .map_err(|e| CliError::Window(format!("no usable GL config: {e}")))?;
        let gl_config = fewest_samples(configs)?;

        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .with_profile(GlProfile::Core)
            .build(Some(raw_window_handle));

        // SAFETY: the raw window handle belongs to `window`, which outlives
        // the context because Renderer drops GL state first.
        let not_current = unsafe { gl_display.create_context(&gl_config, &context_attributes) }
            .map_err(|e| CliError::Window(format!("GL 3.3 core context unavailable: {e}")))?;

        let surface_attributes = window
            .build_surface_attributes(Default::default())
            .map_err(|e| CliError::Window(e.to_string()))?;
        // SAFETY: as above, the surface never outlives the window.
        let surface = unsafe { gl_display.create_window_surface(&gl_config, &surface_attributes) }
            .map_err(|e| CliError::Window(format!("window surface creation failed: {e}")))?;
        let context = not_current
            .make_current(&surface)
            .map_err(|e| CliError::Window(format!("make_current failed: {e}")))?;

        // SAFETY: the context was made current on this thread just above.
        let gl = unsafe {
            glow::Context::from_loader_function_cstr(|name| gl_display.get_proc_address(name))
        };

        let size = window.inner_size();
        let mut ctx = GlContext::new(
            gl,
            WindowPresenter { surface, context },
            Viewport::new(size.width, size.height),
        )?;
        let compositor = IbfvCompositor::new(&mut ctx, config, rng)?;
        info!(width = size.width, height = size.height, "window ready");

        Ok(Self {
            compositor,
            ctx,
            window,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.ctx.presenter_mut().resize(size.width, size.height);
        self.compositor.resize(&mut self.ctx, size.width, size.height);
    }
}

struct App {
    config: IbfvConfig,
    rng: Xorshift64,
    renderer: Option<Renderer>,
    error: Option<CliError>,
}

impl App {
    fn new(config: IbfvConfig, rng: Xorshift64) -> Self {
        Self {
            config,
            rng,
            renderer: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: CliError) {
        error!(error = %e, "shutting down");
        self.error = Some(e);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }
        match Renderer::create(event_loop, self.config.clone(), &mut self.rng) {
            Ok(renderer) => {
                renderer.window.request_redraw();
                self.renderer = Some(renderer);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => renderer.resize(size),
            WindowEvent::RedrawRequested => {
                match renderer.compositor.render_frame(&mut renderer.ctx) {
                    Ok(report) => {
                        if let Some(fps) = report.fps {
                            println!("{fps:.2} fps");
                        }
                    }
                    Err(e) => self.fail(event_loop, e.into()),
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(renderer) = &self.renderer {
            renderer.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut renderer) = self.renderer.take() {
            info!(frames = renderer.compositor.frame(), "exiting");
            renderer.ctx.destroy();
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let params: serde_json::Value = serde_json::from_str(&cli.params)
        .map_err(|e| CliError::Input(format!("invalid --params JSON: {e}")))?;
    let config = IbfvConfig::from_json(&params);
    config
        .validate()
        .map_err(|e| CliError::Input(format!("invalid --params: {e}")))?;

    let rng = cli.seed.map_or_else(Xorshift64::from_entropy, Xorshift64::new);

    println!("Hit ESC key to quit.");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = App::new(config, rng);
    event_loop.run_app(&mut app)?;

    app.error.map_or(Ok(()), Err)
}

fn main() {
    let cli = Cli::parse();
    init_logging();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        process::exit(e.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glutin::config::Config;

    #[test]
    fn empty_config_list_is_a_window_error() {
        let err = fewest_samples(std::iter::empty::<Config>()).unwrap_err();
        assert_eq!(err.exit_code(), 11);
        assert!(err.to_string().contains("no GL config"), "{err}");
    }

    #[test]
    fn default_params_parse_to_default_config() {
        let cli = Cli::parse_from(["ibfv"]);
        let params: serde_json::Value = serde_json::from_str(&cli.params).unwrap();
        assert_eq!(IbfvConfig::from_json(&params), IbfvConfig::default());
        assert_eq!(cli.seed, None);
    }
}
