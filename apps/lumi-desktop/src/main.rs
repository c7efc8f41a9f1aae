use anyhow::{Context, Result, anyhow};
use clap::Parser;
use egui::Context as EguiContext;
use lumi_common::{OverlaySettings, SceneKind, Settings};
use lumi_input::{Action, InputState, KeyBindings};
use lumi_render::{
    Camera, FrameContext, FrameCounter, FrameTiming, ProgramId, Renderer, Scene, build_scene,
};
use lumi_render_wgpu::{FrameStats, RendererConfig, WgpuRenderer};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

#[derive(Parser)]
#[command(name = "lumi-desktop", about = "LUMI real-time renderer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Settings file (JSON); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scene to run: shadows, pbr or instancing
    #[arg(long)]
    scene: Option<SceneKind>,

    /// Assets directory, overriding the settings file
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Key bindings file (JSON)
    #[arg(long)]
    bindings: Option<PathBuf>,
}

/// Everything the frame loop owns apart from GPU handles.
struct AppState {
    settings: Settings,
    scene: Box<dyn Scene>,
    camera: Camera,
    input: InputState,
    bindings: KeyBindings,
    overlays: OverlaySettings,
    timing: FrameTiming,
    counter: FrameCounter,
    start: Instant,
    mouse_captured: bool,
    last_stats: FrameStats,
    /// Programs compiled from files in the shader directory.
    shader_overrides: Vec<&'static str>,
    shadow_resolution: u32,
}

impl AppState {
    fn new(settings: Settings, bindings: KeyBindings) -> Self {
        Self {
            scene: build_scene(&settings),
            camera: Camera::from_settings(&settings.camera),
            input: InputState::new(settings.camera.boost),
            overlays: settings.overlays,
            timing: FrameTiming::new(),
            counter: FrameCounter::default(),
            start: Instant::now(),
            mouse_captured: false,
            last_stats: FrameStats::default(),
            shader_overrides: Vec::new(),
            shadow_resolution: 0,
            bindings,
            settings,
        }
    }

    /// Advance time and move the camera.
    fn update(&mut self) {
        let dt = self.timing.advance(self.start.elapsed().as_secs_f64());
        self.counter.new_frame(dt);
        self.input.apply(&mut self.camera, dt);
    }

    /// Returns `true` when the key asks to quit.
    fn handle_key(&mut self, key: KeyCode, pressed: bool, repeat: bool) -> bool {
        let name = format!("{key:?}");
        match self.input.key_event(&self.bindings, &name, pressed, repeat) {
            Some(Action::Quit) => true,
            Some(Action::Toggle(overlay)) => {
                let on = overlay.toggle(&mut self.overlays);
                tracing::info!("{overlay:?} {}", if on { "on" } else { "off" });
                false
            }
            _ => false,
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.overlays.inspector {
            return;
        }

        egui::Window::new("LUMI")
            .default_width(260.0)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!("Scene: {}", self.scene.kind()));
                ui.label(format!(
                    "{} fps ({:.2} ms)",
                    self.counter.fps_mean(),
                    self.counter.delta_mean() * 1000.0
                ));
                ui.label(format!(
                    "Draws: {} in {} passes ({} skipped)",
                    self.last_stats.draws, self.last_stats.passes, self.last_stats.skipped
                ));
                ui.separator();

                let p = self.camera.position;
                ui.label(format!("Camera: ({:.1}, {:.1}, {:.1})", p.x, p.y, p.z));
                ui.label(format!(
                    "Yaw {:.1}  Pitch {:.1}  FOV {:.1}",
                    self.camera.yaw, self.camera.pitch, self.camera.zoom
                ));
                ui.separator();

                ui.checkbox(&mut self.overlays.skybox, "Skybox (F2)");
                match self.scene.kind() {
                    SceneKind::Shadows => {
                        let r = self.shadow_resolution;
                        ui.label(format!("Shadow map: {r}x{r}"));
                        ui.checkbox(&mut self.overlays.depth_debug, "Depth map (F3)");
                        ui.checkbox(&mut self.overlays.light_cube, "Light cube (F4)");
                    }
                    SceneKind::Pbr => {
                        ui.checkbox(&mut self.overlays.animate_lights, "Animate lights (F5)");
                    }
                    SceneKind::Instancing => {
                        ui.label(format!("Instances: {}", self.settings.prefab.amount));
                    }
                }

                if !self.shader_overrides.is_empty() {
                    ui.label(format!("Shader overrides: {}", self.shader_overrides.join(", ")));
                }

                ui.separator();
                ui.small("F1: Inspector | RMB: Look | WASD/EQ: Move | Shift: Boost | Esc: Quit");
            });
    }
}

struct GpuApp {
    state: AppState,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    config: Option<wgpu::SurfaceConfiguration>,
    renderer: Option<WgpuRenderer>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    /// Set when initialisation fails; returned from `main`.
    error: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            window: None,
            surface: None,
            device: None,
            queue: None,
            config: None,
            renderer: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_settings = &self.state.settings.window;
        let attrs = Window::default_attributes()
            .with_title(window_settings.title.clone())
            .with_inner_size(PhysicalSize::new(window_settings.width, window_settings.height))
            .with_resizable(window_settings.resizable);
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("no suitable GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("lumi_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if window_settings.vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer_config =
            RendererConfig::from_settings(&self.state.settings, surface_format, config.width, config.height);
        let manifest = self.state.scene.manifest();
        let renderer = WgpuRenderer::new(&device, &queue, &renderer_config, &manifest)
            .with_context(|| format!("load scene '{}'", self.state.scene.kind()))?;
        self.state.shadow_resolution = renderer.shadow_map_resolution();
        self.state.shader_overrides = ProgramId::ALL
            .into_iter()
            .filter(|p| renderer.program(*p).is_some_and(|s| !s.source().is_builtin()))
            .map(ProgramId::name)
            .collect();

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend, {}x{} {:?}",
            adapter.get_info().backend.to_str(),
            config.width,
            config.height,
            renderer.surface_format()
        );

        self.window = Some(window);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);
        self.config = Some(config);
        self.renderer = Some(renderer);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);
        Ok(())
    }

    fn set_mouse_captured(&mut self, captured: bool) {
        self.state.mouse_captured = captured;
        let Some(window) = &self.window else {
            return;
        };
        let grab = if captured {
            window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))
        } else {
            window.set_cursor_grab(CursorGrabMode::None)
        };
        if let Err(e) = grab {
            tracing::debug!("cursor grab unavailable: {e}");
        }
        window.set_cursor_visible(!captured);
    }

    fn redraw(&mut self) {
        self.state.update();

        let (Some(window), Some(surface), Some(device), Some(queue), Some(config)) = (
            &self.window,
            &self.surface,
            &self.device,
            &self.queue,
            &self.config,
        ) else {
            return;
        };

        let output = match surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                surface.configure(device, config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let state = &mut self.state;
        let plan = state.scene.build_frame(&FrameContext {
            camera: &state.camera,
            aspect: config.width as f32 / config.height.max(1) as f32,
            time: state.timing.elapsed() as f32,
            overlays: state.overlays,
            clear_color: state.settings.window.clear_color,
        });
        if let Some(renderer) = &mut self.renderer {
            state.last_stats = renderer.frame(device, queue, &view).render(&plan);
        }

        if let (Some(egui_winit), Some(egui_renderer)) = (&mut self.egui_winit, &mut self.egui_renderer) {
            let raw_input = egui_winit.take_egui_input(window);
            let full_output = self.egui_ctx.run(raw_input, |ctx| {
                state.draw_ui(ctx);
            });
            egui_winit.handle_platform_output(window, full_output.platform_output);

            let paint_jobs = self
                .egui_ctx
                .tessellate(full_output.shapes, full_output.pixels_per_point);
            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [config.width, config.height],
                pixels_per_point: full_output.pixels_per_point,
            };

            for (id, image_delta) in &full_output.textures_delta.set {
                egui_renderer.update_texture(device, queue, *id, image_delta);
            }
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
            egui_renderer.update_buffers(device, queue, &mut encoder, &paint_jobs, &screen_descriptor);
            {
                let mut pass = encoder
                    .begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("egui_pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Load,
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        ..Default::default()
                    })
                    .forget_lifetime();
                egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
            }
            queue.submit(std::iter::once(encoder.finish()));
            for id in &full_output.textures_delta.free {
                egui_renderer.free_texture(id);
            }
        }

        output.present();
        window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.error.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            tracing::error!("initialisation failed: {e:#}");
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(egui_winit), Some(window)) = (&mut self.egui_winit, &self.window) {
            let response = egui_winit.on_window_event(window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let (Some(surface), Some(device), Some(config)) =
                    (&self.surface, &self.device, &mut self.config)
                {
                    config.width = new_size.width.max(1);
                    config.height = new_size.height.max(1);
                    surface.configure(device, config);
                    if let Some(renderer) = &mut self.renderer {
                        renderer.resize(device, config.width, config.height);
                    }
                }
            }
            WindowEvent::Focused(false) => {
                self.state.input.clear();
                self.set_mouse_captured(false);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        repeat,
                        ..
                    },
                ..
            } => {
                if self.state.handle_key(key, key_state == ElementState::Pressed, repeat) {
                    tracing::info!("quit requested");
                    event_loop.exit();
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Right,
                state: btn_state,
                ..
            } => {
                self.set_mouse_captured(btn_state == ElementState::Pressed);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let dy = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 20.0,
                };
                self.state.camera.process_mouse_scroll(dy);
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
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
            if self.state.mouse_captured {
                let (dx, dy) = InputState::look_offsets(delta.0, delta.1);
                self.state.camera.process_mouse_movement(dx, dy, true);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(scene) = cli.scene {
        settings.scene = scene;
    }
    if let Some(assets) = &cli.assets {
        settings.assets_dir = assets.clone();
    }
    settings.validate()?;
    Ok(settings)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let settings = load_settings(&cli)?;
    let bindings = match &cli.bindings {
        Some(path) => KeyBindings::load(path)?,
        None => KeyBindings::default(),
    };
    tracing::info!(
        "lumi-desktop starting: scene '{}', assets {}",
        settings.scene,
        settings.assets_dir.display()
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(AppState::new(settings, bindings));
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
