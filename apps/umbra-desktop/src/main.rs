use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use umbra_common::{MoveDirection, RasterMode};
use umbra_input::{Action, LookController};
use umbra_kernel::{Scene, SceneConfig};
use umbra_render::{FrameDriver, FrameReport};
use umbra_render_wgpu::WgpuRenderer;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "umbra-desktop", about = "Shadow-mapped scene viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene configuration (YAML)
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Keys that map to actions, in the order their actions apply. Later keys
/// win when two held keys set the same state: 4 over 3, then 9 over 8 over 7.
const BOUND_KEYS: [KeyCode; 19] = [
    KeyCode::KeyW,
    KeyCode::KeyS,
    KeyCode::KeyA,
    KeyCode::KeyD,
    KeyCode::KeyE,
    KeyCode::KeyQ,
    KeyCode::KeyL,
    KeyCode::KeyJ,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::ArrowLeft,
    KeyCode::ArrowRight,
    KeyCode::ArrowUp,
    KeyCode::ArrowDown,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit7,
    KeyCode::Digit8,
    KeyCode::Digit9,
];

fn key_action(key: KeyCode, config: &SceneConfig) -> Option<Action> {
    let anim = &config.animation;
    let speed = config.camera.speed;
    let action = match key {
        KeyCode::KeyW => Action::Move {
            direction: MoveDirection::Forward,
            speed,
        },
        KeyCode::KeyS => Action::Move {
            direction: MoveDirection::Backward,
            speed,
        },
        KeyCode::KeyA => Action::Move {
            direction: MoveDirection::Left,
            speed,
        },
        KeyCode::KeyD => Action::Move {
            direction: MoveDirection::Right,
            speed,
        },
        KeyCode::KeyE => Action::RotateScene(anim.scene_angle_step),
        KeyCode::KeyQ => Action::RotateScene(-anim.scene_angle_step),
        KeyCode::KeyL => Action::OrbitLight(config.light.angle_step),
        KeyCode::KeyJ => Action::OrbitLight(-config.light.angle_step),
        KeyCode::Digit5 => Action::AdjustFog(anim.fog_step),
        KeyCode::Digit6 => Action::AdjustFog(-anim.fog_step),
        KeyCode::ArrowLeft => Action::MoveTank {
            dx: -anim.tank_step,
            dz: 0.0,
        },
        KeyCode::ArrowRight => Action::MoveTank {
            dx: anim.tank_step,
            dz: 0.0,
        },
        KeyCode::ArrowUp => Action::MoveTank {
            dx: 0.0,
            dz: anim.tank_step,
        },
        KeyCode::ArrowDown => Action::MoveTank {
            dx: 0.0,
            dz: -anim.tank_step,
        },
        KeyCode::Digit3 => Action::SetPointLight(true),
        KeyCode::Digit4 => Action::SetPointLight(false),
        KeyCode::Digit7 => Action::SetRasterMode(RasterMode::Wireframe),
        KeyCode::Digit8 => Action::SetRasterMode(RasterMode::Points),
        KeyCode::Digit9 => Action::SetRasterMode(RasterMode::Fill),
        _ => return None,
    };
    Some(action)
}

/// Translate the keys currently held into this frame's actions.
fn held_actions(keys: &HashSet<KeyCode>, config: &SceneConfig) -> Vec<Action> {
    BOUND_KEYS
        .iter()
        .filter(|key| keys.contains(*key))
        .filter_map(|&key| key_action(key, config))
        .collect()
}

/// Application state.
struct AppState {
    config: SceneConfig,
    scene: Scene,
    driver: FrameDriver,
    look: LookController,
    show_overlay: bool,
    // Input state
    keys_held: HashSet<KeyCode>,
    mouse_captured: bool,
    minimized: bool,
    pending: Vec<Action>,
    started: Instant,
    last_report: Option<FrameReport>,
    device_errors: usize,
}

impl AppState {
    fn new(config: SceneConfig) -> Result<Self> {
        let scene = Scene::from_config(&config).context("invalid camera configuration")?;
        let driver = FrameDriver::new(&config.shadow, 1920, 1080);
        let look = LookController::new(config.camera.mouse_sensitivity);
        Ok(Self {
            config,
            scene,
            driver,
            look,
            show_overlay: true,
            keys_held: HashSet::new(),
            mouse_captured: false,
            minimized: false,
            pending: Vec::new(),
            started: Instant::now(),
            last_report: None,
            device_errors: 0,
        })
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            if key == KeyCode::F1 && !self.keys_held.contains(&key) {
                self.show_overlay = !self.show_overlay;
            }
            self.keys_held.insert(key);
        } else {
            self.keys_held.remove(&key);
        }
    }

    /// Track the framebuffer size. Returns false while the window is
    /// minimized; the surface and renderer keep their last drawable size.
    fn handle_resize(&mut self, width: u32, height: u32) -> bool {
        self.minimized = width == 0 || height == 0;
        if self.minimized {
            tracing::debug!("window minimized, pausing frames");
            return false;
        }
        self.driver.resize(&mut self.scene, width, height);
        true
    }

    /// Mouse look plus everything the held keys ask for this frame.
    fn take_actions(&mut self) -> Vec<Action> {
        let mut actions = std::mem::take(&mut self.pending);
        actions.extend(held_actions(&self.keys_held, &self.config));
        actions
    }

    fn draw_ui(&self, ctx: &EguiContext) {
        if !self.show_overlay {
            return;
        }
        let camera = self.scene.camera();
        let anim = self.scene.animation();
        egui::Window::new("Scene")
            .default_pos([10.0, 10.0])
            .default_width(240.0)
            .show(ctx, |ui| {
                let p = camera.position();
                ui.label(format!("Camera: ({:.1}, {:.1}, {:.1})", p.x, p.y, p.z));
                ui.label(format!(
                    "Look: pitch {:.1} yaw {:.1}",
                    self.look.pitch(),
                    self.look.yaw()
                ));
                ui.separator();
                ui.label(format!("Scene angle: {:.1}", anim.scene_angle));
                ui.label(format!("Light angle: {:.1}", self.scene.light().angle()));
                ui.label(format!("Fog density: {:.4}", anim.fog_density));
                ui.label(format!("Tank: ({:.2}, {:.2})", anim.tank.x, anim.tank.y));
                ui.label(format!(
                    "Point light: {}",
                    if self.scene.point_light().enabled {
                        "on"
                    } else {
                        "off"
                    }
                ));
                ui.label(format!("Raster: {:?}", self.scene.raster_mode()));
                ui.separator();
                if let Some(report) = &self.last_report {
                    ui.label(format!(
                        "Frame {}: {} shadow / {} forward draws",
                        report.index, report.shadow_draws, report.forward_draws
                    ));
                }
                ui.label(format!("Device errors: {}", self.device_errors));
                ui.separator();
                ui.small("WASD move | RMB look | Q/E rotate | J/L light");
                ui.small("5/6 fog | arrows tank | 3/4 point light");
                ui.small("7/8/9 wire/points/fill | F1 overlay | Esc quit");
            });
    }
}

/// Window, surface and everything that renders into it.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Umbra")
            .with_inner_size(PhysicalSize::new(1920u32, 1080));
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
        .context("no suitable graphics adapter")?;

        // Wireframe and point rendering are optional adapter features.
        let wanted = wgpu::Features::POLYGON_MODE_LINE | wgpu::Features::POLYGON_MODE_POINT;
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("umbra_device"),
                required_features: adapter.features() & wanted,
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(
            Arc::clone(&device),
            Arc::clone(&queue),
            surface_format,
            config.width,
            config.height,
        );

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    /// Callers skip zero sizes, which the renderer would not follow.
    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.renderer.resize(width, height);
    }

    /// Draw the egui overlay on top of `view`.
    fn paint_overlay(&mut self, view: &wgpu::TextureView, egui_ctx: &EguiContext, state: &AppState) {
        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx);
        });

        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
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
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    fatal: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            gpu: None,
            egui_ctx: EguiContext::default(),
            fatal: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{error:#}");
        self.fatal = Some(error);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.minimized {
            return;
        }
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
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

        let actions = self.state.take_actions();
        let elapsed = self.state.started.elapsed().as_secs_f32();
        let report = match self.state.driver.frame(
            &mut gpu.renderer,
            &mut self.state.scene,
            &actions,
            elapsed,
        ) {
            Ok(report) => report,
            Err(e) => {
                drop(output);
                self.fail(event_loop, e.into());
                return;
            }
        };
        gpu.renderer.submit(&view);
        self.state.device_errors += report.device_errors;
        self.state.last_report = Some(report);

        gpu.paint_overlay(&view, &self.egui_ctx, &self.state);

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        let gpu = match Gpu::new(event_loop, &self.egui_ctx) {
            Ok(gpu) => gpu,
            Err(e) => return self.fail(event_loop, e),
        };
        let mut gpu = gpu;
        if let Err(e) = self.state.driver.initialize(&mut gpu.renderer) {
            return self.fail(event_loop, e.into());
        }
        let (width, height) = (gpu.config.width, gpu.config.height);
        self.state
            .driver
            .resize(&mut self.state.scene, width, height);
        self.gpu = Some(gpu);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if self.state.handle_resize(new_size.width, new_size.height) {
                    if let Some(gpu) = &mut self.gpu {
                        gpu.resize(new_size.width, new_size.height);
                    }
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                if key == KeyCode::Escape && key_state == ElementState::Pressed {
                    event_loop.exit();
                    return;
                }
                self.state
                    .handle_key(key, key_state == ElementState::Pressed);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Right,
                state: btn_state,
                ..
            } => {
                self.state.mouse_captured = btn_state == ElementState::Pressed;
                if let Some(gpu) = &self.gpu {
                    gpu.window.set_cursor_visible(!self.state.mouse_captured);
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
            if self.state.mouse_captured {
                let action = self.state.look.on_mouse_delta(delta.0 as f32, delta.1 as f32);
                self.state.pending.push(action);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.state.minimized {
            return;
        }
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("umbra-desktop starting");

    let config = match &cli.config {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SceneConfig::default(),
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(AppState::new(config)?);
    event_loop.run_app(&mut app)?;

    match app.fatal {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
