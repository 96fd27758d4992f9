//! The windowed application shell.
//!
//! [`run`] opens a window, builds one [`Pipeline`] on the wgpu backend with
//! the stock program bound, asks a [`SceneFactory`] for the root node and then
//! draws that root once per redraw. Redraws are requested by input and, while
//! [`SceneFactory::update`] reports a change, continuously.
//!
//! Controls
//! - right drag: orbit the camera
//! - wheel: zoom
//! - `L`: toggle lighting
//! - `E` / `N`: toggle the edge and normal overlays
//! - `+` / `-`: change the sample count handed to the shader
//!
//! The first error halts the shell: it is logged, shown in the window title
//! and all further input is ignored.

use std::sync::Arc;

use futures::future::LocalBoxFuture;
use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::Key,
    window::{Window, WindowId},
};

use crate::{
    backend::wgpu::{WgpuBackend, WgpuFrames, default_program},
    camera::{MouseDrag, OrbitCamera},
    config::AppConfig,
    context::Context,
    data_structures::scene_graph::SceneNode,
    error::Result,
    logging::init_logging,
    math::vec3,
    pipeline::{Pipeline, Tracked},
};

/// Builds and animates the scene shown by the shell.
pub trait SceneFactory {
    /// Creates the root node. Runs once, before the first frame, with the
    /// default program bound.
    fn build<'a>(&'a mut self, pipeline: &'a mut Pipeline) -> LocalBoxFuture<'a, Result<SceneNode>>;

    /// Advances the scene by `dt` seconds; returns whether anything changed.
    fn update(&mut self, _root: &mut SceneNode, _dt: f32) -> bool {
        false
    }
}

const ROTATE_DEG_PER_PIXEL: f64 = 0.4;
const ZOOM_PER_LINE: f32 = 0.9;
const ZOOM_PER_PIXEL: f32 = 0.995;

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub(crate) enum AppEvent {
    Initialized(anyhow::Result<Box<Running>>),
}

pub(crate) struct Running {
    ctx: Context,
    frames: WgpuFrames,
    pipeline: Pipeline,
    root: SceneNode,
    factory: Box<dyn SceneFactory>,
    camera: OrbitCamera,
    drag: MouseDrag,
    cursor: (f64, f64),
    lighting: bool,
    edges: bool,
    normals: bool,
    sample_count: u32,
    last_time: Instant,
}

async fn init(
    window: Arc<Window>,
    config: AppConfig,
    mut factory: Box<dyn SceneFactory>,
) -> anyhow::Result<Box<Running>> {
    let ctx = Context::new(window).await?;
    let (backend, frames) = WgpuBackend::new(
        ctx.device.clone(),
        ctx.queue.clone(),
        ctx.config.format,
        config.pipeline.uniforms.clone(),
    );
    let mut pipeline = Pipeline::new(Box::new(backend), config.pipeline.clone());
    let program = pipeline.create_program(&default_program())?;
    pipeline.use_program(program)?;
    let root = factory.build(&mut pipeline).await?;
    log::info!("scene '{}' ready", root.name());

    Ok(Box::new(Running {
        ctx,
        frames,
        pipeline,
        root,
        factory,
        camera: config.camera,
        drag: MouseDrag::default(),
        cursor: (0.0, 0.0),
        lighting: config.lighting,
        edges: false,
        normals: false,
        sample_count: config.sample_count.max(1),
        last_time: Instant::now(),
    }))
}

impl Running {
    /// Sends the per-frame state and records the root's draws.
    fn draw_scene(&mut self) -> Result<()> {
        let (width, height) = self.ctx.size();
        let pipeline = &mut self.pipeline;
        pipeline.set_view_matrix(self.camera.view_matrix())?;
        pipeline.set_projection_matrix(self.camera.projection_matrix(width, height))?;
        pipeline.set_lighting(self.lighting)?;
        pipeline.set_sample_count(self.sample_count)?;

        self.root.visualize(pipeline, self.lighting)?;
        if self.edges {
            let mut scope = pipeline.scope(Tracked::COLOR);
            let drawn = scope
                .set_color(vec3(0.1, 0.1, 0.1))
                .and_then(|_| self.root.visualize_edges(&mut scope));
            let restored = scope.exit();
            drawn.and(restored)?;
        }
        if self.normals {
            let mut scope = pipeline.scope(Tracked::COLOR);
            let drawn = scope
                .set_color(vec3(0.9, 0.2, 0.2))
                .and_then(|_| self.root.visualize_normals(&mut scope));
            let restored = scope.exit();
            drawn.and(restored)?;
        }
        Ok(())
    }

    /// Renders one frame. Surface loss is recovered by reconfiguring; scene
    /// errors are returned.
    fn redraw(&mut self, clear_colour: wgpu::Color) -> Result<()> {
        let dt = self.last_time.elapsed().as_secs_f32();
        self.last_time = Instant::now();
        let animating = self.factory.update(&mut self.root, dt);

        self.draw_scene()?;
        match self.ctx.surface.get_current_texture() {
            Ok(output) => {
                let view = output
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                self.frames
                    .render(&view, &self.ctx.depth_view, clear_colour, self.ctx.size());
                output.present();
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.frames.discard();
                let size = self.ctx.window.inner_size();
                self.ctx.resize(size.width, size.height);
                self.ctx.window.request_redraw();
            }
            Err(e) => {
                self.frames.discard();
                log::error!("Unable to render {}", e);
            }
        }

        if animating {
            self.ctx.window.request_redraw();
        }
        Ok(())
    }

    /// Applies input; returns whether a redraw is needed.
    fn input(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                let Key::Character(key) = &event.logical_key else {
                    return false;
                };
                match key.to_lowercase().as_str() {
                    "l" => self.lighting = !self.lighting,
                    "e" => self.edges = !self.edges,
                    "n" => self.normals = !self.normals,
                    "+" | "=" => self.sample_count += 1,
                    "-" => self.sample_count = self.sample_count.saturating_sub(1).max(1),
                    _ => return false,
                }
                log::debug!(
                    "lighting {} edges {} normals {} samples {}",
                    self.lighting,
                    self.edges,
                    self.normals,
                    self.sample_count
                );
                true
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Right,
                ..
            } => {
                match state {
                    ElementState::Pressed => self.drag.press(self.cursor.0, self.cursor.1),
                    ElementState::Released => self.drag.release(),
                }
                false
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x, position.y);
                match self.drag.drag_to(position.x, position.y) {
                    Some((dx, dy)) => {
                        self.camera.rotate(
                            (-dx * ROTATE_DEG_PER_PIXEL) as f32,
                            (dy * ROTATE_DEG_PER_PIXEL) as f32,
                        );
                        true
                    }
                    None => false,
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let factor = match delta {
                    MouseScrollDelta::LineDelta(_, y) => ZOOM_PER_LINE.powf(*y),
                    MouseScrollDelta::PixelDelta(p) => ZOOM_PER_PIXEL.powf(p.y as f32),
                };
                self.camera.zoom(factor);
                true
            }
            _ => false,
        }
    }
}

enum Phase {
    Starting,
    Running(Box<Running>),
    Halted,
}

pub(crate) struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[cfg(target_arch = "wasm32")]
    proxy: winit::event_loop::EventLoopProxy<AppEvent>,
    config: AppConfig,
    factory: Option<Box<dyn SceneFactory>>,
    window: Option<Arc<Window>>,
    phase: Phase,
}

impl App {
    #[allow(unused_variables)]
    fn new(
        event_loop: &EventLoop<AppEvent>,
        config: AppConfig,
        factory: Box<dyn SceneFactory>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            #[cfg(target_arch = "wasm32")]
            proxy: event_loop.create_proxy(),
            config,
            factory: Some(factory),
            window: None,
            phase: Phase::Starting,
        })
    }

    fn clear_colour(&self) -> wgpu::Color {
        let [r, g, b, a] = self.config.clear_colour;
        wgpu::Color { r, g, b, a }
    }

    fn start(&mut self, initialized: anyhow::Result<Box<Running>>) {
        match initialized {
            Ok(running) => {
                running.ctx.window.request_redraw();
                self.phase = Phase::Running(running);
            }
            Err(e) => self.halt(e),
        }
    }

    /// Stops rendering for good and reports `error`.
    fn halt(&mut self, error: anyhow::Error) {
        log::error!("rendering halted: {error:#}");
        if let Some(window) = &self.window {
            window.set_title(&format!("{} [halted: {error}]", self.config.title));
        }
        self.phase = Phase::Halted;
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(factory) = self.factory.take() else {
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.width,
                self.config.height,
            ));

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let canvas = wgpu::web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.get_element_by_id(CANVAS_ID))
                .map(|canvas| canvas.unchecked_into());
            window_attributes = window_attributes.with_canvas(canvas);
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.halt(e.into());
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        let init_future = init(window, self.config.clone(), factory);

        #[cfg(not(target_arch = "wasm32"))]
        {
            let initialized = self.async_runtime.block_on(init_future);
            self.start(initialized);
        }
        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let initialized = init_future.await;
                if proxy.send_event(AppEvent::Initialized(initialized)).is_err() {
                    log::error!("event loop closed before the scene was ready");
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::Initialized(mut initialized) => {
                // the canvas may have been resized while loading
                if let Ok(running) = initialized.as_mut() {
                    let size = running.ctx.window.inner_size();
                    running.ctx.resize(size.width, size.height);
                }
                self.start(initialized);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if let WindowEvent::CloseRequested = event {
            event_loop.exit();
            return;
        }
        let clear_colour = self.clear_colour();
        let Phase::Running(running) = &mut self.phase else {
            return;
        };
        match event {
            WindowEvent::Resized(size) => {
                running.ctx.resize(size.width, size.height);
                running.ctx.window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = running.redraw(clear_colour) {
                    running.frames.discard();
                    self.halt(e.into());
                }
            }
            event => {
                if running.input(&event) {
                    running.ctx.window.request_redraw();
                }
            }
        }
    }
}

/// Opens the window and runs the event loop until it is closed.
pub fn run(config: AppConfig, factory: Box<dyn SceneFactory>) -> anyhow::Result<()> {
    init_logging(config.logging.clone());

    let event_loop: EventLoop<AppEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config, factory)?;
    event_loop.run_app(&mut app)?;
    Ok(())
}
