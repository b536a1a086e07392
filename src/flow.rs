//! Frame loop, scene lifecycle and the bundled winit host.
//!
//! # User-facing types
//!
//! - [`ForestState`] is everything the simulation needs without a GPU: the
//!   assembled scene, camera state and input controller
//! - [`FrameLoop`] is the cancellable per-frame tick
//! - [`SceneHandle`] ties both to a window and its GPU resources, with an
//!   explicit `init`/`dispose` lifecycle
//! - [`run`] opens a window (or attaches to `<canvas id="canvas">` on the
//!   web) and drives a [`SceneHandle`] from winit's event loop
//!
//! # Lifecycle Flow
//!
//! Each redraw runs one [`FrameLoop::tick`]:
//! 1. Apply held keys, space (auto-rotate toggle) included
//! 2. Advance the angle if auto-rotating
//! 3. Derive the camera pose
//! 4. Sway the grass
//!
//! then uploads the camera and transforms and renders the shadow and lit
//! passes.

use std::sync::Arc;

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    camera::{CameraPose, CameraRig, CameraState},
    config::ForestConfig,
    context::Context,
    error::{ConstructionError, ForestError, ResourceAcquisitionError},
    input::InputController,
    render::GpuScene,
    scene::{Scene, SceneAssembler},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// The simulation half of a running forest. Owns no GPU resources, so it can
/// be stepped in tests.
pub struct ForestState {
    pub scene: Scene,
    pub camera: CameraState,
    pub rig: CameraRig,
    pub input: InputController,
    auto_rotate_step: f32,
}

impl ForestState {
    /// Fails if the camera config cannot bound a camera or the scene cannot
    /// be assembled.
    pub fn new(config: &ForestConfig) -> Result<Self, ConstructionError> {
        config.camera.validate()?;
        let scene = SceneAssembler::new(config).assemble()?;
        Ok(Self {
            scene,
            camera: CameraState::new(&config.camera),
            rig: CameraRig::new(config.camera.look_at),
            input: InputController::new(&config.camera),
            auto_rotate_step: config.camera.auto_rotate_step,
        })
    }

    pub fn on_window_event(&mut self, event: &WindowEvent) -> bool {
        self.input.on_window_event(event, &mut self.camera)
    }

    /// One frame of simulation at `t` seconds after the loop started.
    fn step(&mut self, t: f32) -> CameraPose {
        self.input.apply_held_keys(&mut self.camera);
        if self.camera.auto_rotate() {
            self.camera.rotate(self.auto_rotate_step);
        }
        let pose = self.rig.current_pose(&self.camera);
        self.scene.apply_sway(t);
        pose
    }
}

/// A frame loop that is started once and can be cancelled once. A cancelled
/// loop never ticks again, even if started anew.
#[derive(Debug, Default)]
pub struct FrameLoop {
    started: Option<Instant>,
    cancelled: bool,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        if self.started.is_none() && !self.cancelled {
            self.started = Some(Instant::now());
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some() && !self.cancelled
    }

    /// Seconds since [`FrameLoop::start`], zero if not started.
    pub fn elapsed(&self) -> f32 {
        self.started
            .map(|started| started.elapsed().as_secs_f32())
            .unwrap_or(0.0)
    }

    /// Advances `state` by one frame at time `t`. Returns the camera pose to
    /// render with, or `None` once the loop is not running.
    pub fn tick_at(&mut self, state: &mut ForestState, t: f32) -> Option<CameraPose> {
        if !self.is_running() {
            return None;
        }
        Some(state.step(t))
    }

    pub fn tick(&mut self, state: &mut ForestState) -> Option<CameraPose> {
        let t = self.elapsed();
        self.tick_at(state, t)
    }
}

/// GPU resources of a live scene. `scene` is declared first so meshes and
/// pipelines are released before the device.
struct Gpu {
    scene: GpuScene,
    ctx: Context,
}

/// A forest bound to a window. Created by [`SceneHandle::init`], torn down by
/// [`SceneHandle::dispose`] or by dropping it.
pub struct SceneHandle {
    state: ForestState,
    frame_loop: FrameLoop,
    gpu: Option<Gpu>,
    disposed: bool,
}

impl SceneHandle {
    /// Builds the scene, acquires the GPU for `window`, attaches the input
    /// controller and starts the frame loop. Scene construction runs first, so
    /// an invalid config never touches the GPU.
    pub async fn init(window: Arc<Window>, config: &ForestConfig) -> Result<Self, ForestError> {
        let mut state = ForestState::new(config)?;
        log::info!("forest assembled with seed {}", state.scene.seed());
        state.input.set_scale_factor(window.scale_factor());

        let ctx = Context::new(window, config, state.scene.lights()).await?;
        let scene = GpuScene::new(&ctx.device, &ctx.target, &ctx.camera, &ctx.light, &state.scene);
        log::info!("{} meshes on the GPU", scene.mesh_count());

        let mut frame_loop = FrameLoop::new();
        frame_loop.start();
        Ok(Self {
            state,
            frame_loop,
            gpu: Some(Gpu { scene, ctx }),
            disposed: false,
        })
    }

    /// A running forest with no window or GPU. Frames only advance the
    /// simulation.
    pub fn headless(config: &ForestConfig) -> Result<Self, ForestError> {
        let state = ForestState::new(config)?;
        let mut frame_loop = FrameLoop::new();
        frame_loop.start();
        Ok(Self {
            state,
            frame_loop,
            gpu: None,
            disposed: false,
        })
    }

    pub fn has_gpu(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn state(&self) -> &ForestState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.frame_loop.is_running()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn on_window_event(&mut self, event: &WindowEvent) -> bool {
        self.state.on_window_event(event)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(gpu) = &mut self.gpu {
            gpu.ctx.resize(width, height);
        }
    }

    /// Resizes the surface to the window's current size.
    pub fn fit_to_window(&mut self) {
        if let Some(gpu) = &mut self.gpu {
            gpu.ctx.reconfigure();
        }
    }

    pub fn request_redraw(&self) {
        if let Some(gpu) = &self.gpu {
            gpu.ctx.window().request_redraw();
        }
    }

    /// Ticks the loop and renders. Surface loss is repaired by reconfiguring;
    /// any other surface error skips the frame.
    pub fn frame(&mut self) {
        let Some(pose) = self.frame_loop.tick(&mut self.state) else {
            return;
        };
        let Some(gpu) = &mut self.gpu else {
            return;
        };
        gpu.ctx.camera.write_pose(&gpu.ctx.queue, &pose);
        gpu.scene.write_transforms(&gpu.ctx.queue, &self.state.scene);
        match gpu.scene.render(&gpu.ctx) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu.ctx.reconfigure(),
            Err(e) => log::warn!("Unable to render {}", e),
        }
        gpu.ctx.window().request_redraw();
    }

    /// Stops the loop, detaches input and releases every GPU resource.
    /// Calling it again does nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.frame_loop.cancel();
        self.state.input.detach();
        self.gpu = None;
        log::info!("forest disposed");
    }
}

impl Drop for SceneHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

pub(crate) enum FlowEvent {
    #[allow(dead_code)]
    Initialized(Result<SceneHandle, ForestError>),
}

pub(crate) struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: winit::event_loop::EventLoopProxy<FlowEvent>,
    // Taken on the first `resumed` so the scene is only built once.
    config: Option<ForestConfig>,
    handle: Option<SceneHandle>,
    error: Option<ForestError>,
}

impl App {
    fn new(event_loop: &EventLoop<FlowEvent>, config: ForestConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy,
            config: Some(config),
            handle: None,
            error: None,
        })
    }

    fn initialized(&mut self, event_loop: &ActiveEventLoop, result: Result<SceneHandle, ForestError>) {
        match result {
            Ok(handle) => {
                handle.request_redraw();
                self.handle = Some(handle);
            }
            Err(e) => {
                log::error!("Could not start the forest: {}", e);
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(config) = self.config.take() else {
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("Virtual Forest");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let canvas = web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.get_element_by_id(CANVAS_ID))
                .and_then(|element| element.dyn_into::<web_sys::HtmlCanvasElement>().ok());
            if canvas.is_none() {
                log::warn!("no <canvas id=\"{}\">, letting winit create one", CANVAS_ID);
            }
            window_attributes = window_attributes.with_canvas(canvas);
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                let e = ForestError::from(ResourceAcquisitionError::from(e));
                self.initialized(event_loop, Err(e));
                return;
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let result = self.async_runtime.block_on(SceneHandle::init(window, &config));
            self.initialized(event_loop, result);
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = SceneHandle::init(window, &config).await;
                if proxy.send_event(FlowEvent::Initialized(result)).is_err() {
                    log::error!("event loop closed before the forest finished loading");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            FlowEvent::Initialized(result) => {
                self.initialized(event_loop, result);
                // The canvas may have been resized while the GPU was loading.
                if let Some(handle) = &mut self.handle {
                    handle.fit_to_window();
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(handle) = &mut self.handle else {
            return;
        };
        handle.on_window_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                handle.dispose();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => handle.resize(size.width, size.height),
            WindowEvent::RedrawRequested => handle.frame(),
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut handle) = self.handle.take() {
            handle.dispose();
        }
    }
}

/// Opens the forest in a window and runs until it is closed. An error from
/// scene construction or GPU setup is returned once the event loop has
/// stopped.
pub fn run(config: ForestConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info)?;
    }

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;

    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    run(ForestConfig::default()).map_err(|e| JsValue::from_str(&e.to_string()))
}
