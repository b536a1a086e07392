use std::sync::Arc;

use winit::window::Window;

use crate::{
    camera::CameraResources,
    config::ForestConfig,
    data_structures::texture::MSAA_SAMPLES,
    error::ResourceAcquisitionError,
    pipelines::light::{LightResources, LightRig},
    render::RenderTarget,
};

/// The GPU side of a running scene: surface, device and the resources every
/// mesh shares (render target, camera, lights).
#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) target: RenderTarget,
    pub(crate) is_surface_configured: bool,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub light: LightResources,
    pub clear_colour: wgpu::Color,
}

impl Context {
    pub async fn new(
        window: Arc<Window>,
        config: &ForestConfig,
        lights: &LightRig,
    ) -> Result<Self, ResourceAcquisitionError> {
        let size = window.inner_size();

        // BackendBit::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
            })
            .await?;

        log::info!("Surface");
        let surface_caps = surface.get_capabilities(&adapter);
        // The shaders output linear colour and rely on an sRGB surface for
        // the final encoding.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(ResourceAcquisitionError::NoSurfaceFormat)?;
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        let sample_count = if adapter
            .get_texture_format_features(surface_format)
            .flags
            .sample_count_supported(MSAA_SAMPLES)
        {
            MSAA_SAMPLES
        } else {
            log::warn!("{surface_format:?} cannot be multisampled, rendering without MSAA");
            1
        };

        let camera = CameraResources::new(&device, &config.camera, surface_config.width, surface_config.height);
        let light = LightResources::new(&device, lights.clone());
        let target = RenderTarget::new(
            &device,
            surface_format,
            [surface_config.width, surface_config.height],
            sample_count,
        );

        let mut ctx = Self {
            window,
            target,
            is_surface_configured: false,
            surface,
            device,
            queue,
            config: surface_config,
            camera,
            light,
            clear_colour: config.clear_colour,
        };
        // A zero-sized window is configured later, on its first resize.
        if size.width > 0 && size.height > 0 {
            ctx.resize(size.width, size.height);
        }
        Ok(ctx)
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.is_surface_configured = true;
            self.camera.projection.resize(width, height);
            self.surface.configure(&self.device, &self.config);
            self.target = RenderTarget::new(
                &self.device,
                self.config.format,
                [width, height],
                self.target.sample_count,
            );
        }
    }

    /// Reconfigures the surface at its current size, after it was lost or
    /// went out of date.
    pub fn reconfigure(&mut self) {
        let size = self.window.inner_size();
        self.resize(size.width, size.height);
    }
}
