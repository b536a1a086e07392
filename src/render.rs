//! Drawing the forest.
//!
//! [`GpuScene`] mirrors the scene graph on the GPU: one [`Mesh`] per drawable
//! node, in depth-first order. Each frame it rewrites the instance buffers from
//! the nodes' world transforms, renders shadow casters into the light's depth
//! map, then draws every mesh with the lit pipeline into a [`RenderTarget`].
//!
//! Nothing here needs a window: the same code draws to the surface and to
//! offscreen textures.

use std::iter;

use crate::{
    camera::CameraResources,
    context::Context,
    data_structures::{
        model::{DrawModel, Mesh, material_bind_group_layout},
        scene_graph::walk,
        texture::Texture,
    },
    pipelines::{basic::mk_forest_pipeline, light::LightResources, shadow::mk_shadow_pipeline},
    scene::Scene,
};

/// Depth buffer, and the multisampled colour buffer when `sample_count > 1`,
/// sized to match one output.
#[derive(Debug)]
pub struct RenderTarget {
    pub format: wgpu::TextureFormat,
    pub sample_count: u32,
    pub depth: Texture,
    pub msaa: Option<Texture>,
}

impl RenderTarget {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, size: [u32; 2], sample_count: u32) -> Self {
        let msaa = (sample_count > 1)
            .then(|| Texture::create_msaa_target(device, format, size, sample_count, "msaa_texture"));
        Self {
            format,
            sample_count,
            depth: Texture::create_depth_texture(device, size, sample_count, "depth_texture"),
            msaa,
        }
    }

    /// The main pass draws into the multisampled buffer and resolves into
    /// `output`, or straight into `output` without multisampling.
    fn colour_attachment<'a>(
        &'a self,
        output: &'a wgpu::TextureView,
        clear: wgpu::Color,
    ) -> wgpu::RenderPassColorAttachment<'a> {
        let (view, resolve_target) = match &self.msaa {
            Some(msaa) => (&msaa.view, Some(output)),
            None => (output, None),
        };
        wgpu::RenderPassColorAttachment {
            view,
            resolve_target,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        }
    }
}

pub struct GpuScene {
    meshes: Vec<Mesh>,
    forest_pipeline: wgpu::RenderPipeline,
    shadow_pipeline: wgpu::RenderPipeline,
}

impl GpuScene {
    /// Uploads every drawable node of `scene` and builds both pipelines for
    /// `target`'s format and sample count.
    pub fn new(
        device: &wgpu::Device,
        target: &RenderTarget,
        camera: &CameraResources,
        light: &LightResources,
        scene: &Scene,
    ) -> Self {
        let material_layout = material_bind_group_layout(device);
        let mut meshes = Vec::new();
        walk(scene.root(), &mut |node| {
            if let Some((data, material)) = node.drawable() {
                meshes.push(Mesh::new(
                    device,
                    node.name(),
                    data,
                    material,
                    node.get_world_transform(),
                    &material_layout,
                ));
            }
        });
        log::debug!("uploaded {} meshes", meshes.len());

        let forest_pipeline = mk_forest_pipeline(
            device,
            target.format,
            target.sample_count,
            &material_layout,
            &camera.bind_group_layout,
            &light.bind_group_layout,
        );
        let shadow_pipeline = mk_shadow_pipeline(device, &light.shadow_bind_group_layout);

        Self {
            meshes,
            forest_pipeline,
            shadow_pipeline,
        }
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// How many meshes the shadow pass draws.
    pub fn shadow_caster_count(&self) -> usize {
        self.shadow_casters().count()
    }

    fn shadow_casters(&self) -> impl Iterator<Item = &Mesh> {
        self.meshes.iter().filter(|mesh| mesh.cast_shadow)
    }

    /// Uploads the current world transform of every drawable node. The scene
    /// graph's shape never changes, so walk order matches `meshes`.
    pub fn write_transforms(&self, queue: &wgpu::Queue, scene: &Scene) {
        let mut meshes = self.meshes.iter();
        walk(scene.root(), &mut |node| {
            if node.drawable().is_none() {
                return;
            }
            if let Some(mesh) = meshes.next() {
                queue.write_buffer(
                    &mesh.instance_buffer,
                    0,
                    bytemuck::cast_slice(&[node.get_world_transform().to_raw()]),
                );
            }
        });
    }

    /// Records the shadow pass and the lit pass into `encoder`, drawing
    /// through `target` into `output`.
    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        output: &wgpu::TextureView,
        target: &RenderTarget,
        camera: &CameraResources,
        light: &LightResources,
        clear: wgpu::Color,
    ) {
        {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &light.shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            shadow_pass.set_pipeline(&self.shadow_pipeline);
            for mesh in self.shadow_casters() {
                shadow_pass.draw_mesh_depth(mesh, &light.shadow_bind_group);
            }
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Render Pass"),
            color_attachments: &[Some(target.colour_attachment(output, clear))],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &target.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        render_pass.set_pipeline(&self.forest_pipeline);
        for mesh in &self.meshes {
            render_pass.draw_mesh(mesh, &camera.bind_group, &light.bind_group);
        }
    }

    /// Renders one frame to the window surface and presents it.
    pub fn render(&self, ctx: &Context) -> Result<(), wgpu::SurfaceError> {
        if !ctx.is_surface_configured {
            return Ok(());
        }
        let output = ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        self.encode(
            &mut encoder,
            &view,
            &ctx.target,
            &ctx.camera,
            &ctx.light,
            ctx.clear_colour,
        );
        ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
