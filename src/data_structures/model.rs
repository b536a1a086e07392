//! Meshes and materials: CPU-side geometry, PBR material descriptors, and the
//! GPU resources they are uploaded into.

use std::ops::Range;

use wgpu::util::DeviceExt;

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Triangle-list geometry. Generated once by the mesh factory and never
/// changed afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterates the corner positions of each triangle.
    pub fn triangles(&self) -> impl Iterator<Item = [cgmath::Vector3<f32>; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.vertices[tri[0] as usize].position.into(),
                self.vertices[tri[1] as usize].position.into(),
                self.vertices[tri[2] as usize].position.into(),
            ]
        })
    }
}

/// Physically based material parameters, static per mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    /// sRGB colour as `0xRRGGBB`.
    pub color: u32,
    pub roughness: f32,
    pub metalness: f32,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Material {
    /// Fully rough dielectric that neither casts nor receives shadows.
    pub fn new(name: &str, color: u32) -> Self {
        Self {
            name: name.to_string(),
            color,
            roughness: 1.0,
            metalness: 0.0,
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    pub fn roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness;
        self
    }

    pub fn metalness(mut self, metalness: f32) -> Self {
        self.metalness = metalness;
        self
    }

    pub fn cast_shadow(mut self) -> Self {
        self.cast_shadow = true;
        self
    }

    pub fn receive_shadow(mut self) -> Self {
        self.receive_shadow = true;
        self
    }

    /// Colour in linear space, which is what the shader expects on an sRGB
    /// surface.
    pub fn linear_color(&self) -> [f32; 3] {
        hex_to_linear(self.color)
    }

    pub fn to_uniform(&self) -> MaterialUniform {
        let [r, g, b] = self.linear_color();
        MaterialUniform {
            color: [r, g, b, 1.0],
            roughness: self.roughness,
            metalness: self.metalness,
            receive_shadow: if self.receive_shadow { 1.0 } else { 0.0 },
            _padding: 0.0,
        }
    }
}

/// `0xRRGGBB` sRGB colour to linear RGB.
pub fn hex_to_linear(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
    [channel(16), channel(8), channel(0)]
}

pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    color: [f32; 4],
    roughness: f32,
    metalness: f32,
    receive_shadow: f32,
    // Uniforms are laid out in 16 byte rows
    _padding: f32,
}

pub fn material_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("material_bind_group_layout"),
    })
}

/// A mesh node's geometry, material and transform living on the GPU.
#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub instance_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub material_buffer: wgpu::Buffer,
    pub material_bind_group: wgpu::BindGroup,
    pub cast_shadow: bool,
}

impl Mesh {
    pub fn new(
        device: &wgpu::Device,
        name: &str,
        data: &MeshData,
        material: &Material,
        world: &crate::data_structures::instance::Instance,
        material_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", name)),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Instance Buffer", name)),
            contents: bytemuck::cast_slice(&[world.to_raw()]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let material_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Material Buffer", material.name)),
            contents: bytemuck::cast_slice(&[material.to_uniform()]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let material_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: material_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: material_buffer.as_entire_binding(),
            }],
            label: Some(&format!("{} Material Bind Group", material.name)),
        });

        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            instance_buffer,
            num_elements: data.indices.len() as u32,
            material_buffer,
            material_bind_group,
            cast_shadow: material.cast_shadow,
        }
    }
}

pub trait DrawModel<'a> {
    fn draw_mesh(
        &mut self,
        mesh: &'a Mesh,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    );

    fn draw_mesh_instanced(
        &mut self,
        mesh: &'a Mesh,
        instances: Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    );

    /// Depth-only draw into the shadow map; only vertex and instance data.
    fn draw_mesh_depth(&mut self, mesh: &'a Mesh, light_bind_group: &'a wgpu::BindGroup);
}

impl<'a, 'b> DrawModel<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(
        &mut self,
        mesh: &'b Mesh,
        camera_bind_group: &'b wgpu::BindGroup,
        light_bind_group: &'b wgpu::BindGroup,
    ) {
        self.draw_mesh_instanced(mesh, 0..1, camera_bind_group, light_bind_group);
    }

    fn draw_mesh_instanced(
        &mut self,
        mesh: &'b Mesh,
        instances: Range<u32>,
        camera_bind_group: &'b wgpu::BindGroup,
        light_bind_group: &'b wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_vertex_buffer(1, mesh.instance_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, &mesh.material_bind_group, &[]);
        self.set_bind_group(1, camera_bind_group, &[]);
        self.set_bind_group(2, light_bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }

    fn draw_mesh_depth(&mut self, mesh: &'b Mesh, light_bind_group: &'b wgpu::BindGroup) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_vertex_buffer(1, mesh.instance_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, light_bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, 0..1);
    }
}
