use cgmath::{InnerSpace, Matrix4, Point3, Vector3, ortho};
use wgpu::util::DeviceExt;

use crate::{
    camera::OPENGL_TO_WGPU_MATRIX,
    data_structures::{model::hex_to_linear, texture},
};

pub const SKY_COLOR: u32 = 0x87ceeb;
pub const HEMISPHERE_GROUND_COLOR: u32 = 0x6b8e23;
pub const SHADOW_MAP_SIZE: u32 = 2048;

/// The fixed three-light rig plus fog, shared by every mesh in the forest.
#[derive(Clone, Debug, PartialEq)]
pub struct LightRig {
    pub ambient_color: u32,
    pub ambient_intensity: f32,
    pub directional_color: u32,
    pub directional_intensity: f32,
    pub directional_position: [f32; 3],
    pub directional_target: [f32; 3],
    /// Half extent of the orthographic shadow frustum.
    pub shadow_extent: f32,
    pub shadow_near: f32,
    pub shadow_far: f32,
    pub shadow_map_size: u32,
    pub hemisphere_sky: u32,
    pub hemisphere_ground: u32,
    pub hemisphere_intensity: f32,
    pub fog_color: u32,
    pub fog_near: f32,
    pub fog_far: f32,
}

impl Default for LightRig {
    fn default() -> Self {
        Self {
            ambient_color: 0xffffff,
            ambient_intensity: 0.4,
            directional_color: 0xffffff,
            directional_intensity: 0.8,
            directional_position: [50.0, 50.0, 30.0],
            directional_target: [0.0, 0.0, 0.0],
            shadow_extent: 50.0,
            shadow_near: 0.5,
            shadow_far: 500.0,
            shadow_map_size: SHADOW_MAP_SIZE,
            hemisphere_sky: SKY_COLOR,
            hemisphere_ground: HEMISPHERE_GROUND_COLOR,
            hemisphere_intensity: 0.5,
            fog_color: SKY_COLOR,
            fog_near: 50.0,
            fog_far: 200.0,
        }
    }
}

impl LightRig {
    /// Unit vector pointing from the scene towards the directional light.
    pub fn direction(&self) -> Vector3<f32> {
        (Vector3::from(self.directional_position) - Vector3::from(self.directional_target)).normalize()
    }

    /// View-projection of the shadow camera, looking from the light's
    /// position at its target through an orthographic box.
    pub fn view_proj(&self) -> Matrix4<f32> {
        let e = self.shadow_extent;
        let view = Matrix4::look_at_rh(
            Point3::from(self.directional_position),
            Point3::from(self.directional_target),
            Vector3::unit_y(),
        );
        OPENGL_TO_WGPU_MATRIX * ortho(-e, e, -e, e, self.shadow_near, self.shadow_far) * view
    }

    pub fn to_uniform(&self) -> LightUniform {
        let direction = self.direction();
        LightUniform {
            view_proj: self.view_proj().into(),
            direction: direction.into(),
            directional_intensity: self.directional_intensity,
            directional_color: hex_to_linear(self.directional_color),
            ambient_intensity: self.ambient_intensity,
            ambient_color: hex_to_linear(self.ambient_color),
            hemisphere_intensity: self.hemisphere_intensity,
            sky_color: hex_to_linear(self.hemisphere_sky),
            _padding: 0.0,
            ground_color: hex_to_linear(self.hemisphere_ground),
            _padding2: 0.0,
            fog_color: hex_to_linear(self.fog_color),
            fog_near: self.fog_near,
            fog_far: self.fog_far,
            shadow_texel: 1.0 / self.shadow_map_size.max(1) as f32,
            _padding3: [0.0; 2],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    view_proj: [[f32; 4]; 4],
    direction: [f32; 3],
    directional_intensity: f32,
    directional_color: [f32; 3],
    ambient_intensity: f32,
    ambient_color: [f32; 3],
    hemisphere_intensity: f32,
    sky_color: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: f32,
    ground_color: [f32; 3],
    _padding2: f32,
    fog_color: [f32; 3],
    fog_near: f32,
    fog_far: f32,
    /// Width of one shadow map texel in UV units, for filtering.
    shadow_texel: f32,
    _padding3: [f32; 2],
}

#[derive(Debug)]
pub struct LightResources {
    pub rig: LightRig,
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub shadow_map: texture::ShadowMap,
    /// Uniform, shadow map and comparison sampler, for the lit pass.
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
    /// Uniform only, for the depth pass that renders the shadow map.
    pub shadow_bind_group: wgpu::BindGroup,
    pub shadow_bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device, rig: LightRig) -> Self {
        let uniform = rig.to_uniform();
        let buffer = mk_buffer(device, uniform);
        let shadow_map = texture::ShadowMap::new(device, rig.shadow_map_size, "shadow_map");

        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer, &shadow_map);
        let shadow_bind_group_layout = mk_shadow_bind_group_layout(device);
        let shadow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &shadow_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("shadow_bind_group"),
        });

        Self {
            rig,
            uniform,
            buffer,
            shadow_map,
            bind_group,
            bind_group_layout,
            shadow_bind_group,
            shadow_bind_group_layout,
        }
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Uniform Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Depth,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                count: None,
            },
        ],
        label: Some("light_bind_group_layout"),
    })
}

fn mk_shadow_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("shadow_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
    shadow_map: &texture::ShadowMap,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: light_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&shadow_map.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&shadow_map.sampler),
            },
        ],
        label: Some("light_bind_group"),
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use cgmath::{Point3, Transform};

    use super::*;

    #[test]
    fn uniform_is_a_whole_number_of_rows() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 176);
        assert_eq!(std::mem::size_of::<LightUniform>() % 16, 0);
    }

    #[test]
    fn light_shines_from_above() {
        let rig = LightRig::default();
        let dir = rig.direction();
        assert!(dir.y > 0.0);
        assert_abs_diff_eq!(dir.magnitude(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn shadow_frustum_covers_the_forest() {
        let view_proj = LightRig::default().view_proj();
        for corner in [
            Point3::new(-20.0, 0.0, -20.0),
            Point3::new(20.0, 10.0, 20.0),
            Point3::new(-20.0, 10.0, 20.0),
            Point3::new(0.0, 0.0, 0.0),
        ] {
            let clip = view_proj.transform_point(corner);
            assert!(clip.x.abs() <= 1.0 && clip.y.abs() <= 1.0, "{corner:?} outside");
            assert!((0.0..=1.0).contains(&clip.z), "{corner:?} depth {}", clip.z);
        }
    }

    #[test]
    fn shadow_texel_matches_the_map_size() {
        let uniform = LightRig::default().to_uniform();
        assert_abs_diff_eq!(uniform.shadow_texel, 1.0 / 2048.0);
    }

    #[test]
    fn white_stays_white_in_linear_space() {
        let [r, g, b] = hex_to_linear(0xffffff);
        assert_abs_diff_eq!(r, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(g, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(b, 1.0, epsilon = 1e-6);
    }
}
