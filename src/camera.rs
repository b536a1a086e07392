//! Orbit camera: state, pose derivation, projection and GPU uniform.
//!
//! The camera circles a fixed look-at target. Its whole state is an angle, a
//! radius and a height plus the auto-rotate flag; [`CameraRig::current_pose`]
//! turns that into a position every frame.

use cgmath::{Matrix4, Point3, Rad, SquareMatrix, Vector3, perspective};
use wgpu::util::DeviceExt;

use crate::config::CameraConfig;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Orbit parameters. Radius and height never leave their configured ranges;
/// every setter clamps. Non-finite values and deltas are ignored, so one bad
/// event cannot poison the pose.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraState {
    angle: f32,
    radius: f32,
    height: f32,
    auto_rotate: bool,
    radius_range: (f32, f32),
    height_range: (f32, f32),
}

impl CameraState {
    /// # Panics
    ///
    /// If `config` does not pass [`CameraConfig::validate`], since clamping
    /// against an empty or NaN range panics.
    pub fn new(config: &CameraConfig) -> Self {
        let mut state = Self {
            angle: config.initial_angle,
            radius: config.radius_range.0,
            height: config.height_range.0,
            auto_rotate: config.initial_auto_rotate,
            radius_range: config.radius_range,
            height_range: config.height_range,
        };
        state.set_radius(config.initial_radius);
        state.set_height(config.initial_height);
        state
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn auto_rotate(&self) -> bool {
        self.auto_rotate
    }

    /// Angles are unbounded; the trigonometry wraps them.
    pub fn rotate(&mut self, delta: f32) {
        if delta.is_finite() {
            self.angle += delta;
        }
    }

    pub fn set_radius(&mut self, radius: f32) {
        if radius.is_finite() {
            self.radius = radius.clamp(self.radius_range.0, self.radius_range.1);
        }
    }

    pub fn zoom(&mut self, delta: f32) {
        if delta.is_finite() {
            self.set_radius(self.radius + delta);
        }
    }

    pub fn set_height(&mut self, height: f32) {
        if height.is_finite() {
            self.height = height.clamp(self.height_range.0, self.height_range.1);
        }
    }

    pub fn raise(&mut self, delta: f32) {
        if delta.is_finite() {
            self.set_height(self.height + delta);
        }
    }

    pub fn set_auto_rotate(&mut self, enabled: bool) {
        self.auto_rotate = enabled;
    }

    pub fn toggle_auto_rotate(&mut self) {
        self.auto_rotate = !self.auto_rotate;
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::new(&CameraConfig::default())
    }
}

/// Where the camera is and what it looks at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Point3<f32>,
    pub look_at: Point3<f32>,
}

impl CameraPose {
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.look_at, Vector3::unit_y())
    }
}

/// Derives camera poses from [`CameraState`] around a fixed target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraRig {
    target: Point3<f32>,
}

impl CameraRig {
    pub fn new(target: [f32; 3]) -> Self {
        Self {
            target: Point3::from(target),
        }
    }

    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    /// `(sin(angle)·radius, height, cos(angle)·radius)`, looking at the target.
    pub fn current_pose(&self, state: &CameraState) -> CameraPose {
        let (sin, cos) = state.angle().sin_cos();
        CameraPose {
            position: Point3::new(sin * state.radius(), state.height(), cos * state.radius()),
            look_at: self.target,
        }
    }
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::new(CameraConfig::default().look_at)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, pose: &CameraPose, projection: &Projection) {
        self.view_position = pose.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * pose.view_matrix()).into();
    }

    pub fn view_position(&self) -> [f32; 4] {
        self.view_position
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Camera uniform buffer and its bind group.
#[derive(Debug)]
pub struct CameraResources {
    pub rig: CameraRig,
    pub projection: Projection,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, config: &CameraConfig, width: u32, height: u32) -> Self {
        let rig = CameraRig::new(config.look_at);
        let projection = Projection::new(
            width,
            height,
            cgmath::Deg(config.fovy),
            config.znear,
            config.zfar,
        );
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&rig.current_pose(&CameraState::new(config)), &projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            rig,
            projection,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Recompute the uniform for `pose` and upload it.
    pub fn write_pose(&mut self, queue: &wgpu::Queue, pose: &CameraPose) {
        self.uniform.update_view_proj(pose, &self.projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    #[test]
    fn initial_pose_is_behind_the_target_on_z() {
        let rig = CameraRig::default();
        let pose = rig.current_pose(&CameraState::default());
        assert_eq!(pose.position, Point3::new(0.0, 5.0, 20.0));
        assert_eq!(pose.look_at, Point3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn quarter_turn_moves_the_camera_to_positive_x() {
        let rig = CameraRig::default();
        let mut state = CameraState::default();
        state.rotate(FRAC_PI_2);
        let pose = rig.current_pose(&state);
        assert_abs_diff_eq!(pose.position.x, 20.0, epsilon = 1e-4);
        assert_abs_diff_eq!(pose.position.z, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn pose_is_deterministic() {
        let rig = CameraRig::default();
        let mut state = CameraState::default();
        state.rotate(1.234);
        state.zoom(7.0);
        state.raise(3.0);
        assert_eq!(rig.current_pose(&state), rig.current_pose(&state.clone()));
    }

    #[test]
    fn setters_clamp_to_bounds() {
        let mut state = CameraState::default();
        state.zoom(1000.0);
        assert_eq!(state.radius(), 50.0);
        state.zoom(-1000.0);
        assert_eq!(state.radius(), 5.0);
        state.raise(1000.0);
        assert_eq!(state.height(), 30.0);
        state.raise(-1000.0);
        assert_eq!(state.height(), 2.0);
    }

    #[test]
    fn non_finite_updates_leave_the_state_alone() {
        let mut state = CameraState::default();
        let before = state.clone();
        state.zoom(f32::NAN);
        state.raise(f32::INFINITY);
        state.rotate(f32::NAN);
        state.set_radius(f32::NEG_INFINITY);
        state.set_height(f32::NAN);
        assert_eq!(state, before);
        state.zoom(1.0);
        assert_eq!(state.radius(), 21.0);
    }

    #[test]
    fn initial_values_outside_bounds_are_clamped() {
        let config = CameraConfig {
            initial_radius: 1.0,
            initial_height: 99.0,
            ..Default::default()
        };
        let state = CameraState::new(&config);
        assert_eq!(state.radius(), 5.0);
        assert_eq!(state.height(), 30.0);
    }

    #[test]
    fn uniform_tracks_the_pose_position() {
        let rig = CameraRig::default();
        let projection = Projection::new(800, 600, cgmath::Deg(75.0), 0.1, 1000.0);
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&rig.current_pose(&CameraState::default()), &projection);
        assert_eq!(uniform.view_position(), [0.0, 5.0, 20.0, 1.0]);
    }
}
