//! Tunables for the forest scene and its camera.
//!
//! `ForestConfig::default()` reproduces the fixed forest layout. Hosts may
//! override individual fields before handing the config to
//! [`crate::flow::SceneHandle::init`] or [`crate::flow::run`].

use std::ops::Range;

use crate::error::{ConstructionError, ensure_finite, ensure_positive, ensure_range};

/// Bounds, deltas and sensitivities of the orbit camera.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraConfig {
    pub initial_angle: f32,
    pub initial_radius: f32,
    pub initial_height: f32,
    pub initial_auto_rotate: bool,
    pub radius_range: (f32, f32),
    pub height_range: (f32, f32),
    /// Radius change per frame while `w`/`s` is held.
    pub radius_step: f32,
    /// Angle change (radians) per frame while `a`/`d` is held.
    pub angle_step: f32,
    /// Height change per frame while `q`/`e` is held.
    pub height_step: f32,
    /// Angle advance per frame while auto-rotating.
    pub auto_rotate_step: f32,
    /// Radians per pixel of horizontal drag.
    pub drag_angle_sensitivity: f32,
    /// Height units per pixel of vertical drag.
    pub drag_height_sensitivity: f32,
    /// Radius units per unit of wheel delta.
    pub wheel_sensitivity: f32,
    pub look_at: [f32; 3],
    /// Vertical field of view in degrees.
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            initial_angle: 0.0,
            initial_radius: 20.0,
            initial_height: 5.0,
            initial_auto_rotate: true,
            radius_range: (5.0, 50.0),
            height_range: (2.0, 30.0),
            radius_step: 0.3,
            angle_step: 0.02,
            height_step: 0.2,
            auto_rotate_step: 0.005,
            drag_angle_sensitivity: 0.01,
            drag_height_sensitivity: 0.05,
            wheel_sensitivity: 0.05,
            look_at: [0.0, 2.0, 0.0],
            fovy: 75.0,
            znear: 0.1,
            zfar: 1000.0,
        }
    }
}

impl CameraConfig {
    /// Camera state clamps against these bounds, so both ranges must be
    /// non-empty and finite. Steps, sensitivities and starting values must be
    /// finite; the projection needs a positive field of view and
    /// `0 < znear < zfar`.
    pub fn validate(&self) -> Result<(), ConstructionError> {
        ensure_range("camera radius", &(self.radius_range.0..self.radius_range.1))?;
        ensure_range("camera height", &(self.height_range.0..self.height_range.1))?;
        for (what, value) in [
            ("initial camera angle", self.initial_angle),
            ("initial camera radius", self.initial_radius),
            ("initial camera height", self.initial_height),
            ("radius step", self.radius_step),
            ("angle step", self.angle_step),
            ("height step", self.height_step),
            ("auto-rotate step", self.auto_rotate_step),
            ("drag angle sensitivity", self.drag_angle_sensitivity),
            ("drag height sensitivity", self.drag_height_sensitivity),
            ("wheel sensitivity", self.wheel_sensitivity),
        ] {
            ensure_finite(what, value)?;
        }
        for (axis, value) in ["look-at x", "look-at y", "look-at z"].into_iter().zip(self.look_at) {
            ensure_finite(axis, value)?;
        }
        ensure_positive("field of view", self.fovy)?;
        ensure_positive("near plane", self.znear)?;
        ensure_range("depth", &(self.znear..self.zfar))?;
        Ok(())
    }
}

/// Layout of the forest and the per-frame animation.
#[derive(Clone, Debug, PartialEq)]
pub struct ForestConfig {
    /// Seed for rock and grass placement. `None` picks one from the clock.
    pub seed: Option<u64>,
    pub tree_positions: Vec<(f32, f32)>,
    pub rock_count: usize,
    /// Rocks are placed uniformly in `[-rock_extent, rock_extent]` on x and z.
    pub rock_extent: f32,
    pub rock_size: Range<f32>,
    pub grass_count: usize,
    /// Grass is placed uniformly in `[-grass_extent, grass_extent]` on x and z.
    pub grass_extent: f32,
    /// Angular frequency of the grass sway in radians per second.
    pub sway_frequency: f32,
    /// Peak sway angle in radians.
    pub sway_amplitude: f32,
    /// Sky colour used for the clear colour and the fog.
    pub clear_colour: wgpu::Color,
    pub camera: CameraConfig,
}

pub const TREE_POSITIONS: [(f32, f32); 16] = [
    (-10.0, -5.0),
    (10.0, -8.0),
    (-15.0, -15.0),
    (12.0, -12.0),
    (-8.0, 5.0),
    (15.0, 8.0),
    (-12.0, 12.0),
    (8.0, 15.0),
    (-20.0, -10.0),
    (18.0, -15.0),
    (-5.0, -20.0),
    (20.0, 5.0),
    (5.0, 20.0),
    (-18.0, 15.0),
    (0.0, -12.0),
    (-6.0, 8.0),
];

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            seed: None,
            tree_positions: TREE_POSITIONS.to_vec(),
            rock_count: 15,
            rock_extent: 20.0,
            rock_size: 0.5..1.5,
            grass_count: 100,
            grass_extent: 15.0,
            sway_frequency: 1.0,
            sway_amplitude: 0.1,
            // #87ceeb in linear space
            clear_colour: wgpu::Color {
                r: 0.242,
                g: 0.617,
                b: 0.831,
                a: 1.0,
            },
            camera: CameraConfig::default(),
        }
    }
}

impl ForestConfig {
    /// Same layout, fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }

    /// The configured seed, or one derived from the wall clock.
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| instant::now() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_matches_the_forest() {
        let config = ForestConfig::default();
        assert_eq!(config.tree_positions.len(), 16);
        assert_eq!(config.rock_count, 15);
        assert_eq!(config.grass_count, 100);
        assert_eq!(config.camera.radius_range, (5.0, 50.0));
        assert_eq!(config.camera.height_range, (2.0, 30.0));
    }

    #[test]
    fn default_camera_is_valid() {
        assert_eq!(CameraConfig::default().validate(), Ok(()));
    }

    #[test]
    fn inverted_or_nan_camera_bounds_are_rejected() {
        let inverted = CameraConfig {
            radius_range: (50.0, 5.0),
            ..Default::default()
        };
        assert!(matches!(
            inverted.validate(),
            Err(ConstructionError::EmptyRange { what: "camera radius", .. })
        ));

        let nan = CameraConfig {
            height_range: (2.0, f32::NAN),
            ..Default::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn non_finite_steps_are_rejected() {
        let config = CameraConfig {
            wheel_sensitivity: f32::INFINITY,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConstructionError::NonFinite { what: "wheel sensitivity", .. })
        ));
    }

    #[test]
    fn explicit_seed_is_used() {
        assert_eq!(ForestConfig::seeded(42).resolve_seed(), 42);
    }
}
