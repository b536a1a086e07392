//! Keyboard, pointer and wheel handling for the orbit camera.
//!
//! Events only record state or nudge the camera directly (drag, wheel).
//! Held keys are polled once per frame by the render loop through
//! [`InputController::apply_held_keys`], so a key held for `n` frames moves
//! the camera by exactly `n` steps regardless of key-repeat timing. Space is
//! polled the same way: it flips auto-rotate on every frame it is held.
//!
//! Pointer and wheel distances are in logical pixels. Physical positions from
//! winit are divided by the window's scale factor first.
//!
//! | Input | Effect |
//! | --- | --- |
//! | `w` / `s` | radius -/+ per frame |
//! | `a` / `d` | angle -/+ per frame |
//! | `q` / `e` | height -/+ per frame |
//! | space | toggle auto-rotate, every frame while held |
//! | drag | angle and height follow the pointer, auto-rotate stops |
//! | wheel | radius follows the scroll delta |

use std::collections::HashSet;

use winit::{
    event::{ElementState, MouseScrollDelta, WindowEvent},
    keyboard::{Key, NamedKey},
};

use crate::{camera::CameraState, config::CameraConfig};

/// Key identifier of the space bar.
pub const SPACE: &str = " ";

/// Wheel lines are converted to pixels the way browsers report them.
const PIXELS_PER_LINE: f64 = 100.0;

/// Raw input state: which keys are held and whether a drag is in progress.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputState {
    held: HashSet<String>,
    dragging: bool,
    last_pointer: (f64, f64),
}

impl InputState {
    pub fn is_held(&self, key: &str) -> bool {
        self.held.contains(key)
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn last_pointer(&self) -> (f64, f64) {
        self.last_pointer
    }
}

/// Per-frame steps and sensitivities, taken from [`CameraConfig`].
#[derive(Clone, Debug, PartialEq)]
struct Tuning {
    radius_step: f32,
    angle_step: f32,
    height_step: f32,
    drag_angle: f32,
    drag_height: f32,
    wheel: f32,
}

impl From<&CameraConfig> for Tuning {
    fn from(config: &CameraConfig) -> Self {
        Self {
            radius_step: config.radius_step,
            angle_step: config.angle_step,
            height_step: config.height_step,
            drag_angle: config.drag_angle_sensitivity,
            drag_height: config.drag_height_sensitivity,
            wheel: config.wheel_sensitivity,
        }
    }
}

#[derive(Clone, Debug)]
pub struct InputController {
    state: InputState,
    tuning: Tuning,
    /// Physical pixels per logical pixel.
    scale_factor: f64,
    attached: bool,
}

impl InputController {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            state: InputState::default(),
            tuning: config.into(),
            scale_factor: 1.0,
            attached: true,
        }
    }

    pub fn state(&self) -> &InputState {
        &self.state
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Ignored unless positive and finite.
    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        if scale_factor.is_finite() && scale_factor > 0.0 {
            self.scale_factor = scale_factor;
        }
    }

    /// Stop listening: forget everything held and ignore further events.
    pub fn detach(&mut self) {
        self.attached = false;
        self.state = InputState::default();
    }

    /// `key` is matched case-insensitively.
    pub fn key_down(&mut self, key: &str) {
        if !self.attached {
            return;
        }
        self.state.held.insert(key.to_lowercase());
    }

    pub fn key_up(&mut self, key: &str) {
        if !self.attached {
            return;
        }
        self.state.held.remove(&key.to_lowercase());
    }

    /// Starting a drag hands control to the user: auto-rotate switches off
    /// and stays off after the drag ends.
    pub fn pointer_down(&mut self, camera: &mut CameraState) {
        if !self.attached {
            return;
        }
        self.state.dragging = true;
        camera.set_auto_rotate(false);
    }

    pub fn pointer_up(&mut self) {
        if !self.attached {
            return;
        }
        self.state.dragging = false;
    }

    /// Moves always update the last pointer position; only drags move the
    /// camera. Non-finite positions are dropped.
    pub fn pointer_move(&mut self, x: f64, y: f64, camera: &mut CameraState) {
        if !self.attached || !x.is_finite() || !y.is_finite() {
            return;
        }
        if self.state.dragging {
            let dx = (x - self.state.last_pointer.0) as f32;
            let dy = (y - self.state.last_pointer.1) as f32;
            camera.rotate(-dx * self.tuning.drag_angle);
            camera.raise(dy * self.tuning.drag_height);
        }
        self.state.last_pointer = (x, y);
    }

    /// Positive `delta_y` (scrolling down) moves the camera away.
    pub fn wheel(&mut self, delta_y: f64, camera: &mut CameraState) {
        if !self.attached {
            return;
        }
        camera.zoom(delta_y as f32 * self.tuning.wheel);
    }

    /// Applies one frame's worth of held-key movement, including the
    /// auto-rotate toggle while space is held.
    pub fn apply_held_keys(&mut self, camera: &mut CameraState) {
        let held = |key: &str| self.state.is_held(key);
        if held("w") {
            camera.zoom(-self.tuning.radius_step);
        }
        if held("s") {
            camera.zoom(self.tuning.radius_step);
        }
        if held("a") {
            camera.rotate(-self.tuning.angle_step);
        }
        if held("d") {
            camera.rotate(self.tuning.angle_step);
        }
        if held("q") {
            camera.raise(-self.tuning.height_step);
        }
        if held("e") {
            camera.raise(self.tuning.height_step);
        }
        if held(SPACE) {
            camera.toggle_auto_rotate();
        }
    }

    /// Feeds a winit window event through the controller. Returns whether the
    /// event was an input this controller understands.
    pub fn on_window_event(&mut self, event: &WindowEvent, camera: &mut CameraState) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                let Some(key) = key_identifier(&event.logical_key) else {
                    return false;
                };
                match event.state {
                    ElementState::Pressed => self.key_down(&key),
                    ElementState::Released => self.key_up(&key),
                }
                true
            }
            // any button drags
            WindowEvent::MouseInput { state, .. } => {
                match state {
                    ElementState::Pressed => self.pointer_down(camera),
                    ElementState::Released => self.pointer_up(),
                }
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = position.to_logical::<f64>(self.scale_factor);
                self.pointer_move(position.x, position.y, camera);
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                // winit reports scrolling up as positive, browsers as negative
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -(*y as f64) * PIXELS_PER_LINE,
                    MouseScrollDelta::PixelDelta(position) => -position.y / self.scale_factor,
                };
                self.wheel(delta_y, camera);
                true
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.set_scale_factor(*scale_factor);
                false
            }
            _ => false,
        }
    }
}

/// Lower-cased character for printable keys, `" "` for space.
pub fn key_identifier(key: &Key) -> Option<String> {
    match key {
        Key::Named(NamedKey::Space) => Some(SPACE.to_string()),
        Key::Character(text) => Some(text.to_lowercase()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn setup() -> (InputController, CameraState) {
        let config = CameraConfig::default();
        (InputController::new(&config), CameraState::new(&config))
    }

    #[test]
    fn holding_w_for_ten_frames_zooms_in_by_three() {
        let (mut input, mut camera) = setup();
        input.key_down("w");
        for _ in 0..10 {
            input.apply_held_keys(&mut camera);
        }
        assert_abs_diff_eq!(camera.radius(), 17.0, epsilon = 1e-4);
    }

    #[test]
    fn held_keys_stop_at_the_bounds() {
        let (mut input, mut camera) = setup();
        input.key_down("W");
        input.key_down("q");
        for _ in 0..1000 {
            input.apply_held_keys(&mut camera);
        }
        assert_eq!(camera.radius(), 5.0);
        assert_eq!(camera.height(), 2.0);

        input.key_up("w");
        input.key_up("Q");
        input.key_down("s");
        input.key_down("e");
        for _ in 0..1000 {
            input.apply_held_keys(&mut camera);
        }
        assert_eq!(camera.radius(), 50.0);
        assert_eq!(camera.height(), 30.0);
    }

    #[test]
    fn a_and_d_turn_the_camera() {
        let (mut input, mut camera) = setup();
        input.key_down("d");
        input.apply_held_keys(&mut camera);
        assert_abs_diff_eq!(camera.angle(), 0.02);
        input.key_up("d");
        input.key_down("a");
        input.apply_held_keys(&mut camera);
        input.apply_held_keys(&mut camera);
        assert_abs_diff_eq!(camera.angle(), -0.02, epsilon = 1e-6);
    }

    #[test]
    fn wheel_scales_the_delta() {
        let (mut input, mut camera) = setup();
        camera.set_radius(10.0);
        input.wheel(100.0, &mut camera);
        assert_abs_diff_eq!(camera.radius(), 15.0, epsilon = 1e-4);
        input.wheel(-10_000.0, &mut camera);
        assert_eq!(camera.radius(), 5.0);
    }

    #[test]
    fn held_space_toggles_every_frame() {
        let (mut input, mut camera) = setup();
        assert!(camera.auto_rotate());
        input.key_down(SPACE);
        // key-repeat changes nothing
        input.key_down(SPACE);
        input.apply_held_keys(&mut camera);
        assert!(!camera.auto_rotate());
        input.apply_held_keys(&mut camera);
        assert!(camera.auto_rotate());
        input.apply_held_keys(&mut camera);
        assert!(!camera.auto_rotate());
        input.key_up(SPACE);
        input.apply_held_keys(&mut camera);
        assert!(!camera.auto_rotate());
    }

    #[test]
    fn space_released_before_the_frame_is_not_seen() {
        let (mut input, mut camera) = setup();
        input.key_down(SPACE);
        input.key_up(SPACE);
        input.apply_held_keys(&mut camera);
        assert!(camera.auto_rotate());
    }

    #[test]
    fn non_finite_wheel_and_pointer_input_is_ignored() {
        let (mut input, mut camera) = setup();
        input.wheel(f64::NAN, &mut camera);
        input.wheel(f64::INFINITY, &mut camera);
        assert_eq!(camera.radius(), 20.0);

        input.pointer_move(10.0, 10.0, &mut camera);
        input.pointer_down(&mut camera);
        input.pointer_move(f64::NAN, f64::NEG_INFINITY, &mut camera);
        assert_eq!(input.state().last_pointer(), (10.0, 10.0));
        input.pointer_move(20.0, 10.0, &mut camera);
        assert_abs_diff_eq!(camera.angle(), -0.1, epsilon = 1e-6);
        assert_eq!(camera.height(), 5.0);
    }

    #[test]
    fn scale_factor_must_be_positive() {
        let (mut input, _) = setup();
        input.set_scale_factor(2.0);
        input.set_scale_factor(0.0);
        input.set_scale_factor(f64::NAN);
        assert_eq!(input.scale_factor(), 2.0);
    }

    #[test]
    fn drag_disables_auto_rotate_and_release_keeps_it_off() {
        let (mut input, mut camera) = setup();
        input.pointer_down(&mut camera);
        assert!(input.state().is_dragging());
        assert!(!camera.auto_rotate());
        input.pointer_up();
        assert!(!input.state().is_dragging());
        assert!(!camera.auto_rotate());
    }

    #[test]
    fn pointer_up_leaves_an_explicitly_enabled_auto_rotate_alone() {
        let (mut input, mut camera) = setup();
        input.pointer_down(&mut camera);
        camera.set_auto_rotate(true);
        input.pointer_up();
        assert!(camera.auto_rotate());
    }

    #[test]
    fn drag_moves_angle_and_height_by_pointer_delta() {
        let (mut input, mut camera) = setup();
        input.pointer_move(100.0, 100.0, &mut camera);
        // moves without a drag only track the pointer
        assert_eq!(camera.angle(), 0.0);
        input.pointer_down(&mut camera);
        input.pointer_move(110.0, 120.0, &mut camera);
        assert_abs_diff_eq!(camera.angle(), -0.1, epsilon = 1e-6);
        assert_abs_diff_eq!(camera.height(), 6.0, epsilon = 1e-5);
        assert_eq!(input.state().last_pointer(), (110.0, 120.0));
    }

    #[test]
    fn detached_controller_ignores_events() {
        let (mut input, mut camera) = setup();
        input.key_down("w");
        input.detach();
        assert!(!input.state().is_held("w"));
        input.key_down("s");
        input.pointer_down(&mut camera);
        input.wheel(100.0, &mut camera);
        input.apply_held_keys(&mut camera);
        assert_eq!(camera.radius(), 20.0);
        assert!(camera.auto_rotate());
    }

    #[test]
    fn key_identifiers_are_lower_case() {
        assert_eq!(key_identifier(&Key::Character("W".into())), Some("w".to_string()));
        assert_eq!(key_identifier(&Key::Named(NamedKey::Space)), Some(SPACE.to_string()));
        assert_eq!(key_identifier(&Key::Named(NamedKey::Enter)), None);
    }
}
