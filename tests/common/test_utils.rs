#![allow(dead_code)]

use virtual_forest::{ForestConfig, flow::ForestState};
use winit::{
    dpi::PhysicalPosition,
    event::{DeviceId, ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent},
};

pub(crate) fn forest(seed: u64) -> ForestState {
    ForestState::new(&ForestConfig::seeded(seed)).expect("default forest must assemble")
}

fn device() -> DeviceId {
    // Only used as an opaque tag on synthetic events.
    unsafe { DeviceId::dummy() }
}

pub(crate) fn button(button: MouseButton, state: ElementState) -> WindowEvent {
    WindowEvent::MouseInput {
        device_id: device(),
        state,
        button,
    }
}

pub(crate) fn left_button(state: ElementState) -> WindowEvent {
    button(MouseButton::Left, state)
}

pub(crate) fn cursor(x: f64, y: f64) -> WindowEvent {
    WindowEvent::CursorMoved {
        device_id: device(),
        position: PhysicalPosition::new(x, y),
    }
}

pub(crate) fn wheel_lines(lines: f32) -> WindowEvent {
    WindowEvent::MouseWheel {
        device_id: device(),
        delta: MouseScrollDelta::LineDelta(0.0, lines),
        phase: TouchPhase::Moved,
    }
}

pub(crate) fn wheel_pixels(pixels: f64) -> WindowEvent {
    WindowEvent::MouseWheel {
        device_id: device(),
        delta: MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, pixels)),
        phase: TouchPhase::Moved,
    }
}
