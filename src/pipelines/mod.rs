//! Render pipelines and the lighting resources they bind.
//!
//! - `basic` is the lit pass every mesh is drawn with
//! - `shadow` renders shadow casters into the directional light's depth map
//! - `light` holds the light rig, its uniform and bind groups

pub mod basic;
pub mod light;
pub mod shadow;
