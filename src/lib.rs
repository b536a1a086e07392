//! virtual-forest
//!
//! A small procedurally assembled forest: sixteen trees, scattered rocks, a
//! pond, swaying grass and a gently waved ground, lit by an ambient, a
//! hemisphere and a shadow-casting directional light. An orbit camera circles
//! the scene and follows keyboard, drag and wheel input. Everything is
//! generated at startup; nothing is loaded from files. Runs natively and in
//! the browser through WebGL2.
//!
//! High-level modules
//! - `camera`: orbit state, pose derivation, projection and uniform
//! - `config`: tunables for the layout, camera and animation
//! - `context`: window surface, device and shared GPU resources
//! - `data_structures`: meshes, materials, transforms and the scene graph
//! - `error`: construction and resource acquisition errors
//! - `flow`: frame loop, scene lifecycle and the winit host
//! - `input`: keyboard, pointer and wheel handling
//! - `pipelines`: the lit and shadow pipelines and the light rig
//! - `render`: uploading and drawing the scene graph
//! - `resources`: procedural geometry and the forest's building blocks
//! - `scene`: one-shot scene assembly
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod input;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;

pub use config::ForestConfig;
pub use error::{ConstructionError, ForestError, ResourceAcquisitionError};
pub use flow::{SceneHandle, run};
