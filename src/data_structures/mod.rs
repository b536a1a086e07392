//! Engine data structures: meshes, materials, textures, scene graphs, and
//! transforms.
//!
//! - `model` contains CPU geometry, material descriptors and their GPU meshes
//! - `texture` contains the depth buffer and shadow map wrappers
//! - `instance` holds per-node transformation data
//! - `scene_graph` enables hierarchical scene organization

pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
