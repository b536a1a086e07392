/**
 * This module synthesizes every mesh in the forest procedurally. Nothing is
 * loaded from files: `geometry` builds primitives and `mesh` turns them into
 * ready-to-place scene nodes (trees, rocks, ground, pond, grass).
 */
pub mod geometry;
pub mod mesh;

pub use mesh::{build_grass_blade, build_ground, build_pond, build_rock, build_tree};
