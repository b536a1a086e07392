//! One-shot assembly of the forest scene graph.
//!
//! [`SceneAssembler::assemble`] consumes the assembler, so a scene can only be
//! built once from it. The resulting [`Scene`] is static apart from the grass
//! sway, which the render loop applies every frame.

use log::debug;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    config::ForestConfig,
    data_structures::{
        instance::Instance,
        scene_graph::{ContainerNode, SceneNode, count_nodes},
    },
    error::{ConstructionError, ensure_positive, ensure_range},
    pipelines::light::LightRig,
    resources::{
        build_grass_blade, build_ground, build_pond, build_rock, build_tree,
        mesh::{self, grass_blade_rotation},
    },
};

pub const ROOT: &str = "forest";
pub const GRASS: &str = "grass";

/// How many of each kind of object a scene holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SceneCounts {
    pub trees: usize,
    pub rocks: usize,
    pub ponds: usize,
    pub grass_blades: usize,
    pub grounds: usize,
}

fn named(name: &'static str) -> impl Fn(&dyn SceneNode) -> bool {
    move |node| node.name() == name
}

pub struct SceneAssembler {
    config: ForestConfig,
    rng: StdRng,
    seed: u64,
}

impl SceneAssembler {
    pub fn new(config: &ForestConfig) -> Self {
        let seed = config.resolve_seed();
        Self {
            config: config.clone(),
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Builds ground, trees, rocks, pond and grass under a single root, in
    /// that order. Any invalid parameter aborts the whole scene.
    pub fn assemble(mut self) -> Result<Scene, ConstructionError> {
        let rock_extent = ensure_positive("rock extent", self.config.rock_extent)?;
        let grass_extent = ensure_positive("grass extent", self.config.grass_extent)?;
        let rock_size = ensure_range("rock size", &self.config.rock_size)?;

        let mut root = ContainerNode::new(ROOT, Instance::new());
        root.add_child(Box::new(build_ground()?));

        for &(x, z) in &self.config.tree_positions {
            root.add_child(Box::new(build_tree(x, z)?));
        }

        for _ in 0..self.config.rock_count {
            let x = self.rng.random_range(-rock_extent..rock_extent);
            let z = self.rng.random_range(-rock_extent..rock_extent);
            let size = self.rng.random_range(rock_size.clone());
            root.add_child(Box::new(build_rock(x, z, size, &mut self.rng)?));
        }

        root.add_child(Box::new(build_pond()?));

        let mut grass = ContainerNode::new(GRASS, Instance::new());
        for _ in 0..self.config.grass_count {
            let x = self.rng.random_range(-grass_extent..grass_extent);
            let z = self.rng.random_range(-grass_extent..grass_extent);
            grass.add_child(Box::new(build_grass_blade(x, z)?));
        }
        let grass_index = root.get_children().len();
        root.add_child(Box::new(grass));

        let mut scene = Scene {
            root,
            grass_index,
            lights: LightRig::default(),
            seed: self.seed,
            sway_frequency: self.config.sway_frequency,
            sway_amplitude: self.config.sway_amplitude,
        };
        scene.update_world_transforms();
        debug!("assembled forest with seed {}: {:?}", scene.seed, scene.counts());
        Ok(scene)
    }
}

pub struct Scene {
    root: ContainerNode,
    grass_index: usize,
    lights: LightRig,
    seed: u64,
    sway_frequency: f32,
    sway_amplitude: f32,
}

impl Scene {
    pub fn root(&self) -> &dyn SceneNode {
        &self.root
    }

    pub fn lights(&self) -> &LightRig {
        &self.lights
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn counts(&self) -> SceneCounts {
        SceneCounts {
            trees: count_nodes(&self.root, &named(mesh::TREE)),
            rocks: count_nodes(&self.root, &named(mesh::ROCK)),
            ponds: count_nodes(&self.root, &named(mesh::POND)),
            grass_blades: count_nodes(&self.root, &named(mesh::GRASS_BLADE)),
            grounds: count_nodes(&self.root, &named(mesh::GROUND)),
        }
    }

    pub fn grass_blades(&self) -> &[Box<dyn SceneNode>] {
        self.root.get_children()[self.grass_index].get_children()
    }

    pub fn grass_blades_mut(&mut self) -> &mut [Box<dyn SceneNode>] {
        self.root.get_children_mut()[self.grass_index].get_children_mut()
    }

    /// Sway angle of blade `index` at `t` seconds.
    pub fn sway_angle(&self, t: f32, index: usize) -> f32 {
        (t * self.sway_frequency + index as f32).sin() * self.sway_amplitude
    }

    /// Leans every grass blade about Z by its sway angle at `t` seconds and
    /// refreshes world transforms.
    pub fn apply_sway(&mut self, t: f32) {
        let angles: Vec<f32> = (0..self.grass_blades().len())
            .map(|i| self.sway_angle(t, i))
            .collect();
        for (blade, angle) in self.grass_blades_mut().iter_mut().zip(angles) {
            let local = blade.get_local_transform().clone().with_rotation(grass_blade_rotation(angle));
            blade.set_local_transform(local);
        }
        self.update_world_transforms();
    }

    pub fn update_world_transforms(&mut self) {
        self.root.update_world_transforms(&Instance::new());
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use cgmath::{Rotation, Vector3};

    use super::*;
    use crate::data_structures::scene_graph::walk;

    fn assemble(seed: u64) -> Scene {
        SceneAssembler::new(&ForestConfig::seeded(seed)).assemble().unwrap()
    }

    #[test]
    fn forest_has_the_expected_population() {
        assert_eq!(
            assemble(1).counts(),
            SceneCounts {
                trees: 16,
                rocks: 15,
                ponds: 1,
                grass_blades: 100,
                grounds: 1,
            }
        );
    }

    #[test]
    fn same_seed_same_forest() {
        let positions = |scene: &Scene| {
            let mut out = Vec::new();
            walk(scene.root(), &mut |n| out.push(n.get_world_transform().clone()));
            out
        };
        assert_eq!(positions(&assemble(99)), positions(&assemble(99)));
        assert_ne!(positions(&assemble(99)), positions(&assemble(100)));
    }

    #[test]
    fn random_placement_stays_in_bounds() {
        for seed in 0..20 {
            let scene = assemble(seed);
            for child in scene.root().get_children() {
                if child.name() != mesh::ROCK {
                    continue;
                }
                let p = child.get_local_transform().position;
                assert!(p.x.abs() <= 20.0 && p.z.abs() <= 20.0);
                // size is twice the resting height
                assert!((0.25..=0.75).contains(&p.y));
            }
            for blade in scene.grass_blades() {
                let p = blade.get_local_transform().position;
                assert!(p.x.abs() <= 15.0 && p.z.abs() <= 15.0);
            }
        }
    }

    #[test]
    fn invalid_config_builds_nothing() {
        let config = ForestConfig {
            rock_size: 1.0..0.5,
            ..ForestConfig::seeded(1)
        };
        assert!(matches!(
            SceneAssembler::new(&config).assemble(),
            Err(ConstructionError::EmptyRange { .. })
        ));

        let config = ForestConfig {
            grass_extent: 0.0,
            ..ForestConfig::seeded(1)
        };
        assert!(SceneAssembler::new(&config).assemble().is_err());
    }

    #[test]
    fn sway_leans_each_blade_by_its_phase() {
        let mut scene = assemble(3);
        scene.apply_sway(0.5);
        for (i, blade) in scene.grass_blades().iter().enumerate() {
            let expected = (0.5 + i as f32).sin() * 0.1;
            let rotation = blade.get_local_transform().rotation;
            let want = grass_blade_rotation(expected);
            let probe = Vector3::new(1.0, 0.0, 0.0);
            let got = rotation.rotate_vector(probe);
            let want = want.rotate_vector(probe);
            assert_abs_diff_eq!(got.x, want.x, epsilon = 1e-5);
            assert_abs_diff_eq!(got.y, want.y, epsilon = 1e-5);
            assert_abs_diff_eq!(got.z, want.z, epsilon = 1e-5);
        }
    }

    #[test]
    fn sway_keeps_blade_positions() {
        let mut scene = assemble(3);
        let before: Vec<_> = scene
            .grass_blades()
            .iter()
            .map(|b| b.get_world_transform().position)
            .collect();
        scene.apply_sway(12.0);
        let after: Vec<_> = scene
            .grass_blades()
            .iter()
            .map(|b| b.get_world_transform().position)
            .collect();
        assert_eq!(before, after);
    }
}
