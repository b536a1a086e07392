use std::f32::consts::{FRAC_PI_2, PI};

use rand::Rng;

use crate::{
    data_structures::{
        instance::Instance,
        model::{Material, MeshData},
        scene_graph::{ContainerNode, MeshNode},
    },
    error::{ConstructionError, ensure_positive},
    resources::geometry,
};

pub const TREE: &str = "tree";
pub const TRUNK: &str = "trunk";
pub const FOLIAGE: &str = "foliage";
pub const ROCK: &str = "rock";
pub const GROUND: &str = "ground";
pub const POND: &str = "pond";
pub const GRASS_BLADE: &str = "grass_blade";

pub const GROUND_SIZE: f32 = 200.0;
pub const GROUND_SEGMENTS: u32 = 32;
/// Spatial frequency of the ground wave on both plane axes.
pub const GROUND_WAVE_FREQUENCY: f32 = 0.1;
pub const GROUND_WAVE_AMPLITUDE: f32 = 0.3;

/// Radius, height and centre height of each foliage cone, bottom to top.
const FOLIAGE_LAYERS: [(f32, f32, f32); 3] = [(2.0, 3.0, 5.5), (1.5, 2.5, 7.5), (1.0, 2.0, 9.0)];

pub fn trunk_material() -> Material {
    Material::new(TRUNK, 0x4a3020).roughness(0.9).cast_shadow()
}

pub fn foliage_material() -> Material {
    Material::new(FOLIAGE, 0x2d5016).roughness(0.7).cast_shadow()
}

pub fn rock_material() -> Material {
    Material::new(ROCK, 0x666666)
        .roughness(0.9)
        .metalness(0.1)
        .cast_shadow()
        .receive_shadow()
}

pub fn ground_material() -> Material {
    Material::new(GROUND, 0x4a7c59)
        .roughness(0.8)
        .metalness(0.2)
        .receive_shadow()
}

pub fn pond_material() -> Material {
    Material::new(POND, 0x4a90e2)
        .roughness(0.1)
        .metalness(0.8)
        .receive_shadow()
}

pub fn grass_material() -> Material {
    Material::new(GRASS_BLADE, 0x3a7c3a)
}

/**
 * A tree is a group holding a tapered trunk and three stacked foliage cones,
 * standing on the ground at `(x, 0, z)`. The same inputs always give the same
 * tree.
 */
pub fn build_tree(x: f32, z: f32) -> Result<ContainerNode, ConstructionError> {
    let mut tree = ContainerNode::new(TREE, Instance::at(x, 0.0, z));

    let trunk = geometry::cylinder(0.3, 0.4, 4.0, 8)?;
    tree.add_child(Box::new(MeshNode::new(
        TRUNK,
        trunk,
        trunk_material(),
        Instance::at(0.0, 2.0, 0.0),
    )));

    for (radius, height, y) in FOLIAGE_LAYERS {
        let cone = geometry::cone(radius, height, 8)?;
        tree.add_child(Box::new(MeshNode::new(
            FOLIAGE,
            cone,
            foliage_material(),
            Instance::at(0.0, y, 0.0),
        )));
    }
    Ok(tree)
}

/// A rock of circumradius `size` resting at `(x, size / 2, z)` with an
/// orientation drawn from `rng`, each Euler angle uniform in `[0, π)`.
pub fn build_rock(x: f32, z: f32, size: f32, rng: &mut impl Rng) -> Result<MeshNode, ConstructionError> {
    let size = ensure_positive("rock size", size)?;
    let mesh = geometry::dodecahedron(size)?;
    let rotation = Instance::euler_xyz(
        rng.random_range(0.0..PI),
        rng.random_range(0.0..PI),
        rng.random_range(0.0..PI),
    );
    Ok(MeshNode::new(
        ROCK,
        mesh,
        rock_material(),
        Instance::at(x, size * 0.5, z).with_rotation(rotation),
    ))
}

/// Height of the ground wave at plane coordinates `(x, y)`.
pub fn ground_height(x: f32, y: f32, amplitude: f32) -> f32 {
    (x * GROUND_WAVE_FREQUENCY).sin() * (y * GROUND_WAVE_FREQUENCY).cos() * amplitude
}

/// The ground grid in its local XY plane, displaced by the wave and with
/// normals recomputed for the displaced surface.
pub fn ground_geometry(amplitude: f32) -> Result<MeshData, ConstructionError> {
    let mut mesh = geometry::plane(GROUND_SIZE, GROUND_SIZE, GROUND_SEGMENTS, GROUND_SEGMENTS)?;
    geometry::displace_z(&mut mesh, |x, y| ground_height(x, y, amplitude));
    geometry::compute_vertex_normals(&mut mesh);
    Ok(mesh)
}

/// The ground, laid flat by rotating its plane -90° about X.
pub fn build_ground() -> Result<MeshNode, ConstructionError> {
    let mesh = ground_geometry(GROUND_WAVE_AMPLITUDE)?;
    Ok(MeshNode::new(
        GROUND,
        mesh,
        ground_material(),
        Instance::new().with_rotation(Instance::euler_xyz(-FRAC_PI_2, 0.0, 0.0)),
    ))
}

pub fn build_pond() -> Result<MeshNode, ConstructionError> {
    let mesh = geometry::circle(5.0, 32)?;
    Ok(MeshNode::new(
        POND,
        mesh,
        pond_material(),
        Instance::at(-5.0, 0.1, 10.0).with_rotation(Instance::euler_xyz(-FRAC_PI_2, 0.0, 0.0)),
    ))
}

/// Blades are cones turned upside down; `sway` leans them about Z.
pub fn grass_blade_rotation(sway: f32) -> cgmath::Quaternion<f32> {
    Instance::euler_xyz(PI, 0.0, sway)
}

pub fn build_grass_blade(x: f32, z: f32) -> Result<MeshNode, ConstructionError> {
    let mesh = geometry::cone(0.05, 0.5, 3)?;
    Ok(MeshNode::new(
        GRASS_BLADE,
        mesh,
        grass_material(),
        Instance::at(x, 0.25, z).with_rotation(grass_blade_rotation(0.0)),
    ))
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use cgmath::{InnerSpace, Vector3};
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::data_structures::scene_graph::SceneNode;

    #[test]
    fn tree_is_a_trunk_and_three_cones() {
        let tree = build_tree(-10.0, -5.0).unwrap();
        let names: Vec<_> = tree.get_children().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, [TRUNK, FOLIAGE, FOLIAGE, FOLIAGE]);
        assert_eq!(tree.get_local_transform().position, Vector3::new(-10.0, 0.0, -5.0));

        let heights: Vec<f32> = tree.get_children()[1..]
            .iter()
            .map(|c| c.get_local_transform().position.y)
            .collect();
        assert!(heights.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn trees_are_deterministic() {
        let a = build_tree(3.0, 4.0).unwrap();
        let b = build_tree(3.0, 4.0).unwrap();
        for (x, y) in a.get_children().iter().zip(b.get_children()) {
            assert_eq!(x.drawable().map(|(m, _)| m), y.drawable().map(|(m, _)| m));
        }
    }

    #[test]
    fn rock_rests_on_half_its_size() {
        let mut rng = StdRng::seed_from_u64(7);
        let rock = build_rock(1.0, 2.0, 1.2, &mut rng).unwrap();
        let local = rock.get_local_transform();
        assert_abs_diff_eq!(local.position.y, 0.6);
        assert!(rock.material().cast_shadow && rock.material().receive_shadow);
    }

    #[test]
    fn rock_rejects_non_positive_size() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(
            build_rock(0.0, 0.0, 0.0, &mut rng).err(),
            Some(ConstructionError::NonPositiveDimension {
                what: "rock size",
                value: 0.0
            })
        );
        assert!(build_rock(0.0, 0.0, -1.0, &mut rng).is_err());
    }

    #[test]
    fn flat_ground_has_flat_normals() {
        let mesh = ground_geometry(0.0).unwrap();
        for v in &mesh.vertices {
            assert_abs_diff_eq!(v.position[2], 0.0);
            assert_abs_diff_eq!(v.normal[0], 0.0, epsilon = 1e-6);
            assert_abs_diff_eq!(v.normal[1], 0.0, epsilon = 1e-6);
            assert_abs_diff_eq!(v.normal[2], 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn ground_normals_follow_the_displaced_surface() {
        // A steep wave makes stale normals obvious.
        let amplitude = 3.0;
        let mesh = ground_geometry(amplitude).unwrap();
        let k = GROUND_WAVE_FREQUENCY;
        let half = GROUND_SIZE / 2.0;
        for v in &mesh.vertices {
            let [x, y, z] = v.position;
            assert_abs_diff_eq!(z, ground_height(x, y, amplitude), epsilon = 1e-5);
            if x.abs() >= half - 1e-3 || y.abs() >= half - 1e-3 {
                continue;
            }
            let dx = k * (x * k).cos() * (y * k).cos() * amplitude;
            let dy = -k * (x * k).sin() * (y * k).sin() * amplitude;
            let analytic = Vector3::new(-dx, -dy, 1.0).normalize();
            let computed = Vector3::from(v.normal);
            assert!(computed.z > 0.0, "inverted normal at ({x}, {y})");
            assert!(computed.dot(analytic) > 0.98, "normal at ({x}, {y}) is off");
        }
    }

    #[test]
    fn grass_blade_points_down_until_it_sways() {
        let blade = build_grass_blade(0.0, 0.0).unwrap();
        let apex = blade.get_local_transform().rotation * Vector3::new(0.0, 1.0, 0.0);
        assert_abs_diff_eq!(apex.y, -1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(blade.get_local_transform().position.y, 0.25);
    }
}
