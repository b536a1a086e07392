//! Primitive geometry generators.
//!
//! All primitives are centred on the origin and wound counter-clockwise when
//! seen from outside. Cylinders and cones stand on the Y axis; planes and
//! circles lie in the XY plane facing +Z, the same way most scene-graph
//! libraries lay them out, so they are rotated into the ground plane by their
//! node transform.

use std::f32::consts::TAU;

use cgmath::{InnerSpace, Vector3};

use crate::{
    data_structures::model::{MeshData, ModelVertex},
    error::{ConstructionError, ensure_positive, ensure_segments},
};

/// A (possibly tapered) cylinder of `height` along Y with caps.
///
/// `radius_top` may be zero, which yields a cone without a top cap.
pub fn cylinder(
    radius_top: f32,
    radius_bottom: f32,
    height: f32,
    radial_segments: u32,
) -> Result<MeshData, ConstructionError> {
    if !(radius_top.is_finite() && radius_top >= 0.0) {
        return Err(ConstructionError::NonPositiveDimension {
            what: "cylinder top radius",
            value: radius_top,
        });
    }
    let radius_bottom = ensure_positive("cylinder bottom radius", radius_bottom)?;
    let height = ensure_positive("cylinder height", height)?;
    let segments = ensure_segments("cylinder", 3, radial_segments)?;

    let mut mesh = MeshData::default();
    let half_height = height / 2.0;
    let slope = (radius_bottom - radius_top) / height;

    // Side wall: a top ring and a bottom ring. The seam vertex is duplicated
    // so every column has its own pair.
    for row in 0..=1 {
        let v = row as f32;
        let radius = v * (radius_bottom - radius_top) + radius_top;
        let y = -v * height + half_height;
        for x in 0..=segments {
            let theta = x as f32 / segments as f32 * TAU;
            let (sin, cos) = theta.sin_cos();
            let normal = Vector3::new(sin, slope, cos).normalize();
            mesh.vertices.push(ModelVertex {
                position: [radius * sin, y, radius * cos],
                normal: normal.into(),
            });
        }
    }
    let stride = segments + 1;
    for x in 0..segments {
        let a = x;
        let b = stride + x;
        let c = stride + x + 1;
        let d = x + 1;
        // The upper triangle collapses onto the apex of a cone.
        if radius_top > 0.0 {
            mesh.indices.extend_from_slice(&[a, b, d]);
        }
        mesh.indices.extend_from_slice(&[b, c, d]);
    }

    if radius_top > 0.0 {
        cap(&mut mesh, true, radius_top, half_height, segments);
    }
    cap(&mut mesh, false, radius_bottom, -half_height, segments);

    Ok(mesh)
}

pub fn cone(radius: f32, height: f32, radial_segments: u32) -> Result<MeshData, ConstructionError> {
    let radius = ensure_positive("cone radius", radius)?;
    cylinder(0.0, radius, height, radial_segments)
}

fn cap(mesh: &mut MeshData, top: bool, radius: f32, y: f32, segments: u32) {
    let normal = if top { [0.0, 1.0, 0.0] } else { [0.0, -1.0, 0.0] };
    let center = mesh.vertices.len() as u32;
    mesh.vertices.push(ModelVertex {
        position: [0.0, y, 0.0],
        normal,
    });
    let ring = mesh.vertices.len() as u32;
    for x in 0..=segments {
        let theta = x as f32 / segments as f32 * TAU;
        let (sin, cos) = theta.sin_cos();
        mesh.vertices.push(ModelVertex {
            position: [radius * sin, y, radius * cos],
            normal,
        });
    }
    for x in 0..segments {
        let i = ring + x;
        if top {
            mesh.indices.extend_from_slice(&[center, i, i + 1]);
        } else {
            mesh.indices.extend_from_slice(&[center, i + 1, i]);
        }
    }
}

/// A regular dodecahedron with circumradius `radius`, flat shaded: each of
/// the twelve pentagons gets its own five vertices carrying the face normal.
pub fn dodecahedron(radius: f32) -> Result<MeshData, ConstructionError> {
    let radius = ensure_positive("dodecahedron radius", radius)?;
    let phi = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let inv = 1.0 / phi;

    let mut corners: Vec<Vector3<f32>> = Vec::with_capacity(20);
    for sx in [-1.0, 1.0] {
        for sy in [-1.0, 1.0] {
            for sz in [-1.0, 1.0] {
                corners.push(Vector3::new(sx, sy, sz));
            }
        }
    }
    for a in [-1.0, 1.0] {
        for b in [-1.0, 1.0] {
            corners.push(Vector3::new(0.0, a * inv, b * phi));
            corners.push(Vector3::new(a * inv, b * phi, 0.0));
            corners.push(Vector3::new(b * phi, 0.0, a * inv));
        }
    }
    let corners: Vec<Vector3<f32>> = corners.into_iter().map(|c| c.normalize() * radius).collect();

    // Face centres point at the vertices of the dual icosahedron.
    let mut face_dirs: Vec<Vector3<f32>> = Vec::with_capacity(12);
    for a in [-1.0, 1.0] {
        for b in [-1.0, 1.0] {
            face_dirs.push(Vector3::new(0.0, a * phi, b));
            face_dirs.push(Vector3::new(b, 0.0, a * phi));
            face_dirs.push(Vector3::new(a * phi, b, 0.0));
        }
    }

    let mut mesh = MeshData::default();
    for dir in face_dirs {
        let normal = dir.normalize();
        let nearest = corners
            .iter()
            .map(|c| c.dot(normal))
            .fold(f32::NEG_INFINITY, f32::max);
        let mut face: Vec<Vector3<f32>> = corners
            .iter()
            .copied()
            .filter(|c| (c.dot(normal) - nearest).abs() < 1e-4 * radius)
            .collect();
        debug_assert_eq!(face.len(), 5);

        // Order the pentagon counter-clockwise around its outward normal.
        let u = (face[0] - normal * face[0].dot(normal)).normalize();
        let w = normal.cross(u);
        face.sort_by(|p, q| {
            let angle = |v: &Vector3<f32>| v.dot(w).atan2(v.dot(u));
            angle(p).total_cmp(&angle(q))
        });

        let base = mesh.vertices.len() as u32;
        mesh.vertices.extend(face.iter().map(|p| ModelVertex {
            position: (*p).into(),
            normal: normal.into(),
        }));
        for i in 1..face.len() as u32 - 1 {
            mesh.indices.extend_from_slice(&[base, base + i, base + i + 1]);
        }
    }
    Ok(mesh)
}

/// A `width` × `height` grid in the XY plane facing +Z with
/// `width_segments` × `height_segments` cells. Rows run from +Y to -Y.
pub fn plane(
    width: f32,
    height: f32,
    width_segments: u32,
    height_segments: u32,
) -> Result<MeshData, ConstructionError> {
    let width = ensure_positive("plane width", width)?;
    let height = ensure_positive("plane height", height)?;
    let grid_x = ensure_segments("plane width", 1, width_segments)?;
    let grid_y = ensure_segments("plane height", 1, height_segments)?;

    let mut mesh = MeshData::default();
    let cell_w = width / grid_x as f32;
    let cell_h = height / grid_y as f32;
    for iy in 0..=grid_y {
        let y = height / 2.0 - iy as f32 * cell_h;
        for ix in 0..=grid_x {
            let x = ix as f32 * cell_w - width / 2.0;
            mesh.vertices.push(ModelVertex {
                position: [x, y, 0.0],
                normal: [0.0, 0.0, 1.0],
            });
        }
    }
    let stride = grid_x + 1;
    for iy in 0..grid_y {
        for ix in 0..grid_x {
            let a = ix + stride * iy;
            let b = ix + stride * (iy + 1);
            let c = ix + 1 + stride * (iy + 1);
            let d = ix + 1 + stride * iy;
            mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    Ok(mesh)
}

/// A filled disc in the XY plane facing +Z.
pub fn circle(radius: f32, segments: u32) -> Result<MeshData, ConstructionError> {
    let radius = ensure_positive("circle radius", radius)?;
    let segments = ensure_segments("circle", 3, segments)?;

    let mut mesh = MeshData::default();
    mesh.vertices.push(ModelVertex {
        position: [0.0, 0.0, 0.0],
        normal: [0.0, 0.0, 1.0],
    });
    for s in 0..=segments {
        let theta = s as f32 / segments as f32 * TAU;
        let (sin, cos) = theta.sin_cos();
        mesh.vertices.push(ModelVertex {
            position: [radius * cos, radius * sin, 0.0],
            normal: [0.0, 0.0, 1.0],
        });
    }
    for i in 1..=segments {
        mesh.indices.extend_from_slice(&[i, i + 1, 0]);
    }
    Ok(mesh)
}

/// Moves every vertex of an XY-plane mesh along Z by `height(x, y)`.
///
/// Normals are stale afterwards; call [`compute_vertex_normals`].
pub fn displace_z(mesh: &mut MeshData, height: impl Fn(f32, f32) -> f32) {
    for vertex in mesh.vertices.iter_mut() {
        let [x, y, _] = vertex.position;
        vertex.position[2] = height(x, y);
    }
}

/// Area-weighted smooth normals from the current triangle positions.
pub fn compute_vertex_normals(mesh: &mut MeshData) {
    let mut sums = vec![Vector3::new(0.0_f32, 0.0, 0.0); mesh.vertices.len()];
    for tri in mesh.indices.chunks_exact(3) {
        let a: Vector3<f32> = mesh.vertices[tri[0] as usize].position.into();
        let b: Vector3<f32> = mesh.vertices[tri[1] as usize].position.into();
        let c: Vector3<f32> = mesh.vertices[tri[2] as usize].position.into();
        // Unnormalized, so larger faces weigh more
        let face = (b - a).cross(c - a);
        for &i in tri {
            sums[i as usize] += face;
        }
    }
    for (vertex, sum) in mesh.vertices.iter_mut().zip(sums) {
        if sum.magnitude2() > 0.0 {
            vertex.normal = sum.normalize().into();
        }
    }
}
