//! Procedural Meshes
//!
//! Tessellated boxes in every exported topology, used as stand-in content
//! for the headless simulation and for tests.

use vantage_core::math::{Vec2, Vec3};

use crate::mesh::{Mesh, Topology, Vertex, VertexStream};

/// (normal, u axis, v axis) per face, with `u x v == normal`
const FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    (Vec3::X, Vec3::NEG_Z, Vec3::Y),
    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    (Vec3::Y, Vec3::X, Vec3::NEG_Z),
    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
];

/// Largest subdivision count whose vertices still fit 16-bit indices
pub const MAX_SUBDIVISIONS: u32 = 100;

/// Build a cube centred on the origin with `subdivisions` quads per face edge.
///
/// `subdivisions` is clamped to `1..=MAX_SUBDIVISIONS`. Strip topologies emit
/// one strip per row of quads.
pub fn tessellated_box(name: impl Into<String>, half_extent: f32, subdivisions: u32, topology: Topology) -> Mesh {
    let n = subdivisions.clamp(1, MAX_SUBDIVISIONS);
    let grid = grid_vertices(half_extent, n);
    let row = n + 1;
    let face_base = |face: u32| face * row * row;
    let at = |face: u32, i: u32, j: u32| (face_base(face) + j * row + i) as u16;

    match topology {
        Topology::IndexedList | Topology::List => {
            let mut indices = Vec::with_capacity((6 * n * n * 6) as usize);
            for face in 0..6 {
                for j in 0..n {
                    for i in 0..n {
                        let a = at(face, i, j);
                        let b = at(face, i + 1, j);
                        let c = at(face, i, j + 1);
                        let d = at(face, i + 1, j + 1);
                        indices.extend_from_slice(&[a, b, c, c, b, d]);
                    }
                }
            }
            if topology == Topology::IndexedList {
                Mesh::indexed_triangle_list(name, VertexStream::from_vertices(&grid), indices)
            } else {
                let expanded: Vec<Vertex> = indices.iter().map(|&i| grid[i as usize]).collect();
                Mesh::triangle_list(name, VertexStream::from_vertices(&expanded), (indices.len() / 3) as u32)
            }
        }
        Topology::IndexedStrips | Topology::Strips => {
            let mut indices = Vec::with_capacity((6 * n * 2 * row) as usize);
            let mut lengths = Vec::with_capacity((6 * n) as usize);
            for face in 0..6 {
                for j in 0..n {
                    for i in 0..row {
                        indices.push(at(face, i, j + 1));
                        indices.push(at(face, i, j));
                    }
                    lengths.push(2 * n);
                }
            }
            if topology == Topology::IndexedStrips {
                Mesh::triangle_strips(name, VertexStream::from_vertices(&grid), lengths, Some(indices))
            } else {
                let expanded: Vec<Vertex> = indices.iter().map(|&i| grid[i as usize]).collect();
                Mesh::triangle_strips(name, VertexStream::from_vertices(&expanded), lengths, None)
            }
        }
    }
}

fn grid_vertices(half_extent: f32, n: u32) -> Vec<Vertex> {
    let row = n + 1;
    let mut vertices = Vec::with_capacity((6 * row * row) as usize);
    for (normal, u_axis, v_axis) in FACES {
        for j in 0..row {
            for i in 0..row {
                let u = i as f32 / n as f32;
                let v = j as f32 / n as f32;
                let position =
                    (normal + u_axis * (u * 2.0 - 1.0) + v_axis * (v * 2.0 - 1.0)) * half_extent;
                vertices.push(Vertex {
                    position,
                    normal,
                    texcoord: Vec2::new(u, v),
                    tangent: u_axis,
                });
            }
        }
    }
    vertices
}
