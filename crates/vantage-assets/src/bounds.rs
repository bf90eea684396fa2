//! Bounding Volume Extraction
//!
//! Derives the 8-corner object-space box of a reference mesh once, when the
//! mesh is loaded.

use vantage_core::math::{Aabb, BoundingBox};

use crate::mesh::PositionSource;
use crate::{AssetError, AssetResult};

/// Compute the bounding box of every position in `source`.
///
/// Single pass over the vertices with the running min/max seeded from vertex
/// 0. Fails with [`AssetError::InvalidMesh`] when the source has no vertices,
/// its data is shorter than the declared vertex count, or a position cannot be
/// read.
pub fn extract_bounding_box<S: PositionSource>(name: &str, source: &S) -> AssetResult<BoundingBox> {
    let count = source.vertex_count();
    if count == 0 {
        return Err(AssetError::InvalidMesh {
            mesh: name.to_string(),
            reason: "mesh has no vertices".to_string(),
        });
    }

    if !source.is_complete() {
        return Err(AssetError::InvalidMesh {
            mesh: name.to_string(),
            reason: format!("vertex data shorter than {count} vertices"),
        });
    }

    let unreadable = |index: usize| AssetError::InvalidMesh {
        mesh: name.to_string(),
        reason: format!("position attribute missing or truncated at vertex {index}"),
    };

    let first = source.position_at(0).ok_or_else(|| unreadable(0))?;
    let mut aabb = Aabb::new(first, first);
    for index in 1..count {
        let position = source.position_at(index).ok_or_else(|| unreadable(index))?;
        aabb.expand_to_include(position);
    }

    log::debug!(
        "Bounding box for '{}' over {} vertices: min {:?} max {:?}",
        name,
        count,
        aabb.min,
        aabb.max
    );

    Ok(BoundingBox::from_aabb(&aabb))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{VertexLayout, VertexStream};
    use vantage_core::math::{Vec3, Vec4};

    #[test]
    fn test_extract_box() {
        let stream = VertexStream::from_positions(&[
            Vec3::new(-2.0, 0.0, 1.0),
            Vec3::new(3.0, -1.0, 0.0),
            Vec3::new(0.0, 4.0, -5.0),
        ]);
        let bbox = extract_bounding_box("mesh", &stream).unwrap();
        let aabb = bbox.aabb();

        assert_eq!(aabb.min, Vec3::new(-2.0, -1.0, -5.0));
        assert_eq!(aabb.max, Vec3::new(3.0, 4.0, 1.0));
        assert_eq!(bbox.corners()[0], Vec4::new(3.0, 4.0, 1.0, 1.0));
        assert_eq!(bbox.corners()[7], Vec4::new(-2.0, -1.0, -5.0, 1.0));
    }

    #[test]
    fn test_box_contains_every_vertex() {
        let positions: Vec<Vec3> = (0..50)
            .map(|i| {
                let t = i as f32 * 0.37;
                Vec3::new(t.sin() * 10.0, t.cos() * 3.0, (t * 0.5).sin() * 7.0)
            })
            .collect();
        let stream = VertexStream::from_positions(&positions);
        let aabb = extract_bounding_box("wave", &stream).unwrap().aabb();
        assert!(positions.iter().all(|p| aabb.contains_point(*p)));
    }

    #[test]
    fn test_zero_vertices() {
        let stream = VertexStream::from_positions(&[]);
        let err = extract_bounding_box("empty", &stream).unwrap_err();
        assert!(matches!(err, AssetError::InvalidMesh { .. }));
        assert!(err.to_string().contains("no vertices"));
    }

    #[test]
    fn test_missing_position_attribute() {
        let mut layout = VertexLayout::interleaved();
        layout.position = None;
        let stream = VertexStream::new(vec![0; 44], layout, 1);
        let err = extract_bounding_box("no-position", &stream).unwrap_err();
        assert!(matches!(err, AssetError::InvalidMesh { .. }));
    }

    #[test]
    fn test_truncated_interleaved_stream() {
        // One full position but not a whole 44-byte vertex.
        let stream = VertexStream::new(vec![0; 12], VertexLayout::interleaved(), 1);
        assert!(stream.position_at(0).is_some());
        let err = extract_bounding_box("truncated", &stream).unwrap_err();
        assert!(matches!(err, AssetError::InvalidMesh { .. }));
        assert!(err.to_string().contains("shorter"));
    }
}
