//! Screen-Space Coverage
//!
//! Projects the 8 corners of an object-space box through the current MVP and
//! takes the 2D bounding rectangle of the results. The rectangle never
//! underestimates the true footprint of the box, but overestimates it once the
//! box is rotated.

use vantage_core::math::{BoundingBox, Mat4, project_to_ndc};
use vantage_core::ScreenExtent;

/// Projected footprint of a bounding box for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coverage {
    /// Rectangle around every corner that projected cleanly
    pub extent: Option<ScreenExtent>,
    /// Corners dropped because they sat on or behind the eye plane
    pub rejected_corners: u8,
}

impl Coverage {
    /// True when no corner could be projected
    pub fn is_degenerate(&self) -> bool {
        self.extent.is_none()
    }

    /// Covered area in NDC units
    pub fn area(&self) -> Option<f32> {
        self.extent.map(|e| e.area())
    }
}

/// Estimate the screen extent of `bounds` under `mvp`.
///
/// Corners with a clip-space `w <= 0` are excluded from the accumulation;
/// the min/max is seeded from the first corner that survives. Pure: the same
/// inputs always produce bit-identical output.
pub fn estimate_coverage(bounds: &BoundingBox, mvp: &Mat4) -> Coverage {
    let mut extent: Option<ScreenExtent> = None;
    let mut rejected_corners = 0u8;

    for corner in bounds.corners() {
        match project_to_ndc(*corner, mvp) {
            Some(point) => match extent.as_mut() {
                Some(extent) => extent.include(point),
                None => extent = Some(ScreenExtent::from_point(point)),
            },
            None => rejected_corners += 1,
        }
    }

    Coverage {
        extent,
        rejected_corners,
    }
}

/// Screen extent of `bounds` under `mvp`, or `None` if every corner is
/// degenerate
pub fn estimate_extent(bounds: &BoundingBox, mvp: &Mat4) -> Option<ScreenExtent> {
    estimate_coverage(bounds, mvp).extent
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_core::math::{Aabb, Vec2, Vec3, Vec4};

    fn camera_mvp(model: Mat4) -> Mat4 {
        let projection = Mat4::perspective_rh_gl(std::f32::consts::FRAC_PI_6, 1.0, 1.0, 1000.0);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        projection * view * model
    }

    fn unit_box() -> BoundingBox {
        BoundingBox::from_aabb(&Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0)))
    }

    #[test]
    fn test_identity_extent() {
        let extent = estimate_extent(&unit_box(), &Mat4::from_scale(Vec3::splat(0.5))).unwrap();
        assert_eq!(extent, ScreenExtent { min_x: -0.5, max_x: 0.5, min_y: -0.5, max_y: 0.5 });
        assert_eq!(extent.area(), 1.0);
    }

    #[test]
    fn test_matches_reference_enumeration() {
        let bounds = BoundingBox::from_aabb(&Aabb::new(Vec3::new(-1.0, -0.5, -2.0), Vec3::new(2.0, 1.0, 0.5)));
        for step in 0..24 {
            let angle = step as f32 * 0.27;
            let mvp = camera_mvp(Mat4::from_rotation_y(angle) * Mat4::from_rotation_x(angle * 0.5));

            let points: Vec<Vec2> = bounds
                .corners()
                .iter()
                .map(|c| {
                    let clip = mvp * *c;
                    assert!(clip.w > 0.0);
                    Vec2::new(clip.x / clip.w, clip.y / clip.w)
                })
                .collect();
            let min = points.iter().fold(Vec2::splat(f32::INFINITY), |a, p| a.min(*p));
            let max = points.iter().fold(Vec2::splat(f32::NEG_INFINITY), |a, p| a.max(*p));

            let extent = estimate_extent(&bounds, &mvp).unwrap();
            assert!((extent.min_x - min.x).abs() < 1e-6);
            assert!((extent.max_x - max.x).abs() < 1e-6);
            assert!((extent.min_y - min.y).abs() < 1e-6);
            assert!((extent.max_y - max.y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_extent_contains_every_projected_corner() {
        let bounds = unit_box();
        let mvp = camera_mvp(Mat4::from_rotation_y(0.7));
        let extent = estimate_extent(&bounds, &mvp).unwrap();
        for corner in bounds.corners() {
            assert!(extent.contains(project_to_ndc(*corner, &mvp).unwrap()));
        }
    }

    #[test]
    fn test_area_grows_with_scale() {
        let aabb = Aabb::new(Vec3::new(-0.5, -1.0, -0.25), Vec3::new(1.0, 0.5, 0.75));
        let mvp = camera_mvp(Mat4::from_rotation_y(0.4));

        let mut previous = estimate_coverage(&BoundingBox::from_aabb(&aabb), &mvp).area().unwrap();
        for k in [1.0f32, 1.25, 1.5, 2.0, 3.0] {
            let area = estimate_coverage(&BoundingBox::from_aabb(&aabb.scaled(k)), &mvp)
                .area()
                .unwrap();
            assert!(area >= previous, "area shrank at scale {k}");
            if k > 1.0 {
                assert!(area > previous, "area did not grow at scale {k}");
            }
            previous = area;
        }
    }

    #[test]
    fn test_idempotent() {
        let bounds = unit_box();
        let mvp = camera_mvp(Mat4::from_rotation_y(1.1) * Mat4::from_translation(Vec3::new(0.3, -0.2, 1.0)));
        let first = estimate_coverage(&bounds, &mvp);
        let second = estimate_coverage(&bounds, &mvp);
        let a = first.extent.unwrap();
        let b = second.extent.unwrap();
        assert_eq!(a.min_x.to_bits(), b.min_x.to_bits());
        assert_eq!(a.max_x.to_bits(), b.max_x.to_bits());
        assert_eq!(a.min_y.to_bits(), b.min_y.to_bits());
        assert_eq!(a.max_y.to_bits(), b.max_y.to_bits());
    }

    #[test]
    fn test_zero_w_corner_is_excluded() {
        let mut corners = *unit_box().corners();
        corners[3] = Vec4::new(5.0, 5.0, 0.0, 0.0);
        let bounds = BoundingBox::from_corners(corners);

        let coverage = estimate_coverage(&bounds, &Mat4::from_scale(Vec3::splat(0.5)));
        assert_eq!(coverage.rejected_corners, 1);

        let extent = coverage.extent.unwrap();
        for value in [extent.min_x, extent.max_x, extent.min_y, extent.max_y] {
            assert!(value.is_finite());
        }
        assert_eq!(extent.area(), 1.0);
    }

    #[test]
    fn test_all_corners_behind_eye() {
        // Box placed behind a camera at z = 10 looking down -Z.
        let mvp = camera_mvp(Mat4::from_translation(Vec3::new(0.0, 0.0, 20.0)));
        let coverage = estimate_coverage(&unit_box(), &mvp);
        assert!(coverage.is_degenerate());
        assert_eq!(coverage.rejected_corners, 8);
    }

    #[test]
    fn test_straddling_eye_plane() {
        let mvp = camera_mvp(Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0)));
        let coverage = estimate_coverage(&unit_box(), &mvp);
        assert_eq!(coverage.rejected_corners, 4);
        assert!(coverage.area().unwrap().is_finite());
    }
}
