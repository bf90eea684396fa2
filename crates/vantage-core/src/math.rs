//! Math utilities
//!
//! Re-exports from glam plus the bounding volume and screen-space types used
//! by the LOD decision.

pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Create an AABB from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB from center and half-extents
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the half-extents of the AABB
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Get the full size of the AABB
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Check if a point is inside the AABB
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Expand the AABB to include a point
    pub fn expand_to_include(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Scale the box uniformly around its own center
    pub fn scaled(&self, factor: f32) -> Aabb {
        Self::from_center_half_extents(self.center(), self.half_extents() * factor)
    }
}

/// Number of corners in a [`BoundingBox`]
pub const BOX_CORNERS: usize = 8;

/// Object-space box stored as its 8 homogeneous corners (w = 1).
///
/// Corner `i` takes the minimum on an axis when that axis bit is set
/// (`i & 1` for x, `i & 2` for y, `i & 4` for z) and the maximum otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    corners: [Vec4; BOX_CORNERS],
}

impl BoundingBox {
    /// Expand an AABB into its 8 corners
    pub fn from_aabb(aabb: &Aabb) -> Self {
        let corners = std::array::from_fn(|i| {
            Vec4::new(
                if i & 1 != 0 { aabb.min.x } else { aabb.max.x },
                if i & 2 != 0 { aabb.min.y } else { aabb.max.y },
                if i & 4 != 0 { aabb.min.z } else { aabb.max.z },
                1.0,
            )
        });
        Self { corners }
    }

    /// Build the box from raw corner values.
    ///
    /// Mostly useful for synthetic inputs; no axis alignment is enforced.
    pub fn from_corners(corners: [Vec4; BOX_CORNERS]) -> Self {
        Self { corners }
    }

    /// The 8 homogeneous corners
    pub fn corners(&self) -> &[Vec4; BOX_CORNERS] {
        &self.corners
    }

    /// Axis-aligned bounds of the corners
    pub fn aabb(&self) -> Aabb {
        let mut aabb = Aabb::new(self.corners[0].truncate(), self.corners[0].truncate());
        for corner in &self.corners[1..] {
            aabb.expand_to_include(corner.truncate());
        }
        aabb
    }
}

/// Project a homogeneous point to normalized device coordinates.
///
/// Returns `None` when the clip-space `w` is not strictly positive (the point
/// lies on or behind the eye plane) or when the divide produces a non-finite
/// value.
pub fn project_to_ndc(point: Vec4, mvp: &Mat4) -> Option<Vec2> {
    let clip = *mvp * point;
    // Written as a negated comparison so a NaN w is rejected as well.
    if !(clip.w > 0.0) {
        return None;
    }
    let rcp_w = clip.w.recip();
    let ndc = Vec2::new(clip.x * rcp_w, clip.y * rcp_w);
    ndc.is_finite().then_some(ndc)
}

/// Axis-aligned rectangle in normalized device coordinates.
///
/// Each NDC axis spans [-1, 1], so a rectangle covering the whole viewport
/// has an area of 4.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenExtent {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl ScreenExtent {
    /// Area of the full viewport in NDC units
    pub const FULL_SCREEN_AREA: f32 = 4.0;

    /// Degenerate extent containing a single point
    pub fn from_point(point: Vec2) -> Self {
        Self {
            min_x: point.x,
            max_x: point.x,
            min_y: point.y,
            max_y: point.y,
        }
    }

    /// Grow the extent to include a point
    pub fn include(&mut self, point: Vec2) {
        self.min_x = self.min_x.min(point.x);
        self.max_x = self.max_x.max(point.x);
        self.min_y = self.min_y.min(point.y);
        self.max_y = self.max_y.max(point.y);
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// Covered area in NDC units
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Check if a point lies inside the extent (inclusive)
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min_x && point.x <= self.max_x &&
        point.y >= self.min_y && point.y <= self.max_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_expand() {
        let mut aabb = Aabb::new(Vec3::splat(5.0), Vec3::splat(5.0));
        assert_eq!(aabb.size(), Vec3::ZERO);

        aabb.expand_to_include(Vec3::new(1.0, -2.0, 3.0));
        aabb.expand_to_include(Vec3::new(-1.0, 4.0, 7.0));
        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, 3.0));
        assert_eq!(aabb.max, Vec3::new(5.0, 5.0, 7.0));
    }

    #[test]
    fn test_aabb_scaled() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::splat(2.0)).scaled(2.0);
        assert_eq!(aabb.min, Vec3::splat(-1.0));
        assert_eq!(aabb.max, Vec3::splat(3.0));
    }

    #[test]
    fn test_corner_bit_pattern() {
        let aabb = Aabb::new(Vec3::new(-1.0, -2.0, -3.0), Vec3::new(1.0, 2.0, 3.0));
        let bbox = BoundingBox::from_aabb(&aabb);
        let corners = bbox.corners();

        assert_eq!(corners[0], Vec4::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(corners[1], Vec4::new(-1.0, 2.0, 3.0, 1.0));
        assert_eq!(corners[2], Vec4::new(1.0, -2.0, 3.0, 1.0));
        assert_eq!(corners[4], Vec4::new(1.0, 2.0, -3.0, 1.0));
        assert_eq!(corners[7], Vec4::new(-1.0, -2.0, -3.0, 1.0));
        assert!(corners.iter().all(|c| c.w == 1.0));
    }

    #[test]
    fn test_bounding_box_contains_all_points() {
        let points = [
            Vec3::new(0.3, 0.1, -0.2),
            Vec3::new(-4.0, 2.5, 1.0),
            Vec3::new(2.0, -1.0, 9.0),
        ];
        let mut bounds = Aabb::new(points[0], points[0]);
        points.iter().for_each(|p| bounds.expand_to_include(*p));
        let aabb = BoundingBox::from_aabb(&bounds).aabb();
        assert_eq!(aabb, bounds);
        for point in points {
            assert!(aabb.contains_point(point));
        }
    }

    #[test]
    fn test_project_identity() {
        let ndc = project_to_ndc(Vec4::new(0.5, -0.25, 0.0, 1.0), &Mat4::IDENTITY).unwrap();
        assert_eq!(ndc, Vec2::new(0.5, -0.25));
    }

    #[test]
    fn test_project_divides_by_w() {
        let ndc = project_to_ndc(Vec4::new(2.0, 4.0, 0.0, 2.0), &Mat4::IDENTITY).unwrap();
        assert_eq!(ndc, Vec2::new(1.0, 2.0));
    }

    #[test]
    fn test_project_rejects_non_positive_w() {
        assert!(project_to_ndc(Vec4::new(1.0, 1.0, 0.0, 0.0), &Mat4::IDENTITY).is_none());
        assert!(project_to_ndc(Vec4::new(1.0, 1.0, 0.0, -1.0), &Mat4::IDENTITY).is_none());
        assert!(project_to_ndc(Vec4::new(1.0, 1.0, 0.0, f32::NAN), &Mat4::IDENTITY).is_none());
    }

    #[test]
    fn test_screen_extent_area() {
        let mut extent = ScreenExtent::from_point(Vec2::new(-0.5, -0.25));
        extent.include(Vec2::new(0.5, 0.25));
        assert_eq!(extent.width(), 1.0);
        assert_eq!(extent.height(), 0.5);
        assert_eq!(extent.area(), 0.5);
        assert!(extent.contains(Vec2::ZERO));
        assert!(!extent.contains(Vec2::new(0.6, 0.0)));
    }
}
