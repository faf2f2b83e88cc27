//! Bounding boxes and frustum culling
//!
//! Planes are extracted from a combined clip-from-world matrix with the
//! Gribb-Hartmann row combinations. Clip depth is [0, 1], so the near plane is
//! row 2 alone. Boxes are tested conservatively: a box is rejected only when
//! its most positive corner lies behind some plane.

use crate::foundation::math::{Mat4, Vec3, Vec4};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Default for BBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BBox {
    /// Create a box from its corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// The empty box (min > max); enclosing any point makes it non-empty
    pub fn empty() -> Self {
        Self {
            min: Vec3::repeat(f32::INFINITY),
            max: Vec3::repeat(f32::NEG_INFINITY),
        }
    }

    /// Smallest box containing all points
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut bbox = Self::empty();
        for point in points {
            bbox.enclose(point);
        }
        bbox
    }

    /// Whether min > max on any axis
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow to contain a point
    pub fn enclose(&mut self, point: &Vec3) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Get the center of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// The eight corners
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Axis-aligned box around the transformed corners.
    ///
    /// Conservative: the result contains the transformed box but may be larger.
    pub fn transform(&self, matrix: &Mat4) -> Self {
        if self.is_empty() {
            return *self;
        }
        let mut out = Self::empty();
        for corner in self.corners() {
            out.enclose(&matrix.transform_point(&corner.into()).coords);
        }
        out
    }
}

/// Plane defined by normal and distance from origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal pointing into the kept half-space
    pub normal: Vec3,
    /// Signed offset
    pub distance: f32,
}

impl Plane {
    /// Plane from `(a, b, c, d)` coefficients, normalized so `|(a, b, c)| == 1`
    pub fn from_coefficients(coefficients: Vec4) -> Self {
        let normal = coefficients.xyz();
        let length = normal.norm();
        if length > 0.0 {
            Self {
                normal: normal / length,
                distance: coefficients.w / length,
            }
        } else {
            Self { normal, distance: coefficients.w }
        }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: &Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

/// Six clip planes: left, right, bottom, top, near, far
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Planes with normals pointing inward
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extract the frustum of a clip-from-world matrix
    pub fn from_matrix(clip_from_world: &Mat4) -> Self {
        let row = |i: usize| -> Vec4 { clip_from_world.row(i).transpose() };
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        Self {
            planes: [
                Plane::from_coefficients(r3 + r0),
                Plane::from_coefficients(r3 - r0),
                Plane::from_coefficients(r3 + r1),
                Plane::from_coefficients(r3 - r1),
                Plane::from_coefficients(r2),
                Plane::from_coefficients(r3 - r2),
            ],
        }
    }

    /// Whether the box lies entirely outside at least one plane.
    ///
    /// Empty boxes are never reported outside.
    pub fn is_outside(&self, bbox: &BBox) -> bool {
        if bbox.is_empty() {
            return false;
        }
        self.planes.iter().any(|plane| {
            let corner = Vec3::new(
                if plane.normal.x > 0.0 { bbox.max.x } else { bbox.min.x },
                if plane.normal.y > 0.0 { bbox.max.y } else { bbox.min.y },
                if plane.normal.z > 0.0 { bbox.max.z } else { bbox.min.z },
            );
            plane.distance_to_point(&corner) < 0.0
        })
    }
}
