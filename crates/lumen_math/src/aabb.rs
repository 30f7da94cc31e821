use crate::{Interval, Vec3};

/// Axis-aligned bounding box, stored as one interval per axis.
///
/// Mesh geoms carry one of these in object space so the intersection
/// stage can reject rays before walking the triangle list.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// Minimum corner. Infinite while the box is empty.
    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    /// Maximum corner. Negative infinite while the box is empty.
    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    /// True until at least one point has been added.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty() || self.z.is_empty()
    }

    /// Extend the box in place so it encloses `point`.
    pub fn grow(&mut self, point: Vec3) {
        self.x.grow(point.x);
        self.y.grow(point.y);
        self.z.grow(point.z);
    }

    /// The `+inf / -inf` sentinel box. Contains nothing.
    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_empty_sentinels() {
        let aabb = Aabb::default();

        assert!(aabb.is_empty());
        assert_eq!(aabb.min(), Vec3::splat(f32::INFINITY));
        assert_eq!(aabb.max(), Vec3::splat(f32::NEG_INFINITY));
    }

    #[test]
    fn test_aabb_grow_is_exact() {
        let mut aabb = Aabb::EMPTY;
        aabb.grow(Vec3::new(2.0, -1.0, 0.5));
        aabb.grow(Vec3::new(-1.0, 2.0, 2.0));
        aabb.grow(Vec3::new(0.0, 0.0, -1.0));

        // No padding: the box is exactly the extent of the points
        assert_eq!(aabb.min(), Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(aabb.max(), Vec3::new(2.0, 2.0, 2.0));
        assert!(!aabb.is_empty());
    }
}
