use lumen_math::Ray;

use crate::Color;

/// One in-flight sample: a ray, its accumulated throughput and the
/// number of bounces it may still take.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSegment {
    pub ray: Ray,

    /// Multiplicative throughput accumulated along the path
    pub color: Color,

    /// Pixel this sample accumulates into
    pub pixel_index: usize,

    pub remaining_bounces: u32,
}

impl PathSegment {
    /// Create a fresh segment with unit throughput.
    pub fn new(ray: Ray, pixel_index: usize, bounces: u32) -> Self {
        Self {
            ray,
            color: Color::ONE,
            pixel_index,
            remaining_bounces: bounces,
        }
    }

    /// True once the bounce budget is spent.
    pub fn is_terminated(&self) -> bool {
        self.remaining_bounces == 0
    }

    /// End the path, keeping `color` as its final contribution.
    pub fn terminate(&mut self, color: Color) {
        self.color = color;
        self.remaining_bounces = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_math::Vec3;

    #[test]
    fn test_new_segment() {
        let segment = PathSegment::new(Ray::new(Vec3::ZERO, Vec3::X), 7, 3);
        assert_eq!(segment.color, Color::ONE);
        assert_eq!(segment.pixel_index, 7);
        assert!(!segment.is_terminated());
    }

    #[test]
    fn test_terminate() {
        let mut segment = PathSegment::new(Ray::default(), 0, 5);
        segment.terminate(Color::ZERO);
        assert!(segment.is_terminated());
        assert_eq!(segment.color, Color::ZERO);
    }
}
