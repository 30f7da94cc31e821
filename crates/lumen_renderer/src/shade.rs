//! Data-parallel shading pass and final gather.
//!
//! One lane per path segment. Lanes share only the read-only material
//! table; each draws from its own [`lane_rng`] stream.

use lumen_core::Material;
use lumen_math::Vec3;
use rayon::prelude::*;

use crate::sampling::lane_rng;
use crate::scatter::{scatter_ray_with_config, ScatterConfig};
use crate::{Color, PathSegment};

/// What the intersection stage reports for one segment.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShadeableIntersection {
    /// Ray parameter of the hit; zero or negative means no hit
    pub t: f32,

    /// World-space unit normal at the hit
    pub surface_normal: Vec3,

    pub material_id: usize,
}

impl ShadeableIntersection {
    /// A result for a ray that left the scene.
    pub fn miss() -> Self {
        Self {
            t: -1.0,
            ..Default::default()
        }
    }

    pub fn is_hit(&self) -> bool {
        self.t > 0.0
    }
}

/// Shade every live segment against its intersection.
///
/// `depth` is the 1-based bounce number; bounce 0 is reserved for camera
/// ray generation so the streams never overlap. Per lane:
/// - miss: the path ends black
/// - emissive material: throughput picks up `base_color * emittance` and
///   the path ends
/// - material id past the end of `materials`: the path ends black
/// - otherwise the segment scatters at the hit point
///
/// Segments that are already terminated are left alone.
pub fn shade_segments(
    segments: &mut [PathSegment],
    intersections: &[ShadeableIntersection],
    materials: &[Material],
    iteration: u32,
    depth: u32,
    config: &ScatterConfig,
) {
    debug_assert_eq!(segments.len(), intersections.len());
    log::debug!(
        "Shading {} segment(s), iteration {} bounce {}",
        segments.len(),
        iteration,
        depth
    );

    segments
        .par_iter_mut()
        .zip(intersections.par_iter())
        .for_each(|(segment, hit)| {
            shade_segment(segment, hit, materials, iteration, depth, config)
        });
}

fn shade_segment(
    segment: &mut PathSegment,
    hit: &ShadeableIntersection,
    materials: &[Material],
    iteration: u32,
    depth: u32,
    config: &ScatterConfig,
) {
    if segment.is_terminated() {
        return;
    }
    if !hit.is_hit() {
        segment.terminate(Color::ZERO);
        return;
    }

    let Some(material) = materials.get(hit.material_id) else {
        log::trace!(
            "Pixel {} hit unknown material {}",
            segment.pixel_index,
            hit.material_id
        );
        segment.terminate(Color::ZERO);
        return;
    };

    if material.is_emissive() {
        let color = segment.color * material.base_color * material.emittance;
        segment.terminate(color);
        return;
    }

    let mut rng = lane_rng(segment.pixel_index, iteration, depth);
    let point = segment.ray.at(hit.t);
    scatter_ray_with_config(segment, point, hit.surface_normal, material, &mut rng, config);
}

/// Add each segment's color into its pixel.
///
/// Segments pointing past the end of `image` are dropped.
pub fn final_gather(image: &mut [Color], segments: &[PathSegment]) {
    let mut dropped = 0usize;
    for segment in segments {
        match image.get_mut(segment.pixel_index) {
            Some(pixel) => *pixel += segment.color,
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        log::warn!("Dropped {} segment(s) outside the {}-pixel image", dropped, image.len());
    }
}
