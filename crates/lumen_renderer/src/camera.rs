//! Primary ray generation.

use lumen_core::Camera;
use lumen_math::Ray;

use crate::sampling::{lane_rng, random_in_unit_disk, sample_square};
use crate::PathSegment;

/// Build the first path segment for pixel `(x, y)` of one iteration.
///
/// The pixel position is jittered inside the pixel. With a positive
/// `lens_radius` the origin is moved on the lens disk and the ray aimed
/// at the point `focal_distance` along the pinhole ray (thin lens).
/// Draws from the bounce-0 stream of the pixel.
pub fn generate_path_segment(
    camera: &Camera,
    x: u32,
    y: u32,
    trace_depth: u32,
    iteration: u32,
) -> PathSegment {
    let pixel_index = x as usize + y as usize * camera.resolution.x as usize;
    let mut rng = lane_rng(pixel_index, iteration, 0);

    let jitter = sample_square(&mut rng);
    let px = x as f32 + jitter.x;
    let py = y as f32 + jitter.y;
    let half_width = camera.resolution.x as f32 * 0.5;
    let half_height = camera.resolution.y as f32 * 0.5;
    let up = camera.true_up();

    let direction = (camera.view
        - camera.right * camera.pixel_length.x * (px - half_width)
        - up * camera.pixel_length.y * (py - half_height))
        .normalize_or_zero();
    let mut ray = Ray::new(camera.position, direction);

    if camera.lens_radius > 0.0 {
        let focal_point = ray.at(camera.focal_distance);
        let lens = random_in_unit_disk(&mut rng) * camera.lens_radius;
        ray.origin = camera.position + camera.right * lens.x + up * lens.y;
        ray.direction = (focal_point - ray.origin).normalize_or_zero();
    }

    PathSegment::new(ray, pixel_index, trace_depth)
}
