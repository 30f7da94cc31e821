//! Lumen Renderer - per-bounce path tracing stages.
//!
//! The intersection stage and the accumulation loop live outside this
//! crate. What lives here is everything that runs per lane between them:
//!
//! - camera ray generation ([`generate_path_segment`])
//! - cosine-weighted hemisphere sampling ([`cosine_sample_hemisphere`])
//! - BSDF selection and path update ([`scatter_ray`])
//! - the data-parallel shading pass ([`shade_segments`]) and final gather
//!
//! Each lane owns a deterministic random stream from [`lane_rng`], so
//! the same (pixel, iteration, bounce) always replays the same path.

mod camera;
mod path;
mod sampling;
mod scatter;
mod shade;

pub use camera::generate_path_segment;
pub use path::PathSegment;
pub use sampling::{cosine_sample_hemisphere, lane_rng, lane_seed, utilhash};
pub use scatter::{scatter_ray, scatter_ray_with_config, ScatterConfig, WeightPolicy};
pub use shade::{final_gather, shade_segments, ShadeableIntersection};

/// Re-export Vec3 and common math types from lumen_math
pub use lumen_math::{Ray, Vec3};

/// Color type alias (RGB throughput, typically 0-1)
pub type Color = Vec3;

use rand::{Rng, RngCore};

/// Uniform float in `[0, 1)`.
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}
