//! Direction sampling and per-lane random streams.

use std::f32::consts::TAU;

use lumen_math::{Vec3, SQRT_OF_ONE_THIRD};
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use crate::gen_f32;

/// Cosine-weighted random direction in the hemisphere around `normal`.
///
/// The density is proportional to the cosine of the angle to `normal`,
/// so a Lambertian BRDF divided by the pdf is constant. `normal` must be
/// unit length. Consumes two draws from `rng`.
pub fn cosine_sample_hemisphere(normal: Vec3, rng: &mut dyn RngCore) -> Vec3 {
    let cos_theta = gen_f32(rng).sqrt();
    let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
    let phi = gen_f32(rng) * TAU;

    // Any unit vector has a component below 1/sqrt(3), so the cross
    // product with that axis never degenerates
    let axis = if normal.x.abs() < SQRT_OF_ONE_THIRD {
        Vec3::X
    } else if normal.y.abs() < SQRT_OF_ONE_THIRD {
        Vec3::Y
    } else {
        Vec3::Z
    };

    let tangent = normal.cross(axis).normalize();
    let bitangent = normal.cross(tangent).normalize();

    cos_theta * normal + phi.cos() * sin_theta * tangent + phi.sin() * sin_theta * bitangent
}

/// Thomas Wang style 32-bit integer hash.
pub fn utilhash(mut a: u32) -> u32 {
    a = a.wrapping_add(0x7ed5_5d16).wrapping_add(a << 12);
    a = (a ^ 0xc761_c23c) ^ (a >> 19);
    a = a.wrapping_add(0x1656_67b1).wrapping_add(a << 5);
    a = a.wrapping_add(0xd3a2_646c) ^ (a << 9);
    a = a.wrapping_add(0xfd70_46c5).wrapping_add(a << 3);
    a = (a ^ 0xb55a_4f09) ^ (a >> 16);
    a
}

/// Seed for one lane: hash of (iteration, bounce) xor hash of the pixel.
///
/// Only the low 32 bits of `pixel_index` take part.
pub fn lane_seed(pixel_index: usize, iteration: u32, bounce: u32) -> u32 {
    let stream = (1 << 31) | (bounce << 22) | iteration;
    utilhash(stream) ^ utilhash(pixel_index as u32)
}

/// Independent random stream for one lane of one bounce.
pub fn lane_rng(pixel_index: usize, iteration: u32, bounce: u32) -> SmallRng {
    SmallRng::seed_from_u64(u64::from(lane_seed(pixel_index, iteration, bounce)))
}

/// Uniform point in the unit disk (z = 0), by rejection.
pub(crate) fn random_in_unit_disk(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(gen_f32(rng) * 2.0 - 1.0, gen_f32(rng) * 2.0 - 1.0, 0.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

/// Uniform offset in `[-0.5, 0.5)^2` (z = 0).
pub(crate) fn sample_square(rng: &mut dyn RngCore) -> Vec3 {
    Vec3::new(gen_f32(rng) - 0.5, gen_f32(rng) - 0.5, 0.0)
}
