//! Per-bounce BSDF selection.
//!
//! One uniform draw picks a branch by cumulative weight, with fixed
//! precedence mirror, then transmission, then diffuse:
//!
//! | branch     | direction                        | throughput                      |
//! |------------|----------------------------------|---------------------------------|
//! | mirror     | reflect about the normal         | specular * base * reflective    |
//! | transmit   | Snell refraction, TIR -> mirror  | specular                        |
//! | diffuse    | cosine-weighted hemisphere       | base                            |
//!
//! Fresnel blending between reflection and transmission is not modelled.

use lumen_core::Material;
use lumen_math::Vec3;
use rand::RngCore;

use crate::sampling::cosine_sample_hemisphere;
use crate::{gen_f32, PathSegment};

/// How the reflective and refractive weights of a material are
/// interpreted before branch selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WeightPolicy {
    /// Use the weights as written. A sum above 1 starves the diffuse
    /// branch and a weight above 1 brightens the mirror branch.
    #[default]
    AsAuthored,
    /// Clamp reflective to [0, 1] and refractive to what remains.
    Clamp,
    /// Scale both down proportionally when their sum exceeds 1.
    Renormalize,
}

impl WeightPolicy {
    /// Effective `(reflective, refractive)` weights.
    pub fn resolve(self, reflective: f32, refractive: f32) -> (f32, f32) {
        match self {
            Self::AsAuthored => (reflective, refractive),
            Self::Clamp => {
                let reflective = reflective.clamp(0.0, 1.0);
                (reflective, refractive.clamp(0.0, 1.0 - reflective))
            }
            Self::Renormalize => {
                let reflective = reflective.max(0.0);
                let refractive = refractive.max(0.0);
                let sum = reflective + refractive;
                if sum > 1.0 {
                    (reflective / sum, refractive / sum)
                } else {
                    (reflective, refractive)
                }
            }
        }
    }
}

/// Scattering configuration.
#[derive(Debug, Clone)]
pub struct ScatterConfig {
    /// Distance the new origin is pushed along the new direction
    pub origin_offset: f32,
    pub weight_policy: WeightPolicy,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            origin_offset: 0.001,
            weight_policy: WeightPolicy::AsAuthored,
        }
    }
}

/// Scatter `segment` off a surface with the default configuration.
///
/// See [`scatter_ray_with_config`].
pub fn scatter_ray(
    segment: &mut PathSegment,
    point: Vec3,
    normal: Vec3,
    material: &Material,
    rng: &mut dyn RngCore,
) {
    scatter_ray_with_config(segment, point, normal, material, rng, &ScatterConfig::default());
}

/// Pick a BSDF branch and update `segment` in place.
///
/// `point` and `normal` are the world-space hit point and unit normal.
/// The new ray starts at `point` offset along the new direction, the
/// throughput is multiplied by the branch color and one bounce is spent.
/// A segment with no bounces left is not touched.
pub fn scatter_ray_with_config(
    segment: &mut PathSegment,
    point: Vec3,
    normal: Vec3,
    material: &Material,
    rng: &mut dyn RngCore,
    config: &ScatterConfig,
) {
    if segment.remaining_bounces == 0 {
        return;
    }

    let (reflective, refractive) = config
        .weight_policy
        .resolve(material.reflective, material.refractive);
    let incoming = segment.ray.direction.normalize_or_zero();
    let r = gen_f32(rng);

    let (direction, multiplier) = if r <= reflective {
        (
            reflect(incoming, normal),
            material.specular_color * material.base_color * reflective,
        )
    } else if r <= reflective + refractive {
        (transmit(incoming, normal, material.ior), material.specular_color)
    } else {
        (cosine_sample_hemisphere(normal, rng), material.base_color)
    };

    let direction = direction.normalize_or_zero();
    segment.ray.origin = point + config.origin_offset * direction;
    segment.ray.direction = direction;
    segment.color *= multiplier;
    segment.remaining_bounces -= 1;
}

/// Refract through the surface, or mirror on total internal reflection.
///
/// A direction along the normal is leaving the medium.
fn transmit(incoming: Vec3, normal: Vec3, ior: f32) -> Vec3 {
    if ior <= 0.0 {
        return reflect(incoming, normal);
    }

    let cos_i = incoming.dot(normal);
    let (eta, facing) = if cos_i > 0.0 {
        (ior, -normal)
    } else {
        (1.0 / ior, normal)
    };

    let sin_t = eta * (1.0 - cos_i * cos_i).max(0.0).sqrt();
    if sin_t > 1.0 {
        reflect(incoming, facing)
    } else {
        refract(incoming, facing, eta)
    }
}

/// Reflect a vector about a normal.
#[inline]
fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract `v` through a normal facing against it, `eta` = n_i / n_t.
#[inline]
fn refract(v: Vec3, n: Vec3, eta: f32) -> Vec3 {
    let cos_i = n.dot(v);
    let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
    if k < 0.0 {
        return Vec3::ZERO;
    }
    eta * v - (eta * cos_i + k.sqrt()) * n
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_math::Ray;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Returns the same word forever, pinning the branch draw.
    struct FixedRng(u32);

    impl RngCore for FixedRng {
        fn next_u32(&mut self) -> u32 {
            self.0
        }

        fn next_u64(&mut self) -> u64 {
            u64::from(self.0)
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    fn segment(direction: Vec3, bounces: u32) -> PathSegment {
        PathSegment::new(Ray::new(Vec3::new(0.0, 1.0, 0.0), direction), 0, bounces)
    }

    fn material(reflective: f32, refractive: f32, ior: f32) -> Material {
        Material {
            base_color: Vec3::new(0.8, 0.5, 0.2),
            specular_color: Vec3::new(0.9, 0.9, 0.5),
            reflective,
            refractive,
            ior,
            ..Default::default()
        }
    }

    fn assert_vec_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-5, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_pure_mirror() {
        let mut rng = StdRng::seed_from_u64(42);
        let mirror = material(1.0, 0.0, 0.0);

        for _ in 0..200 {
            let mut seg = segment(Vec3::new(1.0, -1.0, 0.0), 4);
            scatter_ray(&mut seg, Vec3::ZERO, Vec3::Y, &mirror, &mut rng);

            let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
            assert_vec_close(seg.ray.direction, expected);
            assert_vec_close(seg.ray.origin, 0.001 * expected);
            assert_vec_close(seg.color, mirror.specular_color * mirror.base_color);
            assert_eq!(seg.remaining_bounces, 3);
        }
    }

    #[test]
    fn test_pure_diffuse_stays_in_hemisphere() {
        let mut rng = StdRng::seed_from_u64(42);
        let diffuse = material(0.0, 0.0, 0.0);
        let normal = Vec3::new(0.0, 0.6, 0.8);

        for _ in 0..1000 {
            let mut seg = segment(-normal, 1);
            scatter_ray(&mut seg, Vec3::ZERO, normal, &diffuse, &mut rng);

            assert!(seg.ray.direction.dot(normal) >= -1e-6);
            assert_vec_close(seg.color, diffuse.base_color);
        }
    }

    #[test]
    fn test_bounce_budget_then_noop() {
        let mut rng = StdRng::seed_from_u64(42);
        let diffuse = material(0.0, 0.0, 0.0);
        let n = 5;
        let mut seg = segment(Vec3::NEG_Y, n);

        for _ in 0..n {
            assert!(!seg.is_terminated());
            scatter_ray(&mut seg, Vec3::ZERO, Vec3::Y, &diffuse, &mut rng);
        }
        assert_eq!(seg.remaining_bounces, 0);

        let before = seg;
        scatter_ray(&mut seg, Vec3::new(5.0, 5.0, 5.0), Vec3::Y, &diffuse, &mut rng);
        assert_eq!(seg, before);
    }

    #[test]
    fn test_total_internal_reflection_falls_back_to_mirror() {
        let mut rng = StdRng::seed_from_u64(42);
        let glass = material(0.0, 1.0, 1.5);
        // Leaving the medium at a grazing angle
        let incoming = Vec3::new(1.0, 0.2, 0.0);

        let mut seg = segment(incoming, 2);
        scatter_ray(&mut seg, Vec3::ZERO, Vec3::Y, &glass, &mut rng);

        assert_vec_close(seg.ray.direction, Vec3::new(1.0, -0.2, 0.0).normalize());
        assert_vec_close(seg.color, glass.specular_color);
    }

    #[test]
    fn test_refraction_entering() {
        let mut rng = StdRng::seed_from_u64(42);
        let glass = material(0.0, 1.0, 1.5);

        // Head-on passes straight through
        let mut seg = segment(Vec3::NEG_Y, 2);
        scatter_ray(&mut seg, Vec3::ZERO, Vec3::Y, &glass, &mut rng);
        assert_vec_close(seg.ray.direction, Vec3::NEG_Y);

        // Oblique bends toward the normal by Snell's law
        let incoming = Vec3::new(1.0, -1.0, 0.0).normalize();
        let mut seg = segment(incoming, 2);
        scatter_ray(&mut seg, Vec3::ZERO, Vec3::Y, &glass, &mut rng);

        let sin_t = incoming.x / 1.5;
        assert!((seg.ray.direction.x - sin_t).abs() < 1e-5);
        assert!(seg.ray.direction.y < 0.0);
        assert!((seg.ray.direction.length() - 1.0).abs() < 1e-5);
        assert_vec_close(seg.color, glass.specular_color);
    }

    #[test]
    fn test_refraction_exiting() {
        let mut rng = StdRng::seed_from_u64(42);
        let glass = material(0.0, 1.0, 1.5);
        let incoming = Vec3::new(0.3, 1.0, 0.0).normalize();

        let mut seg = segment(incoming, 2);
        scatter_ray(&mut seg, Vec3::ZERO, Vec3::Y, &glass, &mut rng);

        // Bends away from the normal on the way out
        assert!((seg.ray.direction.x - incoming.x * 1.5).abs() < 1e-5);
        assert!(seg.ray.direction.y > 0.0);
    }

    #[test]
    fn test_mixed_branches_use_their_own_throughput() {
        let mut rng = StdRng::seed_from_u64(42);
        let half = material(0.5, 0.0, 0.0);
        let mirror_color = half.specular_color * half.base_color * 0.5;
        let (mut mirrors, mut diffuse) = (0, 0);

        for _ in 0..500 {
            let mut seg = segment(Vec3::new(1.0, -1.0, 0.0), 1);
            scatter_ray(&mut seg, Vec3::ZERO, Vec3::Y, &half, &mut rng);

            if (seg.color - mirror_color).length() < 1e-6 {
                mirrors += 1;
                assert_vec_close(seg.ray.direction, Vec3::new(1.0, 1.0, 0.0).normalize());
            } else {
                diffuse += 1;
                assert_vec_close(seg.color, half.base_color);
            }
        }
        assert!(mirrors > 150 && diffuse > 150, "{} / {}", mirrors, diffuse);
    }

    #[test]
    fn test_custom_origin_offset() {
        let mut rng = StdRng::seed_from_u64(42);
        let config = ScatterConfig {
            origin_offset: 0.5,
            ..Default::default()
        };
        let mut seg = segment(Vec3::new(1.0, -1.0, 0.0), 1);
        scatter_ray_with_config(
            &mut seg,
            Vec3::ONE,
            Vec3::Y,
            &material(1.0, 0.0, 0.0),
            &mut rng,
            &config,
        );

        assert_vec_close(seg.ray.origin, Vec3::ONE + 0.5 * Vec3::new(1.0, 1.0, 0.0).normalize());
    }

    #[test]
    fn test_draw_equal_to_weight_takes_that_branch() {
        // 0x8000_0000 draws exactly 0.5
        let mut rng = FixedRng(0x8000_0000);
        assert_eq!(crate::gen_f32(&mut rng), 0.5);

        let half_mirror = material(0.5, 0.0, 0.0);
        let mut seg = segment(Vec3::new(1.0, -1.0, 0.0), 1);
        scatter_ray(&mut seg, Vec3::ZERO, Vec3::Y, &half_mirror, &mut rng);
        assert_vec_close(seg.ray.direction, Vec3::new(1.0, 1.0, 0.0).normalize());
        assert_vec_close(seg.color, half_mirror.specular_color * half_mirror.base_color * 0.5);

        let split = material(0.25, 0.25, 1.5);
        let mut seg = segment(Vec3::NEG_Y, 1);
        scatter_ray(&mut seg, Vec3::ZERO, Vec3::Y, &split, &mut rng);
        assert_vec_close(seg.ray.direction, Vec3::NEG_Y);
        assert_vec_close(seg.color, split.specular_color);
    }

    #[test]
    fn test_weight_policies() {
        assert_eq!(WeightPolicy::AsAuthored.resolve(0.8, 0.6), (0.8, 0.6));

        let (refl, refr) = WeightPolicy::Clamp.resolve(0.8, 0.6);
        assert!((refl - 0.8).abs() < 1e-6 && (refr - 0.2).abs() < 1e-6);
        assert_eq!(WeightPolicy::Clamp.resolve(1.5, 0.5), (1.0, 0.0));

        let (refl, refr) = WeightPolicy::Renormalize.resolve(0.8, 0.6);
        assert!((refl + refr - 1.0).abs() < 1e-6);
        assert!((refl / refr - 0.8 / 0.6).abs() < 1e-5);
        assert_eq!(WeightPolicy::Renormalize.resolve(0.2, 0.3), (0.2, 0.3));
    }

    #[test]
    fn test_clamp_policy_caps_mirror_throughput() {
        let mut rng = StdRng::seed_from_u64(42);
        let hot = material(2.0, 0.0, 0.0);
        let config = ScatterConfig {
            weight_policy: WeightPolicy::Clamp,
            ..Default::default()
        };

        let mut seg = segment(Vec3::NEG_Y, 1);
        scatter_ray_with_config(&mut seg, Vec3::ZERO, Vec3::Y, &hot, &mut rng, &config);
        assert_vec_close(seg.color, hot.specular_color * hot.base_color);
    }
}
