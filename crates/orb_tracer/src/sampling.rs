//! Random sampling helpers.
//!
//! Every helper takes the generator explicitly so a seeded stream fully
//! determines the rendered image. The number of draws each helper makes is
//! part of its contract: changing it changes every image rendered after it.

use orb_math::Vec3;
use rand::{Rng, RngCore};

/// Uniform `f32` in `[0, 1)`. One draw.
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// Uniform `f32` in `[min, max)`. One draw.
#[inline]
pub fn gen_range_f32(rng: &mut dyn RngCore, min: f32, max: f32) -> f32 {
    min + (max - min) * gen_f32(rng)
}

/// Uniformly distributed unit vector.
///
/// Rejection samples the cube `[-1, 1)^3` until a point lands inside the unit
/// ball (and not too close to the origin to normalize), then projects it onto
/// the sphere. Each attempt draws x, y, z in that order.
pub fn random_unit_vector(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(
            gen_range_f32(rng, -1.0, 1.0),
            gen_range_f32(rng, -1.0, 1.0),
            gen_range_f32(rng, -1.0, 1.0),
        );
        let len_sq = p.length_squared();
        if 1e-6 < len_sq && len_sq <= 1.0 {
            return p / len_sq.sqrt();
        }
    }
}

/// Uniform point strictly inside the unit disk on the z = 0 plane.
///
/// Each attempt draws x then y.
pub fn random_in_unit_disk(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(
            gen_range_f32(rng, -1.0, 1.0),
            gen_range_f32(rng, -1.0, 1.0),
            0.0,
        );
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

/// Uniform offset in the square `[-0.5, 0.5)^2` on the z = 0 plane.
///
/// Two draws, x then y.
pub fn sample_square(rng: &mut dyn RngCore) -> Vec3 {
    let x = gen_f32(rng) - 0.5;
    let y = gen_f32(rng) - 0.5;
    Vec3::new(x, y, 0.0)
}
