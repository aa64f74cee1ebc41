//! Deterministic scalar fields: lattice hash, value noise, fbm and the
//! divergence-free curl of fbm.
//!
//! Everything here is a pure function of its arguments.

use bevy::math::Vec2;

const OCTAVES: usize = 5;
const BASE_AMPLITUDE: f32 = 0.55;
const CURL_EPSILON: f32 = 0.015;

/// Integer hash of a lattice point, mapped to `[0, 1)`.
pub fn hash(i: i32, j: i32) -> f32 {
    let mut h = (i as u32).wrapping_mul(0x27d4_eb2d) ^ (j as u32).wrapping_mul(0x1656_67b1);
    h = (h ^ (h >> 15)).wrapping_mul(0x85eb_ca6b);
    h = (h ^ (h >> 13)).wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    // Top 24 bits fit an f32 mantissa exactly, so the result never rounds up to 1.0
    (h >> 8) as f32 / 16_777_216.0
}

/// Quintic fade `6t^5 - 15t^4 + 10t^3`.
#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// Bilinearly interpolated lattice hash with quintic easing.
pub fn value_noise(x: f32, y: f32) -> f32 {
    let x0 = x.floor();
    let y0 = y.floor();
    let (i, j) = (x0 as i32, y0 as i32);
    let sx = fade(x - x0);
    let sy = fade(y - y0);

    let a = hash(i, j);
    let b = hash(i.wrapping_add(1), j);
    let c = hash(i, j.wrapping_add(1));
    let d = hash(i.wrapping_add(1), j.wrapping_add(1));

    let top = a + (b - a) * sx;
    let bottom = c + (d - c) * sx;
    top + (bottom - top) * sy
}

/// Fractal Brownian motion: five octaves of value noise, halving amplitude
/// and doubling frequency each octave.
pub fn fbm(x: f32, y: f32) -> f32 {
    let mut sum = 0.0;
    let mut amplitude = BASE_AMPLITUDE;
    let mut frequency = 1.0;
    for _ in 0..OCTAVES {
        sum += amplitude * value_noise(x * frequency, y * frequency);
        amplitude *= 0.5;
        frequency *= 2.0;
    }
    sum
}

/// Unit flow direction from the rotated gradient of [`fbm`].
///
/// Returns the zero vector where the gradient vanishes.
pub fn curl(x: f32, y: f32) -> Vec2 {
    let e = CURL_EPSILON;
    let dfdx = (fbm(x + e, y) - fbm(x - e, y)) / (2.0 * e);
    let dfdy = (fbm(x, y + e) - fbm(x, y - e)) / (2.0 * e);

    let flow = Vec2::new(dfdy, -dfdx);
    let magnitude = flow.length();
    let magnitude = if magnitude > f32::MIN_POSITIVE { magnitude } else { 1.0 };
    flow / magnitude
}
