//! Organic road perturbation
//!
//! Interior roads are pushed off their baseline by a smooth sinusoidal term plus
//! a seeded jitter, scaled by a center factor that is zero at the district edge.
//! The offset is clamped so neighbouring roads can never cross or merge.

use std::f64::consts::TAU;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::Axis;
use crate::seeds::{hash_indices, unit_f64};

/// Share of the clearance (`block_size / 2 - road_width`) a road may use
const AMPLITUDE_CLAMP: f64 = 0.9;

/// Radians per road index for the smooth term
const WAVE_FREQUENCY: f64 = 1.3;

/// Weights of the smooth and jitter terms (sum to 1)
const SMOOTH_WEIGHT: f64 = 0.65;
const JITTER_WEIGHT: f64 = 0.35;

/// Upper bound of the multiplicative rendered-width jitter
const MAX_WIDTH_JITTER: f64 = 0.10;

/// Offset and width limits derived from the block and road sizes
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrganicBounds {
    /// Largest absolute offset a road may receive
    pub max_offset: f64,
    /// Largest relative deviation of a rendered road width
    pub width_jitter: f64,
}

impl OrganicBounds {
    pub fn new(block_size: f64, road_width: f64) -> Self {
        let clearance = (block_size / 2.0 - road_width).max(0.0);
        let max_offset = AMPLITUDE_CLAMP * clearance;
        // Room left between two roads pushed towards each other at full offset
        let headroom = block_size - 2.0 * max_offset - road_width;
        let width_jitter = MAX_WIDTH_JITTER.min(0.45 * headroom / road_width).max(0.0);
        Self {
            max_offset,
            width_jitter,
        }
    }
}

/// 1 at the middle road of an axis, falling linearly to 0 at both boundary roads
pub fn center_factor(k: usize, blocks: usize) -> f64 {
    let half = blocks as f64 / 2.0;
    if half == 0.0 {
        return 0.0;
    }
    (1.0 - (k as f64 - half).abs() / half).max(0.0)
}

/// Phase of the smooth term for one axis family
pub fn axis_phase(seed: u64, axis: Axis) -> f64 {
    unit_f64(hash_indices(seed, &[axis.id(), 0xA5])) * TAU
}

/// Offset of road `k`. Always consumes one draw from `rng`.
pub fn organic_offset(
    k: usize,
    blocks: usize,
    curve: f64,
    phase: f64,
    bounds: &OrganicBounds,
    rng: &mut ChaCha8Rng,
) -> f64 {
    let jitter: f64 = rng.gen_range(-1.0..1.0);
    let factor = center_factor(k, blocks);
    if curve == 0.0 || factor == 0.0 || bounds.max_offset == 0.0 {
        return 0.0;
    }

    let smooth = (k as f64 * WAVE_FREQUENCY + phase).sin();
    let wave = SMOOTH_WEIGHT * smooth + JITTER_WEIGHT * jitter;
    let raw = curve * factor * wave * bounds.max_offset;
    raw.clamp(-bounds.max_offset, bounds.max_offset)
}

/// Rendered width with a bounded multiplicative jitter
pub fn rendered_width(road_width: f64, bounds: &OrganicBounds, rng: &mut ChaCha8Rng) -> f64 {
    let u: f64 = rng.gen_range(-1.0..1.0);
    road_width * (1.0 + u * bounds.width_jitter)
}
