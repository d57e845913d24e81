//! Fixed-point probability model: binary probabilities, adaptive CDFs and
//! decision trees.

pub mod cdf;
pub mod table;
pub mod tree;

use table::{COUNT_SAT, COUNT_TO_UPDATE_FACTOR};

/// Probability that a coded bit is `0`, in units of 1/256.
///
/// Legal values are `1..=255`. A `0` is clamped to `1` by both the encoder
/// and the decoder.
pub type Prob = u8;

/// Number of bits of precision in a [`Prob`].
pub const PROB_BITS: u32 = 8;
/// Total probability mass of a [`Prob`].
pub const PROB_SCALE: u32 = 1 << PROB_BITS;
/// Even odds.
pub const PROB_HALF: Prob = 128;

/// Clamps a probability into the legal `[1, 255]` window.
#[inline]
pub fn clip_prob(p: i32) -> Prob {
    p.clamp(1, 255) as Prob
}

/// Rounded `num / den` as a probability.
///
/// A zero denominator carries no information and yields [`PROB_HALF`].
#[inline]
pub fn get_prob(num: u32, den: u32) -> Prob {
    if den == 0 {
        return PROB_HALF;
    }
    let p = ((num as u64 * PROB_SCALE as u64 + (den >> 1) as u64) / den as u64) as i64;
    clip_prob(p.min(i32::MAX as i64) as i32)
}

/// Probability of a `0` branch given observed branch counts.
#[inline]
pub fn get_binary_prob(n0: u32, n1: u32) -> Prob {
    get_prob(n0, n0.saturating_add(n1))
}

/// Blends `a` toward `b` by `factor / 256`, rounding to nearest.
#[inline]
pub fn weighted_prob(a: Prob, b: Prob, factor: u32) -> Prob {
    debug_assert!(factor <= PROB_SCALE);
    let mixed = a as u32 * (PROB_SCALE - factor) + b as u32 * factor;
    ((mixed + (PROB_SCALE >> 1)) >> PROB_BITS) as Prob
}

/// Adapts a previous probability toward the branch counts `ct`.
///
/// The weight given to the counts grows with their total and saturates at
/// [`COUNT_SAT`] events.
pub fn merge_probs(pre: Prob, ct: [u32; 2]) -> Prob {
    let den = ct[0].saturating_add(ct[1]);
    if den == 0 {
        return pre;
    }
    let count = den.min(COUNT_SAT);
    let factor = COUNT_TO_UPDATE_FACTOR[count as usize];
    let prob = get_prob(ct[0], den);
    weighted_prob(pre, prob, factor)
}
