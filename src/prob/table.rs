//! Read-only probability tables shared by the encoder, decoder and rate
//! estimator.

/// Scale from a cost in bits to a cost in `PROB_COST` units.
pub const PROB_COST_SHIFT: u32 = 9;

/// Cost of coding a `0` bit under probability `p` (the index), in
/// 1/512 bit units. Index 256 is the certain event and costs nothing;
/// index 0 is never a legal probability and is priced like index 1.
pub const PROB_COST: [u16; 257] = build_prob_cost();

/// Counts at or above this value adapt with the maximum update factor.
pub const COUNT_SAT: u32 = 20;

/// Maximum weight, out of 256, given to freshly observed counts.
pub const MAX_UPDATE_FACTOR: u32 = 128;

/// Blend factor applied to observed branch counts when merging probabilities,
/// indexed by the saturated event count.
pub const COUNT_TO_UPDATE_FACTOR: [u32; COUNT_SAT as usize + 1] = [
    0, 6, 12, 19, 25, 32, 38, 44, 51, 57, 64, 70, 76, 83, 89, 96, 102, 108, 115, 121, 128,
];

/// Extra CDF adaptation slowdown indexed by alphabet size.
pub const NSYMBS_TO_SPEED: [u32; 17] = [0, 0, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2];

/// log2(x) in Q9 fixed point for x in 1..=256, by repeated squaring of the
/// normalized mantissa. Truncates.
const fn log2_q9(x: u32) -> u32 {
    let int = 31 - x.leading_zeros();
    let mut m: u64 = ((x as u64) << 16) >> int;
    let mut frac = 0u32;
    let mut i = 0;
    while i < PROB_COST_SHIFT {
        m = (m * m) >> 16;
        frac <<= 1;
        if m >= (2 << 16) {
            m >>= 1;
            frac |= 1;
        }
        i += 1;
    }
    (int << PROB_COST_SHIFT) | frac
}

const fn build_prob_cost() -> [u16; 257] {
    let mut table = [0u16; 257];
    let mut p = 1;
    while p <= 256 {
        table[p] = ((8 << PROB_COST_SHIFT) - log2_q9(p as u32)) as u16;
        p += 1;
    }
    table[0] = table[1];
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prob_cost_anchors() {
        assert_eq!(PROB_COST[256], 0);
        assert_eq!(PROB_COST[128], 512);
        assert_eq!(PROB_COST[64], 1024);
        assert_eq!(PROB_COST[2], 3584);
        assert_eq!(PROB_COST[1], 4096);
        assert_eq!(PROB_COST[0], PROB_COST[1]);
    }

    #[test]
    fn test_prob_cost_is_decreasing() {
        for p in 1..256 {
            assert!(
                PROB_COST[p] >= PROB_COST[p + 1],
                "cost must not rise with probability at p={}",
                p
            );
        }
    }

    #[test]
    fn test_update_factor_shape() {
        assert_eq!(COUNT_TO_UPDATE_FACTOR[0], 0);
        assert_eq!(COUNT_TO_UPDATE_FACTOR[COUNT_SAT as usize], MAX_UPDATE_FACTOR);
        assert!(COUNT_TO_UPDATE_FACTOR.windows(2).all(|w| w[0] < w[1]));
    }
}
