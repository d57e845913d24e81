//! Adaptive cumulative distribution functions over small alphabets.

use super::table::NSYMBS_TO_SPEED;
use super::{Prob, get_prob};
use crate::utils::error::{EntropyError, Result};

/// Bits of precision in a CDF cut point.
pub const CDF_PROB_BITS: u32 = 15;
/// Total probability mass of a CDF.
pub const CDF_PROB_TOP: u32 = 1 << CDF_PROB_BITS;
/// Largest alphabet a [`Cdf`] can describe.
pub const CDF_MAX_SYMBOLS: usize = 16;
/// Smallest mass any symbol keeps after adaptation.
pub const CDF_MIN_GAP: u32 = 4;

const CDF_COUNT_SAT: u16 = 32;

/// An adaptive CDF over `nsymbs` outcomes.
///
/// `cuts[i]` is `P(symbol <= i) * CDF_PROB_TOP`; the final cut point is
/// implicitly `CDF_PROB_TOP` and is not stored. Cut points are kept strictly
/// increasing inside `[1, CDF_PROB_TOP - 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cdf {
    cuts: [u16; CDF_MAX_SYMBOLS - 1],
    nsymbs: usize,
    count: u16,
}

impl Cdf {
    /// Builds a CDF from its `n - 1` explicit cut points in 15-bit precision.
    pub fn new(cuts: &[u16]) -> Result<Self> {
        let nsymbs = cuts.len() + 1;
        check_alphabet(nsymbs)?;

        let mut prev = 0u32;
        for (i, &cut) in cuts.iter().enumerate() {
            let cut = cut as u32;
            if cut <= prev {
                return Err(EntropyError::InvalidCdf(format!(
                    "cut point {} ({}) does not exceed its predecessor ({})",
                    i, cut, prev
                )));
            }
            if cut >= CDF_PROB_TOP {
                return Err(EntropyError::InvalidCdf(format!(
                    "cut point {} ({}) reaches the probability top {}",
                    i, cut, CDF_PROB_TOP
                )));
            }
            prev = cut;
        }

        let mut table = [0u16; CDF_MAX_SYMBOLS - 1];
        table[..cuts.len()].copy_from_slice(cuts);
        Ok(Self {
            cuts: table,
            nsymbs,
            count: 0,
        })
    }

    /// Builds a CDF from cut points expressed out of `total`, rescaling them
    /// to 15-bit precision. `Cdf::from_scaled(&[64, 128, 192], 256)` is the
    /// four-symbol uniform distribution.
    pub fn from_scaled(cuts: &[u32], total: u32) -> Result<Self> {
        if total == 0 {
            return Err(EntropyError::InvalidCdf("total mass is zero".to_string()));
        }
        let mut scaled = Vec::with_capacity(cuts.len());
        for &cut in cuts {
            if cut >= total {
                return Err(EntropyError::InvalidCdf(format!(
                    "cut point {} is not below the total {}",
                    cut, total
                )));
            }
            let v = (cut as u64 * CDF_PROB_TOP as u64 + (total / 2) as u64) / total as u64;
            scaled.push(v as u16);
        }
        Self::new(&scaled)
    }

    /// Equal mass for every symbol.
    pub fn uniform(nsymbs: usize) -> Result<Self> {
        check_alphabet(nsymbs)?;
        let cuts: Vec<u16> = (1..nsymbs)
            .map(|i| (i as u32 * CDF_PROB_TOP / nsymbs as u32) as u16)
            .collect();
        Self::new(&cuts)
    }

    /// Builds a CDF proportional to an event histogram.
    ///
    /// Every symbol keeps at least [`CDF_MIN_GAP`] of mass, so symbols that
    /// were never observed stay codable. An empty histogram is uniform.
    pub fn from_counts(counts: &[u32]) -> Result<Self> {
        let nsymbs = counts.len();
        check_alphabet(nsymbs)?;

        let total: u64 = counts.iter().map(|&c| c as u64).sum();
        if total == 0 {
            return Self::uniform(nsymbs);
        }

        let spread = (CDF_PROB_TOP - nsymbs as u32 * CDF_MIN_GAP) as u64;
        let mut cuts = Vec::with_capacity(nsymbs - 1);
        let mut acc = 0u64;
        for &c in &counts[..nsymbs - 1] {
            acc += c as u64 * spread / total + CDF_MIN_GAP as u64;
            cuts.push(acc as u16);
        }
        Self::new(&cuts)
    }

    /// Number of symbols in the alphabet.
    pub fn nsymbs(&self) -> usize {
        self.nsymbs
    }

    /// The explicit cut points.
    pub fn cuts(&self) -> &[u16] {
        &self.cuts[..self.nsymbs - 1]
    }

    /// Number of updates applied so far, saturating at 32.
    pub fn count(&self) -> u16 {
        self.count
    }

    /// Lower bound of `symbol`'s interval.
    #[inline]
    pub fn low(&self, symbol: usize) -> u32 {
        if symbol == 0 {
            0
        } else {
            self.cuts[symbol - 1] as u32
        }
    }

    /// Upper bound of `symbol`'s interval.
    #[inline]
    pub fn high(&self, symbol: usize) -> u32 {
        if symbol + 1 >= self.nsymbs {
            CDF_PROB_TOP
        } else {
            self.cuts[symbol] as u32
        }
    }

    /// Mass of `symbol` out of [`CDF_PROB_TOP`].
    #[inline]
    pub fn probability(&self, symbol: usize) -> u32 {
        self.high(symbol) - self.low(symbol)
    }

    /// Probability that the coded symbol is exactly `symbol`, given that it is
    /// not below `symbol`, as a bool-coder probability. Multi-symbol coding
    /// walks the alphabet with one such decision per symbol.
    #[inline]
    pub(crate) fn stop_prob(&self, symbol: usize) -> Prob {
        let low = self.low(symbol);
        get_prob(self.high(symbol) - low, CDF_PROB_TOP - low)
    }

    /// Moves the distribution toward an observed `symbol`.
    ///
    /// Adaptation starts fast and slows down as the counter grows; larger
    /// alphabets adapt more slowly. Out-of-range symbols are ignored.
    pub fn update(&mut self, symbol: usize) {
        debug_assert!(symbol < self.nsymbs, "symbol {} out of range", symbol);
        if symbol >= self.nsymbs {
            return;
        }

        let rate = self.adaptation_rate();
        for (i, cut) in self.cuts[..self.nsymbs - 1].iter_mut().enumerate() {
            let v = *cut as u32;
            let v = if i >= symbol {
                v + ((CDF_PROB_TOP - v) >> rate)
            } else {
                v - (v >> rate)
            };
            *cut = v as u16;
        }
        if self.count < CDF_COUNT_SAT {
            self.count += 1;
        }
        self.enforce_gaps();
    }

    fn adaptation_rate(&self) -> u32 {
        3 + (self.count > 15) as u32 + (self.count > 31) as u32 + NSYMBS_TO_SPEED[self.nsymbs]
    }

    /// Restores the minimum symbol mass at both ends and between neighbours.
    fn enforce_gaps(&mut self) {
        let n = self.nsymbs - 1;

        let mut ceiling = CDF_PROB_TOP;
        for cut in self.cuts[..n].iter_mut().rev() {
            let max = ceiling - CDF_MIN_GAP;
            if *cut as u32 > max {
                *cut = max as u16;
            }
            ceiling = *cut as u32;
        }

        let mut floor = 0u32;
        for cut in self.cuts[..n].iter_mut() {
            let min = floor + CDF_MIN_GAP;
            if (*cut as u32) < min {
                *cut = min as u16;
            }
            floor = *cut as u32;
        }
    }
}

fn check_alphabet(nsymbs: usize) -> Result<()> {
    if !(2..=CDF_MAX_SYMBOLS).contains(&nsymbs) {
        return Err(EntropyError::InvalidCdf(format!(
            "alphabet of {} symbols outside 2..={}",
            nsymbs, CDF_MAX_SYMBOLS
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_well_formed(cdf: &Cdf) {
        let mut prev = 0u32;
        for &cut in cdf.cuts() {
            assert!(cut as u32 > prev, "cuts not increasing: {:?}", cdf.cuts());
            prev = cut as u32;
        }
        assert!(prev < CDF_PROB_TOP);
    }

    #[test]
    fn test_new_rejects_bad_tables() {
        assert!(Cdf::new(&[]).is_err());
        assert!(Cdf::new(&[0, 100]).is_err());
        assert!(Cdf::new(&[100, 100]).is_err());
        assert!(Cdf::new(&[200, 100]).is_err());
        assert!(Cdf::new(&[100, 32768]).is_err());
        assert!(Cdf::new(&[1u16; 16]).is_err());
        assert!(Cdf::new(&[1, 32767]).is_ok());
    }

    #[test]
    fn test_from_scaled() {
        let cdf = Cdf::from_scaled(&[64, 128, 192], 256).unwrap();
        assert_eq!(cdf.cuts(), &[8192, 16384, 24576]);
        assert_eq!(cdf.nsymbs(), 4);
        assert_eq!(cdf, Cdf::uniform(4).unwrap());
        assert!(Cdf::from_scaled(&[64, 256], 256).is_err());
        assert!(Cdf::from_scaled(&[1], 0).is_err());
    }

    #[test]
    fn test_intervals() {
        let cdf = Cdf::new(&[1000, 5000, 30000]).unwrap();
        assert_eq!(cdf.low(0), 0);
        assert_eq!(cdf.high(0), 1000);
        assert_eq!(cdf.probability(1), 4000);
        assert_eq!(cdf.high(3), CDF_PROB_TOP);
        let total: u32 = (0..4).map(|s| cdf.probability(s)).sum();
        assert_eq!(total, CDF_PROB_TOP);
    }

    #[test]
    fn test_stop_prob() {
        let cdf = Cdf::uniform(4).unwrap();
        assert_eq!(cdf.stop_prob(0), 64);
        assert_eq!(cdf.stop_prob(1), 85);
        assert_eq!(cdf.stop_prob(2), 128);
    }

    #[test]
    fn test_from_counts() {
        let cdf = Cdf::from_counts(&[0, 10, 0, 30]).unwrap();
        assert_well_formed(&cdf);
        assert!(cdf.probability(0) >= CDF_MIN_GAP);
        assert!(cdf.probability(3) > cdf.probability(1));
        assert!(cdf.probability(1) > cdf.probability(2));
        assert_eq!(Cdf::from_counts(&[0, 0, 0]).unwrap(), Cdf::uniform(3).unwrap());
    }

    #[test]
    fn test_update_moves_mass_toward_symbol() {
        let mut cdf = Cdf::from_scaled(&[64, 128, 192], 256).unwrap();
        let mut last = cdf.probability(2);
        for _ in 0..200 {
            cdf.update(2);
            let mass = cdf.probability(2);
            assert!(mass >= last, "mass fell from {} to {}", last, mass);
            last = mass;
            assert_well_formed(&cdf);
        }
        assert!(last > CDF_PROB_TOP * 3 / 4);
        assert_eq!(cdf.count(), 32);
    }

    #[test]
    fn test_update_never_collapses() {
        let mut cdf = Cdf::uniform(16).unwrap();
        for _ in 0..5000 {
            cdf.update(0);
        }
        assert_well_formed(&cdf);
        for s in 0..16 {
            assert!(cdf.probability(s) >= CDF_MIN_GAP);
        }

        let mut cdf = Cdf::uniform(2).unwrap();
        for _ in 0..5000 {
            cdf.update(1);
        }
        assert_well_formed(&cdf);
        assert!(cdf.probability(0) >= CDF_MIN_GAP);
    }

    #[test]
    fn test_larger_alphabets_adapt_slower() {
        let small = Cdf::uniform(2).unwrap();
        let medium = Cdf::uniform(3).unwrap();
        let large = Cdf::uniform(8).unwrap();
        assert_eq!(small.adaptation_rate(), 4);
        assert_eq!(medium.adaptation_rate(), 4);
        assert_eq!(large.adaptation_rate(), 5);

        let mut warmed = Cdf::uniform(2).unwrap();
        for _ in 0..40 {
            warmed.update(1);
        }
        assert_eq!(warmed.adaptation_rate(), 6);
    }
}
