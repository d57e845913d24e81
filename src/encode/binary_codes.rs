//! Non-adaptive integer codes built from even-odds decisions.

use super::BoolWrite;
use crate::utils::error::{EntropyError, Result};

#[inline]
fn msb(n: u32) -> u32 {
    31 - n.leading_zeros()
}

/// Widest magnitude a symmetric code can carry: every `i32` fits in 31 bits
/// of `|v| - 1`.
pub const SYMMETRIC_MAX_MAG_BITS: u32 = 31;

/// Subexponential parameters at or above this value make the first bucket
/// cover any `u16` range, so they all code exactly like it.
pub(crate) const SUBEXP_MAX_K: u16 = 16;

/// Codes `v` in `[-2^mag_bits, 2^mag_bits]`: a zero flag, then a sign bit and
/// `mag_bits` bits of `|v| - 1`.
pub fn write_primitive_symmetric<W: BoolWrite + ?Sized>(w: &mut W, v: i32, mag_bits: u32) -> Result<()> {
    if mag_bits > SYMMETRIC_MAX_MAG_BITS {
        return Err(EntropyError::InvalidArg(format!(
            "{} magnitude bits exceed the maximum of {}",
            mag_bits, SYMMETRIC_MAX_MAG_BITS
        )));
    }
    if v.unsigned_abs() > 1u32 << mag_bits {
        return Err(EntropyError::InvalidArg(format!(
            "{} does not fit in {} magnitude bits",
            v, mag_bits
        )));
    }
    if v == 0 {
        return w.write_bool(false);
    }
    w.write_bool(true)?;
    w.write_bool(v < 0)?;
    w.write_literal(v.unsigned_abs() - 1, mag_bits)
}

pub fn count_primitive_symmetric(v: i32, mag_bits: u32) -> u32 {
    if v == 0 { 1 } else { 2 + mag_bits }
}

/// Codes `v` in `[0, n)` with either `l - 1` or `l` bits, `l` being the bit
/// length of `n - 1`; the shorter words go to the smallest values.
pub fn write_primitive_quniform<W: BoolWrite + ?Sized>(w: &mut W, n: u16, v: u16) -> Result<()> {
    if n <= 1 {
        return Ok(());
    }
    check_below(v, n)?;
    let (n, v) = (n as u32, v as u32);
    let l = msb(n - 1) + 1;
    let m = (1 << l) - n;
    if v < m {
        w.write_literal(v, l - 1)
    } else {
        w.write_literal(m + ((v - m) >> 1), l - 1)?;
        w.write_bool((v - m) & 1 != 0)
    }
}

pub fn count_primitive_quniform(n: u16, v: u16) -> u32 {
    if n <= 1 {
        return 0;
    }
    let l = msb(n as u32 - 1) + 1;
    let m = (1 << l) - n as u32;
    if (v as u32) < m { l - 1 } else { l }
}

/// Window of `p` values around `reference`, clamped inside `[0, n)`.
pub(crate) fn bilevel_window(n: u16, p: u16, reference: u16) -> Result<(u16, u16)> {
    if p == 0 || p >= n || reference >= n {
        return Err(EntropyError::InvalidArg(format!(
            "bilevel code needs 0 < p < n and ref < n, got n={} p={} ref={}",
            n, p, reference
        )));
    }
    let (n, p, reference) = (n as i32, p as i32, reference as i32);
    let mut lolimit = reference - p / 2;
    let mut hilimit = lolimit + p - 1;
    if lolimit < 0 {
        lolimit = 0;
        hilimit = p - 1;
    } else if hilimit >= n {
        hilimit = n - 1;
        lolimit = n - p;
    }
    Ok((lolimit as u16, hilimit as u16))
}

/// Codes `v` in `[0, n)` relative to `reference`: the `p` values closest to
/// `reference` get a short quasi-uniform code, the rest a longer one.
pub fn write_primitive_refbilevel<W: BoolWrite + ?Sized>(
    w: &mut W,
    n: u16,
    p: u16,
    reference: u16,
    v: u16,
) -> Result<()> {
    if n <= 1 {
        return Ok(());
    }
    check_below(v, n)?;
    let (lolimit, hilimit) = bilevel_window(n, p, reference)?;
    if v >= lolimit && v <= hilimit {
        w.write_bool(true)?;
        write_primitive_quniform(w, p, v - lolimit)
    } else {
        w.write_bool(false)?;
        let v = if v > hilimit { v - p } else { v };
        write_primitive_quniform(w, n - p, v)
    }
}

pub fn count_primitive_refbilevel(n: u16, p: u16, reference: u16, v: u16) -> Result<u32> {
    if n <= 1 {
        return Ok(0);
    }
    let (lolimit, hilimit) = bilevel_window(n, p, reference)?;
    if v >= lolimit && v <= hilimit {
        Ok(1 + count_primitive_quniform(p, v - lolimit))
    } else {
        let v = if v > hilimit { v - p } else { v };
        Ok(1 + count_primitive_quniform(n - p, v))
    }
}

/// Finite subexponential code for `v` in `[0, n)` with parameter `k`.
///
/// Values are grouped into buckets of size `2^k`, `2^k`, `2^(k+1)`, ...;
/// a unary prefix selects the bucket and a literal the offset inside it.
/// Once the remaining range is at most three buckets wide it is coded
/// quasi-uniformly instead. `k` saturates at [`SUBEXP_MAX_K`].
pub fn write_primitive_subexpfin<W: BoolWrite + ?Sized>(w: &mut W, n: u16, k: u16, v: u16) -> Result<()> {
    check_below(v, n)?;
    let (n, k, v) = (n as u32, k.min(SUBEXP_MAX_K) as u32, v as u32);
    let mut i = 0;
    let mut mk = 0;
    loop {
        let b = if i > 0 { k + i - 1 } else { k };
        let a = 1u32 << b;
        if n <= mk + 3 * a {
            return write_primitive_quniform(w, (n - mk) as u16, (v - mk) as u16);
        }
        let t = v >= mk + a;
        w.write_bool(t)?;
        if !t {
            return w.write_literal(v - mk, b);
        }
        i += 1;
        mk += a;
    }
}

pub fn count_primitive_subexpfin(n: u16, k: u16, v: u16) -> u32 {
    let (n, k, v) = (n as u32, k.min(SUBEXP_MAX_K) as u32, v as u32);
    let mut count = 0;
    let mut i = 0;
    let mut mk = 0;
    loop {
        let b = if i > 0 { k + i - 1 } else { k };
        let a = 1u32 << b;
        if n <= mk + 3 * a {
            return count + count_primitive_quniform((n - mk) as u16, v.saturating_sub(mk) as u16);
        }
        count += 1;
        if v < mk + a {
            return count + b;
        }
        i += 1;
        mk += a;
    }
}

fn recenter_nonneg(r: u32, v: u32) -> u32 {
    if v > (r << 1) {
        v
    } else if v >= r {
        (v - r) << 1
    } else {
        ((r - v) << 1) - 1
    }
}

/// Maps `v` in `[0, n)` so that values near `r` become small.
pub fn recenter_finite_nonneg(n: u16, r: u16, v: u16) -> u16 {
    let (n, r, v) = (n as u32, r as u32, v as u32);
    let mapped = if (r << 1) <= n {
        recenter_nonneg(r, v)
    } else {
        recenter_nonneg(n - 1 - r, n - 1 - v)
    };
    mapped as u16
}

/// Subexponential code for `v` in `[0, n)` recentered around `reference`.
pub fn write_primitive_refsubexpfin<W: BoolWrite + ?Sized>(
    w: &mut W,
    n: u16,
    k: u16,
    reference: u16,
    v: u16,
) -> Result<()> {
    check_below(v, n)?;
    check_below(reference, n)?;
    write_primitive_subexpfin(w, n, k, recenter_finite_nonneg(n, reference, v))
}

pub fn count_primitive_refsubexpfin(n: u16, k: u16, reference: u16, v: u16) -> u32 {
    count_primitive_subexpfin(n, k, recenter_finite_nonneg(n, reference, v))
}

fn check_below(v: u16, n: u16) -> Result<()> {
    if v >= n {
        return Err(EntropyError::InvalidArg(format!(
            "value {} outside [0, {})",
            v, n
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::BitCounter;

    fn counted<F>(f: F) -> u64
    where
        F: FnOnce(&mut BitCounter) -> Result<()>,
    {
        let mut counter = BitCounter::new();
        f(&mut counter).unwrap();
        counter.bits()
    }

    #[test]
    fn test_quniform_lengths() {
        // n = 5: l = 3, m = 3, so 0..3 take two bits and 3..5 take three.
        let lens: Vec<u32> = (0..5).map(|v| count_primitive_quniform(5, v)).collect();
        assert_eq!(lens, vec![2, 2, 2, 3, 3]);
        assert_eq!(count_primitive_quniform(1, 0), 0);
        assert_eq!(count_primitive_quniform(8, 7), 3);
        for v in 0..5 {
            let bits = counted(|w| write_primitive_quniform(w, 5, v));
            assert_eq!(bits, count_primitive_quniform(5, v) as u64);
        }
    }

    #[test]
    fn test_symmetric() {
        assert_eq!(count_primitive_symmetric(0, 4), 1);
        assert_eq!(count_primitive_symmetric(-16, 4), 6);
        assert_eq!(counted(|w| write_primitive_symmetric(w, -16, 4)), 6);
        let mut counter = BitCounter::new();
        assert!(write_primitive_symmetric(&mut counter, 17, 4).is_err());
    }

    #[test]
    fn test_bilevel_window() {
        assert_eq!(bilevel_window(16, 4, 8).unwrap(), (6, 9));
        assert_eq!(bilevel_window(16, 4, 0).unwrap(), (0, 3));
        assert_eq!(bilevel_window(16, 4, 15).unwrap(), (12, 15));
        assert!(bilevel_window(16, 0, 3).is_err());
        assert!(bilevel_window(16, 16, 3).is_err());
        assert!(bilevel_window(16, 4, 16).is_err());
    }

    #[test]
    fn test_refbilevel_counts_match_writes() {
        for v in 0..20 {
            let expected = count_primitive_refbilevel(20, 6, 11, v).unwrap();
            let bits = counted(|w| write_primitive_refbilevel(w, 20, 6, 11, v));
            assert_eq!(bits, expected as u64, "v={}", v);
        }
    }

    #[test]
    fn test_subexpfin_counts_match_writes() {
        for &(n, k) in &[(16u16, 0u16), (64, 2), (255, 3), (1000, 4)] {
            for v in 0..n {
                let expected = count_primitive_subexpfin(n, k, v);
                let bits = counted(|w| write_primitive_subexpfin(w, n, k, v));
                assert_eq!(bits, expected as u64, "n={} k={} v={}", n, k, v);
            }
        }
    }

    #[test]
    fn test_subexpfin_prefers_small_values() {
        assert!(count_primitive_subexpfin(1000, 2, 1) < count_primitive_subexpfin(1000, 2, 900));
    }

    #[test]
    fn test_recenter_is_a_permutation() {
        for &(n, r) in &[(10u16, 2u16), (10, 7), (9, 4), (2, 1)] {
            let mut seen = vec![false; n as usize];
            for v in 0..n {
                let m = recenter_finite_nonneg(n, r, v);
                assert!(m < n);
                assert!(!seen[m as usize], "n={} r={} collides at {}", n, r, m);
                seen[m as usize] = true;
            }
            assert_eq!(recenter_finite_nonneg(n, r, r), 0);
        }
    }

    #[test]
    fn test_symmetric_magnitude_width() {
        let mut counter = BitCounter::new();
        assert!(matches!(
            write_primitive_symmetric(&mut counter, 5, 32),
            Err(EntropyError::InvalidArg(_))
        ));
        assert_eq!(counter.cost(), 0);
        let bits = counted(|w| write_primitive_symmetric(w, i32::MIN, SYMMETRIC_MAX_MAG_BITS));
        assert_eq!(bits, 33);
    }

    #[test]
    fn test_subexpfin_large_k_saturates() {
        for &k in &[16u16, 31, 32, u16::MAX] {
            for &(n, v) in &[(100u16, 5u16), (u16::MAX, 60000)] {
                assert_eq!(count_primitive_subexpfin(n, k, v), count_primitive_quniform(n, v));
                let bits = counted(|w| write_primitive_subexpfin(w, n, k, v));
                assert_eq!(bits, count_primitive_quniform(n, v) as u64, "n={} k={}", n, k);
            }
        }
        assert_eq!(
            count_primitive_subexpfin(u16::MAX, 15, 40000),
            counted(|w| write_primitive_subexpfin(w, u16::MAX, 15, 40000)) as u32
        );
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let mut counter = BitCounter::new();
        assert!(write_primitive_quniform(&mut counter, 5, 5).is_err());
        assert!(write_primitive_subexpfin(&mut counter, 5, 1, 9).is_err());
        assert!(write_primitive_refsubexpfin(&mut counter, 5, 1, 7, 2).is_err());
    }
}
