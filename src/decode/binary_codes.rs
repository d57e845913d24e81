//! Readers for the codes in [`crate::encode::binary_codes`].

use super::BoolRead;
use crate::encode::binary_codes::{SUBEXP_MAX_K, SYMMETRIC_MAX_MAG_BITS, bilevel_window};
use crate::utils::error::Result;

#[inline]
fn msb(n: u32) -> u32 {
    31 - n.leading_zeros()
}

/// `mag_bits` saturates at [`SYMMETRIC_MAX_MAG_BITS`].
pub fn read_primitive_symmetric<R: BoolRead + ?Sized>(r: &mut R, mag_bits: u32) -> i32 {
    if !r.read_bool() {
        return 0;
    }
    let negative = r.read_bool();
    let magnitude = r.read_literal(mag_bits.min(SYMMETRIC_MAX_MAG_BITS)) as i64 + 1;
    let v = if negative { -magnitude } else { magnitude };
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

pub fn read_primitive_quniform<R: BoolRead + ?Sized>(r: &mut R, n: u16) -> u16 {
    if n <= 1 {
        return 0;
    }
    let n = n as u32;
    let l = msb(n - 1) + 1;
    let m = (1 << l) - n;
    let v = r.read_literal(l - 1);
    let v = if v < m { v } else { (v << 1) - m + r.read_bool() as u32 };
    v as u16
}

pub fn read_primitive_refbilevel<R: BoolRead + ?Sized>(r: &mut R, n: u16, p: u16, reference: u16) -> Result<u16> {
    if n <= 1 {
        return Ok(0);
    }
    let (lolimit, _) = bilevel_window(n, p, reference)?;
    if r.read_bool() {
        Ok(read_primitive_quniform(r, p) + lolimit)
    } else {
        let v = read_primitive_quniform(r, n - p);
        Ok(if v >= lolimit { v + p } else { v })
    }
}

/// `k` saturates at the same bound as the writer.
pub fn read_primitive_subexpfin<R: BoolRead + ?Sized>(r: &mut R, n: u16, k: u16) -> u16 {
    let (n, k) = (n as u32, k.min(SUBEXP_MAX_K) as u32);
    let mut i = 0;
    let mut mk = 0;
    loop {
        let b = if i > 0 { k + i - 1 } else { k };
        let a = 1u32 << b;
        if n <= mk + 3 * a {
            return (read_primitive_quniform(r, (n - mk) as u16) as u32 + mk) as u16;
        }
        if !r.read_bool() {
            return (r.read_literal(b) + mk) as u16;
        }
        i += 1;
        mk += a;
    }
}

fn inv_recenter_nonneg(r: u32, v: u32) -> u32 {
    if v > (r << 1) {
        v
    } else if v & 1 == 0 {
        (v >> 1) + r
    } else {
        r - ((v + 1) >> 1)
    }
}

/// Inverse of [`crate::encode::binary_codes::recenter_finite_nonneg`].
pub fn inv_recenter_finite_nonneg(n: u16, r: u16, v: u16) -> u16 {
    let (n, r, v) = (n as u32, r as u32, v as u32);
    let value = if (r << 1) <= n {
        inv_recenter_nonneg(r, v)
    } else {
        n - 1 - inv_recenter_nonneg(n - 1 - r, v)
    };
    value as u16
}

pub fn read_primitive_refsubexpfin<R: BoolRead + ?Sized>(r: &mut R, n: u16, k: u16, reference: u16) -> u16 {
    inv_recenter_finite_nonneg(n, reference, read_primitive_subexpfin(r, n, k))
}
