//! Rate estimation in 1/512 bit units for rate-distortion decisions.

use super::BoolWrite;
use crate::prob::cdf::Cdf;
use crate::prob::table::{PROB_COST, PROB_COST_SHIFT};
use crate::prob::tree::{Token, Tree};
use crate::prob::{PROB_SCALE, Prob};
use crate::utils::error::{EntropyError, Result};

/// Cost of coding a `0` under `prob`.
#[inline]
pub fn cost_zero(prob: Prob) -> u32 {
    PROB_COST[prob.max(1) as usize] as u32
}

/// Cost of coding a `1` under `prob`.
#[inline]
pub fn cost_one(prob: Prob) -> u32 {
    PROB_COST[(PROB_SCALE - prob.max(1) as u32) as usize] as u32
}

#[inline]
pub fn cost_bit(prob: Prob, bit: bool) -> u32 {
    if bit { cost_one(prob) } else { cost_zero(prob) }
}

/// Cost of an `n`-bit literal at even odds.
#[inline]
pub fn cost_literal(n: u32) -> u32 {
    n << PROB_COST_SHIFT
}

/// Total cost of `ct[0]` zeros and `ct[1]` ones under `prob`.
pub fn cost_branch(ct: [u32; 2], prob: Prob) -> u64 {
    ct[0] as u64 * cost_zero(prob) as u64 + ct[1] as u64 * cost_one(prob) as u64
}

/// Cost of coding `token` through `tree`.
pub fn treed_cost(tree: &Tree<'_>, probs: &[Prob], token: &Token) -> Result<u32> {
    tree.check_probs(probs)?;
    let nodes = tree.nodes();
    let mut cost = 0;
    let mut i = 0usize;
    for shift in (0..token.len).rev() {
        let bit = (token.value >> shift) & 1;
        cost += cost_bit(probs[i >> 1], bit != 0);
        let link = nodes[i + bit as usize];
        if link <= 0 {
            break;
        }
        i = link as usize;
    }
    Ok(cost)
}

/// Cost of every symbol of `tree`, indexed by symbol.
pub fn cost_tokens(tree: &Tree<'_>, probs: &[Prob]) -> Result<Vec<u32>> {
    tree.tokens()
        .iter()
        .map(|token| treed_cost(tree, probs, token))
        .collect()
}

/// Cost of coding `symbol` under `cdf`. Symbols outside the alphabet are
/// rejected as [`BoolWrite::encode_cdf`] rejects them.
pub fn cdf_cost(cdf: &Cdf, symbol: usize) -> Result<u32> {
    let last = cdf.nsymbs() - 1;
    if symbol > last {
        return Err(EntropyError::InvalidArg(format!(
            "symbol {} outside an alphabet of {}",
            symbol,
            cdf.nsymbs()
        )));
    }
    let mut cost: u32 = (0..symbol).map(|i| cost_one(cdf.stop_prob(i))).sum();
    if symbol < last {
        cost += cost_zero(cdf.stop_prob(symbol));
    }
    Ok(cost)
}

/// A [`BoolWrite`] sink that accumulates the cost of the decisions it is
/// given instead of producing bytes.
#[derive(Debug, Default, Clone)]
pub struct BitCounter {
    cost: u64,
}

impl BitCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulated cost in 1/512 bit units.
    pub fn cost(&self) -> u64 {
        self.cost
    }

    /// Accumulated cost rounded to whole bits.
    pub fn bits(&self) -> u64 {
        (self.cost + (1 << (PROB_COST_SHIFT - 1))) >> PROB_COST_SHIFT
    }

    pub fn reset(&mut self) {
        self.cost = 0;
    }
}

impl BoolWrite for BitCounter {
    #[inline]
    fn write_bit(&mut self, bit: bool, prob: Prob) -> Result<()> {
        self.cost += cost_bit(prob, bit) as u64;
        Ok(())
    }
}
