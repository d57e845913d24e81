pub mod binary_codes;
pub mod bool_writer;
pub mod cost;

pub use bool_writer::{BoolEncoder, EncoderParams};
pub use cost::BitCounter;

use crate::prob::cdf::Cdf;
use crate::prob::tree::{Token, Tree};
use crate::prob::{PROB_HALF, Prob};
use crate::utils::error::{EntropyError, Result};

/// Sink for probability-weighted binary decisions.
///
/// Only [`BoolWrite::write_bit`] is required; literals, CDF symbols and tree
/// symbols are all decomposed into calls to it, so every implementation
/// produces (or prices) the same decision sequence.
pub trait BoolWrite {
    /// Codes `bit` where `prob` is the probability of `false` out of 256.
    fn write_bit(&mut self, bit: bool, prob: Prob) -> Result<()>;

    /// Codes `bit` at even odds.
    fn write_bool(&mut self, bit: bool) -> Result<()> {
        self.write_bit(bit, PROB_HALF)
    }

    /// Codes the low `bits` bits of `value`, most significant first.
    /// At most 32 bits.
    fn write_literal(&mut self, value: u32, bits: u32) -> Result<()> {
        if bits > u32::BITS {
            return Err(EntropyError::InvalidArg(format!(
                "literal of {} bits exceeds {}",
                bits,
                u32::BITS
            )));
        }
        for bit in (0..bits).rev() {
            self.write_bool((value >> bit) & 1 != 0)?;
        }
        Ok(())
    }

    /// Codes `symbol` under `cdf` without adapting it.
    ///
    /// Each symbol before `symbol` costs one `true` decision and `symbol`
    /// itself one `false`, each weighted by the conditional mass of the
    /// symbol at that position. The last symbol needs no terminating decision.
    fn encode_cdf(&mut self, symbol: usize, cdf: &Cdf) -> Result<()> {
        if symbol >= cdf.nsymbs() {
            return Err(EntropyError::InvalidArg(format!(
                "symbol {} outside an alphabet of {}",
                symbol,
                cdf.nsymbs()
            )));
        }
        for i in 0..cdf.nsymbs() - 1 {
            let stop = i == symbol;
            self.write_bit(!stop, cdf.stop_prob(i))?;
            if stop {
                break;
            }
        }
        Ok(())
    }

    /// Codes `symbol` under `cdf`, then adapts `cdf` toward it.
    fn encode_cdf_adaptive(&mut self, symbol: usize, cdf: &mut Cdf) -> Result<()> {
        self.encode_cdf(symbol, cdf)?;
        cdf.update(symbol);
        Ok(())
    }

    /// Codes the leaf reached by the `len`-bit path `bits`.
    fn write_tree_bits(&mut self, tree: &Tree<'_>, probs: &[Prob], bits: u32, len: u32) -> Result<()> {
        let token = Token { value: bits, len };
        if !tree.tokens().contains(&token) {
            return Err(EntropyError::InvalidArg(format!(
                "path {:#b} of length {} does not end on a leaf",
                bits, len
            )));
        }
        self.write_token(tree, probs, &token)
    }

    /// Codes `symbol` as its root-to-leaf path through `tree`.
    fn write_tree(&mut self, tree: &Tree<'_>, probs: &[Prob], symbol: usize) -> Result<()> {
        let token = tree.token(symbol).ok_or_else(|| {
            EntropyError::InvalidArg(format!(
                "symbol {} outside a tree of {} leaves",
                symbol,
                tree.num_leaves()
            ))
        })?;
        self.write_token(tree, probs, &token)
    }

    /// Codes a token previously taken from `tree`.
    fn write_token(&mut self, tree: &Tree<'_>, probs: &[Prob], token: &Token) -> Result<()> {
        tree.check_probs(probs)?;
        let nodes = tree.nodes();
        let mut i = 0usize;
        for shift in (0..token.len).rev() {
            let bit = (token.value >> shift) & 1;
            self.write_bit(bit != 0, probs[i >> 1])?;
            let link = nodes[i + bit as usize];
            if link <= 0 {
                break;
            }
            i = link as usize;
        }
        Ok(())
    }
}
