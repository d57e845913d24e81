pub mod binary_codes;
pub mod bool_reader;

pub use bool_reader::BoolDecoder;

use crate::prob::cdf::Cdf;
use crate::prob::tree::Tree;
use crate::prob::{PROB_HALF, Prob};
use crate::utils::error::Result;

/// Source of probability-weighted binary decisions, the mirror of
/// [`crate::encode::BoolWrite`].
///
/// Reads never fail: an exhausted source keeps producing decisions and
/// reports the condition separately, so a truncated stream is detected at a
/// point the caller chooses rather than in the middle of a symbol.
pub trait BoolRead {
    /// Decodes one decision where `prob` is the probability of `false` out
    /// of 256.
    fn read_bit(&mut self, prob: Prob) -> bool;

    fn read_bool(&mut self) -> bool {
        self.read_bit(PROB_HALF)
    }

    /// Reads a `bits`-bit literal, most significant bit first. Widths past
    /// 32 bits, which no writer accepts, read 32.
    fn read_literal(&mut self, bits: u32) -> u32 {
        (0..bits.min(u32::BITS)).fold(0, |value, _| (value << 1) | self.read_bool() as u32)
    }

    /// Decodes a symbol coded with [`crate::encode::BoolWrite::encode_cdf`].
    fn decode_cdf(&mut self, cdf: &Cdf) -> usize {
        let last = cdf.nsymbs() - 1;
        (0..last)
            .find(|&i| !self.read_bit(cdf.stop_prob(i)))
            .unwrap_or(last)
    }

    /// Decodes a symbol under `cdf`, then adapts `cdf` toward it.
    fn decode_cdf_adaptive(&mut self, cdf: &mut Cdf) -> usize {
        let symbol = self.decode_cdf(cdf);
        cdf.update(symbol);
        symbol
    }

    /// Walks `tree` from the root, one decision per node, and returns the
    /// symbol of the leaf reached.
    fn read_tree(&mut self, tree: &Tree<'_>, probs: &[Prob]) -> Result<usize> {
        tree.check_probs(probs)?;
        let nodes = tree.nodes();
        let mut i = 0usize;
        loop {
            let link = nodes[i + self.read_bit(probs[i >> 1]) as usize];
            if link <= 0 {
                return Ok(-(link as i32) as usize);
            }
            i = link as usize;
        }
    }
}
