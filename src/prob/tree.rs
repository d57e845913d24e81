//! Static binary decision trees for multi-valued symbols.
//!
//! A tree is a flat array of child links. The node at even index `i` has its
//! `0` child at `tree[i]` and its `1` child at `tree[i + 1]`; a positive link
//! is the index of another node, a link `<= 0` is a leaf holding the symbol
//! `-link`. The node at `i` is coded with probability `probs[i >> 1]`.

use super::cdf::{CDF_PROB_TOP, Cdf};
use super::{PROB_SCALE, Prob, get_binary_prob, merge_probs};
use crate::utils::error::{EntropyError, Result};

/// A child link in a decision tree.
pub type TreeIndex = i8;

/// Deepest path a tree may contain.
pub const MAX_TREE_DEPTH: u32 = 16;

/// Two symbols, one decision.
pub const BINARY_TREE: [TreeIndex; 2] = [0, -1];

/// Block partition: none, horizontal, vertical, split.
pub const PARTITION_TREE: [TreeIndex; 6] = [0, 2, -1, 4, -2, -3];

/// Intra prediction modes. Symbols: DC=0, V=1, H=2, D45=3, D135=4, D117=5,
/// D153=6, D207=7, D63=8, TM=9.
pub const INTRA_MODE_TREE: [TreeIndex; 18] = [
    0, 2, //
    -9, 4, //
    -1, 6, //
    8, 12, //
    -2, 10, //
    -4, -5, //
    -3, 14, //
    -8, 16, //
    -6, -7,
];

/// The root-to-leaf path of a symbol: `len` branch bits, most significant
/// first, packed into `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Token {
    pub value: u32,
    pub len: u32,
}

/// A validated decision tree with the path of every leaf precomputed.
#[derive(Debug, Clone)]
pub struct Tree<'a> {
    nodes: &'a [TreeIndex],
    tokens: Vec<Token>,
}

impl<'a> Tree<'a> {
    /// Validates `nodes` and derives the token of each leaf.
    ///
    /// Links must point forward, every internal node must be reachable
    /// exactly once and the leaves must hold the symbols `0..num_leaves`.
    pub fn new(nodes: &'a [TreeIndex]) -> Result<Self> {
        if nodes.len() < 2 || nodes.len() % 2 != 0 {
            return Err(EntropyError::InvalidTree(format!(
                "node array length {} is not a positive even number",
                nodes.len()
            )));
        }
        for (i, &link) in nodes.iter().enumerate() {
            if link > 0 {
                let target = link as usize;
                if target % 2 != 0 || target <= (i & !1) || target >= nodes.len() {
                    return Err(EntropyError::InvalidTree(format!(
                        "link {} at index {} does not point to a later node",
                        link, i
                    )));
                }
            }
        }

        let mut slots = vec![None; nodes.len() / 2 + 1];
        collect_tokens(nodes, &mut slots, 0, 0, 0)?;
        let tokens = slots
            .into_iter()
            .enumerate()
            .map(|(symbol, token)| {
                token.ok_or_else(|| {
                    EntropyError::InvalidTree(format!("symbol {} has no leaf", symbol))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { nodes, tokens })
    }

    /// The raw child links.
    pub fn nodes(&self) -> &'a [TreeIndex] {
        self.nodes
    }

    /// Size of the alphabet.
    pub fn num_leaves(&self) -> usize {
        self.tokens.len()
    }

    /// Number of node probabilities the tree is coded with.
    pub fn num_probs(&self) -> usize {
        self.nodes.len() / 2
    }

    /// The path to `symbol`'s leaf.
    pub fn token(&self, symbol: usize) -> Option<Token> {
        self.tokens.get(symbol).copied()
    }

    /// Paths of all leaves, indexed by symbol.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub(crate) fn check_probs(&self, probs: &[Prob]) -> Result<()> {
        if probs.len() < self.num_probs() {
            return Err(EntropyError::InvalidArg(format!(
                "tree needs {} node probabilities, got {}",
                self.num_probs(),
                probs.len()
            )));
        }
        Ok(())
    }

    /// Per-node `[zero, one]` branch counts implied by per-leaf event counts.
    pub fn branch_counts(&self, num_events: &[u32]) -> Result<Vec<[u32; 2]>> {
        if num_events.len() != self.num_leaves() {
            return Err(EntropyError::InvalidArg(format!(
                "tree has {} leaves, got {} event counts",
                self.num_leaves(),
                num_events.len()
            )));
        }
        let mut branch_ct = vec![[0u32; 2]; self.num_probs()];
        self.convert_distribution(0, num_events, &mut branch_ct);
        Ok(branch_ct)
    }

    fn convert_distribution(&self, i: usize, num_events: &[u32], branch_ct: &mut [[u32; 2]]) -> u32 {
        let mut side = [0u32; 2];
        for (bit, count) in side.iter_mut().enumerate() {
            let link = self.nodes[i + bit];
            *count = if link <= 0 {
                num_events[-(link as i32) as usize]
            } else {
                self.convert_distribution(link as usize, num_events, branch_ct)
            };
        }
        branch_ct[i >> 1] = side;
        side[0].saturating_add(side[1])
    }

    /// Node probabilities that best fit per-leaf event counts.
    pub fn probs_from_distribution(&self, num_events: &[u32]) -> Result<Vec<Prob>> {
        Ok(self
            .branch_counts(num_events)?
            .iter()
            .map(|ct| get_binary_prob(ct[0], ct[1]))
            .collect())
    }

    /// Adapts previous node probabilities toward per-leaf event counts.
    pub fn merge_probs(&self, pre_probs: &[Prob], num_events: &[u32]) -> Result<Vec<Prob>> {
        self.check_probs(pre_probs)?;
        Ok(self
            .branch_counts(num_events)?
            .iter()
            .zip(pre_probs)
            .map(|(&ct, &pre)| merge_probs(pre, ct))
            .collect())
    }

    /// Collapses the tree into a single CDF over its leaves by multiplying the
    /// branch probabilities along each path. Useful to seed an adaptive
    /// context from a tree-structured model.
    pub fn to_cdf(&self, probs: &[Prob]) -> Result<Cdf> {
        self.check_probs(probs)?;
        let mut masses = vec![0u32; self.num_leaves()];
        self.spread_mass(0, CDF_PROB_TOP, probs, &mut masses);
        Cdf::from_counts(&masses)
    }

    fn spread_mass(&self, i: usize, mass: u32, probs: &[Prob], masses: &mut [u32]) {
        let p = probs[i >> 1].max(1) as u64;
        let zero = (mass as u64 * p / PROB_SCALE as u64) as u32;
        for (bit, share) in [zero, mass - zero].into_iter().enumerate() {
            let link = self.nodes[i + bit];
            if link <= 0 {
                masses[-(link as i32) as usize] = share;
            } else {
                self.spread_mass(link as usize, share, probs, masses);
            }
        }
    }
}

fn collect_tokens(
    nodes: &[TreeIndex],
    slots: &mut [Option<Token>],
    value: u32,
    len: u32,
    i: usize,
) -> Result<()> {
    let len = len + 1;
    if len > MAX_TREE_DEPTH {
        return Err(EntropyError::InvalidTree(format!(
            "path deeper than {} branches",
            MAX_TREE_DEPTH
        )));
    }
    for bit in 0..2 {
        let link = nodes[i + bit];
        let value = (value << 1) | bit as u32;
        if link <= 0 {
            let symbol = -(link as i32) as usize;
            match slots.get_mut(symbol) {
                Some(slot) if slot.is_none() => *slot = Some(Token { value, len }),
                Some(_) => {
                    return Err(EntropyError::InvalidTree(format!(
                        "symbol {} appears on more than one leaf",
                        symbol
                    )));
                }
                None => {
                    return Err(EntropyError::InvalidTree(format!(
                        "leaf symbol {} exceeds the alphabet of {}",
                        symbol,
                        slots.len()
                    )));
                }
            }
        } else {
            collect_tokens(nodes, slots, value, len, link as usize)?;
        }
    }
    Ok(())
}
