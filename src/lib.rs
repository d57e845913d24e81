//! # AV1 Entropy Coding
//!
//! The binary arithmetic coder that serializes coded symbols into an AV1
//! style bitstream, with the probability models and symbol layers built on
//! top of it.
//!
//! This library is organized into several modules:
//! - `utils`: Error handling
//! - `prob`: Bool-coder probabilities, adaptive CDFs and decision trees
//! - `encode`: The bool encoder, symbol writers, primitive codes and rate estimation
//! - `decode`: The bool decoder and the matching symbol readers

// Re-export commonly used types at the crate root
pub use utils::error::{EntropyError, Result};

pub mod utils {
    pub mod error;
}

pub mod decode;
pub mod encode;
pub mod prob;

// Public API exports
pub use decode::{BoolDecoder, BoolRead};
pub use encode::{BitCounter, BoolEncoder, BoolWrite, EncoderParams};
pub use prob::Prob;
pub use prob::cdf::Cdf;
pub use prob::tree::{Token, Tree, TreeIndex};
