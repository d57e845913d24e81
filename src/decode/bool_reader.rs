use super::BoolRead;
use crate::prob::{PROB_BITS, PROB_HALF, PROB_SCALE, Prob};
use crate::utils::error::{EntropyError, Result};
use byteorder::{BigEndian, ByteOrder};
use log::{debug, warn};

/// Width of the decoder's bit window.
const VALUE_BITS: i32 = u64::BITS as i32;

/// Added to the bit count once the input is exhausted so that refills stop
/// and the window keeps shifting in zeros.
const LOTS_OF_BITS: i32 = 0x4000_0000;

/// Binary arithmetic decoder, the inverse of
/// [`crate::encode::BoolEncoder`].
///
/// `value` holds the input bits not yet consumed, aligned so that its top
/// byte lines up with `range`; `count` is the number of valid bits below
/// that byte.
pub struct BoolDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    value: u64,
    count: i32,
    range: u32,
}

impl<'a> BoolDecoder<'a> {
    /// Starts decoding `data` and consumes the leading marker bit.
    ///
    /// Fails with [`EntropyError::InvalidMarker`] if the marker decodes as
    /// `1`, which no encoder produces.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let mut decoder = Self {
            data,
            pos: 0,
            value: 0,
            count: -8,
            range: 255,
        };
        decoder.fill();
        if decoder.read_bit(PROB_HALF) {
            return Err(EntropyError::InvalidMarker);
        }
        debug!("Bool decoder started on {} bytes", data.len());
        Ok(decoder)
    }

    /// Input bytes loaded into the window so far.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// True once more bits have been consumed than the input holds.
    pub fn has_error(&self) -> bool {
        self.count > VALUE_BITS && self.count < LOTS_OF_BITS
    }

    /// Reports a read past the end of the input as
    /// [`EntropyError::CorruptBitstream`].
    pub fn check(&self) -> Result<()> {
        if self.has_error() {
            warn!(
                "Bool decoder read past the end of its {}-byte input",
                self.data.len()
            );
            return Err(EntropyError::CorruptBitstream {
                size: self.data.len(),
            });
        }
        Ok(())
    }

    /// Offset just past the last input byte the decoded decisions depended
    /// on. Whole bytes sitting unread in the window are given back.
    pub fn find_end(self) -> usize {
        let mut count = self.count;
        let mut pos = self.pos;
        while count > 8 && count < VALUE_BITS {
            count -= 8;
            pos -= 1;
        }
        pos
    }

    fn fill(&mut self) {
        let mut shift = VALUE_BITS - 8 - (self.count + 8);
        let bytes_left = self.data.len() - self.pos;

        if bytes_left > 8 {
            let bits = (shift & !7) + 8;
            let word = BigEndian::read_u64(&self.data[self.pos..self.pos + 8]);
            let next = word >> (VALUE_BITS - bits);
            self.count += bits;
            self.pos += (bits >> 3) as usize;
            self.value |= next << (shift & 7);
            return;
        }

        let bits_left = (bytes_left * 8) as i32;
        let bits_over = shift + 8 - bits_left;
        let mut loop_end = 0;
        if bits_over >= 0 {
            self.count += LOTS_OF_BITS;
            loop_end = bits_over;
            debug!("Bool decoder reached the end of its input at byte {}", self.pos);
        }
        if bits_over < 0 || bits_left > 0 {
            while shift >= loop_end {
                let Some(&byte) = self.data.get(self.pos) else {
                    break;
                };
                self.count += 8;
                self.value |= (byte as u64) << shift;
                self.pos += 1;
                shift -= 8;
            }
        }
    }
}

impl BoolRead for BoolDecoder<'_> {
    #[inline]
    fn read_bit(&mut self, prob: Prob) -> bool {
        let prob = prob.max(1) as u32;
        let split = (self.range * prob + (PROB_SCALE - prob)) >> PROB_BITS;

        if self.count < 0 {
            self.fill();
        }

        let bigsplit = (split as u64) << (VALUE_BITS - 8);
        let (bit, range) = if self.value >= bigsplit {
            self.value -= bigsplit;
            (true, self.range - split)
        } else {
            (false, split)
        };

        let shift = (range as u8).leading_zeros();
        self.range = range << shift;
        self.value <<= shift;
        self.count -= shift as i32;

        #[cfg(feature = "debug-logging")]
        log::trace!(
            "read_bit: bit={} prob={} range={} count={}",
            bit,
            prob,
            self.range,
            self.count
        );

        bit
    }
}
