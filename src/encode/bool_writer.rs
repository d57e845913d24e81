use super::BoolWrite;
use crate::prob::{PROB_BITS, PROB_HALF, Prob};
use crate::utils::error::{EntropyError, Result};
use log::debug;
use std::io::Write;

/// Encoder configuration.
#[derive(Debug, Clone, Copy)]
pub struct EncoderParams {
    /// Bytes reserved up front for the output.
    pub initial_capacity: usize,
    /// Hard cap on the output size; exceeding it fails with
    /// [`EntropyError::BufferTooSmall`].
    pub max_size: Option<usize>,
    /// Append a zero byte when the stream would otherwise end on a byte that
    /// looks like a superframe index marker (`0b110x_xxxx`).
    pub guard_index_marker: bool,
}

impl Default for EncoderParams {
    fn default() -> Self {
        Self {
            initial_capacity: 4096,
            max_size: None,
            guard_index_marker: true,
        }
    }
}

/// Binary arithmetic encoder with 8-bit probabilities.
///
/// `low` holds the not yet emitted bits of the interval base, `range` stays
/// in `[128, 255]` between calls and `count` is the number of renormalization
/// shifts left before the next byte becomes final, offset by -24 so that a
/// byte is written once the top of `low` can no longer change except through
/// a carry.
pub struct BoolEncoder {
    low: u32,
    range: u32,
    count: i32,
    buffer: Vec<u8>,
    params: EncoderParams,
}

impl BoolEncoder {
    /// Starts a stream with the default parameters.
    pub fn start_encode() -> Result<Self> {
        Self::with_params(EncoderParams::default())
    }

    /// Starts a stream. The first coded bit is a `0` marker that keeps the
    /// coded value below one half, so a carry never runs off the front of
    /// the buffer.
    pub fn with_params(params: EncoderParams) -> Result<Self> {
        let mut encoder = Self {
            low: 0,
            range: 255,
            count: -24,
            buffer: Vec::with_capacity(params.initial_capacity),
            params,
        };
        encoder.write_bit(false, PROB_HALF)?;
        debug!("Bool encoder started with {:?}", params);
        Ok(encoder)
    }

    /// Bytes emitted so far. Bytes still subject to a carry are included.
    pub fn pos(&self) -> usize {
        self.buffer.len()
    }

    /// Renormalization shifts performed so far, i.e. the number of output
    /// bits the coded decisions have determined.
    pub fn bits_written(&self) -> u64 {
        self.buffer.len() as u64 * 8 + (self.count + 24) as u64
    }

    /// Pads the stream so that every coded decision is recoverable from the
    /// emitted bytes alone and returns them.
    ///
    /// The padding is 32 even-odds `0` decisions; a decoder running past the
    /// end of the buffer reads zeros, which decode to the same decisions.
    pub fn stop_encode(mut self) -> Result<Vec<u8>> {
        for _ in 0..32 {
            self.write_bit(false, PROB_HALF)?;
        }

        if self.params.guard_index_marker {
            if let Some(&last) = self.buffer.last() {
                if last & 0xe0 == 0xc0 {
                    self.push_byte(0)?;
                }
            }
        }

        debug!(
            "Bool encoder finished: {} bytes, {} bits determined",
            self.buffer.len(),
            self.bits_written()
        );
        Ok(self.buffer)
    }

    /// Finishes the stream and writes it to `writer`, returning its length.
    pub fn stop_encode_into<W: Write>(self, writer: &mut W) -> Result<usize> {
        let bytes = self.stop_encode()?;
        writer.write_all(&bytes)?;
        Ok(bytes.len())
    }

    fn push_byte(&mut self, byte: u8) -> Result<()> {
        if let Some(limit) = self.params.max_size {
            if self.buffer.len() >= limit {
                return Err(EntropyError::BufferTooSmall { limit });
            }
        }
        self.buffer.push(byte);
        Ok(())
    }

    /// Adds one to the emitted bytes as a multi-byte number: trailing `0xff`
    /// bytes wrap to zero and the first byte below `0xff` absorbs the carry.
    fn propagate_carry(&mut self) {
        for byte in self.buffer.iter_mut().rev() {
            if *byte == 0xff {
                *byte = 0;
            } else {
                *byte += 1;
                return;
            }
        }
        debug_assert!(false, "carry propagated past the first byte");
    }
}

impl BoolWrite for BoolEncoder {
    #[inline]
    fn write_bit(&mut self, bit: bool, prob: Prob) -> Result<()> {
        let prob = prob.max(1) as u32;
        let split = 1 + (((self.range - 1) * prob) >> PROB_BITS);

        #[cfg(feature = "debug-logging")]
        log::trace!(
            "write_bit: bit={} prob={} range={} low=0x{:06x} count={}",
            bit,
            prob,
            self.range,
            self.low,
            self.count
        );

        let mut low = self.low;
        let mut range = split;
        if bit {
            low = low.wrapping_add(split);
            range = self.range - split;
        }

        let mut shift = (range as u8).leading_zeros() as i32;
        range <<= shift;
        let mut count = self.count + shift;

        if count >= 0 {
            let offset = shift - count;

            if (low << (offset - 1)) & 0x8000_0000 != 0 {
                self.propagate_carry();
            }

            self.push_byte((low >> (24 - offset)) as u8)?;
            low <<= offset;
            shift = count;
            low &= 0xff_ffff;
            count -= 8;
        }

        self.low = low << shift;
        self.count = count;
        self.range = range;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_bit_stream_layout() {
        let mut encoder = BoolEncoder::start_encode().unwrap();
        encoder.write_bit(true, 128).unwrap();
        encoder.write_bit(false, 200).unwrap();
        assert_eq!(encoder.pos(), 0);
        assert_eq!(encoder.bits_written(), 2);
        let bytes = encoder.stop_encode().unwrap();
        assert_eq!(bytes, vec![0x40, 0x00]);
    }

    #[test]
    fn test_empty_stream() {
        let encoder = BoolEncoder::start_encode().unwrap();
        let bytes = encoder.stop_encode().unwrap();
        assert_eq!(bytes, vec![0x00, 0x00]);
    }

    #[test]
    fn test_propagate_carry_through_ff_run() {
        let mut encoder = BoolEncoder::start_encode().unwrap();
        encoder.buffer = vec![0x12, 0xff, 0xff, 0xff];
        encoder.propagate_carry();
        assert_eq!(encoder.buffer, vec![0x13, 0x00, 0x00, 0x00]);

        encoder.buffer = vec![0x12, 0x34];
        encoder.propagate_carry();
        assert_eq!(encoder.buffer, vec![0x12, 0x35]);

        encoder.buffer = vec![0x7f, 0xff];
        encoder.propagate_carry();
        assert_eq!(encoder.buffer, vec![0x80, 0x00]);
    }

    #[test]
    fn test_zero_probability_is_clamped() {
        let mut clamped = BoolEncoder::start_encode().unwrap();
        let mut explicit = BoolEncoder::start_encode().unwrap();
        for i in 0..100 {
            clamped.write_bit(i % 3 == 0, 0).unwrap();
            explicit.write_bit(i % 3 == 0, 1).unwrap();
        }
        assert_eq!(clamped.stop_encode().unwrap(), explicit.stop_encode().unwrap());
    }

    #[test]
    fn test_size_limit() {
        let params = EncoderParams {
            max_size: Some(4),
            ..Default::default()
        };
        let mut encoder = BoolEncoder::with_params(params).unwrap();
        let mut result = Ok(());
        for _ in 0..1000 {
            result = encoder.write_bool(true);
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(
            result,
            Err(EntropyError::BufferTooSmall { limit: 4 })
        ));
        assert_eq!(encoder.pos(), 4);
    }

    #[test]
    fn test_literal_width() {
        let mut encoder = BoolEncoder::start_encode().unwrap();
        assert!(matches!(
            encoder.write_literal(1, 33),
            Err(EntropyError::InvalidArg(_))
        ));
        assert_eq!(encoder.bits_written(), 0);
        encoder.write_literal(u32::MAX, 32).unwrap();
        assert_eq!(encoder.bits_written(), 32);
    }

    #[test]
    fn test_stop_encode_into_writer() {
        let mut encoder = BoolEncoder::start_encode().unwrap();
        encoder.write_literal(0xabcd, 16).unwrap();
        let mut sink = Vec::new();
        let written = encoder.stop_encode_into(&mut sink).unwrap();
        assert_eq!(written, sink.len());
        assert!(written >= 2);
    }

    #[test]
    fn test_index_marker_guard() {
        let encode = |guard_index_marker| {
            let mut encoder = BoolEncoder::with_params(EncoderParams {
                guard_index_marker,
                ..Default::default()
            })
            .unwrap();
            encoder.write_bit(true, 130).unwrap();
            encoder.write_bit(true, 3).unwrap();
            encoder.stop_encode().unwrap()
        };
        assert_eq!(encode(false), vec![0x41, 0xc0]);
        assert_eq!(encode(true), vec![0x41, 0xc0, 0x00]);
    }
}
