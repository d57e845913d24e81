use thiserror::Error;

/// Main error type for the entropy coding library.
#[derive(Error, Debug)]
pub enum EntropyError {
    /// The encoder would have written past its configured size limit.
    #[error("Output buffer too small: limit of {limit} bytes reached")]
    BufferTooSmall { limit: usize },
    /// The decoder read past the end of its input.
    #[error("Corrupt bitstream: read past the end of a {size}-byte buffer")]
    CorruptBitstream { size: usize },
    /// The leading marker bit of a stream decoded as 1.
    #[error("Invalid marker bit at start of stream")]
    InvalidMarker,
    #[error("Invalid CDF: {0}")]
    InvalidCdf(String),
    #[error("Invalid tree: {0}")]
    InvalidTree(String),
    #[error("Invalid argument: {0}")]
    InvalidArg(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for entropy coding operations.
pub type Result<T> = std::result::Result<T, EntropyError>;
