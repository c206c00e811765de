use std::io;

use thiserror::Error;

/// Errors raised while parsing a WAVE container or opening a decoder.
#[derive(Debug, Error)]
pub enum WavError {
    /// The stream does not start with a RIFF tag.
    #[error("wav: not a RIFF container")]
    BadContainerTag,

    /// The RIFF container does not carry the WAVE format tag.
    #[error("wav: RIFF container is not WAVE")]
    BadFormatTag,

    /// A mandatory sub-chunk never appeared inside the header buffer.
    #[error("wav: chunk {chunk:?} not found in header")]
    ChunkNotFound { chunk: &'static str },

    /// The format chunk declares a compression scheme other than linear PCM.
    #[error("wav: audio format code {code} is not linear PCM")]
    UnsupportedFormat { code: u16 },

    /// The format chunk declares a sample width the decoder cannot read.
    #[error("wav: unsupported bit depth: {bits} bits per sample")]
    UnsupportedBitDepth { bits: u16 },

    /// The header ran past the fixed parse buffer.
    #[error("wav: header exceeds the parse buffer")]
    TruncatedHeader,

    /// The file format does not match the configured pipeline target.
    #[error(
        "wav: {sample_rate} Hz / {bits_per_sample}-bit stream does not match the pipeline target"
    )]
    TargetMismatch { sample_rate: u32, bits_per_sample: u16 },

    #[error("wav: io error: {0}")]
    Io(#[from] io::Error),
}
