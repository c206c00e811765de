use thiserror::Error;

/// Errors raised by signal-processing primitives.
#[derive(Debug, Error)]
pub enum DspError {
    #[error("dsp: fft length must be a power of two, got {size}")]
    FftSizeNotPowerOfTwo { size: usize },
}
